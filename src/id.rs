use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static GLOBAL_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Source of the correlation id stamped on every dispatched action.
///
/// Ids only need to be unique within one process; they identify a dispatch,
/// never a piece of form state.
pub trait ActionIdGenerator: Send + Sync + 'static {
    fn next_id(&self, namespace: &str, name: &str) -> String;
}

/// Monotonic counter ids (`"1"`, `"2"`, ...). Deterministic, so tests use it.
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionIdGenerator for SequentialIds {
    fn next_id(&self, _namespace: &str, _name: &str) -> String {
        self.next.fetch_add(1, Ordering::SeqCst).to_string()
    }
}

/// Short opaque tokens, 16 hex chars, hashed from a per-generator seed and a
/// process-wide sequence.
#[derive(Clone, Copy, Debug)]
pub struct TokenIds {
    seed: u64,
}

impl TokenIds {
    pub fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or_default();
        Self { seed: nanos }
    }

    pub const fn with_seed(seed: u64) -> Self {
        Self { seed }
    }
}

impl Default for TokenIds {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionIdGenerator for TokenIds {
    fn next_id(&self, namespace: &str, name: &str) -> String {
        let sequence = GLOBAL_SEQUENCE.fetch_add(1, Ordering::SeqCst);
        let material = format!("{}:{sequence}:{namespace}/{name}", self.seed);
        format!("{:016x}", fnv1a64(material.as_bytes()))
    }
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x00000100000001b3;

    let mut hash = OFFSET_BASIS;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_ids_count_up() {
        let ids = SequentialIds::starting_at(7);
        assert_eq!(ids.next_id("Person", "changed"), "7");
        assert_eq!(ids.next_id("Person", "saved"), "8");
    }

    #[test]
    fn token_ids_are_fixed_width_hex() {
        let ids = TokenIds::with_seed(42);
        let token = ids.next_id("Person", "changed");
        assert_eq!(token.len(), 16);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn token_ids_differ_between_dispatches() {
        let ids = TokenIds::with_seed(42);
        let tokens = (0..16)
            .map(|_| ids.next_id("Person", "changed"))
            .collect::<std::collections::BTreeSet<_>>();
        assert_eq!(tokens.len(), 16);
    }
}
