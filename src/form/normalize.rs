use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use super::controller::{FieldKey, FormController, FormResult, FormState, write_lock};

/// Maps a raw field value to its canonical form.
pub trait OutputNormalizer: Send + Sync + 'static {
    fn normalize(&self, value: &Value) -> Value;
}

impl<F> OutputNormalizer for F
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    fn normalize(&self, value: &Value) -> Value {
        (self)(value)
    }
}

pub trait NormalizeStrategy: Send + Sync + 'static {
    fn normalize(&self, state: &mut FormState) -> FormResult<()>;
}

impl<F> NormalizeStrategy for F
where
    F: Fn(&mut FormState) -> FormResult<()> + Send + Sync + 'static,
{
    fn normalize(&self, state: &mut FormState) -> FormResult<()> {
        (self)(state)
    }
}

/// Applies the registered output normalizers to the keys present in state.
#[derive(Clone, Default)]
pub struct OutputNormalization {
    outputs: BTreeMap<FieldKey, Arc<dyn OutputNormalizer>>,
}

impl OutputNormalization {
    pub fn new(outputs: BTreeMap<FieldKey, Arc<dyn OutputNormalizer>>) -> Self {
        Self { outputs }
    }
}

impl NormalizeStrategy for OutputNormalization {
    fn normalize(&self, state: &mut FormState) -> FormResult<()> {
        for (key, output) in &self.outputs {
            if let Some(value) = state.get_mut(key.as_str()) {
                *value = output.normalize(value);
            }
        }
        Ok(())
    }
}

impl FormController {
    /// Rewrites state in place through the configured normalization.
    pub fn normalize(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state);
        self.normalization.normalize(&mut state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_present_keys_are_rewritten() {
        let mut outputs = BTreeMap::<FieldKey, Arc<dyn OutputNormalizer>>::new();
        outputs.insert(
            "name".into(),
            Arc::new(|value: &Value| json!(value.as_str().unwrap_or_default().trim())),
        );
        outputs.insert("missing".into(), Arc::new(|_: &Value| json!("filled")));
        let normalization = OutputNormalization::new(outputs);

        let mut state = FormState::from_iter([("name", json!("  Josh ")), ("age", json!("35"))]);
        normalization
            .normalize(&mut state)
            .expect("normalize state");

        assert_eq!(state.get("name"), Some(&json!("Josh")));
        assert_eq!(state.get("age"), Some(&json!("35")));
        assert!(!state.contains_key("missing"));
    }
}
