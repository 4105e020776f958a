use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Serialize, Serializer};
use serde_json::Value;

use super::actions::{ActionKind, DispatchHandle, Dispatcher, FormActions};
use super::binding::EventHooks;
use super::config::FormConfig;
use super::lifecycle::{SavePhase, SaveStrategy, SaveTracker};
use super::normalize::NormalizeStrategy;
use super::validation::{ValidationReport, ValidationStrategy};

pub const DEFAULT_KEY_ATTRIBUTE: &str = "data-flux-key";

static MISSING: Value = Value::Null;

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(Arc<str>);

impl FieldKey {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for FieldKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FieldKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&FieldKey> for FieldKey {
    fn from(value: &FieldKey) -> Self {
        value.clone()
    }
}

impl Serialize for FieldKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Whether a field is edited through a single input (`Scalar`) or is a
/// structured value assembled elsewhere (`Composite`).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FieldKind {
    #[default]
    Scalar,
    Composite,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldDecl {
    pub key: FieldKey,
    pub kind: FieldKind,
}

impl FieldDecl {
    pub fn scalar(key: impl Into<FieldKey>) -> Self {
        Self {
            key: key.into(),
            kind: FieldKind::Scalar,
        }
    }

    pub fn composite(key: impl Into<FieldKey>) -> Self {
        Self {
            key: key.into(),
            kind: FieldKind::Composite,
        }
    }
}

/// A struct whose named fields declare a form's field set, usually via
/// `#[derive(FormModel)]`.
pub trait FormModel {
    type Fields;

    fn fields() -> Self::Fields;
    fn declarations() -> Vec<FieldDecl>;
}

/// The live record of field values. Keys are not restricted to the declared
/// fields; absent keys read as `null`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormState(BTreeMap<FieldKey, Value>);

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    /// The value of `key`, or `null` when the field is missing.
    pub fn value(&self, key: &str) -> &Value {
        self.0.get(key).unwrap_or(&MISSING)
    }

    pub fn insert(&mut self, key: impl Into<FieldKey>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.0.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, FieldKey, Value> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect(),
        )
    }
}

impl<K> FromIterator<(K, Value)> for FormState
where
    K: Into<FieldKey>,
{
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(key, value)| (key.into(), value)).collect())
    }
}

impl From<serde_json::Map<String, Value>> for FormState {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl TryFrom<Value> for FormState {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(map.into()),
            other => Err(other),
        }
    }
}

impl<'a> IntoIterator for &'a FormState {
    type Item = (&'a FieldKey, &'a Value);
    type IntoIter = btree_map::Iter<'a, FieldKey, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

pub type HostError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("validation failed for {}", .0.failed_summary())]
    Validation(ValidationReport),
    #[error(transparent)]
    Host(HostError),
    #[error("invalid save phase transition: {from:?} -> {to:?}")]
    InvalidPhaseTransition { from: SavePhase, to: SavePhase },
}

impl FormError {
    pub fn host(error: impl Into<HostError>) -> Self {
        Self::Host(error.into())
    }

    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Validation(report) => Some(report),
            _ => None,
        }
    }
}

pub type FormResult<T> = Result<T, FormError>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FormOptions {
    /// Element attribute naming the field an input event belongs to.
    pub key_attribute: &'static str,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            key_attribute: DEFAULT_KEY_ATTRIBUTE,
        }
    }
}

/// Binds a mutable [`FormState`] to a dispatcher.
///
/// Clones share the same state, so handlers handed to a UI layer observe and
/// mutate the live record.
#[derive(Clone)]
pub struct FormController {
    pub(super) namespace: Arc<str>,
    pub(super) options: FormOptions,
    pub(super) fields: Arc<Vec<FieldDecl>>,
    pub(super) state: Arc<RwLock<FormState>>,
    pub(super) dispatch: DispatchHandle,
    pub(super) validation: Arc<dyn ValidationStrategy>,
    pub(super) normalization: Arc<dyn NormalizeStrategy>,
    pub(super) saving: Arc<dyn SaveStrategy>,
    pub(super) hooks: Arc<EventHooks>,
    pub(super) save_tracker: Arc<RwLock<SaveTracker>>,
}

impl FormController {
    pub fn new<D>(namespace: impl Into<Arc<str>>, dispatcher: D, config: FormConfig) -> Self
    where
        D: Dispatcher + 'static,
    {
        Self::with_dispatcher(namespace, Arc::new(dispatcher), config)
    }

    pub fn with_dispatcher(
        namespace: impl Into<Arc<str>>,
        dispatcher: Arc<dyn Dispatcher>,
        config: FormConfig,
    ) -> Self {
        let namespace = namespace.into();
        let parts = config.into_parts();
        let actions = FormActions::with_ids(namespace.clone(), parts.ids);
        Self {
            namespace,
            options: parts.options,
            fields: Arc::new(parts.fields),
            state: Arc::new(RwLock::new(parts.state)),
            dispatch: DispatchHandle::new(actions, dispatcher),
            validation: parts.validation,
            normalization: parts.normalization,
            saving: parts.saving,
            hooks: Arc::new(parts.hooks),
            save_tracker: Arc::new(RwLock::new(SaveTracker::default())),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn options(&self) -> FormOptions {
        self.options
    }

    pub fn actions(&self) -> &FormActions {
        self.dispatch.actions()
    }

    pub fn declared_fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    /// A copy of the current state.
    pub fn state(&self) -> FormState {
        read_lock(&self.state).clone()
    }

    pub fn value(&self, key: &str) -> Value {
        read_lock(&self.state).value(key).clone()
    }

    /// Overwrites `key` and dispatches `changed` carrying the full state.
    pub fn change(&self, key: impl Into<FieldKey>, value: Value) {
        let key = key.into();
        let snapshot = {
            let mut state = write_lock(&self.state);
            state.insert(key.clone(), value);
            state.to_value()
        };
        tracing::trace!(namespace = %self.namespace, field = %key, "field changed");
        self.dispatch.emit(ActionKind::Changed, snapshot);
    }

    pub fn focus(&self, key: impl Into<FieldKey>) {
        let key = key.into();
        self.dispatch
            .emit(ActionKind::Focused, Value::String(key.to_string()));
    }

    pub fn blur(&self, key: impl Into<FieldKey>) {
        let key = key.into();
        self.dispatch
            .emit(ActionKind::Blurred, Value::String(key.to_string()));
    }

    /// Dispatches `canceled` with the current state. Nothing is reset.
    pub fn cancel(&self) {
        let snapshot = read_lock(&self.state).to_value();
        self.dispatch.emit(ActionKind::Canceled, snapshot);
    }
}

pub(super) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub(super) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
