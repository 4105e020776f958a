use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use super::controller::{DEFAULT_KEY_ATTRIBUTE, FieldKey, FieldKind, FormController, read_lock};

/// What the rendering layer hands over when an input fires.
pub trait FieldEvent {
    fn attribute(&self, name: &str) -> Option<&str>;
    fn value(&self) -> Value;
}

/// A detached event: a bag of element attributes plus the input's value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputEvent {
    attributes: BTreeMap<String, String>,
    value: Value,
}

impl InputEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// An event tagged with the default key attribute.
    pub fn keyed(key: impl Into<String>) -> Self {
        Self::new().with_attribute(DEFAULT_KEY_ATTRIBUTE, key)
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }
}

impl FieldEvent for InputEvent {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn value(&self) -> Value {
        self.value.clone()
    }
}

pub type EventHook = Arc<dyn Fn(&FieldKey, &dyn FieldEvent) + Send + Sync>;

/// Host callbacks run after the built-in handler.
#[derive(Clone, Default)]
pub struct EventHooks {
    pub(super) on_change: Option<EventHook>,
    pub(super) on_focus: Option<EventHook>,
    pub(super) on_blur: Option<EventHook>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldEventKind {
    Change,
    Focus,
    Blur,
}

#[derive(Clone)]
pub struct FieldHandler {
    form: FormController,
    kind: FieldEventKind,
}

impl FieldHandler {
    pub fn kind(&self) -> FieldEventKind {
        self.kind
    }

    /// Returns `false` when the event carried no field key.
    pub fn call(&self, event: &dyn FieldEvent) -> bool {
        self.form.handle_event(self.kind, event)
    }
}

/// Everything a UI needs to wire one field. Built fresh on every request.
#[derive(Clone)]
pub struct FieldProps {
    pub key: FieldKey,
    pub kind: FieldKind,
    pub key_attribute: &'static str,
    /// `None` for composite fields, which are not edited through one input.
    pub value: Option<Value>,
    pub on_change: Option<FieldHandler>,
    pub on_focus: FieldHandler,
    pub on_blur: FieldHandler,
}

impl FieldProps {
    /// The `(name, value)` attribute pair to put on the input element.
    pub fn key_attribute_pair(&self) -> (&'static str, &str) {
        (self.key_attribute, self.key.as_str())
    }
}

impl FormController {
    pub fn handle_change(&self, event: &dyn FieldEvent) -> bool {
        self.handle_event(FieldEventKind::Change, event)
    }

    pub fn handle_focus(&self, event: &dyn FieldEvent) -> bool {
        self.handle_event(FieldEventKind::Focus, event)
    }

    pub fn handle_blur(&self, event: &dyn FieldEvent) -> bool {
        self.handle_event(FieldEventKind::Blur, event)
    }

    pub fn field_props(&self) -> Vec<FieldProps> {
        let state = read_lock(&self.state);
        self.fields
            .iter()
            .map(|decl| {
                let value = match decl.kind {
                    FieldKind::Scalar => Some(state.value(decl.key.as_str()).clone()),
                    FieldKind::Composite => None,
                };
                let on_change = match decl.kind {
                    FieldKind::Scalar => Some(self.handler(FieldEventKind::Change)),
                    FieldKind::Composite => None,
                };
                FieldProps {
                    key: decl.key.clone(),
                    kind: decl.kind,
                    key_attribute: self.options.key_attribute,
                    value,
                    on_change,
                    on_focus: self.handler(FieldEventKind::Focus),
                    on_blur: self.handler(FieldEventKind::Blur),
                }
            })
            .collect()
    }

    pub fn field_prop(&self, key: &str) -> Option<FieldProps> {
        self.field_props()
            .into_iter()
            .find(|props| props.key.as_str() == key)
    }

    fn handler(&self, kind: FieldEventKind) -> FieldHandler {
        FieldHandler {
            form: self.clone(),
            kind,
        }
    }

    fn handle_event(&self, kind: FieldEventKind, event: &dyn FieldEvent) -> bool {
        let Some(key) = event.attribute(self.options.key_attribute).map(FieldKey::from) else {
            tracing::trace!(
                namespace = %self.namespace,
                attribute = self.options.key_attribute,
                ?kind,
                "ignoring event without a field key"
            );
            return false;
        };

        let hook = match kind {
            FieldEventKind::Change => {
                self.change(key.clone(), event.value());
                &self.hooks.on_change
            }
            FieldEventKind::Focus => {
                self.focus(key.clone());
                &self.hooks.on_focus
            }
            FieldEventKind::Blur => {
                self.blur(key.clone());
                &self.hooks.on_blur
            }
        };
        if let Some(hook) = hook {
            hook(&key, event);
        }
        true
    }
}
