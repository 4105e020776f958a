use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};

use crate::id::{ActionIdGenerator, TokenIds};

/// The six lifecycle events a form reports to its store.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ActionKind {
    Changed,
    Focused,
    Blurred,
    Saved,
    Canceled,
    ValidationFailed,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Changed,
        ActionKind::Focused,
        ActionKind::Blurred,
        ActionKind::Saved,
        ActionKind::Canceled,
        ActionKind::ValidationFailed,
    ];

    pub const fn event_name(self) -> &'static str {
        match self {
            ActionKind::Changed => "changed",
            ActionKind::Focused => "focused",
            ActionKind::Blurred => "blurred",
            ActionKind::Saved => "saved",
            ActionKind::Canceled => "canceled",
            ActionKind::ValidationFailed => "validationFailed",
        }
    }
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.event_name())
    }
}

pub fn action_type(namespace: &str, kind: ActionKind) -> String {
    format!("{namespace}/{}", kind.event_name())
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ActionMeta {
    pub id: String,
    pub namespace: String,
    pub name: String,
}

/// An inert event record. Serializes to `{type, payload, meta}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Action {
    #[serde(skip)]
    pub kind: ActionKind,
    #[serde(rename = "type")]
    pub action_type: String,
    pub payload: Value,
    pub meta: ActionMeta,
}

impl Action {
    pub fn is(&self, kind: ActionKind) -> bool {
        self.kind == kind
    }

    pub fn to_value(&self) -> Value {
        json!({
            "type": self.action_type,
            "payload": self.payload,
            "meta": {
                "id": self.meta.id,
                "namespace": self.meta.namespace,
                "name": self.meta.name,
            },
        })
    }

    /// The `{type, payload, action, data}` shape older stores pattern-match on.
    pub fn to_legacy(&self) -> Value {
        json!({
            "type": self.action_type,
            "payload": self.payload,
            "action": self.action_type,
            "data": self.payload,
        })
    }
}

#[derive(Clone)]
pub struct ActionCreator {
    kind: ActionKind,
    namespace: Arc<str>,
    action_type: String,
    ids: Arc<dyn ActionIdGenerator>,
}

impl ActionCreator {
    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn type_name(&self) -> &str {
        &self.action_type
    }

    pub fn create(&self, payload: Value) -> Action {
        let name = self.kind.event_name();
        Action {
            kind: self.kind,
            action_type: self.action_type.clone(),
            payload,
            meta: ActionMeta {
                id: self.ids.next_id(&self.namespace, name),
                namespace: self.namespace.to_string(),
                name: name.to_string(),
            },
        }
    }
}

/// One [`ActionCreator`] per [`ActionKind`], all sharing a namespace.
#[derive(Clone)]
pub struct FormActions {
    namespace: Arc<str>,
    creators: Arc<[ActionCreator; 6]>,
}

impl FormActions {
    pub fn new(namespace: impl Into<Arc<str>>) -> Self {
        Self::with_ids(namespace, Arc::new(TokenIds::new()))
    }

    pub fn with_ids(namespace: impl Into<Arc<str>>, ids: Arc<dyn ActionIdGenerator>) -> Self {
        let namespace = namespace.into();
        let creators = ActionKind::ALL.map(|kind| ActionCreator {
            kind,
            namespace: namespace.clone(),
            action_type: action_type(&namespace, kind),
            ids: ids.clone(),
        });
        Self {
            namespace,
            creators: Arc::new(creators),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn creator(&self, kind: ActionKind) -> &ActionCreator {
        &self.creators[kind as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionCreator> {
        self.creators.iter()
    }

    pub fn changed(&self) -> &ActionCreator {
        self.creator(ActionKind::Changed)
    }

    pub fn focused(&self) -> &ActionCreator {
        self.creator(ActionKind::Focused)
    }

    pub fn blurred(&self) -> &ActionCreator {
        self.creator(ActionKind::Blurred)
    }

    pub fn saved(&self) -> &ActionCreator {
        self.creator(ActionKind::Saved)
    }

    pub fn canceled(&self) -> &ActionCreator {
        self.creator(ActionKind::Canceled)
    }

    pub fn validation_failed(&self) -> &ActionCreator {
        self.creator(ActionKind::ValidationFailed)
    }
}

/// The external store. Calls are synchronous; failures belong to the store.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, action: Action);
}

impl<F> Dispatcher for F
where
    F: Fn(Action) + Send + Sync,
{
    fn dispatch(&self, action: Action) {
        (self)(action)
    }
}

/// Forwards every action to a sink in the legacy wire shape.
pub struct LegacyDispatcher<S> {
    sink: S,
}

impl<S> LegacyDispatcher<S>
where
    S: Fn(Value) + Send + Sync,
{
    pub fn new(sink: S) -> Self {
        Self { sink }
    }
}

impl<S> Dispatcher for LegacyDispatcher<S>
where
    S: Fn(Value) + Send + Sync,
{
    fn dispatch(&self, action: Action) {
        (self.sink)(action.to_legacy())
    }
}

/// Pairs the creators with the dispatcher so lifecycle code can emit in one
/// call.
#[derive(Clone)]
pub struct DispatchHandle {
    actions: FormActions,
    dispatcher: Arc<dyn Dispatcher>,
}

impl DispatchHandle {
    pub fn new(actions: FormActions, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            actions,
            dispatcher,
        }
    }

    pub fn actions(&self) -> &FormActions {
        &self.actions
    }

    pub fn emit(&self, kind: ActionKind, payload: Value) {
        let action = self.actions.creator(kind).create(payload);
        tracing::debug!(
            action_type = %action.action_type,
            action_id = %action.meta.id,
            "dispatching form action"
        );
        self.dispatcher.dispatch(action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::SequentialIds;

    fn actions() -> FormActions {
        FormActions::with_ids("Person", Arc::new(SequentialIds::new()))
    }

    #[test]
    fn action_types_are_namespaced() {
        let actions = actions();
        let types = actions
            .iter()
            .map(|creator| creator.type_name().to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            types,
            vec![
                "Person/changed",
                "Person/focused",
                "Person/blurred",
                "Person/saved",
                "Person/canceled",
                "Person/validationFailed",
            ]
        );
    }

    #[test]
    fn primary_shape_carries_meta() {
        let action = actions().saved().create(json!({"name": "Josh"}));
        assert_eq!(
            action.to_value(),
            json!({
                "type": "Person/saved",
                "payload": {"name": "Josh"},
                "meta": {"id": "1", "namespace": "Person", "name": "saved"},
            })
        );
        assert_eq!(
            serde_json::to_value(&action).expect("serialize action"),
            action.to_value()
        );
    }

    #[test]
    fn legacy_shape_mirrors_type_and_payload() {
        let action = actions().focused().create(json!("name"));
        assert_eq!(
            action.to_legacy(),
            json!({
                "type": "Person/focused",
                "action": "Person/focused",
                "payload": "name",
                "data": "name",
            })
        );
    }

    #[test]
    fn every_creation_gets_a_fresh_id() {
        let actions = actions();
        let first = actions.changed().create(Value::Null);
        let second = actions.changed().create(Value::Null);
        assert_ne!(first.meta.id, second.meta.id);
        assert_eq!(first.action_type, second.action_type);
    }

    #[test]
    fn legacy_dispatcher_converts_before_forwarding() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let dispatcher = LegacyDispatcher::new(move |value: Value| {
            sink.lock().expect("sink lock").push(value);
        });
        let handle = DispatchHandle::new(actions(), Arc::new(dispatcher));
        handle.emit(ActionKind::Canceled, json!({}));
        let seen = seen.lock().expect("sink lock");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["action"], json!("Person/canceled"));
    }
}
