pub use crate::form::{
    Action, ActionKind, Dispatcher, FieldEvent, FieldFailure, FieldKey, FieldKind, FieldSelection,
    FieldValidator, FormConfig, FormController, FormError, FormModel, FormResult, FormState,
    InputEvent, RecordingDispatcher, Validation, ValidationContext, ValidationReport,
};
pub use crate::id::{ActionIdGenerator, SequentialIds, TokenIds};
