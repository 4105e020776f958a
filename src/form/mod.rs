mod actions;
mod binding;
mod config;
mod controller;
mod lifecycle;
mod normalize;
mod store;
mod validation;


pub use actions::{
    Action, ActionCreator, ActionKind, ActionMeta, DispatchHandle, Dispatcher, FormActions,
    LegacyDispatcher, action_type,
};
pub use binding::{EventHook, FieldEvent, FieldEventKind, FieldHandler, FieldProps, InputEvent};
pub use config::FormConfig;
pub use controller::{
    DEFAULT_KEY_ATTRIBUTE, FieldDecl, FieldKey, FieldKind, FormController, FormError, FormModel,
    FormOptions, FormResult, FormState, HostError,
};
pub use fluxform_derive::FormModel;
pub use lifecycle::{SavePhase, SaveStrategy, SaveTicket, StandardSave};
pub use normalize::{NormalizeStrategy, OutputNormalization, OutputNormalizer};
pub use store::RecordingDispatcher;
pub use validation::{
    BoxedValidationFuture, FieldFailure, FieldOutcome, FieldSelection, FieldValidation,
    FieldValidator, FieldValues, FutureValidator, SyncValidator, Validation, ValidationContext,
    ValidationOutput, ValidationReport, ValidationRequest, ValidationStrategy, future, sync,
};
