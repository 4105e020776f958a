use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use serde::Serialize;
use serde_json::{Value, json};

use super::actions::{ActionKind, DispatchHandle};
use super::controller::{FieldKey, FormController, FormError, FormResult, FormState, read_lock};

/// Why one field was rejected.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct FieldFailure {
    message: String,
}

impl FieldFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn missing() -> Self {
        Self::new("required field missing")
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "validator panicked".to_string()
        };
        Self::new(detail)
    }
}

pub type ValidationOutput = Result<Value, FieldFailure>;
pub type BoxedValidationFuture = BoxFuture<'static, ValidationOutput>;

/// What a validator hands back: a settled outcome or one still pending.
pub enum Validation {
    Ready(ValidationOutput),
    Pending(BoxedValidationFuture),
}

impl Validation {
    pub fn valid(value: Value) -> Self {
        Self::Ready(Ok(value))
    }

    pub fn invalid(failure: FieldFailure) -> Self {
        Self::Ready(Err(failure))
    }

    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = ValidationOutput> + Send + 'static,
    {
        Self::Pending(future.boxed())
    }
}

impl From<ValidationOutput> for Validation {
    fn from(output: ValidationOutput) -> Self {
        Self::Ready(output)
    }
}

#[derive(Clone, Copy)]
pub struct ValidationContext<'a> {
    state: &'a FormState,
    key: &'a FieldKey,
    namespace: &'a str,
}

impl<'a> ValidationContext<'a> {
    pub fn new(state: &'a FormState, key: &'a FieldKey, namespace: &'a str) -> Self {
        Self {
            state,
            key,
            namespace,
        }
    }

    pub fn state(&self) -> &'a FormState {
        self.state
    }

    pub fn key(&self) -> &'a FieldKey {
        self.key
    }

    pub fn namespace(&self) -> &'a str {
        self.namespace
    }

    /// The field's value, `null` when absent from state.
    pub fn value(&self) -> &'a Value {
        self.state.value(self.key.as_str())
    }
}

pub trait FieldValidator: Send + Sync + 'static {
    fn validate(&self, cx: ValidationContext<'_>) -> Validation;
}

impl<F> FieldValidator for F
where
    F: Fn(ValidationContext<'_>) -> Validation + Send + Sync + 'static,
{
    fn validate(&self, cx: ValidationContext<'_>) -> Validation {
        (self)(cx)
    }
}

pub struct SyncValidator<F>(F);

impl<F> FieldValidator for SyncValidator<F>
where
    F: Fn(ValidationContext<'_>) -> ValidationOutput + Send + Sync + 'static,
{
    fn validate(&self, cx: ValidationContext<'_>) -> Validation {
        Validation::Ready((self.0)(cx))
    }
}

pub struct FutureValidator<F>(F);

impl<F, Fut> FieldValidator for FutureValidator<F>
where
    F: Fn(ValidationContext<'_>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ValidationOutput> + Send + 'static,
{
    fn validate(&self, cx: ValidationContext<'_>) -> Validation {
        Validation::pending((self.0)(cx))
    }
}

/// A validator that settles immediately.
pub fn sync<F>(validator: F) -> SyncValidator<F>
where
    F: Fn(ValidationContext<'_>) -> ValidationOutput + Send + Sync + 'static,
{
    SyncValidator(validator)
}

/// A validator that settles later. The returned future must own what it reads.
pub fn future<F, Fut>(validator: F) -> FutureValidator<F>
where
    F: Fn(ValidationContext<'_>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ValidationOutput> + Send + 'static,
{
    FutureValidator(validator)
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum FieldSelection {
    #[default]
    All,
    Only(Vec<FieldKey>),
}

impl FieldSelection {
    pub fn only<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<FieldKey>,
    {
        Self::Only(keys.into_iter().map(Into::into).collect())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOutcome {
    Valid(Value),
    Invalid(FieldFailure),
}

impl FieldOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, FieldOutcome::Valid(_))
    }

    pub fn failure(&self) -> Option<&FieldFailure> {
        match self {
            FieldOutcome::Invalid(failure) => Some(failure),
            FieldOutcome::Valid(_) => None,
        }
    }
}

pub type FieldValues = BTreeMap<FieldKey, Value>;

/// Every validated key with its outcome, passing keys included.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationReport {
    outcomes: BTreeMap<FieldKey, FieldOutcome>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.outcomes.values().all(FieldOutcome::is_valid)
    }

    pub fn get(&self, key: &str) -> Option<&FieldOutcome> {
        self.outcomes.get(key)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &FieldOutcome)> {
        self.outcomes.iter()
    }

    pub fn failed_keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.outcomes
            .iter()
            .filter_map(|(key, outcome)| (!outcome.is_valid()).then_some(key))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&FieldKey, &FieldFailure)> {
        self.outcomes
            .iter()
            .filter_map(|(key, outcome)| outcome.failure().map(|failure| (key, failure)))
    }

    pub fn failed_summary(&self) -> String {
        self.failed_keys()
            .map(FieldKey::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The values of the passing keys.
    pub fn values(&self) -> FieldValues {
        self.outcomes
            .iter()
            .filter_map(|(key, outcome)| match outcome {
                FieldOutcome::Valid(value) => Some((key.clone(), value.clone())),
                FieldOutcome::Invalid(_) => None,
            })
            .collect()
    }

    pub fn into_values(self) -> Result<FieldValues, ValidationReport> {
        if !self.is_valid() {
            return Err(self);
        }
        Ok(self
            .outcomes
            .into_iter()
            .filter_map(|(key, outcome)| match outcome {
                FieldOutcome::Valid(value) => Some((key, value)),
                FieldOutcome::Invalid(_) => None,
            })
            .collect())
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.outcomes
                .iter()
                .map(|(key, outcome)| {
                    let entry = match outcome {
                        FieldOutcome::Valid(value) => json!({ "valid": value }),
                        FieldOutcome::Invalid(failure) => {
                            json!({ "invalid": { "message": failure.message() } })
                        }
                    };
                    (key.to_string(), entry)
                })
                .collect(),
        )
    }
}

impl FromIterator<(FieldKey, FieldOutcome)> for ValidationReport {
    fn from_iter<I: IntoIterator<Item = (FieldKey, FieldOutcome)>>(iter: I) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}

pub struct ValidationRequest {
    pub state: FormState,
    pub selection: FieldSelection,
    pub dispatch: DispatchHandle,
}

impl ValidationRequest {
    pub fn namespace(&self) -> &str {
        self.dispatch.actions().namespace()
    }
}

/// Produces the validation verdict for a form. [`FieldValidation`] is the
/// built-in per-field engine; hosts may substitute their own.
pub trait ValidationStrategy: Send + Sync + 'static {
    fn validate(&self, request: ValidationRequest) -> BoxFuture<'static, FormResult<FieldValues>>;
}

impl<F> ValidationStrategy for F
where
    F: Fn(ValidationRequest) -> BoxFuture<'static, FormResult<FieldValues>> + Send + Sync + 'static,
{
    fn validate(&self, request: ValidationRequest) -> BoxFuture<'static, FormResult<FieldValues>> {
        (self)(request)
    }
}

#[derive(Clone, Default)]
pub struct FieldValidation {
    validators: BTreeMap<FieldKey, Arc<dyn FieldValidator>>,
}

impl FieldValidation {
    pub fn new(validators: BTreeMap<FieldKey, Arc<dyn FieldValidator>>) -> Self {
        Self { validators }
    }

    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.validators.keys()
    }

    fn selected(&self, selection: &FieldSelection) -> Vec<(FieldKey, Arc<dyn FieldValidator>)> {
        match selection {
            FieldSelection::All => self
                .validators
                .iter()
                .map(|(key, validator)| (key.clone(), validator.clone()))
                .collect(),
            FieldSelection::Only(keys) => keys
                .iter()
                .filter_map(|key| {
                    self.validators
                        .get(key)
                        .map(|validator| (key.clone(), validator.clone()))
                })
                .collect(),
        }
    }
}

impl ValidationStrategy for FieldValidation {
    fn validate(&self, request: ValidationRequest) -> BoxFuture<'static, FormResult<FieldValues>> {
        let namespace = request.namespace().to_string();
        // Every validator is started before any is awaited.
        let pending = self
            .selected(&request.selection)
            .into_iter()
            .map(|(key, validator)| {
                let cx = ValidationContext::new(&request.state, &key, &namespace);
                let outcome = run_validator(validator.as_ref(), cx);
                async move {
                    let outcome = match outcome.await {
                        Ok(value) => FieldOutcome::Valid(value),
                        Err(failure) => FieldOutcome::Invalid(failure),
                    };
                    (key, outcome)
                }
            })
            .collect::<Vec<_>>();
        let dispatch = request.dispatch;

        async move {
            let report = join_all(pending).await.into_iter().collect::<ValidationReport>();
            match report.into_values() {
                Ok(values) => Ok(values),
                Err(report) => {
                    tracing::debug!(
                        namespace = %namespace,
                        failed = %report.failed_summary(),
                        "form validation failed"
                    );
                    dispatch.emit(ActionKind::ValidationFailed, report.to_value());
                    Err(FormError::Validation(report))
                }
            }
        }
        .boxed()
    }
}

/// Invokes one validator, folding panics into a [`FieldFailure`].
fn run_validator(validator: &dyn FieldValidator, cx: ValidationContext<'_>) -> BoxedValidationFuture {
    let key = cx.key().clone();
    match catch_unwind(AssertUnwindSafe(|| validator.validate(cx))) {
        Ok(Validation::Ready(output)) => futures::future::ready(output).boxed(),
        Ok(Validation::Pending(future)) => AssertUnwindSafe(future)
            .catch_unwind()
            .map(move |settled| {
                settled.unwrap_or_else(|payload| {
                    tracing::warn!(field = %key, "async validator panicked");
                    Err(FieldFailure::from_panic(payload))
                })
            })
            .boxed(),
        Err(payload) => {
            tracing::warn!(field = %key, "validator panicked");
            futures::future::ready(Err(FieldFailure::from_panic(payload))).boxed()
        }
    }
}

impl FormController {
    pub(super) fn validation_request(&self, selection: FieldSelection) -> ValidationRequest {
        ValidationRequest {
            state: read_lock(&self.state).clone(),
            selection,
            dispatch: self.dispatch.clone(),
        }
    }

    /// Runs every selected validator concurrently and waits for all of them.
    ///
    /// On failure a `validationFailed` action carrying the full report is
    /// dispatched and the report is returned as [`FormError::Validation`].
    /// Success dispatches nothing.
    pub async fn validate(&self, selection: FieldSelection) -> FormResult<FieldValues> {
        let request = self.validation_request(selection);
        self.validation.validate(request).await
    }

    pub async fn validate_with<C>(
        &self,
        selection: FieldSelection,
        callback: C,
    ) -> FormResult<FieldValues>
    where
        C: FnOnce(&FormResult<FieldValues>),
    {
        let result = self.validate(selection).await;
        callback(&result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_splits_values_and_failures() {
        let report = [
            (FieldKey::from("age"), FieldOutcome::Valid(json!(35))),
            (
                FieldKey::from("name"),
                FieldOutcome::Invalid(FieldFailure::missing()),
            ),
        ]
        .into_iter()
        .collect::<ValidationReport>();

        assert!(!report.is_valid());
        assert_eq!(report.failed_summary(), "name");
        assert_eq!(report.values().get("age"), Some(&json!(35)));
        assert_eq!(
            report.to_value(),
            json!({
                "age": {"valid": 35},
                "name": {"invalid": {"message": "required field missing"}},
            })
        );
        assert_eq!(
            serde_json::to_value(&report).expect("serialize report"),
            report.to_value()
        );
    }

    #[test]
    fn panicking_validator_becomes_failure() {
        let state = FormState::new();
        let key = FieldKey::from("name");
        let validator = sync(|_cx| -> ValidationOutput { panic!("boom") });
        let outcome = futures::executor::block_on(run_validator(
            &validator,
            ValidationContext::new(&state, &key, "Person"),
        ));
        assert_eq!(outcome, Err(FieldFailure::new("boom")));
    }

    #[test]
    fn only_selection_skips_unregistered_keys() {
        let mut validators = BTreeMap::<FieldKey, Arc<dyn FieldValidator>>::new();
        validators.insert(
            "name".into(),
            Arc::new(sync(|cx| Ok(cx.value().clone()))),
        );
        let engine = FieldValidation::new(validators);
        let selected = engine.selected(&FieldSelection::only(["name", "ghost"]));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].0.as_str(), "name");
    }
}
