use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use super::binding::{EventHooks, FieldEvent};
use super::controller::{FieldDecl, FieldKey, FormModel, FormOptions, FormState};
use super::lifecycle::{SaveStrategy, StandardSave};
use super::normalize::{NormalizeStrategy, OutputNormalization, OutputNormalizer};
use super::validation::{FieldValidation, FieldValidator, ValidationStrategy};
use crate::id::{ActionIdGenerator, TokenIds};

/// Everything a [`FormController`](super::FormController) is built from
/// besides its namespace and dispatcher.
#[derive(Default)]
pub struct FormConfig {
    options: FormOptions,
    fields: Vec<FieldDecl>,
    state: FormState,
    validators: BTreeMap<FieldKey, Arc<dyn FieldValidator>>,
    outputs: BTreeMap<FieldKey, Arc<dyn OutputNormalizer>>,
    validation: Option<Arc<dyn ValidationStrategy>>,
    normalization: Option<Arc<dyn NormalizeStrategy>>,
    saving: Option<Arc<dyn SaveStrategy>>,
    hooks: EventHooks,
    ids: Option<Arc<dyn ActionIdGenerator>>,
}

pub(super) struct FormParts {
    pub(super) options: FormOptions,
    pub(super) fields: Vec<FieldDecl>,
    pub(super) state: FormState,
    pub(super) validation: Arc<dyn ValidationStrategy>,
    pub(super) normalization: Arc<dyn NormalizeStrategy>,
    pub(super) saving: Arc<dyn SaveStrategy>,
    pub(super) hooks: EventHooks,
    pub(super) ids: Arc<dyn ActionIdGenerator>,
}

impl FormConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    pub fn field(mut self, key: impl Into<FieldKey>) -> Self {
        self.fields.push(FieldDecl::scalar(key));
        self
    }

    pub fn composite_field(mut self, key: impl Into<FieldKey>) -> Self {
        self.fields.push(FieldDecl::composite(key));
        self
    }

    /// Declares the fields of a `#[derive(FormModel)]` struct.
    pub fn fields_from<M: FormModel>(mut self) -> Self {
        self.fields.extend(M::declarations());
        self
    }

    pub fn state(mut self, state: FormState) -> Self {
        self.state = state;
        self
    }

    pub fn value(mut self, key: impl Into<FieldKey>, value: Value) -> Self {
        self.state.insert(key, value);
        self
    }

    pub fn validator<V>(mut self, key: impl Into<FieldKey>, validator: V) -> Self
    where
        V: FieldValidator,
    {
        self.validators.insert(key.into(), Arc::new(validator));
        self
    }

    pub fn output<N>(mut self, key: impl Into<FieldKey>, normalizer: N) -> Self
    where
        N: OutputNormalizer,
    {
        self.outputs.insert(key.into(), Arc::new(normalizer));
        self
    }

    /// Replaces the per-field engine entirely; registered validators are
    /// then unused.
    pub fn validation_strategy<S>(mut self, strategy: S) -> Self
    where
        S: ValidationStrategy,
    {
        self.validation = Some(Arc::new(strategy));
        self
    }

    pub fn normalize_strategy<S>(mut self, strategy: S) -> Self
    where
        S: NormalizeStrategy,
    {
        self.normalization = Some(Arc::new(strategy));
        self
    }

    pub fn save_strategy<S>(mut self, strategy: S) -> Self
    where
        S: SaveStrategy,
    {
        self.saving = Some(Arc::new(strategy));
        self
    }

    pub fn on_change(
        mut self,
        hook: impl Fn(&FieldKey, &dyn FieldEvent) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_change = Some(Arc::new(hook));
        self
    }

    pub fn on_focus(
        mut self,
        hook: impl Fn(&FieldKey, &dyn FieldEvent) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_focus = Some(Arc::new(hook));
        self
    }

    pub fn on_blur(mut self, hook: impl Fn(&FieldKey, &dyn FieldEvent) + Send + Sync + 'static) -> Self {
        self.hooks.on_blur = Some(Arc::new(hook));
        self
    }

    pub fn id_generator<G>(mut self, ids: G) -> Self
    where
        G: ActionIdGenerator,
    {
        self.ids = Some(Arc::new(ids));
        self
    }

    pub(super) fn into_parts(self) -> FormParts {
        // Without a declared field list the validated keys are the fields.
        let fields = if self.fields.is_empty() {
            self.validators.keys().cloned().map(FieldDecl::scalar).collect()
        } else {
            self.fields
        };

        FormParts {
            options: self.options,
            fields,
            state: self.state,
            validation: self
                .validation
                .unwrap_or_else(|| Arc::new(FieldValidation::new(self.validators))),
            normalization: self
                .normalization
                .unwrap_or_else(|| Arc::new(OutputNormalization::new(self.outputs))),
            saving: self.saving.unwrap_or_else(|| Arc::new(StandardSave)),
            hooks: self.hooks,
            ids: self.ids.unwrap_or_else(|| Arc::new(TokenIds::new())),
        }
    }
}
