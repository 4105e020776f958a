use serde_json::json;

#[test]
fn prelude_builds_a_working_form() {
    use crate::prelude::*;

    let dispatcher = RecordingDispatcher::new();
    let form = FormController::new(
        "Profile",
        dispatcher.clone(),
        FormConfig::new()
            .field("email")
            .id_generator(SequentialIds::new()),
    );
    form.handle_change(&InputEvent::keyed("email").with_value(json!("a@b.c")));

    assert_eq!(form.state().get("email"), Some(&json!("a@b.c")));
    assert_eq!(dispatcher.count(ActionKind::Changed), 1);
}

#[test]
fn form_facade_exports_core_types() {
    let _ = crate::form::FormOptions::default();
    let _ = crate::form::FieldSelection::default();
    let _ = crate::form::SavePhase::default();
    let _ = crate::form::StandardSave;
    let _ = crate::form::OutputNormalization::default();
    let _ = crate::form::FieldValidation::default();
    assert_eq!(crate::form::DEFAULT_KEY_ATTRIBUTE, "data-flux-key");
    assert_eq!(
        crate::form::action_type("Profile", crate::form::ActionKind::ValidationFailed),
        "Profile/validationFailed"
    );
}
