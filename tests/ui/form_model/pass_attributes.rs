use fluxform::form::{FieldDecl, FormConfig, FormController, FormModel, RecordingDispatcher};

#[allow(dead_code)]
struct Stats {
    height: u32,
    weight: u32,
}

#[allow(dead_code)]
#[derive(fluxform::form::FormModel)]
struct Person {
    name: String,
    #[form(composite)]
    stats: Stats,
    #[form(rename = "years")]
    age: u32,
}

fn main() {
    assert_eq!(Person::fields().age().as_str(), "years");
    assert_eq!(
        Person::declarations(),
        vec![
            FieldDecl::scalar("name"),
            FieldDecl::composite("stats"),
            FieldDecl::scalar("years"),
        ]
    );

    let form = FormController::new(
        "Person",
        RecordingDispatcher::new(),
        FormConfig::new().fields_from::<Person>(),
    );
    assert_eq!(form.declared_fields().len(), 3);
    assert!(form.field_prop("stats").and_then(|props| props.value).is_none());
}
