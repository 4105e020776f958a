use fluxform::form::{FieldKind, FormModel};

#[allow(dead_code)]
#[derive(fluxform::form::FormModel)]
struct DemoForm {
    email: String,
    age: u32,
}

fn main() {
    let fields = DemoForm::fields();
    assert_eq!(fields.email().as_str(), "email");
    assert_eq!(fields.age().as_str(), "age");

    let declarations = DemoForm::declarations();
    assert_eq!(declarations.len(), 2);
    assert!(declarations.iter().all(|decl| decl.kind == FieldKind::Scalar));
}
