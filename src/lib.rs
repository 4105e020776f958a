//! Form state bound to a Flux-style dispatcher.
//!
//! A [`form::FormController`] owns a mutable record of field values, reports
//! every change, focus, blur, save and cancel to an external store as an
//! [`form::Action`], and validates all fields concurrently before saving.

pub mod form;
pub mod id;
pub mod prelude;

#[cfg(test)]
mod test_public_api;
