//! Advisory validation of a finished map.
//!
//! Findings are returned as data, never as errors.

mod diagnostic;
mod validator;

pub use diagnostic::{Diagnostic, Severity};
pub use validator::{validate, Validator};
