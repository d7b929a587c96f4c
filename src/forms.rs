//! Form model, field collection and required-field validation.

pub use formpost_forms::*;
