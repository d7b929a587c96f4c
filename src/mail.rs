//! Mail composition, backends and upload validation.

pub use formpost_mail::*;
