//! HTTP endpoint for form submissions.

pub use formpost_server::*;
