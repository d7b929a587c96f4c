//! Submission dispatch, status alerts and endpoint bootstrap.

pub use formpost_client::*;
