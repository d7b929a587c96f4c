//! # formpost-core
//!
//! Shared building blocks for the formpost submission pipeline.
//!
//! - [`FormSnapshot`] and [`FieldValue`]: the flat, insertion-ordered
//!   name→value mapping collected from a form at submission time
//! - [`template`]: `%token%` placeholder substitution, tolerant of missing keys
//! - [`html`]: escaping, newline conversion and tag stripping used when
//!   rendering outgoing email
//! - [`exception`]: the error taxonomy shared by the client and server sides
//!
//! ## Example
//!
//! ```
//! use formpost_core::{FormSnapshot, template};
//!
//! let mut snapshot = FormSnapshot::new();
//! snapshot.insert("person-first-name", "Ada");
//!
//! let rendered = template::render("Thanks, %person-first-name%! (%missing%)", &snapshot);
//! assert_eq!(rendered, "Thanks, Ada! (%missing%)");
//! ```

pub mod exception;
pub mod html;
pub mod snapshot;
pub mod template;

pub use exception::{Error, Result, ValidationError};
pub use snapshot::{FieldValue, FormSnapshot, REFERRER_FIELD};
pub use template::PlaceholderSource;
