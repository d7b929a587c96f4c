//! Form model, collection and validation for formpost
//!
//! This crate provides:
//! - An in-memory form document with inputs, checkbox and radio groups, file
//!   inputs and a submit control
//! - Field collection into a [`FormSnapshot`](formpost_core::FormSnapshot)
//! - First-failure required-field validation with humanized labels
//! - Dynamic field pools with index recycling and trigger binding
//! - Extraction of sequentially numbered fields

pub mod collector;
pub mod document;
pub mod dynamic;
pub mod numbered;
pub mod validator;

pub use collector::{Collected, collect, collect_elements};
pub use document::{FormDocument, FormElement, FormNode, InputKind, SelectedFile, SubmitControl};
pub use dynamic::{DEFAULT_MAX_FIELDS, DynamicFieldPool, FieldFragment};
pub use numbered::{NumberedField, collect_numbered, format_numbered, heading_blocks};
pub use validator::{Validator, humanize};
