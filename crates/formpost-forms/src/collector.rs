//! Field collection
//!
//! Walks a [`FormDocument`] in document order and produces the snapshot every
//! later stage works from.

use crate::document::{FormDocument, FormElement, InputKind};
use formpost_core::{FieldValue, FormSnapshot};
use indexmap::IndexSet;

/// Result of collecting a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collected {
	pub snapshot: FormSnapshot,
	/// Names of fields not marked required.
	pub optional: IndexSet<String>,
}

impl Collected {
	pub fn is_optional(&self, name: &str) -> bool {
		self.optional.contains(name)
	}
}

/// Collect field values and optional field names from `form`.
///
/// - checked checkboxes sharing a name merge into a list; a single checked
///   box stays a scalar
/// - a radio group stores its checked value, or nothing
/// - every other input stores its trimmed value
/// - unnamed inputs are skipped
///
/// # Examples
///
/// ```
/// use formpost_forms::{collect, FormDocument, FormElement};
///
/// let form = FormDocument::new()
///     .with(FormElement::text("name").with_value("  Ada ").required())
///     .with(FormElement::checkbox("topics", "a").checked())
///     .with(FormElement::checkbox("topics", "b").checked());
///
/// let collected = collect(&form);
/// assert_eq!(collected.snapshot.get_str("name"), Some("Ada"));
/// assert_eq!(
///     collected.snapshot.get("topics").and_then(|v| v.as_list()),
///     Some(&["a".to_string(), "b".to_string()][..])
/// );
/// assert!(collected.is_optional("topics"));
/// ```
pub fn collect(form: &FormDocument) -> Collected {
	collect_elements(form.elements())
}

/// Collect from an arbitrary sequence of elements in order.
pub fn collect_elements<'a, I>(elements: I) -> Collected
where
	I: IntoIterator<Item = &'a FormElement>,
{
	let mut collected = Collected::default();
	let mut lists: Vec<String> = Vec::new();

	for element in elements {
		let Some(name) = element.field_name() else {
			continue;
		};
		if !element.required {
			collected.optional.insert(name.to_string());
		}

		match element.kind {
			InputKind::Checkbox => {
				if !element.checked {
					continue;
				}
				match collected.snapshot.get_mut(name) {
					Some(FieldValue::List(items)) => items.push(element.value.clone()),
					_ => {
						collected
							.snapshot
							.insert(name, vec![element.value.clone()]);
						lists.push(name.to_string());
					}
				}
			}
			InputKind::Radio => {
				if element.checked {
					collected.snapshot.insert(name, element.value.clone());
				}
			}
			_ => {
				collected.snapshot.insert(name, element.value.trim());
			}
		}
	}

	for name in lists {
		if let Some(value) = collected.snapshot.get_mut(&name) {
			*value = std::mem::replace(value, FieldValue::List(Vec::new())).simplify();
		}
	}

	tracing::debug!(fields = collected.snapshot.len(), "collected form fields");
	collected
}
