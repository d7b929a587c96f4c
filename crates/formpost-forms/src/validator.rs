//! Required-field validation

use crate::collector::Collected;
use formpost_core::{FormSnapshot, ValidationError};
use indexmap::IndexSet;

/// Turn a field name into a label.
///
/// Hyphens, underscores and lower-to-upper camel boundaries split tokens;
/// each token is capitalized.
///
/// # Examples
///
/// ```
/// use formpost_forms::humanize;
///
/// assert_eq!(humanize("email"), "Email");
/// assert_eq!(humanize("person-first-name"), "Person First Name");
/// assert_eq!(humanize("firstName"), "First Name");
/// assert_eq!(humanize("abstract_title"), "Abstract Title");
/// ```
pub fn humanize(name: &str) -> String {
	let mut tokens: Vec<String> = Vec::new();
	let mut current = String::new();
	let mut prev_lower = false;

	for ch in name.chars() {
		if ch == '-' || ch == '_' || ch.is_whitespace() {
			if !current.is_empty() {
				tokens.push(std::mem::take(&mut current));
			}
			prev_lower = false;
			continue;
		}
		if ch.is_uppercase() && prev_lower && !current.is_empty() {
			tokens.push(std::mem::take(&mut current));
		}
		prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
		current.push(ch);
	}
	if !current.is_empty() {
		tokens.push(current);
	}

	tokens
		.iter()
		.map(|token| {
			let mut chars = token.chars();
			match chars.next() {
				Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
				None => String::new(),
			}
		})
		.collect::<Vec<_>>()
		.join(" ")
}

/// Validates that required fields are not empty.
#[derive(Debug, Clone, Default)]
pub struct Validator {
	message_template: Option<String>,
}

impl Validator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Use a custom message; the first `%field%` is replaced by the label.
	pub fn with_message(mut self, template: impl Into<String>) -> Self {
		self.message_template = Some(template.into());
		self
	}

	/// Check a collected form.
	pub fn validate(&self, collected: &Collected) -> Result<(), ValidationError> {
		self.validate_snapshot(&collected.snapshot, &collected.optional)
	}

	/// Fail on the first non-optional field holding `""` or `[]`.
	///
	/// # Examples
	///
	/// ```
	/// use formpost_core::FormSnapshot;
	/// use formpost_forms::Validator;
	/// use indexmap::IndexSet;
	///
	/// let snapshot = FormSnapshot::new().with("name", "Ada").with("email", "");
	/// let err = Validator::new()
	///     .validate_snapshot(&snapshot, &IndexSet::new())
	///     .unwrap_err();
	/// assert_eq!(err.message, "Email is required!");
	/// ```
	pub fn validate_snapshot(
		&self,
		snapshot: &FormSnapshot,
		optional: &IndexSet<String>,
	) -> Result<(), ValidationError> {
		let Some((field, _)) = snapshot
			.iter()
			.find(|(name, value)| !optional.contains(*name) && value.is_empty())
		else {
			return Ok(());
		};

		let label = humanize(field);
		let message = match &self.message_template {
			Some(template) => template.replacen("%field%", &label, 1),
			None => format!("{label} is required!"),
		};
		tracing::warn!(field = %field, "required field is empty");
		Err(ValidationError {
			field: field.to_string(),
			label,
			message,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use formpost_core::FieldValue;
	use rstest::rstest;

	#[rstest]
	#[case("personFirstName", "Person First Name")]
	#[case("URL", "URL")]
	#[case("phone2", "Phone2")]
	#[case("--odd--name", "Odd Name")]
	#[case("", "")]
	fn test_humanize(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(humanize(input), expected);
	}

	#[rstest]
	fn test_reports_first_failure_in_order() {
		// Arrange
		let snapshot = FormSnapshot::new()
			.with("first", "")
			.with("second", FieldValue::List(vec![]));

		// Act
		let err = Validator::new()
			.validate_snapshot(&snapshot, &IndexSet::new())
			.unwrap_err();

		// Assert
		assert_eq!(err.field, "first");
	}

	#[rstest]
	fn test_optional_fields_are_skipped() {
		// Arrange
		let snapshot = FormSnapshot::new().with("notes", "").with("topics", FieldValue::List(vec![]));
		let optional: IndexSet<String> = ["notes".to_string()].into_iter().collect();

		// Act
		let err = Validator::new()
			.validate_snapshot(&snapshot, &optional)
			.unwrap_err();

		// Assert
		assert_eq!(err.message, "Topics is required!");
	}

	#[rstest]
	fn test_custom_template_replaces_first_occurrence() {
		// Arrange
		let validator = Validator::new().with_message("Please fill %field% (%field%)");
		let snapshot = FormSnapshot::new().with("person-email", "");

		// Act
		let err = validator
			.validate_snapshot(&snapshot, &IndexSet::new())
			.unwrap_err();

		// Assert
		assert_eq!(err.message, "Please fill Person Email (%field%)");
		assert_eq!(err.label, "Person Email");
	}

	#[rstest]
	fn test_non_empty_values_pass() {
		let snapshot = FormSnapshot::new().with("a", "x").with("b", vec!["y"]);
		assert!(Validator::new()
			.validate_snapshot(&snapshot, &IndexSet::new())
			.is_ok());
	}
}
