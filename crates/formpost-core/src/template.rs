//! `%token%` placeholder substitution
//!
//! Tokens are ASCII letters, digits, `_` and `-` between two percent signs
//! (`%person-first-name%`). [`render`] leaves tokens without data verbatim;
//! callers that need a different policy for unresolved tokens (the email
//! renderer substitutes a sentinel) go through [`render_with`].

use crate::snapshot::{FieldValue, FormSnapshot};
use indexmap::IndexMap;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

static PLACEHOLDER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"%([A-Za-z0-9_-]+)%").expect("PLACEHOLDER_REGEX: invalid regex pattern")
});

/// Anything that can resolve a placeholder token to a string.
pub trait PlaceholderSource {
	fn lookup(&self, token: &str) -> Option<String>;
}

impl PlaceholderSource for FormSnapshot {
	/// Lists are joined with `,`, matching how the browser stringifies arrays.
	fn lookup(&self, token: &str) -> Option<String> {
		self.get(token).map(|value| value.join(","))
	}
}

impl PlaceholderSource for HashMap<String, String> {
	fn lookup(&self, token: &str) -> Option<String> {
		self.get(token).cloned()
	}
}

impl PlaceholderSource for IndexMap<String, String> {
	fn lookup(&self, token: &str) -> Option<String> {
		self.get(token).cloned()
	}
}

impl PlaceholderSource for IndexMap<String, FieldValue> {
	fn lookup(&self, token: &str) -> Option<String> {
		self.get(token).map(|value| value.join(","))
	}
}

impl<T: PlaceholderSource + ?Sized> PlaceholderSource for &T {
	fn lookup(&self, token: &str) -> Option<String> {
		(**self).lookup(token)
	}
}

/// Replace every `%token%` with its value, leaving unknown tokens untouched.
///
/// # Examples
///
/// ```
/// use formpost_core::template::render;
/// use std::collections::HashMap;
///
/// let mut data = HashMap::new();
/// data.insert("field".to_string(), "Email".to_string());
///
/// assert_eq!(render("%field% is required!", &data), "Email is required!");
/// assert_eq!(render("%other% stays", &data), "%other% stays");
/// ```
pub fn render<S: PlaceholderSource + ?Sized>(template: &str, data: &S) -> String {
	render_with(template, |token| data.lookup(token))
}

/// Replace every `%token%` using `resolve`; `None` keeps the token verbatim.
pub fn render_with<F>(template: &str, mut resolve: F) -> String
where
	F: FnMut(&str) -> Option<String>,
{
	PLACEHOLDER_REGEX
		.replace_all(template, |caps: &Captures<'_>| {
			resolve(&caps[1]).unwrap_or_else(|| caps[0].to_string())
		})
		.into_owned()
}

/// Token names referenced by a template, in order of appearance.
///
/// # Examples
///
/// ```
/// use formpost_core::template::placeholders;
///
/// assert_eq!(placeholders("Hi %first-name% %last_name%"), vec!["first-name", "last_name"]);
/// ```
pub fn placeholders(template: &str) -> Vec<&str> {
	PLACEHOLDER_REGEX
		.captures_iter(template)
		.filter_map(|caps| caps.get(1).map(|m| m.as_str()))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rstest::rstest;

	#[rstest]
	fn test_render_snapshot_joins_lists_with_comma() {
		// Arrange
		let snapshot = FormSnapshot::new().with("workshops", vec!["a", "b"]);

		// Act
		let rendered = render("Workshops: %workshops%", &snapshot);

		// Assert
		assert_eq!(rendered, "Workshops: a,b");
	}

	#[rstest]
	#[case("%%", "%%")]
	#[case("100% sure", "100% sure")]
	#[case("%a b%", "%a b%")]
	#[case("%name%%name%", "AdaAda")]
	#[case("<strong>%name%</strong>", "<strong>Ada</strong>")]
	fn test_render_edge_cases(#[case] template: &str, #[case] expected: &str) {
		// Arrange
		let snapshot = FormSnapshot::new().with("name", "Ada");

		// Act / Assert
		assert_eq!(render(template, &snapshot), expected);
	}

	#[rstest]
	#[case("%nome-é%", "%nome-é%")]
	#[case("%ñ%", "%ñ%")]
	#[case("%person_first-name1%", "ok")]
	fn test_tokens_are_ascii_only(#[case] template: &str, #[case] expected: &str) {
		// Arrange
		let snapshot = FormSnapshot::new()
			.with("nome-é", "x")
			.with("ñ", "x")
			.with("person_first-name1", "ok");

		// Act
		let rendered = render(template, &snapshot);

		// Assert
		assert_eq!(rendered, expected);
	}

	#[rstest]
	fn test_render_with_custom_policy() {
		// Act
		let rendered = render_with("%known% and %unknown%", |token| {
			Some(if token == "known" { "yes".into() } else { "[none]".into() })
		});

		// Assert
		assert_eq!(rendered, "yes and [none]");
	}

	proptest! {
		#[test]
		fn prop_render_is_idempotent_for_plain_values(
			value in "[a-zA-Z0-9 ]{0,20}",
			prefix in "[a-z ]{0,10}",
		) {
			let snapshot = FormSnapshot::new().with("token", value);
			let template = format!("{prefix}%token% and %missing%");

			let once = render(&template, &snapshot);
			let twice = render(&once, &snapshot);

			prop_assert_eq!(once, twice);
		}
	}
}
