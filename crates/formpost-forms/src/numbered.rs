//! Sequentially numbered fields
//!
//! Dynamic field groups submit their members as `<base>1`, `<base>2`, ...
//! These helpers gather them back in numeric order.

use formpost_core::html::escape;
use formpost_core::{FieldValue, FormSnapshot};

/// A numbered field found in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedField {
	pub number: u64,
	pub value: FieldValue,
}

/// Fields named `<base><digits>`, ordered by number. Values are unescaped.
///
/// # Examples
///
/// ```
/// use formpost_core::FormSnapshot;
/// use formpost_forms::numbered::collect_numbered;
///
/// let snapshot = FormSnapshot::new()
///     .with("abstract-author10", "Ten")
///     .with("abstract-author2", "Two")
///     .with("abstract-author", "none")
///     .with("abstract-authorX", "none");
///
/// let numbers: Vec<u64> = collect_numbered(&snapshot, "abstract-author")
///     .into_iter()
///     .map(|f| f.number)
///     .collect();
/// assert_eq!(numbers, vec![2, 10]);
/// ```
pub fn collect_numbered(snapshot: &FormSnapshot, base: &str) -> Vec<NumberedField> {
	let mut fields: Vec<NumberedField> = snapshot
		.iter()
		.filter_map(|(key, value)| {
			let digits = key.strip_prefix(base)?;
			if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
				return None;
			}
			let number = digits.parse().ok()?;
			Some(NumberedField {
				number,
				value: value.clone(),
			})
		})
		.collect();
	fields.sort_by_key(|f| f.number);
	fields
}

/// HTML-escaped values of the numbered fields, lists joined with `, `.
pub fn numbered_values(snapshot: &FormSnapshot, base: &str) -> Vec<String> {
	collect_numbered(snapshot, base)
		.iter()
		.map(|f| escape_value(&f.value))
		.collect()
}

/// Render each numbered field through `format` and join the lines with `\n`.
///
/// `%n%` is the field number and `%value%` its escaped value.
///
/// # Examples
///
/// ```
/// use formpost_core::FormSnapshot;
/// use formpost_forms::numbered::format_numbered;
///
/// let snapshot = FormSnapshot::new()
///     .with("author2", "Grace")
///     .with("author1", "Ada <Lovelace>");
///
/// assert_eq!(
///     format_numbered(&snapshot, "author", "<li>%n%. %value%</li>"),
///     "<li>1. Ada &lt;Lovelace&gt;</li>\n<li>2. Grace</li>"
/// );
/// ```
pub fn format_numbered(snapshot: &FormSnapshot, base: &str, format: &str) -> String {
	collect_numbered(snapshot, base)
		.iter()
		.map(|f| {
			format
				.replace("%n%", &f.number.to_string())
				.replace("%value%", &escape_value(&f.value))
		})
		.collect::<Vec<_>>()
		.join("\n")
}

/// One `<p><strong>{heading} N</strong><br>value</p>` block per numbered
/// field, numbered by position starting at 1.
///
/// # Examples
///
/// ```
/// use formpost_core::FormSnapshot;
/// use formpost_forms::numbered::heading_blocks;
///
/// let snapshot = FormSnapshot::new()
///     .with("abstract-author3", "Grace")
///     .with("abstract-author1", "Ada & co");
///
/// assert_eq!(
///     heading_blocks(&snapshot, "abstract-author", "Author"),
///     "<p><strong>Author 1</strong><br>Ada &amp; co</p>\
///      <p><strong>Author 2</strong><br>Grace</p>"
/// );
/// ```
pub fn heading_blocks(snapshot: &FormSnapshot, base: &str, heading: &str) -> String {
	numbered_values(snapshot, base)
		.iter()
		.enumerate()
		.map(|(i, value)| format!("<p><strong>{heading} {}</strong><br>{value}</p>", i + 1))
		.collect()
}

fn escape_value(value: &FieldValue) -> String {
	match value {
		FieldValue::Scalar(s) => escape(s),
		FieldValue::List(items) => items
			.iter()
			.map(|item| escape(item))
			.collect::<Vec<_>>()
			.join(", "),
	}
}
