//! Form snapshot types
//!
//! A [`FormSnapshot`] is what the collector produces and what every later
//! stage (validation, dispatch, email rendering) consumes. Iteration order is
//! insertion order, which keeps "first failing field" deterministic.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Name of the field carrying the page the submission came from.
pub const REFERRER_FIELD: &str = "_referrer";

/// Value of a single snapshot entry.
///
/// Multi-checkbox groups produce a [`FieldValue::List`]; everything else,
/// including a checkbox group with exactly one checked box, is a
/// [`FieldValue::Scalar`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
	Scalar(String),
	List(Vec<String>),
}

impl FieldValue {
	/// Returns `true` for `""` and `[]`.
	///
	/// # Examples
	///
	/// ```
	/// use formpost_core::FieldValue;
	///
	/// assert!(FieldValue::from("").is_empty());
	/// assert!(FieldValue::List(vec![]).is_empty());
	/// assert!(!FieldValue::from("x").is_empty());
	/// ```
	pub fn is_empty(&self) -> bool {
		match self {
			FieldValue::Scalar(s) => s.is_empty(),
			FieldValue::List(items) => items.is_empty(),
		}
	}

	pub fn as_scalar(&self) -> Option<&str> {
		match self {
			FieldValue::Scalar(s) => Some(s),
			FieldValue::List(_) => None,
		}
	}

	pub fn as_list(&self) -> Option<&[String]> {
		match self {
			FieldValue::Scalar(_) => None,
			FieldValue::List(items) => Some(items),
		}
	}

	/// Flatten the value into a single string, joining list items with `separator`.
	pub fn join(&self, separator: &str) -> String {
		match self {
			FieldValue::Scalar(s) => s.clone(),
			FieldValue::List(items) => items.join(separator),
		}
	}

	/// Append a value, turning a scalar into a two-element list.
	pub fn push(&mut self, value: impl Into<String>) {
		match self {
			FieldValue::Scalar(existing) => {
				let first = std::mem::take(existing);
				*self = FieldValue::List(vec![first, value.into()]);
			}
			FieldValue::List(items) => items.push(value.into()),
		}
	}

	/// Collapse a one-element list to its scalar.
	pub fn simplify(self) -> Self {
		match self {
			FieldValue::List(mut items) if items.len() == 1 => {
				FieldValue::Scalar(items.remove(0))
			}
			other => other,
		}
	}
}

impl From<&str> for FieldValue {
	fn from(value: &str) -> Self {
		FieldValue::Scalar(value.to_string())
	}
}

impl From<String> for FieldValue {
	fn from(value: String) -> Self {
		FieldValue::Scalar(value)
	}
}

impl From<Vec<String>> for FieldValue {
	fn from(value: Vec<String>) -> Self {
		FieldValue::List(value)
	}
}

impl From<Vec<&str>> for FieldValue {
	fn from(value: Vec<&str>) -> Self {
		FieldValue::List(value.into_iter().map(str::to_string).collect())
	}
}

/// Insertion-ordered mapping from field name to [`FieldValue`].
///
/// # Examples
///
/// ```
/// use formpost_core::{FieldValue, FormSnapshot};
///
/// let mut snapshot = FormSnapshot::new();
/// snapshot.insert("email", "ada@example.com");
/// snapshot.insert("workshops", vec!["genomics", "imaging"]);
///
/// assert_eq!(snapshot.get_str("email"), Some("ada@example.com"));
/// assert_eq!(snapshot.keys().collect::<Vec<_>>(), vec!["email", "workshops"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormSnapshot {
	fields: IndexMap<String, FieldValue>,
}

impl FormSnapshot {
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert or replace a field. Replacing keeps the original position.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
		self.fields.insert(name.into(), value.into());
	}

	/// Builder-style insert returning the extended snapshot.
	pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
		self.insert(name, value);
		self
	}

	pub fn get(&self, name: &str) -> Option<&FieldValue> {
		self.fields.get(name)
	}

	pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
		self.fields.get_mut(name)
	}

	/// Scalar value of a field, `None` for lists and absent fields.
	pub fn get_str(&self, name: &str) -> Option<&str> {
		self.fields.get(name).and_then(FieldValue::as_scalar)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.fields.contains_key(name)
	}

	pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
		self.fields.shift_remove(name)
	}

	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.fields.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
		self.fields.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Serialize to a JSON object (lists become arrays).
	pub fn to_json(&self) -> serde_json::Value {
		serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
	}
}

impl<K, V> FromIterator<(K, V)> for FormSnapshot
where
	K: Into<String>,
	V: Into<FieldValue>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut snapshot = FormSnapshot::new();
		for (k, v) in iter {
			snapshot.insert(k, v);
		}
		snapshot
	}
}

impl<K, V> Extend<(K, V)> for FormSnapshot
where
	K: Into<String>,
	V: Into<FieldValue>,
{
	fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
		for (k, v) in iter {
			self.insert(k, v);
		}
	}
}

impl IntoIterator for FormSnapshot {
	type Item = (String, FieldValue);
	type IntoIter = indexmap::map::IntoIter<String, FieldValue>;

	fn into_iter(self) -> Self::IntoIter {
		self.fields.into_iter()
	}
}
