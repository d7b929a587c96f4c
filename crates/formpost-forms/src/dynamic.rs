//! Repeated field groups
//!
//! A [`DynamicFieldPool`] owns the fragments attached to one container. New
//! fragments are minted from a template by substituting `{n}` with the
//! fragment's 1-based index. Removed fragments are parked in a recycle table
//! keyed by that index, so re-adding index `k` brings back the same fragment
//! (and whatever the user typed into it) instead of minting a fresh one.

use crate::document::FormElement;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Placeholder replaced by the fragment index.
pub const INDEX_PLACEHOLDER: &str = "{n}";

/// Default upper bound on attached fragments.
pub const DEFAULT_MAX_FIELDS: usize = 10;

static INDEX_SUFFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"-?\d+$").expect("INDEX_SUFFIX_REGEX: invalid regex pattern")
});

/// One instance of the repeated field group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFragment {
	index: usize,
	elements: Vec<FormElement>,
}

impl FieldFragment {
	/// Index assigned when the fragment was minted. Never changes.
	pub fn index(&self) -> usize {
		self.index
	}

	pub fn elements(&self) -> &[FormElement] {
		&self.elements
	}

	pub fn elements_mut(&mut self) -> &mut [FormElement] {
		&mut self.elements
	}

	pub fn element_mut(&mut self, name: &str) -> Option<&mut FormElement> {
		self.elements
			.iter_mut()
			.find(|el| el.field_name() == Some(name))
	}
}

/// Manager for a container of repeated field groups.
///
/// # Examples
///
/// ```
/// use formpost_forms::{DynamicFieldPool, FormElement};
///
/// let mut pool = DynamicFieldPool::new(vec![
///     FormElement::text("abstract-author{n}").with_placeholder("Author {n}"),
/// ])
/// .with_max(3);
///
/// pool.add(5);
/// assert_eq!(pool.count(), 3);
/// assert_eq!(
///     pool.fragments()[2].elements()[0].name.as_deref(),
///     Some("abstract-author3")
/// );
/// ```
#[derive(Debug, Clone)]
pub struct DynamicFieldPool {
	template: Vec<FormElement>,
	max: usize,
	attached: Vec<FieldFragment>,
	recycled: BTreeMap<usize, FieldFragment>,
	trigger: Option<String>,
}

impl DynamicFieldPool {
	/// Create a pool minting fragments from `template`.
	pub fn new(template: Vec<FormElement>) -> Self {
		Self {
			template,
			max: DEFAULT_MAX_FIELDS,
			attached: Vec::new(),
			recycled: BTreeMap::new(),
			trigger: None,
		}
	}

	/// Set the maximum number of attached fragments.
	///
	/// A maximum of zero falls back to [`DEFAULT_MAX_FIELDS`].
	pub fn with_max(mut self, max: usize) -> Self {
		self.max = if max == 0 { DEFAULT_MAX_FIELDS } else { max };
		self
	}

	/// Bind the pool to the control named `trigger`.
	///
	/// The count follows the control's numeric value once the pool is placed
	/// in a [`FormDocument`](crate::FormDocument), and on every change.
	pub fn bound_to(mut self, trigger: impl Into<String>) -> Self {
		self.trigger = Some(trigger.into());
		self
	}

	pub fn trigger(&self) -> Option<&str> {
		self.trigger.as_deref()
	}

	pub fn max(&self) -> usize {
		self.max
	}

	/// Number of attached fragments.
	pub fn count(&self) -> usize {
		self.attached.len()
	}

	pub fn fragments(&self) -> &[FieldFragment] {
		&self.attached
	}

	pub fn fragments_mut(&mut self) -> &mut [FieldFragment] {
		&mut self.attached
	}

	/// Indexes currently parked in the recycle table.
	pub fn recycled_indexes(&self) -> Vec<usize> {
		self.recycled.keys().copied().collect()
	}

	/// Attach up to `n` fragments, never exceeding the maximum.
	///
	/// Returns how many were attached.
	pub fn add(&mut self, n: usize) -> usize {
		let to_add = n.min(self.max.saturating_sub(self.count()));
		for _ in 0..to_add {
			let index = self.count() + 1;
			let fragment = match self.recycled.remove(&index) {
				Some(fragment) => {
					tracing::debug!(index, "reusing recycled fragment");
					fragment
				}
				None => self.mint(index),
			};
			self.attached.push(fragment);
		}
		to_add
	}

	/// Detach up to `n` fragments, last attached first.
	///
	/// Returns how many were detached.
	pub fn remove(&mut self, n: usize) -> usize {
		let to_remove = n.min(self.count());
		for _ in 0..to_remove {
			if let Some(fragment) = self.attached.pop() {
				self.recycled.insert(fragment.index, fragment);
			}
		}
		to_remove
	}

	/// Move the count to `n`, clamped to `[0, max]`.
	pub fn set(&mut self, n: usize) {
		let target = n.min(self.max);
		let current = self.count();
		if target > current {
			self.add(target - current);
		} else if target < current {
			self.remove(current - target);
		}
	}

	/// Apply a trigger control value: parsed as a leading integer, anything
	/// unparsable or negative counts as zero.
	pub fn sync_trigger(&mut self, value: &str) {
		self.set(parse_count(value));
	}

	/// One record per attached fragment, keyed by field name without its
	/// trailing index.
	pub fn values(&self) -> Vec<IndexMap<String, String>> {
		self.attached
			.iter()
			.map(|fragment| {
				fragment
					.elements
					.iter()
					.filter_map(|el| {
						let name = el.field_name()?;
						Some((normalize_name(name), el.value.clone()))
					})
					.collect()
			})
			.collect()
	}

	/// Detach every fragment and forget recycled ones.
	pub fn destroy(&mut self) {
		self.attached.clear();
		self.recycled.clear();
	}

	pub(crate) fn elements(&self) -> impl Iterator<Item = &FormElement> {
		self.attached.iter().flat_map(|f| f.elements.iter())
	}

	pub(crate) fn elements_mut(&mut self) -> impl Iterator<Item = &mut FormElement> {
		self.attached.iter_mut().flat_map(|f| f.elements.iter_mut())
	}

	fn mint(&self, index: usize) -> FieldFragment {
		let n = index.to_string();
		let elements = self
			.template
			.iter()
			.map(|proto| {
				let mut element = proto.clone();
				let mut indexed = false;
				for attr in [&mut element.name, &mut element.id, &mut element.placeholder]
					.into_iter()
					.flatten()
				{
					if attr.contains(INDEX_PLACEHOLDER) {
						*attr = attr.replace(INDEX_PLACEHOLDER, &n);
						indexed = true;
					}
				}
				if indexed && !element.kind.is_checkable() {
					element.value.clear();
					element.default_value.clear();
					element.files.clear();
				}
				element
			})
			.collect();
		FieldFragment { index, elements }
	}
}

/// Strip a trailing `-N` or `N` index from a field name.
///
/// # Examples
///
/// ```
/// use formpost_forms::dynamic::normalize_name;
///
/// assert_eq!(normalize_name("author-3"), "author");
/// assert_eq!(normalize_name("abstract-author12"), "abstract-author");
/// assert_eq!(normalize_name("email"), "email");
/// ```
pub fn normalize_name(name: &str) -> String {
	INDEX_SUFFIX_REGEX.replace(name, "").into_owned()
}

fn parse_count(value: &str) -> usize {
	let trimmed = value.trim_start();
	let (negative, digits) = match trimmed.as_bytes().first() {
		Some(b'-') => (true, &trimmed[1..]),
		Some(b'+') => (false, &trimmed[1..]),
		_ => (false, trimmed),
	};
	let end = digits
		.find(|c: char| !c.is_ascii_digit())
		.unwrap_or(digits.len());
	if negative || end == 0 {
		return 0;
	}
	digits[..end].parse().unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};

	#[fixture]
	fn pool() -> DynamicFieldPool {
		DynamicFieldPool::new(vec![
			FormElement::text("author-{n}")
				.with_id("author-{n}")
				.with_placeholder("Author {n}")
				.with_value("carried over"),
			FormElement::text("static-note").with_value("kept"),
		])
		.with_max(4)
	}

	#[rstest]
	fn test_mint_substitutes_index_and_clears_value(mut pool: DynamicFieldPool) {
		// Act
		pool.add(2);

		// Assert
		let second = &pool.fragments()[1];
		assert_eq!(second.index(), 2);
		let author = &second.elements()[0];
		assert_eq!(author.name.as_deref(), Some("author-2"));
		assert_eq!(author.id.as_deref(), Some("author-2"));
		assert_eq!(author.placeholder.as_deref(), Some("Author 2"));
		assert_eq!(author.value, "");
		assert_eq!(second.elements()[1].value, "kept");
	}

	#[rstest]
	fn test_remove_is_lifo_and_recycles(mut pool: DynamicFieldPool) {
		// Arrange
		pool.add(3);

		// Act
		let removed = pool.remove(2);

		// Assert
		assert_eq!(removed, 2);
		assert_eq!(pool.count(), 1);
		assert_eq!(pool.recycled_indexes(), vec![2, 3]);
	}

	#[rstest]
	fn test_recycled_fragment_keeps_user_input(mut pool: DynamicFieldPool) {
		// Arrange
		pool.add(2);
		if let Some(el) = pool.fragments_mut()[1].element_mut("author-2") {
			el.value = "Grace".into();
		}
		pool.remove(1);

		// Act
		pool.add(1);

		// Assert
		assert!(pool.recycled_indexes().is_empty());
		assert_eq!(pool.values()[1].get("author"), Some(&"Grace".to_string()));
	}

	#[rstest]
	fn test_destroy_clears_everything(mut pool: DynamicFieldPool) {
		// Arrange
		pool.add(3);
		pool.remove(1);

		// Act
		pool.destroy();

		// Assert
		assert_eq!(pool.count(), 0);
		assert!(pool.recycled_indexes().is_empty());
	}

	#[rstest]
	fn test_values_normalizes_names(mut pool: DynamicFieldPool) {
		// Act
		pool.add(1);

		// Assert
		let values = pool.values();
		assert_eq!(values.len(), 1);
		assert_eq!(
			values[0].keys().map(String::as_str).collect::<Vec<_>>(),
			vec!["author", "static-note"]
		);
	}

	#[rstest]
	#[case("3", 3)]
	#[case(" 2 ", 2)]
	#[case("4abc", 4)]
	#[case("abc", 0)]
	#[case("", 0)]
	#[case("-2", 0)]
	#[case("+1", 1)]
	#[case("99999999999999999999999", usize::MAX)]
	fn test_parse_count(#[case] input: &str, #[case] expected: usize) {
		assert_eq!(parse_count(input), expected);
	}

	#[rstest]
	fn test_zero_max_uses_default() {
		let pool = DynamicFieldPool::new(vec![]).with_max(0);
		assert_eq!(pool.max(), DEFAULT_MAX_FIELDS);
	}
}
