//! In-memory form document
//!
//! A [`FormDocument`] is the ordered list of inputs a submission is collected
//! from. Static inputs and dynamic field containers are interleaved in
//! document order, so collection sees repeated field groups exactly where the
//! container sits in the page.

use crate::dynamic::DynamicFieldPool;
use serde::{Deserialize, Serialize};

/// Kind of an input element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
	Text,
	Email,
	Tel,
	Number,
	Date,
	Textarea,
	Hidden,
	Select,
	Checkbox,
	Radio,
	File,
}

impl InputKind {
	/// Checkboxes and radios only contribute a value while checked.
	pub fn is_checkable(self) -> bool {
		matches!(self, InputKind::Checkbox | InputKind::Radio)
	}
}

/// A file chosen in a file input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
	pub name: String,
	pub mime_type: String,
	pub content: Vec<u8>,
}

impl SelectedFile {
	pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: Vec<u8>) -> Self {
		Self {
			name: name.into(),
			mime_type: mime_type.into(),
			content,
		}
	}
}

/// A single input, select, textarea or file element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormElement {
	pub name: Option<String>,
	pub id: Option<String>,
	pub placeholder: Option<String>,
	pub kind: InputKind,
	pub value: String,
	pub default_value: String,
	pub checked: bool,
	pub default_checked: bool,
	pub required: bool,
	pub files: Vec<SelectedFile>,
}

impl FormElement {
	/// Create an element of the given kind.
	///
	/// # Examples
	///
	/// ```
	/// use formpost_forms::{FormElement, InputKind};
	///
	/// let field = FormElement::new(InputKind::Email, "person-email").required();
	/// assert_eq!(field.name.as_deref(), Some("person-email"));
	/// assert!(field.required);
	/// ```
	pub fn new(kind: InputKind, name: impl Into<String>) -> Self {
		Self {
			name: Some(name.into()),
			id: None,
			placeholder: None,
			kind,
			value: String::new(),
			default_value: String::new(),
			checked: false,
			default_checked: false,
			required: false,
			files: Vec::new(),
		}
	}

	pub fn text(name: impl Into<String>) -> Self {
		Self::new(InputKind::Text, name)
	}

	pub fn email(name: impl Into<String>) -> Self {
		Self::new(InputKind::Email, name)
	}

	pub fn textarea(name: impl Into<String>) -> Self {
		Self::new(InputKind::Textarea, name)
	}

	pub fn select(name: impl Into<String>) -> Self {
		Self::new(InputKind::Select, name)
	}

	pub fn file(name: impl Into<String>) -> Self {
		Self::new(InputKind::File, name)
	}

	/// A checkbox submitting `value` while checked.
	pub fn checkbox(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self::new(InputKind::Checkbox, name).with_default(value)
	}

	/// A radio button submitting `value` while checked.
	pub fn radio(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self::new(InputKind::Radio, name).with_default(value)
	}

	/// An element without a `name`; collection skips it.
	pub fn unnamed(kind: InputKind) -> Self {
		let mut element = Self::new(kind, "");
		element.name = None;
		element
	}

	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}

	pub fn with_id(mut self, id: impl Into<String>) -> Self {
		self.id = Some(id.into());
		self
	}

	pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
		self.placeholder = Some(placeholder.into());
		self
	}

	/// Set the current value, as if typed by the user.
	pub fn with_value(mut self, value: impl Into<String>) -> Self {
		self.value = value.into();
		self
	}

	/// Set the value attribute (restored on reset) and the current value.
	pub fn with_default(mut self, value: impl Into<String>) -> Self {
		let value = value.into();
		self.default_value = value.clone();
		self.value = value;
		self
	}

	pub fn checked(mut self) -> Self {
		self.checked = true;
		self
	}

	pub fn with_files(mut self, files: Vec<SelectedFile>) -> Self {
		self.value = files.first().map(|f| f.name.clone()).unwrap_or_default();
		self.files = files;
		self
	}

	/// Name if present and non-empty.
	pub fn field_name(&self) -> Option<&str> {
		self.name.as_deref().filter(|n| !n.is_empty())
	}

	/// Restore the element to its initial state.
	pub fn reset(&mut self) {
		self.value = self.default_value.clone();
		self.checked = self.default_checked;
		self.files.clear();
	}
}

/// State of the form's submit button.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitControl {
	pub disabled: bool,
	pub busy: bool,
}

impl SubmitControl {
	pub fn begin_processing(&mut self) {
		self.disabled = true;
		self.busy = true;
	}

	pub fn finish_processing(&mut self) {
		self.disabled = false;
		self.busy = false;
	}

	pub fn is_idle(&self) -> bool {
		!self.disabled && !self.busy
	}
}

/// A node of the form in document order.
#[derive(Debug, Clone)]
pub enum FormNode {
	Element(FormElement),
	Dynamic(DynamicFieldPool),
}

/// A form: its nodes in document order plus the submit control.
#[derive(Debug, Clone, Default)]
pub struct FormDocument {
	nodes: Vec<FormNode>,
	submit: Option<SubmitControl>,
	/// Node indexes of bound pools whose trigger has not been added yet
	awaiting_trigger: Vec<usize>,
}

impl FormDocument {
	/// Create an empty form with a submit button.
	pub fn new() -> Self {
		Self {
			nodes: Vec::new(),
			submit: Some(SubmitControl::default()),
			awaiting_trigger: Vec::new(),
		}
	}

	/// Create an empty form that has no submit button.
	pub fn without_submit() -> Self {
		Self {
			nodes: Vec::new(),
			submit: None,
			awaiting_trigger: Vec::new(),
		}
	}

	/// Append an element.
	///
	/// A pool bound to this element's name that was added earlier is
	/// synchronized with the element's value.
	pub fn push(&mut self, element: FormElement) -> &mut Self {
		let name = element.field_name().map(str::to_string);
		let value = element.value.clone();
		self.nodes.push(FormNode::Element(element));
		if let Some(name) = name {
			self.sync_awaiting(&name, &value);
		}
		self
	}

	/// Builder-style [`push`](Self::push).
	pub fn with(mut self, element: FormElement) -> Self {
		self.push(element);
		self
	}

	/// Append a dynamic field container.
	///
	/// A bound pool is synchronized once with its trigger's value: right away
	/// when the trigger is already in the form, otherwise when the trigger is
	/// pushed.
	pub fn push_dynamic(&mut self, mut pool: DynamicFieldPool) -> &mut Self {
		if let Some(trigger) = pool.trigger().map(str::to_string) {
			match self.value_of(&trigger).map(str::to_string) {
				Some(value) => pool.sync_trigger(&value),
				None => self.awaiting_trigger.push(self.nodes.len()),
			}
		}
		self.nodes.push(FormNode::Dynamic(pool));
		self
	}

	fn sync_awaiting(&mut self, name: &str, value: &str) {
		let nodes = &mut self.nodes;
		self.awaiting_trigger.retain(|&index| match nodes.get_mut(index) {
			Some(FormNode::Dynamic(pool)) if pool.trigger() == Some(name) => {
				pool.sync_trigger(value);
				false
			}
			_ => true,
		});
	}

	/// Builder-style [`push_dynamic`](Self::push_dynamic).
	pub fn with_dynamic(mut self, pool: DynamicFieldPool) -> Self {
		self.push_dynamic(pool);
		self
	}

	pub fn nodes(&self) -> &[FormNode] {
		&self.nodes
	}

	/// All elements in document order, including those inside dynamic containers.
	pub fn elements(&self) -> Vec<&FormElement> {
		let mut out = Vec::new();
		for node in &self.nodes {
			match node {
				FormNode::Element(element) => out.push(element),
				FormNode::Dynamic(pool) => out.extend(pool.elements()),
			}
		}
		out
	}

	/// Mutable access to every element in document order.
	pub fn elements_mut(&mut self) -> Vec<&mut FormElement> {
		let mut out = Vec::new();
		for node in &mut self.nodes {
			match node {
				FormNode::Element(element) => out.push(element),
				FormNode::Dynamic(pool) => out.extend(pool.elements_mut()),
			}
		}
		out
	}

	/// First element carrying `name`.
	pub fn element(&self, name: &str) -> Option<&FormElement> {
		self.elements()
			.into_iter()
			.find(|el| el.field_name() == Some(name))
	}

	pub fn element_mut(&mut self, name: &str) -> Option<&mut FormElement> {
		self.elements_mut()
			.into_iter()
			.find(|el| el.field_name() == Some(name))
	}

	fn value_of(&self, name: &str) -> Option<&str> {
		self.element(name).map(|el| el.value.as_str())
	}

	/// The dynamic container bound to `trigger`, or the first one when `None`.
	pub fn dynamic_pool_mut(&mut self, trigger: Option<&str>) -> Option<&mut DynamicFieldPool> {
		self.nodes.iter_mut().find_map(|node| match node {
			FormNode::Dynamic(pool) if trigger.is_none() || pool.trigger() == trigger => {
				Some(pool)
			}
			_ => None,
		})
	}

	pub fn dynamic_pool(&self, trigger: Option<&str>) -> Option<&DynamicFieldPool> {
		self.nodes.iter().find_map(|node| match node {
			FormNode::Dynamic(pool) if trigger.is_none() || pool.trigger() == trigger => {
				Some(pool)
			}
			_ => None,
		})
	}

	/// Set an element's value and fire its change handlers.
	///
	/// Returns `false` when no element carries `name`.
	pub fn change(&mut self, name: &str, value: impl Into<String>) -> bool {
		let value = value.into();
		let Some(element) = self.element_mut(name) else {
			return false;
		};
		element.value = value.clone();

		for node in &mut self.nodes {
			if let FormNode::Dynamic(pool) = node
				&& pool.trigger() == Some(name)
			{
				pool.sync_trigger(&value);
			}
		}
		true
	}

	/// Check or uncheck the checkable element `name` whose value is `value`.
	pub fn set_checked(&mut self, name: &str, value: &str, checked: bool) -> bool {
		let mut found = false;
		for element in self.elements_mut() {
			if element.field_name() == Some(name) && element.value == value {
				element.checked = checked;
				found = true;
			}
		}
		found
	}

	pub fn submit_control(&self) -> Option<&SubmitControl> {
		self.submit.as_ref()
	}

	pub fn submit_control_mut(&mut self) -> Option<&mut SubmitControl> {
		self.submit.as_mut()
	}

	/// Reset every element to its initial value.
	///
	/// Dynamic containers keep their attached fragments; only values reset.
	pub fn reset(&mut self) {
		for element in self.elements_mut() {
			element.reset();
		}
	}
}
