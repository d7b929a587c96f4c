//! `%token%` rendering for outgoing mail
//!
//! Body values are HTML-escaped and newline-converted unless their token is
//! on the renderer's raw-HTML allow-list. Tokens without data render as
//! [`NOT_PROVIDED`].

use crate::{EmailError, EmailResult};
use formpost_core::html::escape_multiline;
use formpost_core::template::render_with;
use formpost_core::{FieldValue, FormSnapshot};
use std::collections::HashSet;
use std::path::PathBuf;

/// Rendered in place of tokens without data.
pub const NOT_PROVIDED: &str = "[Not Provided]";

/// Where a message template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
	Inline(String),
	File(PathBuf),
}

impl TemplateSource {
	/// Template text; an unreadable or empty file is a template error.
	pub fn load(&self) -> EmailResult<String> {
		let content = match self {
			TemplateSource::Inline(text) => text.clone(),
			TemplateSource::File(path) => std::fs::read_to_string(path).map_err(|e| {
				EmailError::TemplateError(format!("{}: {}", path.display(), e))
			})?,
		};
		if content.is_empty() {
			return Err(EmailError::TemplateError("template is empty".into()));
		}
		Ok(content)
	}
}

impl From<&str> for TemplateSource {
	fn from(text: &str) -> Self {
		TemplateSource::Inline(text.to_string())
	}
}

impl From<String> for TemplateSource {
	fn from(text: String) -> Self {
		TemplateSource::Inline(text)
	}
}

impl From<PathBuf> for TemplateSource {
	fn from(path: PathBuf) -> Self {
		TemplateSource::File(path)
	}
}

/// Renders mail templates against submitted data.
///
/// # Examples
///
/// ```
/// use formpost_core::FormSnapshot;
/// use formpost_mail::templates::TemplateRenderer;
///
/// let data = FormSnapshot::new().with("name", "<b>x</b>");
///
/// let escaped = TemplateRenderer::new();
/// assert_eq!(escaped.render("%name%", &data), "&lt;b&gt;x&lt;/b&gt;");
///
/// let raw = TemplateRenderer::new().with_html_fields(["name"]);
/// assert_eq!(raw.render("%name%", &data), "<b>x</b>");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemplateRenderer {
	html_fields: HashSet<String>,
}

impl TemplateRenderer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Tokens whose values are inserted without escaping.
	pub fn with_html_fields<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.html_fields.extend(fields.into_iter().map(Into::into));
		self
	}

	pub fn is_html_field(&self, token: &str) -> bool {
		self.html_fields.contains(token)
	}

	/// Render an HTML body.
	///
	/// A token is looked up as written, then with `-` replaced by `_`.
	pub fn render(&self, template: &str, data: &FormSnapshot) -> String {
		render_with(template, |token| {
			let Some(value) = lookup(data, token) else {
				return Some(NOT_PROVIDED.to_string());
			};
			let text = value.join(", ");
			Some(if self.is_html_field(token) {
				text
			} else {
				escape_multiline(&text)
			})
		})
	}

	/// Render a subject line: values are inserted as plain text, missing
	/// tokens render empty.
	pub fn render_subject(&self, template: &str, data: &FormSnapshot) -> String {
		render_with(template, |token| {
			Some(
				lookup(data, token)
					.map(|value| value.join(", "))
					.unwrap_or_default(),
			)
		})
		.replace(['\r', '\n'], " ")
	}
}

fn lookup<'a>(data: &'a FormSnapshot, token: &str) -> Option<&'a FieldValue> {
	data.get(token).or_else(|| {
		let underscored = token.replace('-', "_");
		data.get(&underscored)
	})
}
