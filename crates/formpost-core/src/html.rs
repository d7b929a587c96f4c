//! HTML helpers for email rendering

use regex::Regex;
use std::sync::LazyLock;

static MESSAGE_BLOCK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"(?s)<div class="message">.*?</div>\s*"#)
		.expect("MESSAGE_BLOCK_REGEX: invalid regex pattern")
});

/// Escape HTML special characters
///
/// # Examples
///
/// ```
/// use formpost_core::html::escape;
///
/// assert_eq!(escape("<b>x</b>"), "&lt;b&gt;x&lt;/b&gt;");
/// assert_eq!(escape("Tom & \"Jerry\""), "Tom &amp; &quot;Jerry&quot;");
/// assert_eq!(escape("it's"), "it&apos;s");
/// ```
pub fn escape(text: &str) -> String {
	let mut result = String::with_capacity(text.len() + 10);
	for ch in text.chars() {
		match ch {
			'&' => result.push_str("&amp;"),
			'<' => result.push_str("&lt;"),
			'>' => result.push_str("&gt;"),
			'"' => result.push_str("&quot;"),
			'\'' => result.push_str("&apos;"),
			_ => result.push(ch),
		}
	}
	result
}

/// Insert `<br />` before every line break, keeping the break itself.
///
/// `\r\n` and `\n\r` count as a single break.
///
/// # Examples
///
/// ```
/// use formpost_core::html::nl2br;
///
/// assert_eq!(nl2br("a\nb"), "a<br />\nb");
/// assert_eq!(nl2br("a\r\nb"), "a<br />\r\nb");
/// assert_eq!(nl2br("plain"), "plain");
/// ```
pub fn nl2br(text: &str) -> String {
	let mut result = String::with_capacity(text.len());
	let mut chars = text.chars().peekable();
	while let Some(ch) = chars.next() {
		match ch {
			'\r' | '\n' => {
				result.push_str("<br />");
				result.push(ch);
				let pair = if ch == '\r' { '\n' } else { '\r' };
				if chars.peek() == Some(&pair) {
					result.push(pair);
					chars.next();
				}
			}
			_ => result.push(ch),
		}
	}
	result
}

/// Escape and newline-convert a user-supplied value for an HTML body.
pub fn escape_multiline(text: &str) -> String {
	nl2br(&escape(text))
}

/// Strip HTML tags, keeping text content.
///
/// Quoted attribute values may contain `>`; comments are dropped entirely.
///
/// # Examples
///
/// ```
/// use formpost_core::html::strip_tags;
///
/// assert_eq!(strip_tags("<p>Hello <b>World</b></p>"), "Hello World");
/// assert_eq!(strip_tags(r#"<a title="x>y">Link</a>"#), "Link");
/// assert_eq!(strip_tags("a<!-- hidden -->b"), "ab");
/// ```
pub fn strip_tags(html: &str) -> String {
	let mut result = String::with_capacity(html.len());
	let mut rest = html;

	while let Some(start) = rest.find('<') {
		result.push_str(&rest[..start]);
		let tail = &rest[start..];

		if let Some(comment) = tail.strip_prefix("<!--") {
			rest = match comment.find("-->") {
				Some(end) => &comment[end + 3..],
				None => "",
			};
			continue;
		}

		let mut quote: Option<char> = None;
		let mut consumed = None;
		for (i, ch) in tail.char_indices().skip(1) {
			match (quote, ch) {
				(Some(q), c) if c == q => quote = None,
				(Some(_), _) => {}
				(None, '"') | (None, '\'') => quote = Some(ch),
				(None, '>') => {
					consumed = Some(i + 1);
					break;
				}
				_ => {}
			}
		}
		rest = match consumed {
			Some(end) => &tail[end..],
			None => "",
		};
	}
	result.push_str(rest);
	result
}

/// Remove every `<div class="message">...</div>` block and trailing whitespace.
///
/// # Examples
///
/// ```
/// use formpost_core::html::strip_message_block;
///
/// let html = "<p>Hi</p>\n<div class=\"message\">Thanks!</div>\n<p>Data</p>";
/// assert_eq!(strip_message_block(html), "<p>Hi</p>\n<p>Data</p>");
/// ```
pub fn strip_message_block(html: &str) -> String {
	MESSAGE_BLOCK_REGEX.replace_all(html, "").into_owned()
}
