use crate::{EmailError, EmailResult};
use std::fmt;
use std::path::Path;

/// An email address with an optional display name.
///
/// # Examples
///
/// ```
/// use formpost_mail::Address;
///
/// let named = Address::named("office@example.com", "Office");
/// assert_eq!(named.to_string(), "Office <office@example.com>");
///
/// let bare = Address::new("chair@example.com");
/// assert_eq!(bare.to_string(), "chair@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
	email: String,
	name: Option<String>,
}

impl Address {
	pub fn new(email: impl Into<String>) -> Self {
		Self {
			email: email.into().trim().to_string(),
			name: None,
		}
	}

	/// An address with a display name; an empty name is dropped.
	pub fn named(email: impl Into<String>, name: impl Into<String>) -> Self {
		let name = name.into();
		Self {
			email: email.into().trim().to_string(),
			name: (!name.trim().is_empty()).then_some(name),
		}
	}

	pub fn email(&self) -> &str {
		&self.email
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.name {
			Some(name) => write!(f, "{} <{}>", name, self.email),
			None => f.write_str(&self.email),
		}
	}
}

/// A file attached to the primary notification.
///
/// # Examples
///
/// ```
/// use formpost_mail::Attachment;
///
/// let attachment = Attachment::new("poster.PDF", b"%PDF-1.7".to_vec());
/// assert_eq!(attachment.filename(), "poster.PDF");
/// assert_eq!(attachment.extension(), "pdf");
/// assert!(attachment.mime_type().contains("pdf"));
/// ```
#[derive(Debug, Clone)]
pub struct Attachment {
	filename: String,
	content: Vec<u8>,
	mime_type: String,
}

impl Attachment {
	/// Create an attachment; the MIME type is guessed from the filename.
	pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
		let filename = filename.into();
		let mime_type = Self::detect_mime_type(&filename);
		Self {
			filename,
			content,
			mime_type,
		}
	}

	/// Read an attachment from a stored upload.
	pub fn from_path(path: &Path, filename: impl Into<String>) -> std::io::Result<Self> {
		let content = std::fs::read(path)?;
		Ok(Self::new(filename, content))
	}

	/// Override the guessed MIME type.
	pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
		self.mime_type = mime_type.into();
		self
	}

	pub fn filename(&self) -> &str {
		&self.filename
	}

	pub fn content(&self) -> &[u8] {
		&self.content
	}

	pub fn mime_type(&self) -> &str {
		&self.mime_type
	}

	/// Lowercased extension of the filename, empty when there is none.
	pub fn extension(&self) -> String {
		file_extension(&self.filename)
	}

	fn detect_mime_type(filename: &str) -> String {
		mime_guess::from_path(filename)
			.first()
			.map(|mime| mime.to_string())
			.unwrap_or_else(|| "application/octet-stream".to_string())
	}
}

/// Lowercased extension of `filename`, empty when there is none.
pub fn file_extension(filename: &str) -> String {
	Path::new(filename)
		.extension()
		.and_then(|ext| ext.to_str())
		.map(str::to_lowercase)
		.unwrap_or_default()
}

/// An HTML email with its plain-text alternative.
///
/// Fields are private; construction goes through [`EmailMessageBuilder`],
/// which validates addresses and rejects header injection.
#[derive(Debug, Clone)]
pub struct EmailMessage {
	from: Address,
	to: Vec<Address>,
	reply_to: Vec<Address>,
	subject: String,
	html_body: String,
	text_body: String,
	attachments: Vec<Attachment>,
}

impl EmailMessage {
	pub fn builder() -> EmailMessageBuilder {
		EmailMessageBuilder::default()
	}

	pub fn from(&self) -> &Address {
		&self.from
	}

	pub fn to(&self) -> &[Address] {
		&self.to
	}

	pub fn reply_to(&self) -> &[Address] {
		&self.reply_to
	}

	pub fn subject(&self) -> &str {
		&self.subject
	}

	pub fn html_body(&self) -> &str {
		&self.html_body
	}

	/// Plain-text alternative: the HTML body with tags stripped.
	pub fn text_body(&self) -> &str {
		&self.text_body
	}

	pub fn attachments(&self) -> &[Attachment] {
		&self.attachments
	}

	/// Send through `backend`.
	pub async fn send(&self, backend: &dyn crate::backends::EmailBackend) -> EmailResult<()> {
		backend.send_messages(std::slice::from_ref(self)).await?;
		Ok(())
	}
}

#[derive(Debug, Default)]
pub struct EmailMessageBuilder {
	from: Option<Address>,
	to: Vec<Address>,
	reply_to: Vec<Address>,
	subject: String,
	html_body: String,
	text_body: Option<String>,
	attachments: Vec<Attachment>,
}

impl EmailMessageBuilder {
	pub fn from(mut self, from: Address) -> Self {
		self.from = Some(from);
		self
	}

	pub fn to(mut self, to: Vec<Address>) -> Self {
		self.to = to;
		self
	}

	pub fn reply_to(mut self, reply_to: Vec<Address>) -> Self {
		self.reply_to = reply_to;
		self
	}

	pub fn subject(mut self, subject: impl Into<String>) -> Self {
		self.subject = subject.into();
		self
	}

	/// HTML body; the plain alternative defaults to its stripped text.
	pub fn html(mut self, html: impl Into<String>) -> Self {
		self.html_body = html.into();
		self
	}

	pub fn text(mut self, text: impl Into<String>) -> Self {
		self.text_body = Some(text.into());
		self
	}

	pub fn attachment(mut self, attachment: Attachment) -> Self {
		self.attachments.push(attachment);
		self
	}

	pub fn attachments(mut self, attachments: Vec<Attachment>) -> Self {
		self.attachments.extend(attachments);
		self
	}

	/// Build the message, validating addresses and the subject.
	pub fn build(self) -> EmailResult<EmailMessage> {
		let from = self
			.from
			.ok_or_else(|| EmailError::MissingField("from".into()))?;
		validate_address(from.email())?;

		if self.to.is_empty() {
			return Err(EmailError::MissingField("to".into()));
		}
		for address in self.to.iter().chain(self.reply_to.iter()) {
			validate_address(address.email())?;
		}
		check_header_injection(&self.subject)?;

		let text_body = self
			.text_body
			.unwrap_or_else(|| formpost_core::html::strip_tags(&self.html_body));

		Ok(EmailMessage {
			from,
			to: self.to,
			reply_to: self.reply_to,
			subject: self.subject,
			html_body: self.html_body,
			text_body,
			attachments: self.attachments,
		})
	}
}

/// Reject addresses that cannot be delivered to.
pub fn validate_address(email: &str) -> EmailResult<()> {
	check_header_injection(email)?;
	let Some((local, domain)) = email.rsplit_once('@') else {
		return Err(EmailError::InvalidAddress(email.to_string()));
	};
	let valid = !local.is_empty()
		&& !domain.is_empty()
		&& !domain.starts_with('.')
		&& !domain.ends_with('.')
		&& !email.chars().any(char::is_whitespace);
	if valid {
		Ok(())
	} else {
		Err(EmailError::InvalidAddress(email.to_string()))
	}
}

/// Reject header values carrying line breaks.
pub fn check_header_injection(value: &str) -> EmailResult<()> {
	if value.contains(['\r', '\n']) {
		return Err(EmailError::HeaderInjection(value.escape_debug().to_string()));
	}
	Ok(())
}
