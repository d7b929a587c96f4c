//! Primary notification and autoresponder composition
//!
//! [`MailComposer::compose`] renders and sends the primary message to the
//! configured recipients, then, when the primary succeeded and the job has
//! both a reply-to address and an autoresponder, a confirmation to the
//! submitter. Sends are strictly sequential. A failed autoresponder is
//! reported in the outcome message but never changes `success`.

use crate::backends::EmailBackend;
use crate::message::{Address, Attachment, EmailMessage, validate_address};
use crate::templates::{TemplateRenderer, TemplateSource};
use crate::upload::UploadDescriptor;
use crate::{EmailError, EmailResult};
use formpost_core::FormSnapshot;
use formpost_core::html::strip_message_block;
use serde::Serialize;
use std::sync::Arc;

pub const PRIMARY_SENT: &str = "Email sent successfully";
pub const AUTORESPONDER_SENT: &str = "Autoresponder sent";
pub const NO_AUTORESPONDER: &str = "No autoresponder configured";
pub const DEFAULT_AUTORESPONDER_SUBJECT: &str = "Thank you for your submission";

/// How the confirmation to the submitter is built.
#[derive(Debug, Clone, Default)]
pub struct AutoresponderConfig {
	pub subject: Option<String>,
	pub template: Option<TemplateSource>,
	/// Reuse the primary template, minus its `<div class="message">` block,
	/// when no template is given
	pub include_original: bool,
}

impl AutoresponderConfig {
	pub fn subject(mut self, subject: impl Into<String>) -> Self {
		self.subject = Some(subject.into());
		self
	}

	pub fn template(mut self, template: impl Into<TemplateSource>) -> Self {
		self.template = Some(template.into());
		self
	}

	pub fn include_original(mut self, include: bool) -> Self {
		self.include_original = include;
		self
	}
}

/// Everything needed to send one submission's mail.
#[derive(Debug, Clone, Default)]
pub struct MailJob {
	pub recipients: Vec<Address>,
	pub reply_to: Option<String>,
	pub subject: String,
	pub template: Option<TemplateSource>,
	pub data: FormSnapshot,
	pub files: Vec<UploadDescriptor>,
	pub html_fields: Vec<String>,
	pub autoresponder: Option<AutoresponderConfig>,
}

impl MailJob {
	pub fn new(recipients: Vec<Address>) -> Self {
		Self {
			recipients,
			..Self::default()
		}
	}

	/// `%token%` template for the subject line.
	pub fn subject(mut self, subject: impl Into<String>) -> Self {
		self.subject = subject.into();
		self
	}

	pub fn template(mut self, template: impl Into<TemplateSource>) -> Self {
		self.template = Some(template.into());
		self
	}

	/// Submitter address; blank values count as absent.
	pub fn reply_to(mut self, reply_to: impl Into<String>) -> Self {
		let reply_to = reply_to.into();
		self.reply_to = (!reply_to.trim().is_empty()).then(|| reply_to.trim().to_string());
		self
	}

	pub fn data(mut self, data: FormSnapshot) -> Self {
		self.data = data;
		self
	}

	pub fn files(mut self, files: Vec<UploadDescriptor>) -> Self {
		self.files = files;
		self
	}

	pub fn html_fields<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.html_fields = fields.into_iter().map(Into::into).collect();
		self
	}

	pub fn autoresponder(mut self, autoresponder: AutoresponderConfig) -> Self {
		self.autoresponder = Some(autoresponder);
		self
	}
}

/// Result reported back to the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailOutcome {
	pub success: bool,
	pub message: String,
	pub autoresponder_sent: bool,
}

impl MailOutcome {
	fn failed(err: &EmailError) -> Self {
		Self {
			success: false,
			message: format!("Mailer Error: {err}"),
			autoresponder_sent: false,
		}
	}
}

/// Sends submission mail through a backend.
pub struct MailComposer {
	backend: Arc<dyn EmailBackend>,
	from: Address,
	allowed_extensions: Vec<String>,
}

impl MailComposer {
	pub fn new(backend: Arc<dyn EmailBackend>, from: Address) -> Self {
		Self {
			backend,
			from,
			allowed_extensions: ["pdf", "doc", "docx", "jpg", "jpeg", "png"]
				.into_iter()
				.map(String::from)
				.collect(),
		}
	}

	/// Extensions an attachment may carry when the primary message is sent.
	pub fn with_allowed_extensions(mut self, extensions: Vec<String>) -> Self {
		self.allowed_extensions = extensions;
		self
	}

	/// Send the primary message and, when applicable, the autoresponder.
	///
	/// Returns `Err` only for a missing or unreadable primary template.
	/// Delivery problems are reported through [`MailOutcome`].
	pub async fn compose(&self, job: &MailJob) -> EmailResult<MailOutcome> {
		let template = job
			.template
			.as_ref()
			.ok_or(EmailError::MissingTemplate)?
			.load()?;
		let renderer = TemplateRenderer::new().with_html_fields(job.html_fields.iter().cloned());

		if let Err(err) = self.send_primary(job, &renderer, &template).await {
			tracing::error!(error = %err, "primary message failed");
			return Ok(MailOutcome::failed(&err));
		}
		tracing::info!(recipients = job.recipients.len(), "primary message sent");

		let (ar_message, ar_sent) = match (&job.autoresponder, &job.reply_to) {
			(Some(autoresponder), Some(reply_to)) => {
				match self
					.send_autoresponder(job, autoresponder, reply_to, &renderer, &template)
					.await
				{
					Ok(()) => {
						tracing::info!("autoresponder sent");
						(AUTORESPONDER_SENT.to_string(), true)
					}
					Err(err) => {
						tracing::warn!(error = %err, "autoresponder failed");
						(format!("Autoresponder error: {err}"), false)
					}
				}
			}
			_ => (NO_AUTORESPONDER.to_string(), false),
		};

		Ok(MailOutcome {
			success: true,
			message: format!("{PRIMARY_SENT} | {ar_message}"),
			autoresponder_sent: ar_sent,
		})
	}

	async fn send_primary(
		&self,
		job: &MailJob,
		renderer: &TemplateRenderer,
		template: &str,
	) -> EmailResult<()> {
		let attachments = self.attachments(&job.files)?;
		let reply_to = job
			.reply_to
			.as_deref()
			.filter(|address| validate_address(address).is_ok())
			.map(|address| vec![Address::new(address)])
			.unwrap_or_default();

		let message = EmailMessage::builder()
			.from(self.from.clone())
			.to(job.recipients.clone())
			.reply_to(reply_to)
			.subject(renderer.render_subject(&job.subject, &job.data))
			.html(renderer.render(template, &job.data))
			.attachments(attachments)
			.build()?;
		message.send(self.backend.as_ref()).await
	}

	async fn send_autoresponder(
		&self,
		job: &MailJob,
		autoresponder: &AutoresponderConfig,
		reply_to: &str,
		renderer: &TemplateRenderer,
		primary_template: &str,
	) -> EmailResult<()> {
		let template = match &autoresponder.template {
			Some(source) => source.load()?,
			None if autoresponder.include_original => strip_message_block(primary_template),
			None => return Err(EmailError::MissingAutoresponderTemplate),
		};
		let subject = autoresponder
			.subject
			.as_deref()
			.unwrap_or(DEFAULT_AUTORESPONDER_SUBJECT);

		let message = EmailMessage::builder()
			.from(self.from.clone())
			.to(vec![Address::new(reply_to)])
			.subject(renderer.render_subject(subject, &job.data))
			.html(renderer.render(&template, &job.data))
			.build()?;
		message.send(self.backend.as_ref()).await
	}

	fn attachments(&self, files: &[UploadDescriptor]) -> EmailResult<Vec<Attachment>> {
		files
			.iter()
			.map(|file| {
				let extension = crate::message::file_extension(&file.name);
				if !self
					.allowed_extensions
					.iter()
					.any(|allowed| allowed.eq_ignore_ascii_case(&extension))
				{
					return Err(EmailError::InvalidFileType(extension));
				}
				let attachment = Attachment::from_path(&file.tmp_path, file.name.clone())
					.map_err(|_| EmailError::InvalidUpload)?;
				Ok(if file.mime_type.is_empty() {
					attachment
				} else {
					attachment.with_mime_type(file.mime_type.clone())
				})
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backends::MemoryBackend;
	use rstest::{fixture, rstest};
	use std::io::Write;

	#[fixture]
	fn backend() -> MemoryBackend {
		MemoryBackend::new()
	}

	fn composer(backend: &MemoryBackend) -> MailComposer {
		MailComposer::new(
			Arc::new(backend.clone()),
			Address::named("noreply@example.com", "Conference"),
		)
	}

	fn job() -> MailJob {
		MailJob::new(vec![Address::new("office@example.com")])
			.subject("Submission: %person-first-name%")
			.template("<p>%person-first-name%</p><div class=\"message\"><p>%message%</p></div>")
			.reply_to("ada@example.com")
			.data(
				FormSnapshot::new()
					.with("person-first-name", "Ada")
					.with("message", "<b>x</b>"),
			)
	}

	#[rstest]
	#[tokio::test]
	async fn test_primary_only_without_autoresponder(backend: MemoryBackend) {
		// Act
		let outcome = composer(&backend).compose(&job()).await.unwrap();

		// Assert
		assert_eq!(
			outcome,
			MailOutcome {
				success: true,
				message: "Email sent successfully | No autoresponder configured".into(),
				autoresponder_sent: false,
			}
		);
		let sent = backend.sent_messages();
		assert_eq!(sent.len(), 1);
		assert_eq!(sent[0].subject(), "Submission: Ada");
		assert!(sent[0].html_body().contains("&lt;b&gt;x&lt;/b&gt;"));
		assert_eq!(sent[0].reply_to()[0].email(), "ada@example.com");
	}

	#[rstest]
	#[tokio::test]
	async fn test_html_fields_are_inserted_verbatim(backend: MemoryBackend) {
		// Arrange
		let job = job().html_fields(["message"]);

		// Act
		composer(&backend).compose(&job).await.unwrap();

		// Assert
		assert!(backend.sent_messages()[0].html_body().contains("<p><b>x</b></p>"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_autoresponder_goes_to_submitter(backend: MemoryBackend) {
		// Arrange
		let job = job().autoresponder(
			AutoresponderConfig::default().template("<p>Thanks, %person-first-name%!</p>"),
		);

		// Act
		let outcome = composer(&backend).compose(&job).await.unwrap();

		// Assert
		assert!(outcome.success);
		assert!(outcome.autoresponder_sent);
		assert_eq!(outcome.message, "Email sent successfully | Autoresponder sent");
		let sent = backend.sent_messages();
		assert_eq!(sent.len(), 2);
		assert_eq!(sent[1].to()[0].email(), "ada@example.com");
		assert_eq!(sent[1].subject(), DEFAULT_AUTORESPONDER_SUBJECT);
		assert_eq!(sent[1].html_body(), "<p>Thanks, Ada!</p>");
	}

	#[rstest]
	#[tokio::test]
	async fn test_blank_reply_to_skips_autoresponder(backend: MemoryBackend) {
		// Arrange
		let job = job()
			.reply_to("   ")
			.autoresponder(AutoresponderConfig::default().template("<p>Thanks</p>"));

		// Act
		let outcome = composer(&backend).compose(&job).await.unwrap();

		// Assert
		assert!(!outcome.autoresponder_sent);
		assert_eq!(backend.count(), 1);
		assert!(backend.sent_messages()[0].reply_to().is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_include_original_strips_message_block(backend: MemoryBackend) {
		// Arrange
		let job = job().autoresponder(
			AutoresponderConfig::default()
				.subject("Thanks %person-first-name%")
				.include_original(true),
		);

		// Act
		let outcome = composer(&backend).compose(&job).await.unwrap();

		// Assert
		assert!(outcome.autoresponder_sent);
		let confirmation = &backend.sent_messages()[1];
		assert_eq!(confirmation.subject(), "Thanks Ada");
		assert_eq!(confirmation.html_body(), "<p>Ada</p>");
	}

	#[rstest]
	#[tokio::test]
	async fn test_autoresponder_without_template_is_reported(backend: MemoryBackend) {
		// Arrange
		let job = job().autoresponder(AutoresponderConfig::default());

		// Act
		let outcome = composer(&backend).compose(&job).await.unwrap();

		// Assert
		assert!(outcome.success);
		assert!(!outcome.autoresponder_sent);
		assert_eq!(
			outcome.message,
			"Email sent successfully | Autoresponder error: No autoresponder template provided"
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_primary_failure_prevents_autoresponder(backend: MemoryBackend) {
		// Arrange
		backend.fail_after(0, "relay down");
		let job = job().autoresponder(AutoresponderConfig::default().template("<p>Thanks</p>"));

		// Act
		let outcome = composer(&backend).compose(&job).await.unwrap();

		// Assert
		assert_eq!(
			outcome,
			MailOutcome {
				success: false,
				message: "Mailer Error: Backend error: relay down".into(),
				autoresponder_sent: false,
			}
		);
		assert_eq!(backend.count(), 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_autoresponder_failure_keeps_primary_success(backend: MemoryBackend) {
		// Arrange
		backend.fail_after(1, "quota exceeded");
		let job = job().autoresponder(AutoresponderConfig::default().template("<p>Thanks</p>"));

		// Act
		let outcome = composer(&backend).compose(&job).await.unwrap();

		// Assert
		assert!(outcome.success);
		assert!(!outcome.autoresponder_sent);
		assert!(outcome.message.contains("quota exceeded"));
		assert_eq!(backend.count(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_template_is_an_error(backend: MemoryBackend) {
		// Arrange
		let job = MailJob::new(vec![Address::new("office@example.com")]);

		// Act
		let result = composer(&backend).compose(&job).await;

		// Assert
		assert!(matches!(result, Err(EmailError::MissingTemplate)));
		assert_eq!(backend.count(), 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_attachments_go_to_primary_only(backend: MemoryBackend) {
		// Arrange
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(b"%PDF-1.4").unwrap();
		let job = job()
			.files(vec![UploadDescriptor {
				name: "poster.pdf".into(),
				size: 8,
				mime_type: "application/pdf".into(),
				extension: "pdf".into(),
				tmp_path: file.path().to_path_buf(),
			}])
			.autoresponder(AutoresponderConfig::default().template("<p>Thanks</p>"));

		// Act
		let outcome = composer(&backend).compose(&job).await.unwrap();

		// Assert
		assert!(outcome.autoresponder_sent);
		let sent = backend.sent_messages();
		assert_eq!(sent[0].attachments().len(), 1);
		assert_eq!(sent[0].attachments()[0].filename(), "poster.pdf");
		assert_eq!(sent[0].attachments()[0].content(), b"%PDF-1.4");
		assert!(sent[1].attachments().is_empty());
	}

	#[rstest]
	#[case("payload.exe", "Mailer Error: Invalid file type: .exe")]
	#[case("poster.pdf", "Mailer Error: Invalid file upload detected")]
	#[tokio::test]
	async fn test_rejected_attachment_fails_primary(
		backend: MemoryBackend,
		#[case] name: &str,
		#[case] expected: &str,
	) {
		// Arrange
		let job = job().files(vec![UploadDescriptor {
			name: name.into(),
			size: 8,
			mime_type: String::new(),
			extension: file_extension_of(name),
			tmp_path: "/nonexistent/formpost-upload".into(),
		}]);

		// Act
		let outcome = composer(&backend).compose(&job).await.unwrap();

		// Assert
		assert!(!outcome.success);
		assert_eq!(outcome.message, expected);
		assert_eq!(backend.count(), 0);
	}

	fn file_extension_of(name: &str) -> String {
		crate::message::file_extension(name)
	}

	#[rstest]
	fn test_outcome_serializes_camel_case() {
		// Arrange
		let outcome = MailOutcome {
			success: true,
			message: "ok".into(),
			autoresponder_sent: true,
		};

		// Act
		let json = serde_json::to_value(&outcome).unwrap();

		// Assert
		assert_eq!(
			json,
			serde_json::json!({"success": true, "message": "ok", "autoresponderSent": true})
		);
	}
}
