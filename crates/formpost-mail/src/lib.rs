//! # formpost-mail
//!
//! Server-side mail for form submissions.
//!
//! ## Features
//!
//! - **EmailMessage**: HTML message with a derived plain-text alternative,
//!   validated addresses and attachments
//! - **Backends**: SMTP (lettre), console and in-memory delivery
//! - **TemplateRenderer**: `%token%` substitution with per-field escaping and
//!   a raw-HTML allow-list
//! - **MailComposer**: primary notification plus optional autoresponder
//! - **Upload validation**: count, size and extension limits for uploaded files
//!
//! ## Example
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use formpost_core::FormSnapshot;
//! use formpost_mail::{Address, AutoresponderConfig, MailComposer, MailJob, MemoryBackend};
//! use std::sync::Arc;
//!
//! let backend = MemoryBackend::new();
//! let composer = MailComposer::new(Arc::new(backend.clone()), Address::new("noreply@example.com"));
//!
//! let job = MailJob::new(vec![Address::named("office@example.com", "Office")])
//!     .subject("New registration: %person-first-name%")
//!     .template("<p>%person-first-name% registered.</p>")
//!     .reply_to("ada@example.com")
//!     .data(FormSnapshot::new().with("person-first-name", "Ada"))
//!     .autoresponder(AutoresponderConfig::default().template("<p>Thanks, %person-first-name%!</p>"));
//!
//! let outcome = composer.compose(&job).await?;
//! assert!(outcome.success && outcome.autoresponder_sent);
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod composer;
pub mod message;
pub mod templates;
pub mod upload;

use thiserror::Error;

pub use backends::{
	ConsoleBackend, EmailBackend, MemoryBackend, SmtpBackend, SmtpConfig, SmtpSecurity,
	backend_from_settings,
};
pub use composer::{AutoresponderConfig, MailComposer, MailJob, MailOutcome};
pub use message::{Address, Attachment, EmailMessage, EmailMessageBuilder};
pub use templates::{NOT_PROVIDED, TemplateRenderer, TemplateSource};
pub use upload::{
	UploadBatch, UploadDescriptor, UploadEntry, UploadErrorCode, UploadLimits, UploadReport,
	validate_uploads,
};

#[derive(Debug, Error)]
pub enum EmailError {
	#[error("Invalid email address: {0}")]
	InvalidAddress(String),

	#[error("Missing required field: {0}")]
	MissingField(String),

	#[error("Backend error: {0}")]
	BackendError(String),

	#[error("SMTP error: {0}")]
	SmtpError(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),

	#[error("Template error: {0}")]
	TemplateError(String),

	#[error("No template provided")]
	MissingTemplate,

	#[error("No autoresponder template provided")]
	MissingAutoresponderTemplate,

	#[error("Attachment error: {0}")]
	AttachmentError(String),

	#[error("Invalid file type: .{0}")]
	InvalidFileType(String),

	#[error("Invalid file upload detected")]
	InvalidUpload,

	#[error("Header injection attempt detected: {0}")]
	HeaderInjection(String),

	#[error("{}", .0.join("\n"))]
	Upload(Vec<String>),
}

impl EmailError {
	/// Deployment defects rather than delivery problems.
	pub fn is_config(&self) -> bool {
		matches!(
			self,
			EmailError::TemplateError(_) | EmailError::MissingTemplate
		)
	}
}

pub type EmailResult<T> = std::result::Result<T, EmailError>;

impl From<EmailError> for formpost_core::Error {
	fn from(err: EmailError) -> Self {
		match err {
			EmailError::Upload(errors) => formpost_core::Error::Upload(errors),
			err if err.is_config() => formpost_core::Error::Config(err.to_string()),
			err => formpost_core::Error::Mail(err.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use formpost_core::exception::SUPPORT_MESSAGE;
	use rstest::rstest;

	#[rstest]
	fn test_template_errors_become_config_errors() {
		// Act
		let err: formpost_core::Error = EmailError::MissingTemplate.into();

		// Assert
		assert!(matches!(err, formpost_core::Error::Config(_)));
		assert_eq!(err.user_message(), SUPPORT_MESSAGE);
	}

	#[rstest]
	fn test_delivery_errors_become_mail_errors() {
		// Act
		let err: formpost_core::Error = EmailError::SmtpError("timeout".into()).into();

		// Assert
		assert_eq!(err.to_string(), "Mailer Error: SMTP error: timeout");
	}
}
