//! # formpost-conf
//!
//! Settings for the formpost server.
//!
//! Settings are read from a TOML file, then `FORMPOST_*` environment
//! variables override the SMTP connection, sender address and bind address.
//! [`Settings::validate`] catches deployment defects (missing templates,
//! endpoints without recipients, duplicate paths) before the server starts.
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:8080"
//!
//! [email]
//! backend = "smtp"
//! host = "smtp.example.com"
//! from_email = "conference@example.com"
//! from_name = "Conference 2025"
//!
//! [[forms]]
//! path = "/submit"
//! subject = "Submission: %person-first-name% %person-last-name%"
//! autoresponder = { subject = "Thank you for your submission", template = "submit.html" }
//! html_fields = ["authors", "documents"]
//! numbered_fields = [{ base = "abstract-author", target = "authors" }]
//! recipients = [{ email = "office@example.com", name = "Office" }]
//!
//! [forms.uploads]
//! max_files = 5
//! allowed_extensions = ["jpg", "jpeg"]
//! ```

pub mod settings;
pub mod sources;

use thiserror::Error;

pub use settings::{
	AutoresponderSettings, EmailBackendKind, EmailSettings, FormEndpointSettings,
	NumberedFieldSettings, RecipientSettings, ServerSettings, Settings, SmtpSecurityKind,
	UploadSettings,
};

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("Failed to read {path}: {source}")]
	Io {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("TOML error: {0}")]
	Parse(#[from] toml::de::Error),

	#[error("Invalid setting: {0}")]
	Invalid(String),

	#[error("Template not found: {0}")]
	MissingTemplate(String),

	#[error("No recipients configured for {0}")]
	NoRecipients(String),

	#[error("Duplicate form path: {0}")]
	DuplicatePath(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl From<ConfigError> for formpost_core::Error {
	fn from(err: ConfigError) -> Self {
		formpost_core::Error::Config(err.to_string())
	}
}
