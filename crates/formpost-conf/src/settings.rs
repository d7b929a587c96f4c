//! Settings structures
//!
//! Every section has defaults, so an empty file only needs its `[[forms]]`
//! entries.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root settings for the formpost server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
	/// HTTP listener configuration
	#[serde(default)]
	pub server: ServerSettings,

	/// Outgoing mail configuration
	#[serde(default)]
	pub email: EmailSettings,

	/// One entry per submission endpoint
	#[serde(default)]
	pub forms: Vec<FormEndpointSettings>,
}

impl Settings {
	/// Endpoint configured for `path`.
	pub fn form(&self, path: &str) -> Option<&FormEndpointSettings> {
		self.forms.iter().find(|form| form.path == path)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
	#[serde(default = "default_bind")]
	pub bind: String,

	/// Largest request body accepted, in bytes
	#[serde(default = "default_max_body_bytes")]
	pub max_body_bytes: u64,
}

fn default_bind() -> String {
	"127.0.0.1:8080".to_string()
}

fn default_max_body_bytes() -> u64 {
	16 * 1024 * 1024
}

impl Default for ServerSettings {
	fn default() -> Self {
		Self {
			bind: default_bind(),
			max_body_bytes: default_max_body_bytes(),
		}
	}
}

/// Which mail backend delivers messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailBackendKind {
	Smtp,
	#[default]
	Console,
	Memory,
}

/// Transport security for SMTP connections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurityKind {
	None,
	#[default]
	StartTls,
	Tls,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSettings {
	#[serde(default)]
	pub backend: EmailBackendKind,
	#[serde(default = "default_host")]
	pub host: String,
	#[serde(default = "default_port")]
	pub port: u16,
	#[serde(default)]
	pub username: Option<String>,
	#[serde(default)]
	pub password: Option<String>,
	#[serde(default)]
	pub security: SmtpSecurityKind,
	#[serde(default = "default_from_email")]
	pub from_email: String,
	#[serde(default)]
	pub from_name: Option<String>,
	/// Connection timeout in seconds
	#[serde(default)]
	pub timeout: Option<u64>,
	/// Extensions an attachment may carry when the message is sent
	#[serde(default = "default_attachment_extensions")]
	pub allowed_extensions: Vec<String>,
}

fn default_host() -> String {
	"localhost".to_string()
}

fn default_port() -> u16 {
	587
}

fn default_from_email() -> String {
	"noreply@localhost".to_string()
}

fn default_attachment_extensions() -> Vec<String> {
	["pdf", "doc", "docx", "jpg", "jpeg", "png"]
		.into_iter()
		.map(String::from)
		.collect()
}

impl Default for EmailSettings {
	fn default() -> Self {
		Self {
			backend: EmailBackendKind::default(),
			host: default_host(),
			port: default_port(),
			username: None,
			password: None,
			security: SmtpSecurityKind::default(),
			from_email: default_from_email(),
			from_name: None,
			timeout: None,
			allowed_extensions: default_attachment_extensions(),
		}
	}
}

/// A recipient of the primary notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientSettings {
	pub email: String,
	#[serde(default)]
	pub name: Option<String>,
}

/// Autoresponder sent back to the submitter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoresponderSettings {
	#[serde(default)]
	pub subject: Option<String>,
	#[serde(default)]
	pub template: Option<PathBuf>,
	/// Fall back to a copy of the primary message when no template is set
	#[serde(default)]
	pub include_original: bool,
}

/// Aggregation of `<base>1`, `<base>2`, ... fields into one HTML field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumberedFieldSettings {
	pub base: String,
	pub target: String,
	#[serde(default = "default_heading")]
	pub heading: String,
}

fn default_heading() -> String {
	"Author".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSettings {
	/// Multipart field carrying the files
	#[serde(default = "default_upload_field")]
	pub field: String,
	#[serde(default = "default_max_files")]
	pub max_files: usize,
	#[serde(default = "default_max_file_size_mb")]
	pub max_file_size_mb: f64,
	#[serde(default = "default_upload_extensions")]
	pub allowed_extensions: Vec<String>,
	/// Render `documents`, `filename`, `filesize` and `filetype` fields
	#[serde(default = "default_true")]
	pub file_info: bool,
}

fn default_upload_field() -> String {
	"documents".to_string()
}

fn default_max_files() -> usize {
	5
}

fn default_max_file_size_mb() -> f64 {
	2.0
}

fn default_upload_extensions() -> Vec<String> {
	["jpg", "jpeg", "png", "pdf", "doc", "docx"]
		.into_iter()
		.map(String::from)
		.collect()
}

fn default_true() -> bool {
	true
}

impl Default for UploadSettings {
	fn default() -> Self {
		Self {
			field: default_upload_field(),
			max_files: default_max_files(),
			max_file_size_mb: default_max_file_size_mb(),
			allowed_extensions: default_upload_extensions(),
			file_info: true,
		}
	}
}

/// One submission endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormEndpointSettings {
	/// Request path, e.g. `/submit`
	pub path: String,
	#[serde(default)]
	pub recipients: Vec<RecipientSettings>,
	/// Field holding the submitter's address
	#[serde(default = "default_reply_to_field")]
	pub reply_to_field: String,
	/// `%token%` template for the primary subject
	#[serde(default = "default_subject")]
	pub subject: String,
	/// Primary message template
	#[serde(default)]
	pub template: Option<PathBuf>,
	#[serde(default)]
	pub autoresponder: Option<AutoresponderSettings>,
	/// Fields inserted into templates without escaping
	#[serde(default)]
	pub html_fields: Vec<String>,
	#[serde(default)]
	pub numbered_fields: Vec<NumberedFieldSettings>,
	#[serde(default)]
	pub uploads: Option<UploadSettings>,
}

fn default_reply_to_field() -> String {
	"person-email".to_string()
}

fn default_subject() -> String {
	"New form submission".to_string()
}

impl FormEndpointSettings {
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			recipients: Vec::new(),
			reply_to_field: default_reply_to_field(),
			subject: default_subject(),
			template: None,
			autoresponder: None,
			html_fields: Vec::new(),
			numbered_fields: Vec::new(),
			uploads: None,
		}
	}

	/// Template files this endpoint reads at request time.
	pub fn template_paths(&self) -> Vec<&PathBuf> {
		let mut paths: Vec<&PathBuf> = self.template.iter().collect();
		if let Some(template) = self.autoresponder.as_ref().and_then(|ar| ar.template.as_ref()) {
			paths.push(template);
		}
		paths
	}
}
