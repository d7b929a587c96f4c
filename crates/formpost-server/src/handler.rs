//! Submission handling
//!
//! [`FormHandler::handle`] is transport-independent: it takes a buffered
//! request and returns a status with a JSON body. Every failure before the
//! mail is sent is answered with `400` and the submitter-facing message.

use crate::multipart::{ParsedSubmission, parse_multipart};
use formpost_conf::{FormEndpointSettings, Settings};
use formpost_core::FormSnapshot;
use formpost_core::html::{escape, strip_message_block};
use formpost_forms::heading_blocks;
use formpost_mail::{
	Address, AutoresponderConfig, EmailBackend, MailComposer, MailJob, MailOutcome,
	TemplateSource, UploadDescriptor, UploadLimits, validate_uploads,
};
use http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use serde_json::{Value, json};
use std::sync::Arc;

/// A fully buffered request.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
	pub method: Method,
	pub path: String,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl SubmissionRequest {
	pub fn post(path: impl Into<String>, content_type: &str, body: impl Into<Bytes>) -> Self {
		let mut headers = HeaderMap::new();
		if let Ok(value) = content_type.parse() {
			headers.insert(http::header::CONTENT_TYPE, value);
		}
		Self {
			method: Method::POST,
			path: path.into(),
			headers,
			body: body.into(),
		}
	}

	fn content_type(&self) -> &str {
		self.headers
			.get(http::header::CONTENT_TYPE)
			.and_then(|v| v.to_str().ok())
			.unwrap_or("")
	}
}

/// Status plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionResponse {
	pub status: StatusCode,
	pub body: Value,
}

impl SubmissionResponse {
	pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
		Self {
			status,
			body: json!({ "success": false, "message": message.into() }),
		}
	}

	fn outcome(outcome: &MailOutcome) -> Self {
		let status = if outcome.success {
			StatusCode::OK
		} else {
			StatusCode::BAD_GATEWAY
		};
		Self {
			status,
			body: serde_json::to_value(outcome).unwrap_or_else(|_| json!({ "success": outcome.success })),
		}
	}

	pub fn success(&self) -> bool {
		self.body["success"].as_bool().unwrap_or(false)
	}

	pub fn message(&self) -> &str {
		self.body["message"].as_str().unwrap_or("")
	}
}

/// Routes submissions to their configured forms and sends the mail.
pub struct FormHandler {
	settings: Arc<Settings>,
	backend: Arc<dyn EmailBackend>,
}

impl FormHandler {
	pub fn new(settings: Arc<Settings>, backend: Arc<dyn EmailBackend>) -> Self {
		Self { settings, backend }
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	pub async fn handle(&self, request: SubmissionRequest) -> SubmissionResponse {
		if request.method != Method::POST {
			return SubmissionResponse::failure(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
		}
		let Some(form) = self.settings.form(&request.path) else {
			return SubmissionResponse::failure(StatusCode::NOT_FOUND, "Not found");
		};

		match self.process(form, &request).await {
			Ok(outcome) => {
				tracing::info!(
					path = %form.path,
					success = outcome.success,
					autoresponder_sent = outcome.autoresponder_sent,
					"submission processed"
				);
				SubmissionResponse::outcome(&outcome)
			}
			Err(err) => {
				tracing::warn!(path = %form.path, error = %err, "submission rejected");
				SubmissionResponse::failure(StatusCode::BAD_REQUEST, err.user_message())
			}
		}
	}

	async fn process(
		&self,
		form: &FormEndpointSettings,
		request: &SubmissionRequest,
	) -> formpost_core::Result<MailOutcome> {
		let parsed = parse_multipart(request.content_type(), request.body.clone()).await?;
		let mut data = parsed.fields.clone();
		let mut html_fields = form.html_fields.clone();

		let files = match &form.uploads {
			Some(uploads) => {
				let files = accepted_uploads(&parsed, uploads)?;
				if uploads.file_info {
					insert_file_info(&mut data, &uploads.field, &files);
					html_fields.push(uploads.field.clone());
				}
				files
			}
			None => Vec::new(),
		};

		for numbered in &form.numbered_fields {
			let blocks = heading_blocks(&data, &numbered.base, &numbered.heading);
			data.insert(numbered.target.clone(), blocks);
			html_fields.push(numbered.target.clone());
		}

		let job = self.job(form, data, files, html_fields)?;
		let composer = MailComposer::new(self.backend.clone(), self.sender())
			.with_allowed_extensions(self.settings.email.allowed_extensions.clone());
		let outcome = composer.compose(&job).await?;
		Ok(outcome)
	}

	fn job(
		&self,
		form: &FormEndpointSettings,
		data: FormSnapshot,
		files: Vec<UploadDescriptor>,
		html_fields: Vec<String>,
	) -> formpost_core::Result<MailJob> {
		let recipients = form
			.recipients
			.iter()
			.map(|r| match &r.name {
				Some(name) => Address::named(&r.email, name),
				None => Address::new(&r.email),
			})
			.collect();

		let mut job = MailJob::new(recipients)
			.subject(form.subject.clone())
			.template(primary_template(form)?)
			.html_fields(html_fields)
			.files(files);
		if let Some(reply_to) = data.get_str(&form.reply_to_field) {
			job = job.reply_to(reply_to);
		}
		if let Some(autoresponder) = &form.autoresponder {
			let mut config = AutoresponderConfig::default().include_original(autoresponder.include_original);
			if let Some(subject) = &autoresponder.subject {
				config = config.subject(subject.clone());
			}
			if let Some(template) = &autoresponder.template {
				config = config.template(template.clone());
			}
			job = job.autoresponder(config);
		}
		Ok(job.data(data))
	}

	fn sender(&self) -> Address {
		let email = &self.settings.email;
		match &email.from_name {
			Some(name) => Address::named(&email.from_email, name),
			None => Address::new(&email.from_email),
		}
	}
}

/// The configured template, or the autoresponder template with its
/// `<div class="message">` block removed.
fn primary_template(form: &FormEndpointSettings) -> formpost_core::Result<TemplateSource> {
	if let Some(template) = &form.template {
		return Ok(TemplateSource::File(template.clone()));
	}
	let Some(path) = form.autoresponder.as_ref().and_then(|ar| ar.template.as_ref()) else {
		return Err(formpost_mail::EmailError::MissingTemplate.into());
	};
	let source = TemplateSource::File(path.clone()).load()?;
	Ok(TemplateSource::Inline(strip_message_block(&source)))
}

fn accepted_uploads(
	parsed: &ParsedSubmission,
	uploads: &formpost_conf::UploadSettings,
) -> formpost_core::Result<Vec<UploadDescriptor>> {
	let batch = parsed.uploads(&uploads.field);
	let report = validate_uploads(&batch.entries(), &UploadLimits::from(uploads));
	Ok(report.into_result()?)
}

/// `<p>name</p>` per file under `field`, plus `filename`, `filesize` and
/// `filetype` describing the first file.
fn insert_file_info(data: &mut FormSnapshot, field: &str, files: &[UploadDescriptor]) {
	let listing: String = files
		.iter()
		.map(|file| format!("<p>{}</p>", escape(&file.name)))
		.collect();
	data.insert(field, listing);

	let first = files.first();
	data.insert("filename", first.map(|f| f.name.clone()).unwrap_or_default());
	data.insert("filesize", first.map(UploadDescriptor::display_size).unwrap_or_default());
	data.insert("filetype", first.map(|f| f.extension.clone()).unwrap_or_default());
}

#[cfg(test)]
mod tests {
	use super::*;
	use formpost_conf::{AutoresponderSettings, NumberedFieldSettings, RecipientSettings, UploadSettings};
	use formpost_mail::MemoryBackend;
	use rstest::{fixture, rstest};
	use std::io::Write;
	use std::path::PathBuf;
	use tempfile::TempDir;

	const BOUNDARY: &str = "X-FORMPOST";
	const TEMPLATE: &str = "<h1>Dear %person-first-name%,</h1>\n<div class=\"message\"><p>Thank you!</p></div>\n<div>%authors%</div>\n<div>%documents%</div>\n<p>%filename% %filesize%</p>";

	struct Endpoint {
		_dir: TempDir,
		handler: FormHandler,
		backend: MemoryBackend,
	}

	fn write_template(dir: &TempDir) -> PathBuf {
		let path = dir.path().join("template.html");
		let mut file = std::fs::File::create(&path).unwrap();
		file.write_all(TEMPLATE.as_bytes()).unwrap();
		path
	}

	#[fixture]
	fn endpoint() -> Endpoint {
		let dir = TempDir::new().unwrap();
		let template = write_template(&dir);

		let mut form = FormEndpointSettings::new("/submit");
		form.recipients = vec![RecipientSettings {
			email: "office@example.com".into(),
			name: Some("Office".into()),
		}];
		form.subject = "Submission: %person-first-name%".into();
		form.autoresponder = Some(AutoresponderSettings {
			subject: Some("Thank you".into()),
			template: Some(template),
			include_original: false,
		});
		form.numbered_fields = vec![NumberedFieldSettings {
			base: "abstract-author".into(),
			target: "authors".into(),
			heading: "Author".into(),
		}];
		form.uploads = Some(UploadSettings::default());

		let mut settings = Settings::default();
		settings.email.from_email = "noreply@example.com".into();
		settings.forms.push(form);

		let backend = MemoryBackend::new();
		let handler = FormHandler::new(Arc::new(settings), Arc::new(backend.clone()));
		Endpoint {
			_dir: dir,
			handler,
			backend,
		}
	}

	fn multipart(texts: &[(&str, &str)], files: &[(&str, &str)]) -> SubmissionRequest {
		let mut body = String::new();
		for (name, value) in texts {
			body.push_str(&format!(
				"--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
			));
		}
		for (file_name, content) in files {
			body.push_str(&format!(
				"--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"documents[]\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{content}\r\n"
			));
		}
		body.push_str(&format!("--{BOUNDARY}--\r\n"));
		SubmissionRequest::post(
			"/submit",
			&format!("multipart/form-data; boundary={BOUNDARY}"),
			body,
		)
	}

	#[rstest]
	#[tokio::test]
	async fn test_non_post_is_rejected(endpoint: Endpoint) {
		// Arrange
		let mut request = SubmissionRequest::post("/submit", "text/plain", "");
		request.method = Method::GET;

		// Act
		let response = endpoint.handler.handle(request).await;

		// Assert
		assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
		assert_eq!(response.body, json!({ "success": false, "message": "Method not allowed" }));
	}

	#[rstest]
	#[tokio::test]
	async fn test_unknown_path_is_not_found(endpoint: Endpoint) {
		// Arrange
		let mut request = multipart(&[], &[]);
		request.path = "/other".into();

		// Act
		let response = endpoint.handler.handle(request).await;

		// Assert
		assert_eq!(response.status, StatusCode::NOT_FOUND);
	}

	#[rstest]
	#[tokio::test]
	async fn test_submission_sends_primary_and_autoresponder(endpoint: Endpoint) {
		// Arrange
		let request = multipart(
			&[
				("person-first-name", "Ada"),
				("person-email", "ada@example.com"),
				("abstract-author2", "Charles <Babbage>"),
				("abstract-author1", "Ada Lovelace"),
			],
			&[("poster.pdf", "%PDF")],
		);

		// Act
		let response = endpoint.handler.handle(request).await;

		// Assert
		assert_eq!(response.status, StatusCode::OK);
		assert!(response.success());
		assert_eq!(response.body["autoresponderSent"], true);

		let sent = endpoint.backend.sent_messages();
		assert_eq!(sent.len(), 2);
		let primary = sent[0].html_body();
		assert!(!primary.contains("Thank you!"));
		assert!(primary.contains(
			"<p><strong>Author 1</strong><br>Ada Lovelace</p><p><strong>Author 2</strong><br>Charles &lt;Babbage&gt;</p>"
		));
		assert!(primary.contains("<div><p>poster.pdf</p></div>"));
		assert!(primary.contains("<p>poster.pdf 0.00 MB</p>"));
		assert_eq!(sent[0].subject(), "Submission: Ada");
		assert_eq!(sent[0].attachments().len(), 1);

		assert!(sent[1].html_body().contains("Thank you!"));
		assert_eq!(sent[1].subject(), "Thank you");
		assert_eq!(sent[1].to()[0].email(), "ada@example.com");
	}

	#[rstest]
	#[tokio::test]
	async fn test_upload_errors_are_joined(endpoint: Endpoint) {
		// Arrange
		let request = multipart(
			&[("person-first-name", "Ada")],
			&[("notes.txt", "x"), ("empty.pdf", "")],
		);

		// Act
		let response = endpoint.handler.handle(request).await;

		// Assert
		assert_eq!(response.status, StatusCode::BAD_REQUEST);
		assert_eq!(
			response.message(),
			"File \"notes.txt\" has invalid extension (.txt). Allowed: jpg, jpeg, png, pdf, doc, docx\nFile \"empty.pdf\" is empty"
		);
		assert_eq!(endpoint.backend.count(), 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_backend_failure_is_bad_gateway(endpoint: Endpoint) {
		// Arrange
		endpoint.backend.fail_after(0, "relay down");
		let request = multipart(&[("person-first-name", "Ada")], &[]);

		// Act
		let response = endpoint.handler.handle(request).await;

		// Assert
		assert_eq!(response.status, StatusCode::BAD_GATEWAY);
		assert!(!response.success());
		assert_eq!(response.message(), "Mailer Error: Backend error: relay down");
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_template_shows_support_message() {
		// Arrange
		let mut form = FormEndpointSettings::new("/submit");
		form.recipients = vec![RecipientSettings {
			email: "office@example.com".into(),
			name: None,
		}];
		form.template = Some("/nonexistent/template.html".into());
		let mut settings = Settings::default();
		settings.forms.push(form);
		let backend = MemoryBackend::new();
		let handler = FormHandler::new(Arc::new(settings), Arc::new(backend.clone()));

		// Act
		let response = handler.handle(multipart(&[("name", "Ada")], &[])).await;

		// Assert
		assert_eq!(response.status, StatusCode::BAD_REQUEST);
		assert_eq!(response.message(), formpost_core::exception::SUPPORT_MESSAGE);
		assert_eq!(backend.count(), 0);
	}
}
