//! Upload validation feeding the composer, with file-based templates

use formpost_core::FormSnapshot;
use formpost_mail::{
	Address, AutoresponderConfig, MailComposer, MailJob, MemoryBackend, TemplateSource,
	UploadBatch, UploadErrorCode, UploadLimits, validate_uploads,
};
use rstest::rstest;
use std::io::Write;
use std::sync::Arc;
use tempfile::TempDir;

const CONFIRMATION: &str = r#"<h1>Dear %person-first-name%,</h1>
<div class="message">
	<p>Thank you for submitting your abstract.</p>
</div>
<p>Title: %abstract-title%</p>
<div>%authors%</div>"#;

fn write(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
	let path = dir.path().join(name);
	let mut file = std::fs::File::create(&path).unwrap();
	file.write_all(content).unwrap();
	path
}

fn submission() -> FormSnapshot {
	FormSnapshot::new()
		.with("person-first-name", "Ada")
		.with("person-email", "ada@example.com")
		.with("abstract-title", "Engines & <Looms>")
		.with("authors", "<p><strong>Author 1</strong><br>Ada</p>")
}

#[rstest]
#[tokio::test]
async fn test_validated_uploads_are_attached_to_primary() {
	// Arrange
	let dir = TempDir::new().unwrap();
	let template = write(&dir, "confirmation.html", CONFIRMATION.as_bytes());
	let poster = write(&dir, "upload-1", b"%PDF-1.7 poster");
	let mut batch = UploadBatch::default();
	batch.push("poster.pdf", "application/pdf", 15, UploadErrorCode::Ok, poster);
	batch.push("", "", 0, UploadErrorCode::NoFile, "");
	let files = validate_uploads(&batch.entries(), &UploadLimits::default())
		.into_result()
		.unwrap();

	let backend = MemoryBackend::new();
	let composer = MailComposer::new(
		Arc::new(backend.clone()),
		Address::new("noreply@example.com"),
	);
	let job = MailJob::new(vec![Address::named("office@example.com", "Office")])
		.subject("New abstract: %abstract-title%")
		.template(TemplateSource::File(template.clone()))
		.reply_to("ada@example.com")
		.html_fields(["authors"])
		.data(submission())
		.files(files)
		.autoresponder(
			AutoresponderConfig::default()
				.subject("Thanks, %person-first-name%")
				.template(TemplateSource::File(template)),
		);

	// Act
	let outcome = composer.compose(&job).await.unwrap();

	// Assert
	assert!(outcome.success);
	assert!(outcome.autoresponder_sent);
	let sent = backend.sent_messages();
	assert_eq!(sent.len(), 2);

	let primary = &sent[0];
	assert_eq!(primary.subject(), "New abstract: Engines & <Looms>");
	assert!(primary.html_body().contains("Title: Engines &amp; &lt;Looms&gt;"));
	assert!(primary.html_body().contains("<strong>Author 1</strong>"));
	assert_eq!(primary.attachments().len(), 1);
	assert_eq!(primary.attachments()[0].content(), b"%PDF-1.7 poster");
	assert!(primary.text_body().contains("Dear Ada,"));
	assert!(!primary.text_body().contains("<h1>"));

	let confirmation = &sent[1];
	assert_eq!(confirmation.subject(), "Thanks, Ada");
	assert!(confirmation.attachments().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_autoresponder_template_file_missing_is_reported() {
	// Arrange
	let backend = MemoryBackend::new();
	let composer = MailComposer::new(
		Arc::new(backend.clone()),
		Address::new("noreply@example.com"),
	);
	let job = MailJob::new(vec![Address::new("office@example.com")])
		.template("<p>%person-first-name%</p>")
		.reply_to("ada@example.com")
		.data(submission())
		.autoresponder(
			AutoresponderConfig::default()
				.template(TemplateSource::File("/nonexistent/confirmation.html".into())),
		);

	// Act
	let outcome = composer.compose(&job).await.unwrap();

	// Assert
	assert!(outcome.success);
	assert!(!outcome.autoresponder_sent);
	assert!(outcome.message.starts_with("Email sent successfully | Autoresponder error: Template error"));
	assert_eq!(backend.count(), 1);
}

#[rstest]
fn test_invalid_uploads_block_the_job() {
	// Arrange
	let mut batch = UploadBatch::default();
	batch.push("notes.txt", "text/plain", 10, UploadErrorCode::Ok, "/tmp/a");
	batch.push("scan.pdf", "application/pdf", 3 * 1024 * 1024, UploadErrorCode::Ok, "/tmp/b");

	// Act
	let err = validate_uploads(&batch.entries(), &UploadLimits::default())
		.into_result()
		.unwrap_err();

	// Assert
	assert_eq!(
		err.to_string(),
		"File \"notes.txt\" has invalid extension (.txt). Allowed: jpg, jpeg, png, pdf, doc, docx\n\
		 File \"scan.pdf\" exceeds 2.0MB limit"
	);
}
