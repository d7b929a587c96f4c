//! Multipart submission parsing
//!
//! Text parts become snapshot fields; repeated names merge into a list the
//! way checkbox groups are collected on the client. File parts are written
//! to a per-request temporary directory and recorded per field as an
//! [`UploadBatch`]. A trailing `[]` on a part name is dropped, so
//! `documents[]` and `documents` address the same field.

use crate::{ServerError, ServerResult};
use bytes::Bytes;
use formpost_core::FormSnapshot;
use formpost_mail::{UploadBatch, UploadErrorCode};
use futures_util::future::ready;
use futures_util::stream::once;
use std::collections::HashMap;
use std::path::Path;
use tempfile::TempDir;

/// A parsed request body. Uploaded bytes live as long as this value.
#[derive(Debug)]
pub struct ParsedSubmission {
	pub fields: FormSnapshot,
	uploads: HashMap<String, UploadBatch>,
	storage: TempDir,
}

impl ParsedSubmission {
	/// Files sent under `field`; empty when there were none.
	pub fn uploads(&self, field: &str) -> UploadBatch {
		self.uploads.get(field).cloned().unwrap_or_default()
	}

	pub fn storage_dir(&self) -> &Path {
		self.storage.path()
	}
}

fn field_name(raw: &str) -> &str {
	raw.strip_suffix("[]").unwrap_or(raw)
}

/// Parse a `multipart/form-data` body.
pub async fn parse_multipart(content_type: &str, body: Bytes) -> ServerResult<ParsedSubmission> {
	if !content_type.starts_with("multipart/form-data") {
		return Err(ServerError::UnsupportedContentType(content_type.to_string()));
	}
	let boundary = multer::parse_boundary(content_type)?;
	let stream = once(ready(Ok::<_, std::io::Error>(body)));
	let mut multipart = multer::Multipart::new(stream, boundary);

	let storage = tempfile::Builder::new().prefix("formpost-").tempdir()?;
	let mut fields = FormSnapshot::new();
	let mut uploads: HashMap<String, UploadBatch> = HashMap::new();
	let mut stored = 0usize;

	while let Some(field) = multipart.next_field().await? {
		let Some(name) = field.name().map(|n| field_name(n).to_string()) else {
			return Err(ServerError::InvalidBody("Field name missing".into()));
		};

		match field.file_name().map(str::to_string) {
			Some(file_name) => {
				let mime_type = field
					.content_type()
					.map(|m| m.to_string())
					.unwrap_or_default();
				let content = field.bytes().await?;
				let batch = uploads.entry(name).or_default();

				if file_name.is_empty() && content.is_empty() {
					batch.push("", "", 0, UploadErrorCode::NoFile, "");
					continue;
				}
				stored += 1;
				let path = storage.path().join(format!("upload-{stored}"));
				tokio::fs::write(&path, &content).await?;
				batch.push(
					file_name,
					mime_type,
					content.len() as u64,
					UploadErrorCode::Ok,
					path,
				);
			}
			None => {
				let value = field.text().await?;
				match fields.get_mut(&name) {
					Some(existing) => existing.push(value),
					None => fields.insert(name, value),
				}
			}
		}
	}

	tracing::debug!(fields = fields.len(), files = stored, "multipart body parsed");
	Ok(ParsedSubmission {
		fields,
		uploads,
		storage,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use formpost_core::FieldValue;
	use rstest::rstest;

	const BOUNDARY: &str = "X-FORMPOST-BOUNDARY";

	fn content_type() -> String {
		format!("multipart/form-data; boundary={BOUNDARY}")
	}

	fn text_part(name: &str, value: &str) -> String {
		format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
	}

	fn file_part(name: &str, file_name: &str, mime: &str, content: &str) -> String {
		format!(
			"--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n{content}\r\n"
		)
	}

	fn body(parts: &[String]) -> Bytes {
		Bytes::from(format!("{}--{BOUNDARY}--\r\n", parts.concat()))
	}

	#[rstest]
	#[tokio::test]
	async fn test_text_fields_and_repeats() {
		// Arrange
		let body = body(&[
			text_part("person-first-name", "Ada"),
			text_part("workshops", "Workshop 1"),
			text_part("workshops", "Workshop 2"),
			text_part("_referrer", "https://example.com/submit/"),
		]);

		// Act
		let parsed = parse_multipart(&content_type(), body).await.unwrap();

		// Assert
		assert_eq!(parsed.fields.get_str("person-first-name"), Some("Ada"));
		assert_eq!(
			parsed.fields.get("workshops"),
			Some(&FieldValue::List(vec!["Workshop 1".into(), "Workshop 2".into()]))
		);
		assert_eq!(parsed.fields.keys().last(), Some("_referrer"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_files_are_stored_per_field() {
		// Arrange
		let body = body(&[
			file_part("documents[]", "poster.pdf", "application/pdf", "%PDF-1.7"),
			file_part("documents[]", "photo.jpg", "image/jpeg", "JFIF"),
			file_part("cv", "", "application/octet-stream", ""),
		]);

		// Act
		let parsed = parse_multipart(&content_type(), body).await.unwrap();

		// Assert
		let documents = parsed.uploads("documents").entries();
		assert_eq!(documents.len(), 2);
		assert_eq!(documents[0].name, "poster.pdf");
		assert_eq!(documents[0].size, 8);
		assert_eq!(documents[1].mime_type, "image/jpeg");
		assert_eq!(std::fs::read(&documents[0].tmp_path).unwrap(), b"%PDF-1.7");
		assert!(documents[0].tmp_path.starts_with(parsed.storage_dir()));

		let cv = parsed.uploads("cv").entries();
		assert_eq!(cv[0].error, UploadErrorCode::NoFile);
		assert!(parsed.uploads("missing").is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_storage_is_removed_with_submission() {
		// Arrange
		let body = body(&[file_part("documents", "a.pdf", "application/pdf", "x")]);
		let parsed = parse_multipart(&content_type(), body).await.unwrap();
		let path = parsed.uploads("documents").entries()[0].tmp_path.clone();

		// Act
		drop(parsed);

		// Assert
		assert!(!path.exists());
	}

	#[rstest]
	#[case("application/json")]
	#[case("text/plain")]
	#[tokio::test]
	async fn test_other_content_types_are_rejected(#[case] content_type: &str) {
		// Act
		let result = parse_multipart(content_type, Bytes::from_static(b"{}")).await;

		// Assert
		assert!(matches!(result, Err(ServerError::UnsupportedContentType(_))));
	}
}
