//! Upload validation
//!
//! Uploaded files arrive as a named multi-file field in the parallel-array
//! representation (one array each for names, types, sizes, error codes and
//! temporary paths). [`validate_uploads`] enforces count, size and extension
//! limits before any file is attached to mail.

use crate::message::file_extension;
use crate::{EmailError, EmailResult};
use formpost_conf::UploadSettings;
use std::fmt;
use std::path::PathBuf;

/// Transport status of one uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadErrorCode {
	Ok,
	IniSize,
	FormSize,
	Partial,
	NoFile,
	NoTmpDir,
	CantWrite,
	Extension,
	Unknown(u8),
}

impl UploadErrorCode {
	/// Map the conventional numeric code.
	pub fn from_code(code: u8) -> Self {
		match code {
			0 => UploadErrorCode::Ok,
			1 => UploadErrorCode::IniSize,
			2 => UploadErrorCode::FormSize,
			3 => UploadErrorCode::Partial,
			4 => UploadErrorCode::NoFile,
			6 => UploadErrorCode::NoTmpDir,
			7 => UploadErrorCode::CantWrite,
			8 => UploadErrorCode::Extension,
			other => UploadErrorCode::Unknown(other),
		}
	}

	pub fn is_ok(self) -> bool {
		self == UploadErrorCode::Ok
	}

	pub fn message(self) -> &'static str {
		match self {
			UploadErrorCode::Ok => "There is no error, the file uploaded with success",
			UploadErrorCode::IniSize => {
				"The uploaded file exceeds the upload_max_filesize directive in php.ini"
			}
			UploadErrorCode::FormSize => {
				"The uploaded file exceeds the MAX_FILE_SIZE directive that was specified in the HTML form"
			}
			UploadErrorCode::Partial => "The uploaded file was only partially uploaded",
			UploadErrorCode::NoFile => "No file was uploaded",
			UploadErrorCode::NoTmpDir => "Missing a temporary folder",
			UploadErrorCode::CantWrite => "Failed to write file to disk",
			UploadErrorCode::Extension => "A PHP extension stopped the file upload",
			UploadErrorCode::Unknown(_) => "Unknown upload error",
		}
	}
}

impl fmt::Display for UploadErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.message())
	}
}

/// One slot of an upload field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadEntry {
	pub name: String,
	pub mime_type: String,
	pub size: u64,
	pub error: UploadErrorCode,
	pub tmp_path: PathBuf,
}

/// An upload field in parallel-array form.
///
/// # Examples
///
/// ```
/// use formpost_mail::upload::{UploadBatch, UploadErrorCode};
///
/// let mut batch = UploadBatch::default();
/// batch.push("poster.jpg", "image/jpeg", 1024, UploadErrorCode::Ok, "/tmp/a");
/// batch.push("", "", 0, UploadErrorCode::NoFile, "");
///
/// let entries = batch.entries();
/// assert_eq!(entries.len(), 2);
/// assert_eq!(entries[0].name, "poster.jpg");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadBatch {
	pub names: Vec<String>,
	pub types: Vec<String>,
	pub sizes: Vec<u64>,
	pub errors: Vec<UploadErrorCode>,
	pub tmp_paths: Vec<PathBuf>,
}

impl UploadBatch {
	pub fn push(
		&mut self,
		name: impl Into<String>,
		mime_type: impl Into<String>,
		size: u64,
		error: UploadErrorCode,
		tmp_path: impl Into<PathBuf>,
	) {
		self.names.push(name.into());
		self.types.push(mime_type.into());
		self.sizes.push(size);
		self.errors.push(error);
		self.tmp_paths.push(tmp_path.into());
	}

	/// Zip the arrays into entries. Missing trailing values default to empty,
	/// zero and [`UploadErrorCode::NoFile`].
	pub fn entries(&self) -> Vec<UploadEntry> {
		(0..self.names.len())
			.map(|i| UploadEntry {
				name: self.names[i].clone(),
				mime_type: self.types.get(i).cloned().unwrap_or_default(),
				size: self.sizes.get(i).copied().unwrap_or(0),
				error: self.errors.get(i).copied().unwrap_or(UploadErrorCode::NoFile),
				tmp_path: self.tmp_paths.get(i).cloned().unwrap_or_default(),
			})
			.collect()
	}

	pub fn is_empty(&self) -> bool {
		self.names.iter().all(|name| name.is_empty())
	}
}

impl FromIterator<UploadEntry> for UploadBatch {
	fn from_iter<I: IntoIterator<Item = UploadEntry>>(iter: I) -> Self {
		let mut batch = UploadBatch::default();
		for entry in iter {
			batch.push(entry.name, entry.mime_type, entry.size, entry.error, entry.tmp_path);
		}
		batch
	}
}

/// A file that passed validation. Its bytes stay at `tmp_path` for the
/// lifetime of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDescriptor {
	pub name: String,
	pub size: u64,
	pub mime_type: String,
	pub extension: String,
	pub tmp_path: PathBuf,
}

impl UploadDescriptor {
	/// Size in megabytes, e.g. `1.50 MB`.
	pub fn display_size(&self) -> String {
		format!("{:.2} MB", self.size as f64 / (1024.0 * 1024.0))
	}
}

/// Limits applied by [`validate_uploads`].
#[derive(Debug, Clone, PartialEq)]
pub struct UploadLimits {
	pub max_files: usize,
	pub max_file_size_mb: f64,
	pub allowed_extensions: Vec<String>,
}

impl Default for UploadLimits {
	fn default() -> Self {
		Self {
			max_files: 5,
			max_file_size_mb: 2.0,
			allowed_extensions: ["jpg", "jpeg", "png", "pdf", "doc", "docx"]
				.into_iter()
				.map(String::from)
				.collect(),
		}
	}
}

impl UploadLimits {
	pub fn max_bytes(&self) -> u64 {
		(self.max_file_size_mb * 1024.0 * 1024.0) as u64
	}

	fn allows(&self, extension: &str) -> bool {
		self.allowed_extensions
			.iter()
			.any(|allowed| allowed.eq_ignore_ascii_case(extension))
	}
}

impl From<&UploadSettings> for UploadLimits {
	fn from(settings: &UploadSettings) -> Self {
		Self {
			max_files: settings.max_files,
			max_file_size_mb: settings.max_file_size_mb,
			allowed_extensions: settings.allowed_extensions.clone(),
		}
	}
}

/// Outcome of validating an upload field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadReport {
	pub accepted: Vec<UploadDescriptor>,
	pub errors: Vec<String>,
}

impl UploadReport {
	pub fn is_valid(&self) -> bool {
		self.errors.is_empty()
	}

	/// Accepted files, or every error as one [`EmailError::Upload`].
	pub fn into_result(self) -> EmailResult<Vec<UploadDescriptor>> {
		if self.errors.is_empty() {
			Ok(self.accepted)
		} else {
			Err(EmailError::Upload(self.errors))
		}
	}
}

/// Validate the entries of an upload field.
///
/// - no non-empty entry: valid, nothing accepted
/// - more non-empty entries than `max_files`: one aggregate error, no
///   per-file checks
/// - otherwise every non-empty entry is checked for its transport status,
///   size (over the limit or zero bytes) and extension; all errors are
///   reported and files with an error are left out
///
/// # Examples
///
/// ```
/// use formpost_mail::upload::{validate_uploads, UploadEntry, UploadErrorCode, UploadLimits};
///
/// let entries: Vec<UploadEntry> = (1..=6)
///     .map(|i| UploadEntry {
///         name: format!("photo{i}.jpg"),
///         mime_type: "image/jpeg".into(),
///         size: 1000,
///         error: UploadErrorCode::Ok,
///         tmp_path: format!("/tmp/{i}").into(),
///     })
///     .collect();
///
/// let report = validate_uploads(&entries, &UploadLimits::default());
/// assert_eq!(report.errors, vec!["Maximum 5 files allowed (you uploaded 6)"]);
/// assert!(report.accepted.is_empty());
/// ```
pub fn validate_uploads(entries: &[UploadEntry], limits: &UploadLimits) -> UploadReport {
	let present: Vec<&UploadEntry> = entries.iter().filter(|e| !e.name.is_empty()).collect();
	let mut report = UploadReport::default();

	if present.is_empty() {
		return report;
	}

	if present.len() > limits.max_files {
		report.errors.push(format!(
			"Maximum {} files allowed (you uploaded {})",
			limits.max_files,
			present.len()
		));
		tracing::warn!(count = present.len(), max = limits.max_files, "too many files uploaded");
		return report;
	}

	for entry in present {
		if !entry.error.is_ok() {
			report.errors.push(format!(
				"File \"{}\" upload error: {}",
				entry.name, entry.error
			));
			continue;
		}
		if entry.size > limits.max_bytes() {
			report.errors.push(format!(
				"File \"{}\" exceeds {:.1}MB limit",
				entry.name, limits.max_file_size_mb
			));
			continue;
		}
		if entry.size == 0 {
			report.errors.push(format!("File \"{}\" is empty", entry.name));
			continue;
		}
		let extension = file_extension(&entry.name);
		if !limits.allows(&extension) {
			report.errors.push(format!(
				"File \"{}\" has invalid extension (.{}). Allowed: {}",
				entry.name,
				extension,
				limits.allowed_extensions.join(", ")
			));
			continue;
		}

		report.accepted.push(UploadDescriptor {
			name: entry.name.clone(),
			size: entry.size,
			mime_type: entry.mime_type.clone(),
			extension,
			tmp_path: entry.tmp_path.clone(),
		});
	}

	if !report.errors.is_empty() {
		tracing::warn!(errors = report.errors.len(), "upload validation failed");
	}
	report
}
