//! # formpost-server
//!
//! HTTP endpoint for form submissions. Each configured form path accepts a
//! multipart POST, validates its uploads, aggregates numbered fields and
//! file details into template fields, and sends the notification mail
//! (plus the optional autoresponder). Responses are JSON:
//!
//! ```json
//! { "success": true, "message": "Email sent successfully | Autoresponder sent", "autoresponderSent": true }
//! ```
//!
//! | status | when |
//! |---|---|
//! | 200 | primary message sent |
//! | 400 | request or upload errors, missing templates (support message) |
//! | 404 | no form configured at the path |
//! | 405 | anything but POST |
//! | 413 | body larger than `server.max_body_bytes` |
//! | 502 | the mail backend refused the primary message |

pub mod handler;
pub mod multipart;
pub mod server;

use thiserror::Error;

pub use handler::{FormHandler, SubmissionRequest, SubmissionResponse};
pub use multipart::{ParsedSubmission, parse_multipart};
pub use server::{HttpServer, serve};

#[derive(Debug, Error)]
pub enum ServerError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Invalid request body: {0}")]
	InvalidBody(String),

	#[error("Unsupported content type: {0}")]
	UnsupportedContentType(String),

	#[error("HTTP error: {0}")]
	Http(String),
}

pub type ServerResult<T> = std::result::Result<T, ServerError>;

impl From<multer::Error> for ServerError {
	fn from(err: multer::Error) -> Self {
		ServerError::InvalidBody(err.to_string())
	}
}

impl From<ServerError> for formpost_core::Error {
	fn from(err: ServerError) -> Self {
		match err {
			ServerError::Io(err) => formpost_core::Error::Config(err.to_string()),
			err => formpost_core::Error::Transport(err.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(ServerError::InvalidBody("truncated".into()), "Invalid request body: truncated")]
	#[case(ServerError::UnsupportedContentType("text/plain".into()), "Unsupported content type: text/plain")]
	#[case(ServerError::Http("connection reset".into()), "HTTP error: connection reset")]
	fn test_request_errors_become_transport_errors(#[case] err: ServerError, #[case] expected: &str) {
		// Act
		let converted = formpost_core::Error::from(err);

		// Assert
		assert!(matches!(converted, formpost_core::Error::Transport(ref m) if m == expected));
		assert_eq!(converted.user_message(), expected);
	}

	#[rstest]
	fn test_storage_failure_shows_support_message() {
		// Arrange
		let err = ServerError::Io(std::io::Error::other("disk full"));

		// Act
		let converted = formpost_core::Error::from(err);

		// Assert
		assert!(matches!(converted, formpost_core::Error::Config(_)));
		assert_eq!(converted.user_message(), formpost_core::exception::SUPPORT_MESSAGE);
	}
}
