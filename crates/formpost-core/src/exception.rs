//! Error taxonomy shared across the formpost crates
//!
//! Each crate keeps its own error type and converts into [`Error`] at the
//! boundary where a message is shown to the submitter.

use thiserror::Error as ThisError;

/// Message shown to end users for deployment defects.
pub const SUPPORT_MESSAGE: &str = "System error. Please contact support.";

/// A required field was left empty.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct ValidationError {
	/// Raw field name as it appears in the snapshot
	pub field: String,
	/// Humanized field name (`person-first-name` → `Person First Name`)
	pub label: String,
	/// Rendered, user-facing message
	pub message: String,
}

#[derive(Debug, ThisError)]
pub enum Error {
	#[error("{0}")]
	Validation(#[from] ValidationError),

	#[error("{0}")]
	Transport(String),

	#[error("Configuration error: {0}")]
	Config(String),

	#[error("{}", .0.join("\n"))]
	Upload(Vec<String>),

	#[error("Mailer Error: {0}")]
	Mail(String),
}

impl Error {
	/// Text safe to show to the submitter.
	///
	/// Configuration errors collapse to [`SUPPORT_MESSAGE`] and are logged with
	/// their detail instead.
	///
	/// # Examples
	///
	/// ```
	/// use formpost_core::exception::{Error, SUPPORT_MESSAGE};
	///
	/// let err = Error::Config("template.html not found".into());
	/// assert_eq!(err.user_message(), SUPPORT_MESSAGE);
	///
	/// let err = Error::Upload(vec!["a".into(), "b".into()]);
	/// assert_eq!(err.user_message(), "a\nb");
	/// ```
	pub fn user_message(&self) -> String {
		match self {
			Error::Config(detail) => {
				tracing::error!(detail = %detail, "configuration error");
				SUPPORT_MESSAGE.to_string()
			}
			other => other.to_string(),
		}
	}

	/// Whether resubmitting the same data could succeed.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Error::Transport(_) | Error::Mail(_))
	}
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_validation_error_displays_message() {
		// Arrange
		let err = ValidationError {
			field: "email".into(),
			label: "Email".into(),
			message: "Email is required!".into(),
		};

		// Act
		let err: Error = err.into();

		// Assert
		assert_eq!(err.user_message(), "Email is required!");
		assert!(!err.is_retryable());
	}

	#[rstest]
	#[case(Error::Transport("Server error".into()), true)]
	#[case(Error::Mail("smtp down".into()), true)]
	#[case(Error::Config("x".into()), false)]
	#[case(Error::Upload(vec![]), false)]
	fn test_is_retryable(#[case] err: Error, #[case] expected: bool) {
		assert_eq!(err.is_retryable(), expected);
	}

	#[rstest]
	fn test_mail_error_prefix() {
		assert_eq!(
			Error::Mail("connection refused".into()).to_string(),
			"Mailer Error: connection refused"
		);
	}
}
