//! Mail delivery backends
//!
//! - [`SmtpBackend`]: delivery through an SMTP relay (lettre)
//! - [`ConsoleBackend`]: prints messages to stdout, for development
//! - [`MemoryBackend`]: keeps messages in memory, for tests

mod console;
mod memory;
mod smtp;

pub use console::ConsoleBackend;
pub use memory::MemoryBackend;
pub use smtp::{SmtpBackend, SmtpConfig, SmtpSecurity};

use crate::EmailResult;
use crate::message::EmailMessage;
use async_trait::async_trait;
use formpost_conf::{EmailBackendKind, EmailSettings, SmtpSecurityKind};
use std::sync::Arc;
use std::time::Duration;

/// Something that can deliver email messages.
#[async_trait]
pub trait EmailBackend: Send + Sync {
	/// Deliver `messages` in order, returning how many were sent.
	///
	/// Delivery stops at the first failure.
	async fn send_messages(&self, messages: &[EmailMessage]) -> EmailResult<usize>;
}

/// Build the backend selected by `settings`.
pub fn backend_from_settings(settings: &EmailSettings) -> EmailResult<Arc<dyn EmailBackend>> {
	match settings.backend {
		EmailBackendKind::Smtp => {
			let security = match settings.security {
				SmtpSecurityKind::None => SmtpSecurity::None,
				SmtpSecurityKind::StartTls => SmtpSecurity::StartTls,
				SmtpSecurityKind::Tls => SmtpSecurity::Tls,
			};
			let mut config = SmtpConfig::new(&settings.host, settings.port).with_security(security);
			if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
				config = config.with_credentials(username.clone(), password.clone());
			}
			if let Some(timeout) = settings.timeout {
				config = config.with_timeout(Duration::from_secs(timeout));
			}
			Ok(Arc::new(SmtpBackend::new(config)?))
		}
		EmailBackendKind::Console => Ok(Arc::new(ConsoleBackend)),
		EmailBackendKind::Memory => Ok(Arc::new(MemoryBackend::new())),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(EmailBackendKind::Console)]
	#[case(EmailBackendKind::Memory)]
	#[case(EmailBackendKind::Smtp)]
	#[tokio::test]
	async fn test_backend_from_settings(#[case] kind: EmailBackendKind) {
		// Arrange
		let settings = EmailSettings {
			backend: kind,
			username: Some("user".into()),
			password: Some("pass".into()),
			timeout: Some(5),
			..EmailSettings::default()
		};

		// Act
		let backend = backend_from_settings(&settings);

		// Assert
		assert!(backend.is_ok());
	}
}
