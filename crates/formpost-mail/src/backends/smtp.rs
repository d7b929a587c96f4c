use super::EmailBackend;
use crate::message::{Address, EmailMessage};
use crate::{EmailError, EmailResult};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as LettreAttachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

/// Transport security for the SMTP connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SmtpSecurity {
	/// Plain connection, for local relays and test servers
	None,
	/// Upgrade a plain connection with STARTTLS
	#[default]
	StartTls,
	/// TLS from the first byte
	Tls,
}

/// Connection settings for [`SmtpBackend`].
#[derive(Debug, Clone)]
pub struct SmtpConfig {
	pub host: String,
	pub port: u16,
	pub credentials: Option<(String, String)>,
	pub security: SmtpSecurity,
	pub timeout: Option<Duration>,
}

impl SmtpConfig {
	pub fn new(host: impl Into<String>, port: u16) -> Self {
		Self {
			host: host.into(),
			port,
			credentials: None,
			security: SmtpSecurity::default(),
			timeout: None,
		}
	}

	pub fn with_credentials(mut self, username: String, password: String) -> Self {
		self.credentials = Some((username, password));
		self
	}

	pub fn with_security(mut self, security: SmtpSecurity) -> Self {
		self.security = security;
		self
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);
		self
	}
}

/// Delivers messages through an SMTP relay.
pub struct SmtpBackend {
	transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpBackend {
	pub fn new(config: SmtpConfig) -> EmailResult<Self> {
		let builder = match config.security {
			SmtpSecurity::None => {
				AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
			}
			SmtpSecurity::StartTls => {
				AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
					.map_err(|e| EmailError::SmtpError(e.to_string()))?
			}
			SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
				.map_err(|e| EmailError::SmtpError(e.to_string()))?,
		};

		let mut builder = builder.port(config.port).timeout(config.timeout);
		if let Some((username, password)) = config.credentials {
			builder = builder.credentials(Credentials::new(username, password));
		}

		Ok(Self {
			transport: builder.build(),
		})
	}

	fn to_lettre(message: &EmailMessage) -> EmailResult<Message> {
		let mut builder = Message::builder()
			.from(mailbox(message.from())?)
			.subject(message.subject());
		for address in message.to() {
			builder = builder.to(mailbox(address)?);
		}
		for address in message.reply_to() {
			builder = builder.reply_to(mailbox(address)?);
		}

		let body = MultiPart::alternative_plain_html(
			message.text_body().to_string(),
			message.html_body().to_string(),
		);

		let built = if message.attachments().is_empty() {
			builder.multipart(body)
		} else {
			let mut mixed = MultiPart::mixed().multipart(body);
			for attachment in message.attachments() {
				let content_type = ContentType::parse(attachment.mime_type())
					.map_err(|e| EmailError::AttachmentError(e.to_string()))?;
				mixed = mixed.singlepart(
					LettreAttachment::new(attachment.filename().to_string())
						.body(attachment.content().to_vec(), content_type),
				);
			}
			builder.multipart(mixed)
		};

		built.map_err(|e| EmailError::BackendError(e.to_string()))
	}
}

fn mailbox(address: &Address) -> EmailResult<Mailbox> {
	let email = address
		.email()
		.parse()
		.map_err(|_| EmailError::InvalidAddress(address.email().to_string()))?;
	Ok(Mailbox::new(address.name().map(str::to_string), email))
}

#[async_trait]
impl EmailBackend for SmtpBackend {
	async fn send_messages(&self, messages: &[EmailMessage]) -> EmailResult<usize> {
		let mut sent = 0;
		for message in messages {
			let email = Self::to_lettre(message)?;
			self.transport
				.send(email)
				.await
				.map_err(|e| EmailError::SmtpError(e.to_string()))?;
			tracing::info!(subject = %message.subject(), recipients = message.to().len(), "mail sent via smtp");
			sent += 1;
		}
		Ok(sent)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::message::Attachment;
	use rstest::rstest;

	#[rstest]
	fn test_to_lettre_includes_recipients_and_attachment() {
		// Arrange
		let message = EmailMessage::builder()
			.from(Address::named("noreply@example.com", "Conference"))
			.to(vec![
				Address::named("office@example.com", "Office"),
				Address::new("chair@example.com"),
			])
			.reply_to(vec![Address::new("ada@example.com")])
			.subject("Submission: Ada")
			.html("<p>Hello</p>")
			.attachment(Attachment::new("poster.pdf", b"%PDF".to_vec()))
			.build()
			.unwrap();

		// Act
		let email = SmtpBackend::to_lettre(&message).unwrap();
		let raw = String::from_utf8_lossy(&email.formatted()).to_string();

		// Assert
		assert!(raw.contains("Subject: Submission: Ada"));
		assert!(raw.contains("chair@example.com"));
		assert!(raw.contains("Reply-To: ada@example.com"));
		assert!(raw.contains("poster.pdf"));
		assert!(raw.contains("multipart/alternative"));
	}
}
