use super::EmailBackend;
use crate::EmailResult;
use crate::message::EmailMessage;
use async_trait::async_trait;

/// Prints messages to stdout instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleBackend;

impl ConsoleBackend {
	fn render(message: &EmailMessage) -> String {
		let join = |addresses: &[crate::message::Address]| {
			addresses
				.iter()
				.map(ToString::to_string)
				.collect::<Vec<_>>()
				.join(", ")
		};

		let mut out = String::new();
		out.push_str(&format!("Date: {}\n", chrono::Utc::now().to_rfc2822()));
		out.push_str(&format!("From: {}\n", message.from()));
		out.push_str(&format!("To: {}\n", join(message.to())));
		if !message.reply_to().is_empty() {
			out.push_str(&format!("Reply-To: {}\n", join(message.reply_to())));
		}
		out.push_str(&format!("Subject: {}\n\n", message.subject()));
		out.push_str(message.text_body());
		out.push('\n');
		for attachment in message.attachments() {
			out.push_str(&format!(
				"[attachment: {} ({}, {} bytes)]\n",
				attachment.filename(),
				attachment.mime_type(),
				attachment.content().len()
			));
		}
		out
	}
}

#[async_trait]
impl EmailBackend for ConsoleBackend {
	async fn send_messages(&self, messages: &[EmailMessage]) -> EmailResult<usize> {
		for message in messages {
			println!("{}", "-".repeat(79));
			println!("{}", Self::render(message));
		}
		Ok(messages.len())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::message::{Address, Attachment};
	use rstest::rstest;

	#[rstest]
	fn test_render_lists_headers_and_attachments() {
		// Arrange
		let message = EmailMessage::builder()
			.from(Address::named("noreply@example.com", "Conference"))
			.to(vec![Address::new("a@example.com"), Address::new("b@example.com")])
			.subject("Hello")
			.html("<p>Body</p>")
			.attachment(Attachment::new("x.png", vec![1, 2, 3]))
			.build()
			.unwrap();

		// Act
		let rendered = ConsoleBackend::render(&message);

		// Assert
		assert!(rendered.contains("From: Conference <noreply@example.com>"));
		assert!(rendered.contains("To: a@example.com, b@example.com"));
		assert!(rendered.contains("Subject: Hello\n\nBody\n"));
		assert!(rendered.contains("[attachment: x.png (image/png, 3 bytes)]"));
		assert!(!rendered.contains("Reply-To"));
	}
}
