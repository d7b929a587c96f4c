use super::EmailBackend;
use crate::message::EmailMessage;
use crate::{EmailError, EmailResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

/// Keeps sent messages in memory.
///
/// Clones share the same outbox, so a test can hand one clone to the code
/// under test and inspect another.
///
/// # Examples
///
/// ```
/// use formpost_mail::{Address, EmailBackend, EmailMessage, MemoryBackend};
///
/// # #[tokio::main]
/// # async fn main() {
/// let backend = MemoryBackend::new();
/// let message = EmailMessage::builder()
///     .from(Address::new("noreply@example.com"))
///     .to(vec![Address::new("office@example.com")])
///     .subject("Test")
///     .html("<p>Hello</p>")
///     .build()
///     .unwrap();
///
/// backend.send_messages(&[message]).await.unwrap();
/// assert_eq!(backend.sent_messages()[0].subject(), "Test");
/// # }
/// ```
#[derive(Clone, Default)]
pub struct MemoryBackend {
	messages: Arc<RwLock<Vec<EmailMessage>>>,
	failure: Arc<RwLock<Option<(usize, String)>>>,
}

impl MemoryBackend {
	pub fn new() -> Self {
		Self::default()
	}

	/// Accept `successes` more messages, then fail every send with `reason`.
	pub fn fail_after(&self, successes: usize, reason: impl Into<String>) {
		*self.failure.write() = Some((successes, reason.into()));
	}

	pub fn sent_messages(&self) -> Vec<EmailMessage> {
		self.messages.read().clone()
	}

	pub fn count(&self) -> usize {
		self.messages.read().len()
	}

	pub fn clear(&self) {
		self.messages.write().clear();
	}
}

#[async_trait]
impl EmailBackend for MemoryBackend {
	async fn send_messages(&self, messages: &[EmailMessage]) -> EmailResult<usize> {
		let mut sent = 0;
		for message in messages {
			if let Some((remaining, reason)) = self.failure.write().as_mut() {
				if *remaining == 0 {
					return Err(EmailError::BackendError(reason.clone()));
				}
				*remaining -= 1;
			}
			self.messages.write().push(message.clone());
			sent += 1;
		}
		Ok(sent)
	}
}
