//! Transient status display
//!
//! The alert holds one message at a time. A success message clears itself
//! after [`AUTO_CLEAR_AFTER`]; any newer message, or an explicit clear,
//! cancels the pending clear.

use formpost_core::template::{self, PlaceholderSource};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Delay before a success message disappears.
pub const AUTO_CLEAR_AFTER: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
	/// Shown while a submission is in flight
	Info,
	Success,
	Error,
}

impl Severity {
	/// CSS class appended to `alert`.
	pub fn class(self) -> &'static str {
		match self {
			Severity::Info => "info has-spinner",
			Severity::Success => "success",
			Severity::Error => "error",
		}
	}
}

/// What the alert currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertState {
	pub content: String,
	pub severity: Option<Severity>,
}

impl AlertState {
	pub fn is_cleared(&self) -> bool {
		self.content.is_empty() && self.severity.is_none()
	}

	/// Full class attribute, e.g. `alert success`.
	pub fn class(&self) -> String {
		match self.severity {
			Some(severity) => format!("alert {}", severity.class()),
			None => "alert".to_string(),
		}
	}
}

#[derive(Debug, Default)]
struct Inner {
	state: AlertState,
	generation: u64,
	pending: Option<JoinHandle<()>>,
}

impl Inner {
	fn supersede(&mut self) -> u64 {
		self.generation += 1;
		if let Some(pending) = self.pending.take() {
			pending.abort();
		}
		self.generation
	}
}

/// Shared handle to an alert. Clones show the same alert.
#[derive(Debug, Clone)]
pub struct AlertController {
	inner: Arc<Mutex<Inner>>,
	auto_clear: Duration,
}

impl Default for AlertController {
	fn default() -> Self {
		Self::new()
	}
}

impl AlertController {
	pub fn new() -> Self {
		Self {
			inner: Arc::new(Mutex::new(Inner::default())),
			auto_clear: AUTO_CLEAR_AFTER,
		}
	}

	pub fn with_auto_clear(mut self, delay: Duration) -> Self {
		self.auto_clear = delay;
		self
	}

	/// Replace the content and severity.
	///
	/// A success message schedules its own clear on the current tokio
	/// runtime. Outside a runtime it simply stays until replaced.
	pub fn message(&self, content: impl Into<String>, severity: Severity) {
		let mut inner = self.inner.lock();
		let generation = inner.supersede();
		inner.state = AlertState {
			content: content.into(),
			severity: Some(severity),
		};

		if severity != Severity::Success {
			return;
		}
		match Handle::try_current() {
			Ok(handle) => {
				let weak = Arc::downgrade(&self.inner);
				let delay = self.auto_clear;
				inner.pending = Some(handle.spawn(clear_later(weak, generation, delay)));
			}
			Err(_) => tracing::debug!("no runtime, success alert will not auto-clear"),
		}
	}

	/// Clear immediately.
	pub fn clear(&self) {
		let mut inner = self.inner.lock();
		inner.supersede();
		inner.state = AlertState::default();
	}

	pub fn state(&self) -> AlertState {
		self.inner.lock().state.clone()
	}

	/// Substitute `%token%` placeholders, leaving unknown tokens verbatim.
	pub fn template<S: PlaceholderSource + ?Sized>(&self, text: &str, data: &S) -> String {
		template::render(text, data)
	}
}

async fn clear_later(inner: Weak<Mutex<Inner>>, generation: u64, delay: Duration) {
	tokio::time::sleep(delay).await;
	let Some(inner) = inner.upgrade() else {
		return;
	};
	let mut inner = inner.lock();
	if inner.generation == generation {
		inner.state = AlertState::default();
		inner.pending = None;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use formpost_core::FormSnapshot;
	use rstest::rstest;

	async fn advance(duration: Duration) {
		tokio::time::sleep(duration).await;
	}

	#[rstest]
	#[tokio::test(start_paused = true)]
	async fn test_success_clears_after_ten_seconds() {
		// Arrange
		let alert = AlertController::new();

		// Act
		alert.message("Submission successful, Ada!", Severity::Success);
		advance(Duration::from_secs(9)).await;
		let before = alert.state();
		advance(Duration::from_millis(1001)).await;

		// Assert
		assert_eq!(before.content, "Submission successful, Ada!");
		assert_eq!(before.class(), "alert success");
		assert!(alert.state().is_cleared());
		assert_eq!(alert.state().class(), "alert");
	}

	#[rstest]
	#[tokio::test(start_paused = true)]
	async fn test_new_message_cancels_pending_clear() {
		// Arrange
		let alert = AlertController::new();
		alert.message("Submission successful, Ada!", Severity::Success);
		advance(Duration::from_secs(5)).await;

		// Act
		alert.message("Error: Server error", Severity::Error);
		advance(Duration::from_secs(30)).await;

		// Assert
		assert_eq!(alert.state().content, "Error: Server error");
		assert_eq!(alert.state().severity, Some(Severity::Error));
	}

	#[rstest]
	#[tokio::test(start_paused = true)]
	async fn test_second_success_restarts_timer() {
		// Arrange
		let alert = AlertController::new();
		alert.message("first", Severity::Success);
		advance(Duration::from_secs(6)).await;

		// Act
		alert.message("second", Severity::Success);
		advance(Duration::from_secs(6)).await;
		let midway = alert.state();
		advance(Duration::from_secs(5)).await;

		// Assert
		assert_eq!(midway.content, "second");
		assert!(alert.state().is_cleared());
	}

	#[rstest]
	#[tokio::test(start_paused = true)]
	async fn test_processing_and_error_do_not_auto_clear() {
		// Arrange
		let alert = AlertController::new();

		// Act
		alert.message("Processing your submission...", Severity::Info);
		advance(Duration::from_secs(60)).await;

		// Assert
		assert_eq!(alert.state().class(), "alert info has-spinner");
	}

	#[rstest]
	fn test_clear_is_immediate() {
		// Arrange
		let alert = AlertController::new();
		alert.message("Email is required!", Severity::Error);

		// Act
		alert.clear();

		// Assert
		assert!(alert.state().is_cleared());
	}

	#[rstest]
	fn test_template_keeps_unknown_tokens() {
		// Arrange
		let alert = AlertController::new();
		let data = FormSnapshot::new().with("person-first-name", "Ada");

		// Act
		let text = alert.template("Thanks, %person-first-name%! %error-message%", &data);

		// Assert
		assert_eq!(text, "Thanks, Ada! %error-message%");
	}
}
