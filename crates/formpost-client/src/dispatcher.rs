//! Submission dispatcher
//!
//! One call to [`FormDispatcher::submit`] walks a submission through
//! processing → (success | error) → idle:
//!
//! 1. show the processing message and disable the submit control
//! 2. collect and validate; a validation failure shows its message and
//!    returns without touching the network
//! 3. encode the form and the referrer for the configured [`SubmitMode`]
//! 4. map the response (or the lack of one) to a templated alert
//! 5. re-enable the submit control
//!
//! Resubmission while a request is in flight is only prevented by the
//! disabled submit control.

use crate::alert::{AlertController, Severity};
use crate::transport::{
	Credentials, MultipartPart, OutgoingRequest, RequestBody, RequestMode, Transport,
};
use crate::ClientError;
use formpost_core::{FormSnapshot, REFERRER_FIELD, ValidationError};
use formpost_forms::{FormDocument, InputKind, SelectedFile, Validator, collect};
use indexmap::IndexMap;
use std::sync::Arc;

pub const DEFAULT_PROCESSING: &str = "Processing your submission...";
pub const DEFAULT_SUCCESS: &str = "Submission successful, %person-first-name%!";
pub const DEFAULT_ERROR: &str = "Error: %error-message%";
/// Fallback for `%error-message%` when an error carries no text.
pub const DEFAULT_FAILURE: &str = "Submission failed";
/// Used when a non-OK response carries no JSON `message`.
pub const SERVER_ERROR: &str = "Server error";

/// Token added to the data when rendering the error message.
pub const ERROR_MESSAGE_TOKEN: &str = "error-message";

/// Alert texts. `success` and `error` are `%token%` templates rendered
/// against the submitted data; `validation` may use `%field%`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertTexts {
	pub processing: String,
	pub success: String,
	pub error: String,
	pub validation: Option<String>,
}

impl Default for AlertTexts {
	fn default() -> Self {
		Self {
			processing: DEFAULT_PROCESSING.to_string(),
			success: DEFAULT_SUCCESS.to_string(),
			error: DEFAULT_ERROR.to_string(),
			validation: None,
		}
	}
}

/// How the payload is encoded and sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmitMode {
	/// Multipart form data; non-OK responses are errors
	#[default]
	Direct,
	/// JSON in a `text/plain` body, `no-cors`, `?authuser=0` appended; the
	/// response is never inspected
	Spreadsheet,
}

/// Caller overrides applied on top of the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
	pub mode: Option<RequestMode>,
	pub credentials: Option<Credentials>,
	pub headers: IndexMap<String, String>,
}

impl FetchOptions {
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());
		self
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
	pub endpoint: String,
	pub mode: SubmitMode,
	pub alerts: AlertTexts,
	pub fetch: FetchOptions,
	/// Address of the page the form lives on, sent as `_referrer`
	pub referrer: String,
}

impl DispatcherConfig {
	pub fn new(endpoint: impl Into<String>) -> Self {
		Self {
			endpoint: endpoint.into(),
			mode: SubmitMode::default(),
			alerts: AlertTexts::default(),
			fetch: FetchOptions::default(),
			referrer: String::new(),
		}
	}

	pub fn mode(mut self, mode: SubmitMode) -> Self {
		self.mode = mode;
		self
	}

	pub fn alerts(mut self, alerts: AlertTexts) -> Self {
		self.alerts = alerts;
		self
	}

	pub fn fetch(mut self, fetch: FetchOptions) -> Self {
		self.fetch = fetch;
		self
	}

	pub fn referrer(mut self, referrer: impl Into<String>) -> Self {
		self.referrer = referrer.into();
		self
	}
}

/// How a submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
	/// A required field was empty; nothing was sent
	Invalid(ValidationError),
	Succeeded,
	/// The request failed; carries the error text used for `%error-message%`
	Failed(String),
}

impl SubmissionOutcome {
	pub fn is_success(&self) -> bool {
		matches!(self, SubmissionOutcome::Succeeded)
	}
}

/// Submits a form through a [`Transport`] and reports through an alert.
pub struct FormDispatcher {
	transport: Arc<dyn Transport>,
	config: DispatcherConfig,
	alert: AlertController,
	validator: Validator,
}

impl FormDispatcher {
	pub fn new(transport: Arc<dyn Transport>, config: DispatcherConfig) -> Self {
		let validator = match &config.alerts.validation {
			Some(text) => Validator::new().with_message(text.clone()),
			None => Validator::new(),
		};
		Self {
			transport,
			config,
			alert: AlertController::new(),
			validator,
		}
	}

	/// Report through `alert` instead of a fresh controller.
	pub fn with_alert(mut self, alert: AlertController) -> Self {
		self.alert = alert;
		self
	}

	pub fn alert(&self) -> &AlertController {
		&self.alert
	}

	pub fn config(&self) -> &DispatcherConfig {
		&self.config
	}

	/// Run one submission of `form`.
	pub async fn submit(&self, form: &mut FormDocument) -> SubmissionOutcome {
		self.alert
			.message(self.config.alerts.processing.clone(), Severity::Info);
		if let Some(submit) = form.submit_control_mut() {
			submit.begin_processing();
		}

		let outcome = self.run(form).await;

		if let Some(submit) = form.submit_control_mut() {
			submit.finish_processing();
		}
		outcome
	}

	async fn run(&self, form: &mut FormDocument) -> SubmissionOutcome {
		let collected = collect(form);
		if let Err(err) = self.validator.validate(&collected) {
			self.alert.message(err.message.clone(), Severity::Error);
			return SubmissionOutcome::Invalid(err);
		}
		let snapshot = collected.snapshot;

		let request = self.build_request(form, &snapshot);
		tracing::info!(url = %request.url, mode = ?self.config.mode, "dispatching submission");

		match self.send(request).await {
			Ok(()) => {
				let message = self.alert.template(&self.config.alerts.success, &snapshot);
				self.alert.message(message, Severity::Success);
				form.reset();
				SubmissionOutcome::Succeeded
			}
			Err(err) => {
				let mut reason = err.to_string();
				if reason.is_empty() {
					reason = DEFAULT_FAILURE.to_string();
				}
				tracing::warn!(error = %reason, "submission failed");
				let mut data = snapshot;
				data.insert(ERROR_MESSAGE_TOKEN, reason.clone());
				let message = self.alert.template(&self.config.alerts.error, &data);
				self.alert.message(message, Severity::Error);
				SubmissionOutcome::Failed(reason)
			}
		}
	}

	async fn send(&self, request: OutgoingRequest) -> Result<(), ClientError> {
		let response = self.transport.send(request).await?;
		if self.config.mode == SubmitMode::Direct && !response.ok() {
			return Err(ClientError::Status {
				status: response.status,
				message: response
					.json_message()
					.unwrap_or_else(|| SERVER_ERROR.to_string()),
			});
		}
		Ok(())
	}

	/// Encode `form` for the configured mode.
	pub fn build_request(&self, form: &FormDocument, snapshot: &FormSnapshot) -> OutgoingRequest {
		let fetch = &self.config.fetch;
		let mut request = match self.config.mode {
			SubmitMode::Direct => {
				let mut parts = form_parts(form);
				parts.push(MultipartPart::text(REFERRER_FIELD, &self.config.referrer));
				let mut request =
					OutgoingRequest::post(&self.config.endpoint, RequestBody::Multipart(parts));
				request.mode = fetch.mode.unwrap_or_default();
				request
			}
			SubmitMode::Spreadsheet => {
				let mut payload = snapshot.clone();
				payload.insert(REFERRER_FIELD, self.config.referrer.clone());
				let mut request = OutgoingRequest::post(
					format!("{}?authuser=0", self.config.endpoint),
					RequestBody::Text(payload.to_json().to_string()),
				);
				request.mode = RequestMode::NoCors;
				request
					.headers
					.insert("Content-Type".to_string(), "text/plain".to_string());
				request
			}
		};
		if let Some(credentials) = fetch.credentials {
			request.credentials = credentials;
		}
		for (name, value) in &fetch.headers {
			request.headers.insert(name.clone(), value.clone());
		}
		request
	}
}

/// Multipart parts the way a browser encodes a form: every named control in
/// document order, raw values, checked checkables only, and one part per
/// selected file (an empty file part when none is selected).
pub fn form_parts(form: &FormDocument) -> Vec<MultipartPart> {
	let mut parts = Vec::new();
	for element in form.elements() {
		let Some(name) = element.field_name() else {
			continue;
		};
		match element.kind {
			kind if kind.is_checkable() && !element.checked => {}
			InputKind::File if element.files.is_empty() => parts.push(MultipartPart::File {
				name: name.to_string(),
				file: SelectedFile::new("", "application/octet-stream", Vec::new()),
			}),
			InputKind::File => {
				for file in &element.files {
					parts.push(MultipartPart::File {
						name: name.to_string(),
						file: file.clone(),
					});
				}
			}
			_ => parts.push(MultipartPart::text(name, &element.value)),
		}
	}
	parts
}
