//! Form bootstrap
//!
//! The submission endpoint is either given directly or read from a small
//! file holding the URL (a deployment often keeps the spreadsheet script URL
//! out of the page). Any failure to resolve it leaves the form without a
//! dispatcher and shows the generic support message.

use crate::alert::{AlertController, Severity};
use crate::dispatcher::{DispatcherConfig, FormDispatcher, SubmissionOutcome};
use crate::transport::Transport;
use crate::{ClientError, ClientResult};
use formpost_core::exception::SUPPORT_MESSAGE;
use formpost_forms::FormDocument;
use std::path::PathBuf;
use std::sync::Arc;

/// Where the endpoint URL comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointSource {
	Url(String),
	/// Local file whose trimmed contents are the URL
	File(PathBuf),
	/// Remote resource whose trimmed body is the URL
	Remote(String),
}

/// Resolve `source` to an endpoint URL.
pub async fn resolve_endpoint(
	source: Option<&EndpointSource>,
	transport: &dyn Transport,
) -> ClientResult<String> {
	let url = match source.ok_or(ClientError::NoEndpointSource)? {
		EndpointSource::Url(url) => url.clone(),
		EndpointSource::File(path) => tokio::fs::read_to_string(path)
			.await
			.map_err(|e| ClientError::EndpointUnavailable(format!("{}: {}", path.display(), e)))?,
		EndpointSource::Remote(url) => {
			let response = transport.fetch_text(url).await?;
			if !response.ok() {
				return Err(ClientError::EndpointUnavailable(format!(
					"{} returned {}",
					url, response.status
				)));
			}
			response.body
		}
	};

	let url = url.trim();
	if url.is_empty() {
		return Err(ClientError::EndpointUnavailable("endpoint is empty".into()));
	}
	Ok(url.to_string())
}

/// Everything [`App::init`] needs besides the transport.
#[derive(Debug, Clone)]
pub struct AppConfig {
	pub endpoint: Option<EndpointSource>,
	/// Form configuration; its `endpoint` is replaced by the resolved URL
	pub form: DispatcherConfig,
}

impl AppConfig {
	pub fn new(endpoint: EndpointSource) -> Self {
		Self {
			endpoint: Some(endpoint),
			form: DispatcherConfig::new(""),
		}
	}

	pub fn form(mut self, form: DispatcherConfig) -> Self {
		self.form = form;
		self
	}
}

/// A form wired to its endpoint, or showing why it could not be.
pub struct App {
	alert: AlertController,
	dispatcher: Option<FormDispatcher>,
}

impl App {
	pub async fn init(config: AppConfig, transport: Arc<dyn Transport>) -> Self {
		let alert = AlertController::new();
		match resolve_endpoint(config.endpoint.as_ref(), transport.as_ref()).await {
			Ok(endpoint) => {
				tracing::info!(endpoint = %endpoint, "form initialized");
				let mut form = config.form;
				form.endpoint = endpoint;
				let dispatcher = FormDispatcher::new(transport, form).with_alert(alert.clone());
				Self {
					alert,
					dispatcher: Some(dispatcher),
				}
			}
			Err(err) => {
				let err = formpost_core::Error::from(err);
				alert.message(err.user_message(), Severity::Error);
				Self {
					alert,
					dispatcher: None,
				}
			}
		}
	}

	pub fn alert(&self) -> &AlertController {
		&self.alert
	}

	pub fn dispatcher(&self) -> Option<&FormDispatcher> {
		self.dispatcher.as_ref()
	}

	pub fn is_ready(&self) -> bool {
		self.dispatcher.is_some()
	}

	/// Submit through the dispatcher. Without one, the form is left as is
	/// and the support message stays on display.
	pub async fn submit(&self, form: &mut FormDocument) -> SubmissionOutcome {
		match &self.dispatcher {
			Some(dispatcher) => dispatcher.submit(form).await,
			None => {
				self.alert.message(SUPPORT_MESSAGE, Severity::Error);
				SubmissionOutcome::Failed(SUPPORT_MESSAGE.to_string())
			}
		}
	}
}
