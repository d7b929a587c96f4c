//! # formpost-client
//!
//! Client side of the formpost pipeline: everything that happens between the
//! submitter pressing the submit button and the alert that reports back.
//!
//! - [`AlertController`]: transient status display with a 10 second
//!   auto-clear after success
//! - [`FormDispatcher`]: collect, validate, encode and send a form, either as
//!   multipart to a direct endpoint or as JSON text to a spreadsheet endpoint
//! - [`Transport`]: the HTTP seam, with a [`ReqwestTransport`] implementation
//! - [`App`]: endpoint bootstrap from a URL or a URL-bearing file
//! - [`fixtures`]: test-data providers and [`populate_fields`]
//!
//! ## Example
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use formpost_client::{DispatcherConfig, FormDispatcher, ReqwestTransport, SubmitMode};
//! use formpost_forms::{FormDocument, FormElement};
//! use std::sync::Arc;
//!
//! let mut form = FormDocument::new()
//!     .with(FormElement::text("person-first-name").with_value("Ada").required())
//!     .with(FormElement::email("person-email").with_value("ada@example.com").required());
//!
//! let config = DispatcherConfig::new("https://script.example.com/exec")
//!     .mode(SubmitMode::Spreadsheet)
//!     .referrer("https://conference.example.com/register");
//! let dispatcher = FormDispatcher::new(Arc::new(ReqwestTransport::new()?), config);
//!
//! let outcome = dispatcher.submit(&mut form).await;
//! println!("{:?}: {}", outcome, dispatcher.alert().state().content);
//! # Ok(())
//! # }
//! ```

pub mod alert;
pub mod app;
pub mod dispatcher;
pub mod fixtures;
pub mod transport;

use thiserror::Error;

pub use alert::{AUTO_CLEAR_AFTER, AlertController, AlertState, Severity};
pub use app::{App, AppConfig, EndpointSource, resolve_endpoint};
pub use dispatcher::{
	AlertTexts, DispatcherConfig, FetchOptions, FormDispatcher, SubmissionOutcome, SubmitMode,
};
pub use fixtures::{
	FixtureProvider, FixtureValue, PopulateOptions, PopulateReport, RegistrationFixtures,
	StaticFixtures, populate_fields,
};
pub use transport::{
	Credentials, MultipartPart, OutgoingRequest, RequestBody, RequestMode, ReqwestTransport,
	Transport, TransportResponse,
};

#[derive(Debug, Error)]
pub enum ClientError {
	#[error("{0}")]
	Request(String),

	#[error("{message}")]
	Status { status: u16, message: String },

	#[error("No URL source provided")]
	NoEndpointSource,

	#[error("Failed to load configuration")]
	EndpointUnavailable(String),

	#[error("Invalid request: {0}")]
	InvalidRequest(String),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

impl From<reqwest::Error> for ClientError {
	fn from(err: reqwest::Error) -> Self {
		ClientError::Request(err.to_string())
	}
}

impl From<ClientError> for formpost_core::Error {
	fn from(err: ClientError) -> Self {
		match err {
			ClientError::NoEndpointSource | ClientError::EndpointUnavailable(_) => {
				formpost_core::Error::Config(err.to_string())
			}
			err => formpost_core::Error::Transport(err.to_string()),
		}
	}
}
