//! HTTP seam between the dispatcher and the network
//!
//! Requests are described with the same knobs a browser `fetch` exposes
//! (mode, credentials, headers) so that callers can carry their overrides
//! through unchanged. [`ReqwestTransport`] is the production implementation.

use crate::{ClientError, ClientResult};
use async_trait::async_trait;
use formpost_forms::SelectedFile;
use indexmap::IndexMap;
use reqwest::Client;
use reqwest::multipart::{Form, Part};

/// Cross-origin mode of a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestMode {
	#[default]
	Cors,
	/// Fire-and-forget: the response is opaque and never inspected
	NoCors,
	SameOrigin,
}

/// Whether cookies and authorization headers accompany the request.
///
/// [`ReqwestTransport`] has no page origin to compare against, so it treats
/// `SameOrigin` like `Include`; `Omit` drops `Cookie` and `Authorization`
/// headers before sending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Credentials {
	Omit,
	#[default]
	SameOrigin,
	Include,
}

const CREDENTIAL_HEADERS: [&str; 2] = ["cookie", "authorization"];

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartPart {
	Text { name: String, value: String },
	File { name: String, file: SelectedFile },
}

impl MultipartPart {
	pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
		MultipartPart::Text {
			name: name.into(),
			value: value.into(),
		}
	}

	pub fn name(&self) -> &str {
		match self {
			MultipartPart::Text { name, .. } | MultipartPart::File { name, .. } => name,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
	Multipart(Vec<MultipartPart>),
	/// Sent as-is; the content type comes from the request headers
	Text(String),
}

/// A POST about to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingRequest {
	pub url: String,
	pub mode: RequestMode,
	pub credentials: Credentials,
	pub headers: IndexMap<String, String>,
	pub body: RequestBody,
}

impl OutgoingRequest {
	pub fn post(url: impl Into<String>, body: RequestBody) -> Self {
		Self {
			url: url.into(),
			mode: RequestMode::default(),
			credentials: Credentials::default(),
			headers: IndexMap::new(),
			body,
		}
	}

	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}

/// Status and body of a response. Opaque responses have status `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
	pub status: u16,
	pub body: String,
}

impl TransportResponse {
	pub fn new(status: u16, body: impl Into<String>) -> Self {
		Self {
			status,
			body: body.into(),
		}
	}

	pub fn opaque() -> Self {
		Self::new(0, "")
	}

	pub fn ok(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// The `message` field of a JSON body, if there is one.
	pub fn json_message(&self) -> Option<String> {
		let value: serde_json::Value = serde_json::from_str(&self.body).ok()?;
		value
			.get("message")
			.and_then(|m| m.as_str())
			.filter(|m| !m.is_empty())
			.map(str::to_string)
	}
}

/// Something that can deliver a submission and fetch small text resources.
#[async_trait]
pub trait Transport: Send + Sync {
	/// Send `request`. Only failures to get any response are errors.
	async fn send(&self, request: OutgoingRequest) -> ClientResult<TransportResponse>;

	/// GET `url` as text.
	async fn fetch_text(&self, url: &str) -> ClientResult<TransportResponse>;
}

/// [`Transport`] backed by a [`reqwest::Client`].
///
/// No request timeout is configured; a submission waits as long as the
/// endpoint takes.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
	client: Client,
}

impl ReqwestTransport {
	pub fn new() -> ClientResult<Self> {
		let client = Client::builder().build()?;
		Ok(Self { client })
	}

	pub fn with_client(client: Client) -> Self {
		Self { client }
	}

	/// Headers actually sent for `request` under its credentials mode.
	fn outgoing_headers(request: &OutgoingRequest) -> impl Iterator<Item = (&str, &str)> {
		let omit = request.credentials == Credentials::Omit;
		request
			.headers
			.iter()
			.filter(move |(name, _)| {
				!(omit && CREDENTIAL_HEADERS.iter().any(|h| name.eq_ignore_ascii_case(h)))
			})
			.map(|(name, value)| (name.as_str(), value.as_str()))
	}

	fn multipart(parts: Vec<MultipartPart>) -> ClientResult<Form> {
		let mut form = Form::new();
		for part in parts {
			form = match part {
				MultipartPart::Text { name, value } => form.text(name, value),
				MultipartPart::File { name, file } => {
					let mut body = Part::bytes(file.content).file_name(file.name);
					if !file.mime_type.is_empty() {
						body = body
							.mime_str(&file.mime_type)
							.map_err(|e| ClientError::InvalidRequest(e.to_string()))?;
					}
					form.part(name, body)
				}
			};
		}
		Ok(form)
	}
}

#[async_trait]
impl Transport for ReqwestTransport {
	async fn send(&self, request: OutgoingRequest) -> ClientResult<TransportResponse> {
		let mut builder = self.client.post(&request.url);
		for (name, value) in Self::outgoing_headers(&request) {
			builder = builder.header(name, value);
		}
		builder = match request.body {
			RequestBody::Multipart(parts) => builder.multipart(Self::multipart(parts)?),
			RequestBody::Text(text) => builder.body(text),
		};

		let response = builder.send().await?;
		tracing::debug!(url = %request.url, status = response.status().as_u16(), "submission response");

		if request.mode == RequestMode::NoCors {
			return Ok(TransportResponse::opaque());
		}
		let status = response.status().as_u16();
		let body = response.text().await.unwrap_or_default();
		Ok(TransportResponse::new(status, body))
	}

	async fn fetch_text(&self, url: &str) -> ClientResult<TransportResponse> {
		let response = self.client.get(url).send().await?;
		let status = response.status().as_u16();
		let body = response.text().await?;
		Ok(TransportResponse::new(status, body))
	}
}
