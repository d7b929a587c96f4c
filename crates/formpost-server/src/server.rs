use crate::handler::{FormHandler, SubmissionRequest, SubmissionResponse};
use crate::{ServerError, ServerResult};
use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

/// HTTP/1 server in front of a [`FormHandler`]
pub struct HttpServer {
	handler: Arc<FormHandler>,
	max_body_bytes: usize,
}

impl HttpServer {
	/// Create a server; the body limit comes from the handler's settings.
	pub fn new(handler: Arc<FormHandler>) -> Self {
		let max_body_bytes = usize::try_from(handler.settings().server.max_body_bytes).unwrap_or(usize::MAX);
		Self {
			handler,
			max_body_bytes,
		}
	}

	/// Bind `addr` and serve until an I/O error occurs.
	///
	/// # Examples
	///
	/// ```no_run
	/// use std::sync::Arc;
	/// use formpost_conf::Settings;
	/// use formpost_mail::ConsoleBackend;
	/// use formpost_server::{FormHandler, HttpServer};
	///
	/// # async fn example() -> formpost_server::ServerResult<()> {
	/// let handler = FormHandler::new(Arc::new(Settings::default()), Arc::new(ConsoleBackend));
	/// HttpServer::new(Arc::new(handler))
	///     .listen("127.0.0.1:8080".parse().unwrap())
	///     .await?;
	/// # Ok(())
	/// # }
	/// ```
	pub async fn listen(self, addr: SocketAddr) -> ServerResult<()> {
		let listener = TcpListener::bind(addr).await?;
		self.run(listener, std::future::pending()).await
	}

	/// Accept connections on `listener` until `shutdown` resolves.
	///
	/// Connections already accepted keep running to completion.
	pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> ServerResult<()>
	where
		F: Future<Output = ()>,
	{
		tracing::info!(addr = %listener.local_addr()?, "listening");
		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				result = listener.accept() => {
					let (stream, socket_addr) = result?;
					let handler = self.handler.clone();
					let max_body_bytes = self.max_body_bytes;

					tokio::task::spawn(async move {
						if let Err(err) = Self::handle_connection(stream, socket_addr, handler, max_body_bytes).await {
							tracing::warn!(remote = %socket_addr, error = %err, "connection error");
						}
					});
				}
				_ = &mut shutdown => {
					tracing::info!("shutdown signal received, no longer accepting connections");
					break;
				}
			}
		}
		Ok(())
	}

	/// Serve HTTP requests on one TCP connection.
	pub async fn handle_connection(
		stream: TcpStream,
		socket_addr: SocketAddr,
		handler: Arc<FormHandler>,
		max_body_bytes: usize,
	) -> ServerResult<()> {
		let io = TokioIo::new(stream);
		let service = RequestService {
			handler,
			remote_addr: socket_addr,
			max_body_bytes,
		};

		http1::Builder::new()
			.serve_connection(io, service)
			.await
			.map_err(|e| ServerError::Http(e.to_string()))
	}
}

struct RequestService {
	handler: Arc<FormHandler>,
	remote_addr: SocketAddr,
	max_body_bytes: usize,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<Full<Bytes>>;
	type Error = Box<dyn std::error::Error + Send + Sync>;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = self.handler.clone();
		let remote_addr = self.remote_addr;
		let max_body_bytes = self.max_body_bytes;

		Box::pin(async move {
			let (parts, body) = req.into_parts();
			tracing::debug!(remote = %remote_addr, method = %parts.method, path = parts.uri.path(), "request");

			let response = match Limited::new(body, max_body_bytes).collect().await {
				Ok(collected) => {
					let request = SubmissionRequest {
						method: parts.method,
						path: parts.uri.path().to_string(),
						headers: parts.headers,
						body: collected.to_bytes(),
					};
					handler.handle(request).await
				}
				Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
					tracing::warn!(remote = %remote_addr, limit = max_body_bytes, "request body too large");
					SubmissionResponse::failure(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
				}
				Err(err) => {
					tracing::warn!(remote = %remote_addr, error = %err, "failed to read request body");
					SubmissionResponse::failure(StatusCode::BAD_REQUEST, "Invalid request body")
				}
			};

			let body = serde_json::to_vec(&response.body)?;
			Ok(hyper::Response::builder()
				.status(response.status)
				.header(http::header::CONTENT_TYPE, "application/json")
				.body(Full::new(Bytes::from(body)))?)
		})
	}
}

/// Bind `addr` and serve `handler` until the process receives Ctrl-C.
pub async fn serve(addr: SocketAddr, handler: Arc<FormHandler>) -> ServerResult<()> {
	let listener = TcpListener::bind(addr).await?;
	let shutdown = async {
		if let Err(err) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %err, "failed to listen for shutdown signal");
			std::future::pending::<()>().await;
		}
	};
	HttpServer::new(handler).run(listener, shutdown).await
}
