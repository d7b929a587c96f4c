//! # formpost
//!
//! Form submission pipeline: collect and validate a form, send it to an
//! endpoint, and turn the submission into templated notification mail with
//! validated attachments.
//!
//! ## Feature Flags
//!
//! - `client` - form collection, required-field validation, dynamic field
//!   pools and submission dispatch (includes `forms`)
//! - `forms` - the form model, collector and validator only
//! - `mail` - template rendering, mail composition and upload validation
//! - `conf` - TOML settings with environment overrides
//! - `server` - the HTTP endpoint (includes `mail` and `conf`)
//! - `full` (default) - everything
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! # #[cfg(feature = "full")]
//! # async fn example() -> formpost::Result<()> {
//! use formpost::prelude::*;
//! use std::sync::Arc;
//!
//! let backend = Arc::new(MemoryBackend::new());
//! let composer = MailComposer::new(backend, Address::new("noreply@example.com"));
//! let job = MailJob::new(vec![Address::new("office@example.com")])
//!     .subject("Registration: %person-first-name%")
//!     .template("<p>%person-first-name% %person-last-name%</p>")
//!     .data(FormSnapshot::new().with("person-first-name", "Ada"));
//!
//! let outcome = composer.compose(&job).await?;
//! assert!(outcome.success);
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "conf")]
pub mod conf;
pub mod core;
#[cfg(feature = "forms")]
pub mod forms;
#[cfg(feature = "mail")]
pub mod mail;
#[cfg(feature = "server")]
pub mod server;

pub use formpost_core::{Error, FieldValue, FormSnapshot, Result, ValidationError};

#[cfg(feature = "conf")]
pub use formpost_conf::Settings;

pub mod prelude {
	pub use crate::{Error, FieldValue, FormSnapshot, Result, ValidationError};

	#[cfg(feature = "forms")]
	pub use formpost_forms::{DynamicFieldPool, FormDocument, FormElement, Validator, collect};

	#[cfg(feature = "client")]
	pub use formpost_client::{
		AlertController, App, AppConfig, DispatcherConfig, EndpointSource, FormDispatcher,
		ReqwestTransport, SubmissionOutcome, SubmitMode,
	};

	#[cfg(feature = "mail")]
	pub use formpost_mail::{
		Address, AutoresponderConfig, EmailBackend, MailComposer, MailJob, MailOutcome,
		MemoryBackend, TemplateSource, UploadLimits, validate_uploads,
	};

	#[cfg(feature = "server")]
	pub use formpost_server::{FormHandler, HttpServer, serve};
}
