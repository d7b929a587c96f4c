//! formpost-server
//!
//! ```bash
//! formpost-server --config formpost.toml
//! RUST_LOG=formpost=debug formpost-server --config formpost.toml --bind 0.0.0.0:8080
//! ```

use anyhow::Context;
use clap::Parser;
use formpost_conf::Settings;
use formpost_server::{FormHandler, serve};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "formpost-server")]
#[command(about = "Receive form submissions and send them by email", long_about = None)]
#[command(version)]
struct Cli {
	/// Settings file (TOML)
	#[arg(short, long, value_name = "FILE", default_value = "formpost.toml")]
	config: PathBuf,

	/// Listen address, overriding `server.bind`
	#[arg(short, long, value_name = "ADDR")]
	bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	dotenv::dotenv().ok();

	tracing_subscriber::registry()
		.with(tracing_subscriber::EnvFilter::new(
			std::env::var("RUST_LOG").unwrap_or_else(|_| "formpost=info,formpost_server=info".into()),
		))
		.with(tracing_subscriber::fmt::layer())
		.init();

	let cli = Cli::parse();
	let mut settings = Settings::load(&cli.config)
		.with_context(|| format!("failed to load {}", cli.config.display()))?;
	if let Some(bind) = cli.bind {
		settings.server.bind = bind;
	}

	let addr: SocketAddr = settings
		.server
		.bind
		.parse()
		.with_context(|| format!("invalid listen address: {}", settings.server.bind))?;
	let backend = formpost_mail::backend_from_settings(&settings.email)
		.context("failed to configure the mail backend")?;
	tracing::info!(
		forms = settings.forms.len(),
		backend = ?settings.email.backend,
		"settings loaded"
	);

	let handler = FormHandler::new(Arc::new(settings), backend);
	serve(addr, Arc::new(handler)).await?;
	Ok(())
}
