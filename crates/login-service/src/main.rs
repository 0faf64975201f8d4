//! Main entry point for the login server.
//!
//! Loads the configuration, builds the login engine from the configured
//! signer and account directory, and serves the HTTP API.

use clap::Parser;
use login_config::Config;
use login_core::{LoginBuilder, LoginEngine, LoginFactories, TracingObserver};
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod server;

/// Command-line arguments for the login server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the login server.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging
/// 3. Loads configuration from file
/// 4. Builds the login engine
/// 5. Serves the API until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started login server");

	let config = Config::from_file(&args.config).await?;
	tracing::info!(
		domain_url = %config.server.domain_url,
		signer = %config.signer.primary,
		directory = %config.directory.primary,
		"Loaded configuration"
	);

	let engine = build_engine(config.clone())?;

	let Some(api_config) = config.api.clone().filter(|api| api.enabled) else {
		tracing::warn!("API server disabled in configuration, nothing to serve");
		return Ok(());
	};

	let state = server::AppState::with_engine(engine);
	tokio::select! {
		result = server::start_server(api_config, state) => {
			result?;
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	tracing::info!("Stopped login server");
	Ok(())
}

/// Builds the login engine with every registered implementation available.
fn build_engine(config: Config) -> Result<LoginEngine, Box<dyn std::error::Error>> {
	let engine = LoginBuilder::new(config)
		.with_observer(Arc::new(TracingObserver))
		.build(LoginFactories::all())?;
	Ok(engine)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_args_defaults() {
		let args = Args::parse_from(["login-server"]);
		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");

		let args = Args::parse_from(["login-server", "-c", "prod.toml", "--log-level", "debug"]);
		assert_eq!(args.config, PathBuf::from("prod.toml"));
		assert_eq!(args.log_level, "debug");
	}

	#[tokio::test]
	async fn test_build_engine_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(
			file,
			r#"
[server]
domain_url = "https://app.example.com"

[signer]
primary = "local"
[signer.implementations.local]
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"

[directory]
primary = "mirror_node"
[directory.implementations.mirror_node]
network = "testnet"
"#
		)
		.unwrap();

		let config = Config::from_file(file.path()).await.unwrap();
		let engine = build_engine(config).unwrap();
		assert_eq!(
			engine.signatures().public_key().key_type(),
			login_types::KeyType::Ecdsa
		);
		assert_eq!(
			engine.signatures().directory_url(),
			Some("https://testnet.mirrornode.hedera.com/api/v1")
		);
	}
}
