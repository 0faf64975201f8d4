//! HTTP server for the login API.
//!
//! Routes, all under `/api`:
//! - `POST /payloads`: create a server-signed envelope
//! - `POST /verify`: verify a client counter-signature
//! - `GET /accounts/{id}`: resolve an account's key

use axum::{
	extract::{DefaultBodyLimit, Path, State},
	response::Json,
	routing::{get, post},
	Router,
};
use login_config::ApiConfig;
use login_core::LoginEngine;
use login_types::{
	APIError, AccountKeyInfo, CreatePayloadRequest, SigningEnvelope, VerifyRequest,
	VerifyResponse,
};
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Shared application state for the API server.
///
/// The engine is installed once; requests arriving before that are answered
/// with 503.
#[derive(Clone, Default)]
pub struct AppState {
	engine: Arc<OnceLock<LoginEngine>>,
}

impl AppState {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_engine(engine: LoginEngine) -> Self {
		let state = Self::new();
		state.install(engine);
		state
	}

	/// Installs the engine. Later calls are ignored.
	pub fn install(&self, engine: LoginEngine) {
		if self.engine.set(engine).is_err() {
			tracing::warn!("Login engine already installed, keeping the first one");
		}
	}

	fn engine(&self) -> Result<&LoginEngine, APIError> {
		self.engine.get().ok_or_else(crate::apis::uninitialized)
	}
}

/// Builds the API router.
pub fn router(state: AppState, api_config: &ApiConfig) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/payloads", post(handle_create_payload))
				.route("/verify", post(handle_verify))
				.route("/accounts/{id}", get(handle_get_account)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(TimeoutLayer::new(Duration::from_secs(
					api_config.timeout_seconds,
				)))
				.layer(CorsLayer::permissive())
				.layer(DefaultBodyLimit::max(api_config.max_request_size)),
		)
		.with_state(state)
}

/// Starts the HTTP server and serves until the listener fails.
pub async fn start_server(
	api_config: ApiConfig,
	state: AppState,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(state, &api_config);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Login API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles POST /api/payloads requests.
async fn handle_create_payload(
	State(state): State<AppState>,
	Json(request): Json<CreatePayloadRequest>,
) -> Result<Json<SigningEnvelope<Value>>, APIError> {
	crate::apis::payload::create_payload(request, state.engine()?).map(Json)
}

/// Handles POST /api/verify requests.
async fn handle_verify(
	State(state): State<AppState>,
	Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, APIError> {
	match crate::apis::verify::verify_signature(request, state.engine()?).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Verification request failed: {}", e);
			Err(e)
		},
	}
}

/// Handles GET /api/accounts/{id} requests.
async fn handle_get_account(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<AccountKeyInfo>, APIError> {
	match crate::apis::account::get_account(&id, state.engine()?).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Account lookup failed: {}", e);
			Err(e)
		},
	}
}
