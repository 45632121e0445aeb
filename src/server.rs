//! HTTP server for shopping-list requests.
//!
//! The only place a UI should reach the semantic merge from: clients post
//! the event payload and get back the grouped list; they never call the
//! merge service directly.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version) |
//! | `POST`   | `/events/{id}/grocery-list` | Build the grouped shopping list |
//! | `DELETE` | `/events/{id}/grocery-cache` | Drop the cached merge result |
//!
//! The `grocery-list` body is the event file format (see [`crate::event`])
//! minus `eventId`, which comes from the path. Add `?naive=true` to skip
//! the semantic merge.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "..." } }
//! ```
//!
//! Error codes: `bad_request` (400), `internal` (500).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use grocery_merge_core::{CombineError, SmartCombiner};

use crate::config::Config;
use crate::event::{EventInput, IngredientInput, RecipeRef};
use crate::grocery::{build_combiner, shopping_list, ShoppingList};

#[derive(Clone)]
struct AppState {
    combiner: Arc<SmartCombiner>,
}

/// Starts the HTTP server on `[server].bind`. Runs until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let combiner = Arc::new(build_combiner(config).await?);
    let app = router(combiner);

    tracing::info!(
        bind = %bind_addr,
        merge_provider = %config.merge.provider,
        cache = config.cache.enabled,
        "grocery server listening"
    );
    println!("Grocery server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router around an existing combiner.
pub fn router(combiner: Arc<SmartCombiner>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/events/{id}/grocery-list", post(handle_grocery_list))
        .route("/events/{id}/grocery-cache", delete(handle_invalidate))
        .layer(cors)
        .with_state(AppState { combiner })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: message.into(),
    }
}

/// Missing recipe names are a caller error; anything else is ours.
fn classify_error(err: anyhow::Error) -> AppError {
    if err.downcast_ref::<CombineError>().is_some() {
        bad_request(err.to_string())
    } else {
        tracing::error!(error = %err, "grocery list failed");
        internal(err.to_string())
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /events/{id}/grocery-list ============

#[derive(Deserialize)]
struct GroceryListBody {
    recipes: Vec<RecipeRef>,
    ingredients: Vec<IngredientInput>,
    #[serde(default)]
    pantry: Vec<String>,
}

#[derive(Deserialize)]
struct GroceryListQuery {
    #[serde(default)]
    naive: bool,
}

async fn handle_grocery_list(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Query(query): Query<GroceryListQuery>,
    Json(body): Json<GroceryListBody>,
) -> Result<Json<ShoppingList>, AppError> {
    let event = EventInput {
        event_id,
        recipes: body.recipes,
        ingredients: body.ingredients,
        pantry: body.pantry,
    }
    .into_event()
    .map_err(|e| bad_request(format!("{:#}", e)))?;

    let list = shopping_list(&state.combiner, &event, &[], query.naive)
        .await
        .map_err(classify_error)?;

    Ok(Json(list))
}

// ============ DELETE /events/{id}/grocery-cache ============

async fn handle_invalidate(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> StatusCode {
    state.combiner.invalidate(&event_id).await;
    StatusCode::NO_CONTENT
}
