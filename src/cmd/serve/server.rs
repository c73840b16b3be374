// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::future::pending;

use axum::Router;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;
use axum::http::header::CONTENT_TYPE;
use axum::response::Html;
use axum::routing::get;
use axum::routing::post;
use flashdeck_core::error::Fallible;
use flashdeck_core::types::timestamp::Timestamp;
use tokio::net::TcpListener;
use tokio::signal;

use crate::cmd::serve::api;
use crate::cmd::serve::drill;
use crate::cmd::serve::state::ServerState;
use crate::db::Database;
use crate::utils::CACHE_CONTROL_IMMUTABLE;

pub struct ServerConfig {
    pub database: String,
    pub host: String,
    pub port: u16,
    /// Source of the current time for reviews and due checks.
    pub clock: fn() -> Timestamp,
}

pub fn router(state: ServerState) -> Router {
    let app = Router::new();
    let app = app.route("/", get(drill::get_handler));
    let app = app.route("/", post(drill::post_handler));
    let app = app.route("/style.css", get(style_handler));
    let app = app.route("/decks", get(api::list_decks).post(api::create_deck));
    let app = app.route("/decks/{deck_id}", get(api::get_deck));
    let app = app.route("/decks/{deck_id}/flashcards", get(api::deck_flashcards));
    let app = app.route(
        "/flashcards",
        get(api::list_flashcards).post(api::create_flashcard),
    );
    let app = app.route("/flashcards/{flashcard_id}", get(api::get_flashcard));
    let app = app.route(
        "/flashcards/{flashcard_id}/review",
        post(api::review_flashcard),
    );
    let app = app.route(
        "/flashcards/{flashcard_id}/reviews",
        get(api::flashcard_reviews),
    );
    let app = app.fallback(not_found_handler);
    app.with_state(state)
}

pub async fn start_server(config: ServerConfig) -> Fallible<()> {
    let db = Database::new(&config.database)?;
    let state = ServerState::new(db, config.clock);
    let app = router(state);
    let bind = format!("{}:{}", config.host, config.port);

    log::info!("Starting server on http://{bind}");
    let listener = TcpListener::bind(bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn style_handler() -> (StatusCode, [(HeaderName, &'static str); 2], &'static [u8]) {
    let bytes = include_bytes!("style.css");
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/css"),
            (CACHE_CONTROL, CACHE_CONTROL_IMMUTABLE),
        ],
        bytes,
    )
}

async fn not_found_handler() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html("Not Found".to_string()))
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => log::debug!("Received Ctrl+C, shutting down gracefully"),
        Err(e) => {
            log::warn!("Failed to install Ctrl+C handler: {e}");
            pending::<()>().await
        }
    }
}
