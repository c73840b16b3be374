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

use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::PathRejection;
use axum::extract::rejection::QueryRejection;
use flashdeck_core::sm2::Feedback;
use flashdeck_core::types::schedule::Schedule;
use serde::Deserialize;
use serde::Serialize;

use crate::cmd::serve::error::ApiError;
use crate::cmd::serve::state::ServerState;
use crate::db::CardFilter;
use crate::db::Deck;
use crate::db::Flashcard;
use crate::db::Review;

const DEFAULT_LIMIT: usize = 100;

#[derive(Deserialize)]
pub struct ListParams {
    limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct CardParams {
    /// Only return cards that are due now.
    #[serde(default)]
    due: bool,
    limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct NewDeck {
    name: String,
    description: Option<String>,
}

#[derive(Deserialize)]
pub struct NewFlashcard {
    front: String,
    back: String,
    deck_id: Option<i64>,
}

/// Deserialization rejects anything but the three grades, so invalid
/// feedback never reaches the scheduler.
#[derive(Deserialize)]
pub struct NewReview {
    feedback: Feedback,
}

/// A recorded review together with the schedule it produced.
#[derive(Serialize)]
pub struct ReviewResponse {
    #[serde(flatten)]
    review: Review,
    schedule: Schedule,
}

fn require_text(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(())
}

pub async fn create_deck(
    State(state): State<ServerState>,
    body: Result<Json<NewDeck>, JsonRejection>,
) -> Result<Json<Deck>, ApiError> {
    let Json(body) = body?;
    require_text("name", &body.name)?;
    let now = state.now();
    let db = state.db()?;
    let deck = db.insert_deck(&body.name, body.description.as_deref(), now)?;
    log::info!("Created deck {} ({})", deck.id, deck.name);
    Ok(Json(deck))
}

pub async fn list_decks(
    State(state): State<ServerState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Deck>>, ApiError> {
    let Query(params) = params?;
    let db = state.db()?;
    let decks = db.list_decks(params.limit.unwrap_or(DEFAULT_LIMIT))?;
    Ok(Json(decks))
}

pub async fn get_deck(
    State(state): State<ServerState>,
    deck_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Deck>, ApiError> {
    let Path(deck_id) = deck_id?;
    let db = state.db()?;
    match db.get_deck(deck_id)? {
        Some(deck) => Ok(Json(deck)),
        None => Err(ApiError::NotFound("Deck not found")),
    }
}

pub async fn deck_flashcards(
    State(state): State<ServerState>,
    deck_id: Result<Path<i64>, PathRejection>,
    params: Result<Query<CardParams>, QueryRejection>,
) -> Result<Json<Vec<Flashcard>>, ApiError> {
    let Path(deck_id) = deck_id?;
    let Query(params) = params?;
    let now = state.now();
    let db = state.db()?;
    if db.get_deck(deck_id)?.is_none() {
        return Err(ApiError::NotFound("Deck not found"));
    }
    let filter = CardFilter {
        deck_id: Some(deck_id),
        due_at: params.due.then_some(now),
        limit: params.limit.unwrap_or(DEFAULT_LIMIT),
    };
    Ok(Json(db.list_flashcards(filter)?))
}

pub async fn create_flashcard(
    State(state): State<ServerState>,
    body: Result<Json<NewFlashcard>, JsonRejection>,
) -> Result<Json<Flashcard>, ApiError> {
    let Json(body) = body?;
    require_text("front", &body.front)?;
    require_text("back", &body.back)?;
    let now = state.now();
    let db = state.db()?;
    if let Some(deck_id) = body.deck_id {
        if db.get_deck(deck_id)?.is_none() {
            return Err(ApiError::NotFound("Deck not found"));
        }
    }
    let card = db.insert_flashcard(&body.front, &body.back, body.deck_id, now)?;
    log::info!("Created flashcard {}", card.id);
    Ok(Json(card))
}

pub async fn list_flashcards(
    State(state): State<ServerState>,
    params: Result<Query<CardParams>, QueryRejection>,
) -> Result<Json<Vec<Flashcard>>, ApiError> {
    let Query(params) = params?;
    let now = state.now();
    let db = state.db()?;
    let filter = CardFilter {
        deck_id: None,
        due_at: params.due.then_some(now),
        limit: params.limit.unwrap_or(DEFAULT_LIMIT),
    };
    Ok(Json(db.list_flashcards(filter)?))
}

pub async fn get_flashcard(
    State(state): State<ServerState>,
    flashcard_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Flashcard>, ApiError> {
    let Path(flashcard_id) = flashcard_id?;
    let db = state.db()?;
    match db.get_flashcard(flashcard_id)? {
        Some(card) => Ok(Json(card)),
        None => Err(ApiError::NotFound("Flashcard not found")),
    }
}

pub async fn review_flashcard(
    State(state): State<ServerState>,
    flashcard_id: Result<Path<i64>, PathRejection>,
    body: Result<Json<NewReview>, JsonRejection>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let Path(flashcard_id) = flashcard_id?;
    let Json(body) = body?;
    let now = state.now();
    let mut db = state.db()?;
    match db.record_review(flashcard_id, body.feedback, now)? {
        Some((card, review)) => Ok(Json(ReviewResponse {
            review,
            schedule: card.schedule,
        })),
        None => Err(ApiError::NotFound("Flashcard not found")),
    }
}

pub async fn flashcard_reviews(
    State(state): State<ServerState>,
    flashcard_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let Path(flashcard_id) = flashcard_id?;
    let db = state.db()?;
    if db.get_flashcard(flashcard_id)?.is_none() {
        return Err(ApiError::NotFound("Flashcard not found"));
    }
    Ok(Json(db.reviews_for(flashcard_id)?))
}
