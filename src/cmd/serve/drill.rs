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

use axum::Form;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::rejection::FormRejection;
use axum::extract::rejection::QueryRejection;
use axum::response::Html;
use axum::response::Redirect;
use flashdeck_core::sm2::Feedback;
use maud::Markup;
use maud::html;
use serde::Deserialize;

use crate::cmd::serve::error::ApiError;
use crate::cmd::serve::state::ServerState;
use crate::cmd::serve::template::page_template;
use crate::db::CardFilter;
use crate::db::Flashcard;

#[derive(Deserialize)]
pub struct DrillParams {
    /// Show the back of this card.
    reveal: Option<i64>,
}

#[derive(Deserialize)]
pub struct DrillForm {
    card_id: i64,
    feedback: Feedback,
}

pub async fn get_handler(
    State(state): State<ServerState>,
    params: Result<Query<DrillParams>, QueryRejection>,
) -> Result<Html<String>, ApiError> {
    let Query(params) = params?;
    let now = state.now();
    let db = state.db()?;
    let remaining = db.count_due(now)?;
    let revealed: Option<Flashcard> = match params.reveal {
        Some(card_id) => db
            .get_flashcard(card_id)?
            .filter(|card| card.schedule.is_due(now)),
        None => None,
    };
    let body = match revealed {
        Some(card) => render_card(&card, true, remaining),
        None => {
            let filter = CardFilter {
                deck_id: None,
                due_at: Some(now),
                limit: 1,
            };
            match db.list_flashcards(filter)?.first() {
                Some(card) => render_card(card, false, remaining),
                None => render_done(),
            }
        }
    };
    Ok(Html(page_template(body).into_string()))
}

pub async fn post_handler(
    State(state): State<ServerState>,
    form: Result<Form<DrillForm>, FormRejection>,
) -> Result<Redirect, ApiError> {
    let Form(form) = form?;
    let now = state.now();
    let mut db = state.db()?;
    match db.record_review(form.card_id, form.feedback, now)? {
        Some(_) => Ok(Redirect::to("/")),
        None => Err(ApiError::NotFound("Flashcard not found")),
    }
}

fn render_card(card: &Flashcard, reveal: bool, remaining: usize) -> Markup {
    let controls = if reveal {
        html! {
            form action="/" method="post" {
                input type="hidden" name="card_id" value=(card.id);
                div.grades {
                    button #bad type="submit" name="feedback" value="bad" title="Forgot the answer." { "Bad" }
                    button #mid type="submit" name="feedback" value="mid" title="Remembered with effort." { "Mid" }
                    button #good type="submit" name="feedback" value="good" title="Remembered easily." { "Good" }
                }
            }
        }
    } else {
        html! {
            a #reveal href=(format!("/?reveal={}", card.id)) { "Reveal" }
        }
    };
    html! {
        div.root {
            div.header {
                span.remaining { (remaining) " due" }
            }
            div.card {
                div.question { (card.front) }
                @if reveal {
                    div.answer { (card.back) }
                }
            }
            div.controls {
                (controls)
            }
        }
    }
}

fn render_done() -> Markup {
    html! {
        div.finished {
            h1 { "No cards due." }
        }
    }
}
