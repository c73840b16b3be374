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

use flashdeck_core::error::Fallible;
use flashdeck_core::sm2::Feedback;
use flashdeck_core::types::schedule::Schedule;
use flashdeck_core::types::timestamp::Timestamp;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;
use serde::Serialize;

const SCHEMA: &str = "
create table if not exists decks (
    deck_id integer primary key autoincrement,
    name text not null,
    description text,
    created_at text not null
);

create table if not exists flashcards (
    flashcard_id integer primary key autoincrement,
    front text not null,
    back text not null,
    deck_id integer references decks (deck_id) on delete set null,
    created_at text not null,
    easiness_factor real not null,
    interval_days integer not null,
    repetitions integer not null,
    review_count integer not null,
    last_reviewed_at text,
    next_review_at text not null
);

create index if not exists flashcards_deck_id on flashcards (deck_id);

create table if not exists reviews (
    review_id integer primary key autoincrement,
    flashcard_id integer not null references flashcards (flashcard_id) on delete cascade,
    reviewed_at text not null,
    feedback text not null check (feedback in ('good', 'mid', 'bad'))
);

create index if not exists reviews_flashcard_id on reviews (flashcard_id);
";

const FLASHCARD_COLUMNS: &str = "flashcard_id, front, back, deck_id, created_at, easiness_factor, \
     interval_days, repetitions, review_count, last_reviewed_at, next_review_at";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Deck {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Flashcard {
    pub id: i64,
    pub front: String,
    pub back: String,
    pub deck_id: Option<i64>,
    pub created_at: Timestamp,
    #[serde(flatten)]
    pub schedule: Schedule,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Review {
    pub id: i64,
    pub flashcard_id: i64,
    pub reviewed_at: Timestamp,
    pub feedback: Feedback,
}

/// Which flashcards to list.
#[derive(Clone, Copy, Debug)]
pub struct CardFilter {
    /// Only cards in this deck.
    pub deck_id: Option<i64>,
    /// Only cards due at this moment.
    pub due_at: Option<Timestamp>,
    pub limit: usize,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path`. `:memory:` gives a
    /// throwaway in-memory database.
    pub fn new(path: &str) -> Fallible<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("pragma foreign_keys = on;")?;
        conn.execute_batch(SCHEMA)?;
        log::debug!("Opened database at {path}");
        Ok(Self { conn })
    }

    pub fn insert_deck(
        &self,
        name: &str,
        description: Option<&str>,
        created_at: Timestamp,
    ) -> Fallible<Deck> {
        self.conn.execute(
            "insert into decks (name, description, created_at) values (?1, ?2, ?3)",
            params![name, description, created_at],
        )?;
        Ok(Deck {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            description: description.map(|d| d.to_string()),
            created_at,
        })
    }

    pub fn get_deck(&self, deck_id: i64) -> Fallible<Option<Deck>> {
        let deck = self
            .conn
            .query_row(
                "select deck_id, name, description, created_at from decks where deck_id = ?1",
                params![deck_id],
                deck_from_row,
            )
            .optional()?;
        Ok(deck)
    }

    pub fn list_decks(&self, limit: usize) -> Fallible<Vec<Deck>> {
        let mut stmt = self.conn.prepare(
            "select deck_id, name, description, created_at from decks order by deck_id limit ?1",
        )?;
        let decks = stmt
            .query_map(params![limit as i64], deck_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(decks)
    }

    /// Insert a flashcard with a fresh schedule, due immediately.
    pub fn insert_flashcard(
        &self,
        front: &str,
        back: &str,
        deck_id: Option<i64>,
        created_at: Timestamp,
    ) -> Fallible<Flashcard> {
        let schedule = Schedule::new(created_at);
        self.conn.execute(
            "insert into flashcards (front, back, deck_id, created_at, easiness_factor, \
             interval_days, repetitions, review_count, last_reviewed_at, next_review_at) \
             values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                front,
                back,
                deck_id,
                created_at,
                schedule.easiness_factor,
                schedule.interval,
                schedule.repetitions as i64,
                schedule.review_count as i64,
                schedule.last_reviewed_at,
                schedule.next_review_at,
            ],
        )?;
        Ok(Flashcard {
            id: self.conn.last_insert_rowid(),
            front: front.to_string(),
            back: back.to_string(),
            deck_id,
            created_at,
            schedule,
        })
    }

    pub fn get_flashcard(&self, flashcard_id: i64) -> Fallible<Option<Flashcard>> {
        let sql = format!("select {FLASHCARD_COLUMNS} from flashcards where flashcard_id = ?1");
        let card = self
            .conn
            .query_row(&sql, params![flashcard_id], flashcard_from_row)
            .optional()?;
        Ok(card)
    }

    /// List flashcards in due-date order.
    pub fn list_flashcards(&self, filter: CardFilter) -> Fallible<Vec<Flashcard>> {
        let sql = format!(
            "select {FLASHCARD_COLUMNS} from flashcards \
             where (?1 is null or deck_id = ?1) and (?2 is null or next_review_at <= ?2) \
             order by next_review_at, flashcard_id limit ?3"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let cards = stmt
            .query_map(
                params![filter.deck_id, filter.due_at, filter.limit as i64],
                flashcard_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cards)
    }

    /// The number of cards due at `now`.
    pub fn count_due(&self, now: Timestamp) -> Fallible<usize> {
        let count: i64 = self.conn.query_row(
            "select count(*) from flashcards where next_review_at <= ?1",
            params![now],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Apply a review to a flashcard's schedule and log it. Both writes
    /// happen in one transaction. Returns `None` if the card does not exist.
    pub fn record_review(
        &mut self,
        flashcard_id: i64,
        feedback: Feedback,
        reviewed_at: Timestamp,
    ) -> Fallible<Option<(Flashcard, Review)>> {
        let tx = self.conn.transaction()?;
        let sql = format!("select {FLASHCARD_COLUMNS} from flashcards where flashcard_id = ?1");
        let card: Option<Flashcard> = tx
            .query_row(&sql, params![flashcard_id], flashcard_from_row)
            .optional()?;
        let Some(mut card) = card else {
            return Ok(None);
        };
        let schedule: Schedule = *card.schedule.update(feedback, reviewed_at);
        tx.execute(
            "update flashcards set easiness_factor = ?1, interval_days = ?2, repetitions = ?3, \
             review_count = ?4, last_reviewed_at = ?5, next_review_at = ?6 \
             where flashcard_id = ?7",
            params![
                schedule.easiness_factor,
                schedule.interval,
                schedule.repetitions as i64,
                schedule.review_count as i64,
                schedule.last_reviewed_at,
                schedule.next_review_at,
                flashcard_id,
            ],
        )?;
        tx.execute(
            "insert into reviews (flashcard_id, reviewed_at, feedback) values (?1, ?2, ?3)",
            params![flashcard_id, reviewed_at, feedback],
        )?;
        let review = Review {
            id: tx.last_insert_rowid(),
            flashcard_id,
            reviewed_at,
            feedback,
        };
        tx.commit()?;
        log::debug!(
            "Reviewed card {flashcard_id} as {}; next review at {}",
            feedback.as_str(),
            schedule.next_review_at
        );
        Ok(Some((card, review)))
    }

    /// The review log of a flashcard, oldest first.
    pub fn reviews_for(&self, flashcard_id: i64) -> Fallible<Vec<Review>> {
        let mut stmt = self.conn.prepare(
            "select review_id, flashcard_id, reviewed_at, feedback from reviews \
             where flashcard_id = ?1 order by review_id",
        )?;
        let reviews = stmt
            .query_map(params![flashcard_id], |row| {
                Ok(Review {
                    id: row.get(0)?,
                    flashcard_id: row.get(1)?,
                    reviewed_at: row.get(2)?,
                    feedback: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reviews)
    }
}

fn deck_from_row(row: &Row) -> rusqlite::Result<Deck> {
    Ok(Deck {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn flashcard_from_row(row: &Row) -> rusqlite::Result<Flashcard> {
    let repetitions: i64 = row.get(7)?;
    let review_count: i64 = row.get(8)?;
    Ok(Flashcard {
        id: row.get(0)?,
        front: row.get(1)?,
        back: row.get(2)?,
        deck_id: row.get(3)?,
        created_at: row.get(4)?,
        schedule: Schedule {
            easiness_factor: row.get(5)?,
            interval: row.get(6)?,
            repetitions: repetitions as usize,
            review_count: review_count as usize,
            last_reviewed_at: row.get(9)?,
            next_review_at: row.get(10)?,
        },
    })
}
