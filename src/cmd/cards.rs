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
use std::fmt::Display;
use std::fmt::Formatter;

use clap::ValueEnum;
use flashdeck_core::error::Fallible;
use flashdeck_core::error::fail;
use flashdeck_core::sm2::Feedback;
use flashdeck_core::types::timestamp::Timestamp;

use crate::db::CardFilter;
use crate::db::Database;

/// How well a card was recalled, as given on the command line.
#[derive(ValueEnum, Clone, Copy, PartialEq, Debug)]
pub enum Grade {
    /// Remembered easily.
    Good,
    /// Remembered with effort.
    Mid,
    /// Forgot the answer.
    Bad,
}

impl Display for Grade {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Feedback::from(*self).as_str())
    }
}

impl From<Grade> for Feedback {
    fn from(grade: Grade) -> Self {
        match grade {
            Grade::Good => Feedback::Good,
            Grade::Mid => Feedback::Mid,
            Grade::Bad => Feedback::Bad,
        }
    }
}

pub fn add_deck(
    database: &str,
    name: String,
    description: Option<String>,
    now: Timestamp,
) -> Fallible<()> {
    if name.trim().is_empty() {
        return fail("deck name must not be empty");
    }
    let db = Database::new(database)?;
    let deck = db.insert_deck(&name, description.as_deref(), now)?;
    println!("Created deck {}: {}", deck.id, deck.name);
    Ok(())
}

pub fn add_card(
    database: &str,
    front: String,
    back: String,
    deck_id: Option<i64>,
    now: Timestamp,
) -> Fallible<()> {
    if front.trim().is_empty() || back.trim().is_empty() {
        return fail("front and back must not be empty");
    }
    let db = Database::new(database)?;
    if let Some(deck_id) = deck_id {
        if db.get_deck(deck_id)?.is_none() {
            return fail(format!("no deck with ID {deck_id}"));
        }
    }
    let card = db.insert_flashcard(&front, &back, deck_id, now)?;
    println!("Created flashcard {}", card.id);
    Ok(())
}

/// Print the cards due at `now`, soonest first.
pub fn list_due(
    database: &str,
    deck_id: Option<i64>,
    limit: usize,
    now: Timestamp,
) -> Fallible<()> {
    let db = Database::new(database)?;
    let filter = CardFilter {
        deck_id,
        due_at: Some(now),
        limit,
    };
    let cards = db.list_flashcards(filter)?;
    if cards.is_empty() {
        println!("No cards due.");
    }
    for card in cards {
        println!("{}\t{}\t{}", card.id, card.schedule.next_review_at, card.front);
    }
    Ok(())
}

pub fn review_card(
    database: &str,
    flashcard_id: i64,
    feedback: Feedback,
    now: Timestamp,
) -> Fallible<()> {
    let mut db = Database::new(database)?;
    match db.record_review(flashcard_id, feedback, now)? {
        Some((card, _)) => {
            let schedule = card.schedule;
            println!(
                "Reviewed flashcard {} as {}: next review in {} day(s), at {} (easiness {:.2}, repetitions {}).",
                card.id,
                feedback.as_str(),
                schedule.interval,
                schedule.next_review_at,
                schedule.easiness_factor,
                schedule.repetitions
            );
            Ok(())
        }
        None => fail(format!("no flashcard with ID {flashcard_id}")),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::try_from(s.to_string()).unwrap()
    }

    #[test]
    fn test_add_and_review() -> Fallible<()> {
        let dir = tempdir()?;
        let database = dir.path().join("flashdeck.db").display().to_string();
        let now = ts("2024-03-01T09:00:00.000");

        add_deck(&database, "Capitals".to_string(), None, now)?;
        add_card(
            &database,
            "France".to_string(),
            "Paris".to_string(),
            Some(1),
            now,
        )?;
        list_due(&database, Some(1), 10, now)?;
        review_card(&database, 1, Feedback::Good, now)?;

        let db = Database::new(&database)?;
        let card = db.get_flashcard(1)?.unwrap();
        assert_eq!(card.deck_id, Some(1));
        assert_eq!(card.schedule.review_count, 1);
        assert_eq!(card.schedule.next_review_at, ts("2024-03-02T09:00:00.000"));
        Ok(())
    }

    #[test]
    fn test_invalid_input() -> Fallible<()> {
        let dir = tempdir()?;
        let database = dir.path().join("flashdeck.db").display().to_string();
        let now = ts("2024-03-01T09:00:00.000");

        assert!(add_deck(&database, " ".to_string(), None, now).is_err());
        assert!(add_card(&database, "a".to_string(), "b".to_string(), Some(7), now).is_err());
        assert!(review_card(&database, 1, Feedback::Good, now).is_err());

        let db = Database::new(&database)?;
        assert!(db.get_flashcard(1)?.is_none());
        Ok(())
    }

    #[test]
    fn test_grade_to_feedback() {
        assert_eq!(Feedback::from(Grade::Good), Feedback::Good);
        assert_eq!(Feedback::from(Grade::Mid), Feedback::Mid);
        assert_eq!(Feedback::from(Grade::Bad), Feedback::Bad);
        assert_eq!(Grade::Mid.to_string(), "mid");
    }
}
