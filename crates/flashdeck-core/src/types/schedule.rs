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

use serde::Deserialize;
use serde::Serialize;

use crate::sm2::Easiness;
use crate::sm2::Feedback;
use crate::sm2::INITIAL_EASINESS;
use crate::sm2::INITIAL_INTERVAL;
use crate::sm2::Interval;
use crate::sm2::new_easiness;
use crate::sm2::success_interval;
use crate::types::timestamp::Timestamp;

/// The scheduling state of a single flashcard.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// How easy the card is for the learner. Never below 1.3.
    pub easiness_factor: Easiness,
    /// Days between the last review and the next one.
    pub interval: Interval,
    /// Consecutive non-failing reviews since the last reset.
    pub repetitions: usize,
    /// Total number of reviews, failures included.
    pub review_count: usize,
    /// When the card was last reviewed, if ever.
    pub last_reviewed_at: Option<Timestamp>,
    /// When the card is next due.
    pub next_review_at: Timestamp,
}

impl Schedule {
    /// The schedule of a card created at `created_at`. New cards are due
    /// immediately.
    pub fn new(created_at: Timestamp) -> Self {
        Self {
            easiness_factor: INITIAL_EASINESS,
            interval: INITIAL_INTERVAL,
            repetitions: 0,
            review_count: 0,
            last_reviewed_at: None,
            next_review_at: created_at,
        }
    }

    /// True if the card is new or its last review failed.
    pub fn is_reset(&self) -> bool {
        self.repetitions == 0
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.next_review_at <= now
    }

    /// Apply a review in place and return the updated schedule.
    pub fn update(&mut self, feedback: Feedback, reviewed_at: Timestamp) -> &Schedule {
        *self = update_schedule(*self, feedback, reviewed_at);
        self
    }
}

pub fn update_schedule(schedule: Schedule, feedback: Feedback, reviewed_at: Timestamp) -> Schedule {
    let Schedule {
        easiness_factor,
        interval,
        repetitions,
        review_count,
        ..
    } = schedule;
    let (easiness_factor, interval, repetitions): (Easiness, Interval, usize) =
        if feedback.is_failure() {
            (easiness_factor, INITIAL_INTERVAL, 0)
        } else {
            let easiness_factor = new_easiness(easiness_factor, feedback.quality());
            let interval = success_interval(repetitions, interval, easiness_factor);
            (easiness_factor, interval, repetitions + 1)
        };
    Schedule {
        easiness_factor,
        interval,
        repetitions,
        review_count: review_count + 1,
        last_reviewed_at: Some(reviewed_at),
        next_review_at: reviewed_at.add_days(interval),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::sm2::MIN_EASINESS;

    const ALL: [Feedback; 3] = [Feedback::Good, Feedback::Mid, Feedback::Bad];

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn make_timestamp(s: &str) -> Timestamp {
        let ndt = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.3f").unwrap();
        Timestamp::new(ndt)
    }

    fn created_at() -> Timestamp {
        make_timestamp("2024-01-01T12:00:00.000")
    }

    /// Review a fresh card with the given feedback, one day apart.
    fn run(grades: &[Feedback]) -> Schedule {
        let mut schedule = Schedule::new(created_at());
        for (i, grade) in grades.iter().enumerate() {
            schedule.update(*grade, created_at().add_days(i as i64));
        }
        schedule
    }

    /// Every feedback sequence of length `len`.
    fn sequences(len: usize) -> Vec<Vec<Feedback>> {
        let mut result: Vec<Vec<Feedback>> = vec![vec![]];
        for _ in 0..len {
            result = result
                .into_iter()
                .flat_map(|seq| {
                    ALL.iter().map(move |g| {
                        let mut next = seq.clone();
                        next.push(*g);
                        next
                    })
                })
                .collect();
        }
        result
    }

    /// A spread of starting states, including ones at the easiness floor.
    fn starting_states() -> Vec<Schedule> {
        let mut states = vec![Schedule::new(created_at())];
        for (easiness_factor, interval, repetitions) in
            [(1.3, 1, 0), (1.3, 40, 7), (1.42, 6, 1), (2.5, 6, 2), (3.1, 94, 5)]
        {
            states.push(Schedule {
                easiness_factor,
                interval,
                repetitions,
                review_count: repetitions + 2,
                last_reviewed_at: Some(created_at()),
                next_review_at: created_at().add_days(interval),
            });
        }
        states
    }

    #[test]
    fn test_new() {
        let schedule = Schedule::new(created_at());
        assert_eq!(schedule.easiness_factor, 2.5);
        assert_eq!(schedule.interval, 1);
        assert_eq!(schedule.repetitions, 0);
        assert_eq!(schedule.review_count, 0);
        assert_eq!(schedule.last_reviewed_at, None);
        assert!(schedule.is_due(created_at()));
        assert!(schedule.is_reset());
    }

    #[test]
    fn test_first_good() {
        let schedule = run(&[Feedback::Good]);
        assert!(approx_eq(schedule.easiness_factor, 2.6));
        assert_eq!(schedule.interval, 1);
        assert_eq!(schedule.repetitions, 1);
        assert_eq!(schedule.review_count, 1);
        assert!(!schedule.is_reset());
    }

    #[test]
    fn test_two_goods() {
        let schedule = run(&[Feedback::Good, Feedback::Good]);
        assert!(approx_eq(schedule.easiness_factor, 2.7));
        assert_eq!(schedule.interval, 6);
        assert_eq!(schedule.repetitions, 2);
        assert_eq!(schedule.review_count, 2);
    }

    #[test]
    fn test_three_goods() {
        let schedule = run(&[Feedback::Good, Feedback::Good, Feedback::Good]);
        assert!(approx_eq(schedule.easiness_factor, 2.8));
        assert_eq!(schedule.interval, 17);
        assert_eq!(schedule.repetitions, 3);
        assert_eq!(schedule.review_count, 3);
    }

    #[test]
    fn test_good_progression() {
        let mut schedule = Schedule::new(created_at());
        let intervals: Vec<Interval> = (0..5)
            .map(|_| schedule.update(Feedback::Good, created_at()).interval)
            .collect();
        assert_eq!(intervals, vec![1, 6, 17, 49, 147]);
    }

    #[test]
    fn test_third_review_uses_updated_easiness() {
        let schedule = Schedule {
            easiness_factor: 2.5,
            interval: 6,
            repetitions: 2,
            review_count: 2,
            last_reviewed_at: None,
            next_review_at: created_at(),
        };
        let result = update_schedule(schedule, Feedback::Good, created_at());
        // round(6 * 2.6)
        assert_eq!(result.interval, 16);
        assert_eq!(result.repetitions, 3);
    }

    #[test]
    fn test_first_mid() {
        let schedule = run(&[Feedback::Mid]);
        assert!(approx_eq(schedule.easiness_factor, 2.36));
        assert_eq!(schedule.interval, 1);
        assert_eq!(schedule.repetitions, 1);
        assert_eq!(schedule.review_count, 1);
    }

    #[test]
    fn test_bad_after_three_goods() {
        let schedule = run(&[Feedback::Good, Feedback::Good, Feedback::Good, Feedback::Bad]);
        assert_eq!(schedule.repetitions, 0);
        assert_eq!(schedule.interval, 1);
        assert_eq!(schedule.review_count, 4);
        assert!(approx_eq(schedule.easiness_factor, 2.8));
        assert!(schedule.is_reset());
    }

    #[test]
    fn test_bad_on_new_card() {
        let schedule = run(&[Feedback::Bad]);
        assert_eq!(schedule.repetitions, 0);
        assert_eq!(schedule.interval, 1);
        assert_eq!(schedule.review_count, 1);
        assert_eq!(schedule.easiness_factor, 2.5);
    }

    #[test]
    fn test_bad_resets_any_state() {
        for state in starting_states() {
            let result = update_schedule(state, Feedback::Bad, created_at());
            assert_eq!(result.repetitions, 0);
            assert_eq!(result.interval, 1);
            assert_eq!(result.easiness_factor, state.easiness_factor);
            assert_eq!(result.review_count, state.review_count + 1);
        }
    }

    #[test]
    fn test_repeated_bad() {
        let mut schedule = Schedule::new(created_at());
        let mut previous_due = schedule.next_review_at;
        for i in 1..=4 {
            let reviewed_at = created_at().add_days(i);
            schedule.update(Feedback::Bad, reviewed_at);
            assert_eq!((schedule.repetitions, schedule.interval), (0, 1));
            assert_eq!(schedule.review_count, i as usize);
            assert!(schedule.next_review_at > previous_due);
            previous_due = schedule.next_review_at;
        }
    }

    #[test]
    fn test_mid_cannot_pass_floor() {
        let mut schedule = Schedule::new(created_at());
        for _ in 0..50 {
            schedule.update(Feedback::Mid, created_at());
            assert!(schedule.easiness_factor >= MIN_EASINESS);
        }
        assert!(approx_eq(schedule.easiness_factor, MIN_EASINESS));
    }

    #[test]
    fn test_easiness_direction() {
        for state in starting_states() {
            let good = update_schedule(state, Feedback::Good, created_at());
            assert!(good.easiness_factor > state.easiness_factor);
            let mid = update_schedule(state, Feedback::Mid, created_at());
            if state.easiness_factor - 0.14 >= MIN_EASINESS {
                assert!(mid.easiness_factor < state.easiness_factor);
            } else {
                assert_eq!(mid.easiness_factor, MIN_EASINESS);
            }
        }
    }

    #[test]
    fn test_invariants_over_all_sequences() {
        for state in starting_states() {
            for seq in sequences(6) {
                let mut schedule = state;
                for (n, grade) in seq.iter().enumerate() {
                    let reviewed_at = created_at().add_days(n as i64);
                    schedule.update(*grade, reviewed_at);
                    assert!(schedule.easiness_factor >= MIN_EASINESS);
                    assert!(schedule.interval >= 1);
                    assert_eq!(schedule.review_count, state.review_count + n + 1);
                    assert_eq!(schedule.last_reviewed_at, Some(reviewed_at));
                    assert_eq!(
                        schedule.next_review_at,
                        reviewed_at.add_days(schedule.interval)
                    );
                    assert!(schedule.next_review_at > reviewed_at);
                    assert_eq!(schedule.is_reset(), *grade == Feedback::Bad);
                }
            }
        }
    }

    #[test]
    fn test_due_date_ignores_previous_due_date() {
        let mut schedule = Schedule::new(created_at());
        schedule.next_review_at = created_at().add_days(365);
        let reviewed_at = make_timestamp("2024-01-03T09:30:00.000");
        schedule.update(Feedback::Good, reviewed_at);
        assert_eq!(schedule.last_reviewed_at, Some(reviewed_at));
        assert_eq!(
            schedule.next_review_at,
            make_timestamp("2024-01-04T09:30:00.000")
        );
    }

    #[test]
    fn test_update_returns_updated_value() {
        let mut schedule = Schedule::new(created_at());
        let returned = *schedule.update(Feedback::Good, created_at());
        assert_eq!(returned, schedule);
        assert_eq!(
            returned,
            update_schedule(Schedule::new(created_at()), Feedback::Good, created_at())
        );
    }

    #[test]
    fn test_serialize() {
        let schedule = Schedule::new(created_at());
        let json = serde_json::to_string(&schedule).unwrap();
        assert_eq!(
            json,
            "{\"easiness_factor\":2.5,\"interval\":1,\"repetitions\":0,\"review_count\":0,\
             \"last_reviewed_at\":null,\"next_review_at\":\"2024-01-01T12:00:00.000\"}"
        );
    }
}
