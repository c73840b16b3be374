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

use crate::error::ErrorReport;
use crate::error::fail;

pub type Easiness = f64;
pub type Quality = u8;

/// Interval in whole days.
pub type Interval = i64;

/// The easiness factor of a card that has never been reviewed.
pub const INITIAL_EASINESS: Easiness = 2.5;

/// The easiness factor never drops below this.
pub const MIN_EASINESS: Easiness = 1.3;

pub const INITIAL_INTERVAL: Interval = 1;

/// Interval after the second consecutive successful review.
const SECOND_INTERVAL: Interval = 6;

const MAX_QUALITY: f64 = 5.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Good,
    Mid,
    Bad,
}

impl Feedback {
    pub fn quality(self) -> Quality {
        match self {
            Feedback::Bad => 0,
            Feedback::Mid => 3,
            Feedback::Good => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Feedback::Good => "good",
            Feedback::Mid => "mid",
            Feedback::Bad => "bad",
        }
    }

    /// Whether this feedback resets the card's progress.
    pub fn is_failure(self) -> bool {
        self.quality() == 0
    }
}

impl TryFrom<String> for Feedback {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "good" => Ok(Feedback::Good),
            "mid" => Ok(Feedback::Mid),
            "bad" => Ok(Feedback::Bad),
            _ => fail(format!("invalid feedback string: {value}")),
        }
    }
}

#[cfg(feature = "sqlite")]
impl rusqlite::types::ToSql for Feedback {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(rusqlite::types::ToSqlOutput::from(self.as_str().to_string()))
    }
}

#[cfg(feature = "sqlite")]
impl rusqlite::types::FromSql for Feedback {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        let string = value.as_str()?.to_string();
        Feedback::try_from(string).map_err(|e| rusqlite::types::FromSqlError::Other(Box::new(e)))
    }
}

/// The change in easiness factor for a successful review of quality `q`.
pub fn easiness_delta(q: Quality) -> f64 {
    let miss = MAX_QUALITY - f64::from(q);
    0.1 - miss * (0.08 + miss * 0.02)
}

pub fn new_easiness(ef: Easiness, q: Quality) -> Easiness {
    f64::max(MIN_EASINESS, ef + easiness_delta(q))
}

/// The interval after a successful review, given the repetition count and
/// interval from before the review and the already-updated easiness.
pub fn success_interval(repetitions: usize, interval: Interval, ef: Easiness) -> Interval {
    match repetitions {
        0 => INITIAL_INTERVAL,
        1 => SECOND_INTERVAL,
        _ => (interval as f64 * ef).round() as Interval,
    }
}

#[cfg(test)]
mod tests {
    use std::iter::zip;

    use super::*;
    use crate::error::Fallible;

    /// Approximate equality.
    fn feq(a: f64, b: f64) -> bool {
        f64::abs(a - b) < 1e-9
    }

    #[test]
    fn test_quality_table() {
        assert_eq!(Feedback::Bad.quality(), 0);
        assert_eq!(Feedback::Mid.quality(), 3);
        assert_eq!(Feedback::Good.quality(), 5);
        assert!(Feedback::Bad.is_failure());
        assert!(!Feedback::Mid.is_failure());
    }

    #[test]
    fn test_easiness_delta() {
        assert!(feq(easiness_delta(5), 0.1));
        assert!(feq(easiness_delta(3), -0.14));
    }

    #[test]
    fn test_new_easiness_floor() {
        assert!(feq(new_easiness(1.3, 3), MIN_EASINESS));
        assert!(feq(new_easiness(1.35, 3), MIN_EASINESS));
        assert!(feq(new_easiness(1.3, 5), 1.4));
    }

    #[test]
    fn test_success_interval() {
        assert_eq!(success_interval(0, 30, 2.5), 1);
        assert_eq!(success_interval(1, 1, 2.5), 6);
        assert_eq!(success_interval(2, 6, 2.6), 16);
        assert_eq!(success_interval(2, 6, 2.8), 17);
    }

    /// Ties round away from zero.
    #[test]
    fn test_success_interval_tie() {
        assert_eq!(success_interval(3, 10, 1.25), 13);
        assert_eq!(success_interval(3, 2, 1.75), 4);
    }

    #[test]
    fn test_feedback_serialization_roundtrip() -> Fallible<()> {
        let grades = [Feedback::Good, Feedback::Mid, Feedback::Bad];
        for grade in grades {
            assert_eq!(grade, Feedback::try_from(grade.as_str().to_string())?);
        }
        Ok(())
    }

    #[test]
    fn test_feedback_labels() {
        let labels: Vec<&'static str> = [Feedback::Good, Feedback::Mid, Feedback::Bad]
            .into_iter()
            .map(Feedback::as_str)
            .collect();
        assert_eq!(labels, vec!["good", "mid", "bad"]);
    }

    #[test]
    fn test_feedback_serialization_format() -> Fallible<()> {
        let grades = [Feedback::Good, Feedback::Mid, Feedback::Bad];
        let expected = ["good", "mid", "bad"];
        for (grade, expected) in zip(grades, expected) {
            let serialized = serde_json::to_string(&grade)?;
            assert_eq!(serialized, format!("\"{expected}\""));
        }
        Ok(())
    }

    #[test]
    fn test_invalid_feedback() {
        for s in ["", "GOOD", "easy", "hard"] {
            assert!(Feedback::try_from(s.to_string()).is_err());
            assert!(serde_json::from_str::<Feedback>(&format!("\"{s}\"")).is_err());
        }
    }
}
