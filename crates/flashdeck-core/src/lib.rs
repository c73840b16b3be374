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

//! flashdeck-core: Core library for the flashdeck study service.
//!
//! This library is free of I/O and provides:
//! - The SM-2 scheduler that turns review feedback into a new schedule
//! - The `Feedback` grades and their quality scores
//! - Millisecond-precision timestamps

pub mod error;
pub mod sm2;
pub mod types;

// Re-exports for convenience
pub use error::{ErrorReport, Fallible, fail};
pub use sm2::Feedback;
pub use types::schedule::{Schedule, update_schedule};
pub use types::timestamp::Timestamp;
