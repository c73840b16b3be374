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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use flashdeck_core::types::timestamp::Timestamp;

use crate::cmd::serve::error::ApiError;
use crate::db::Database;

#[derive(Clone)]
pub struct ServerState {
    /// Every read-modify-write of a card happens under this lock.
    pub db: Arc<Mutex<Database>>,
    pub clock: fn() -> Timestamp,
}

impl ServerState {
    pub fn new(db: Database, clock: fn() -> Timestamp) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            clock,
        }
    }

    pub fn db(&self) -> Result<MutexGuard<'_, Database>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".to_string()))
    }

    /// Sample the clock. Handlers call this once per request.
    pub fn now(&self) -> Timestamp {
        (self.clock)()
    }
}
