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

use std::fs::read_to_string;
use std::path::Path;

use flashdeck_core::error::Fallible;
use flashdeck_core::error::fail;
use serde::Deserialize;

/// Read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_PATH: &str = "flashdeck.toml";

const DEFAULT_DATABASE: &str = "flashdeck.db";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;

/// The contents of a configuration file. Every key is optional.
#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub database: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl FileConfig {
    pub fn parse(content: &str) -> Fallible<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load the file at `path`. Without an explicit path, the default file is
    /// read if present and an empty config is used otherwise.
    pub fn load(path: Option<&str>) -> Fallible<Self> {
        match path {
            Some(path) => {
                if !Path::new(path).exists() {
                    return fail(format!("config file does not exist: {path}"));
                }
                log::debug!("Reading config from {path}");
                Self::parse(&read_to_string(path)?)
            }
            None => {
                if Path::new(DEFAULT_CONFIG_PATH).exists() {
                    log::debug!("Reading config from {DEFAULT_CONFIG_PATH}");
                    Self::parse(&read_to_string(DEFAULT_CONFIG_PATH)?)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Values given on the command line. These take precedence over the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub database: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Self {
        Self {
            database: overrides
                .database
                .or(file.database)
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            host: overrides
                .host
                .or(file.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(file.port).unwrap_or(DEFAULT_PORT),
        }
    }
}
