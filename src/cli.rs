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
use std::process::exit;

use clap::Parser;
use clap::Subcommand;
use flashdeck_core::error::Fallible;
use flashdeck_core::types::timestamp::Timestamp;
use tokio::spawn;

use crate::cmd::cards::Grade;
use crate::cmd::cards::add_card;
use crate::cmd::cards::add_deck;
use crate::cmd::cards::list_due;
use crate::cmd::cards::review_card;
use crate::cmd::serve::server::ServerConfig;
use crate::cmd::serve::server::start_server;
use crate::config::Config;
use crate::config::FileConfig;
use crate::config::Overrides;
use crate::utils::wait_for_server;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. By default, flashdeck.toml is read if it exists.
    #[arg(long, global = true)]
    config: Option<String>,
    /// Path to the SQLite database. Default is flashdeck.db.
    #[arg(long, global = true)]
    database: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the JSON API and the drill page.
    Serve {
        /// The host address to bind to. Default is 127.0.0.1.
        #[arg(long)]
        host: Option<String>,
        /// The port to use for the web server. Default is 8000.
        #[arg(long)]
        port: Option<u16>,
        /// Open the drill page in a browser once the server is up.
        #[arg(long)]
        open_browser: bool,
    },
    /// Add a flashcard.
    Add {
        front: String,
        back: String,
        /// The deck to add the card to.
        #[arg(long)]
        deck: Option<i64>,
    },
    /// List the cards that are due now.
    Due {
        /// Only list cards from this deck.
        #[arg(long)]
        deck: Option<i64>,
        /// Maximum number of cards to list.
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Review a card.
    Review {
        id: i64,
        /// How well the card was recalled.
        grade: Grade,
    },
    /// Create a deck.
    DeckAdd {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Cli = Cli::parse();
    let file = FileConfig::load(cli.config.as_deref())?;
    let (host, port) = match &cli.command {
        Command::Serve { host, port, .. } => (host.clone(), *port),
        _ => (None, None),
    };
    let overrides = Overrides {
        database: cli.database,
        host,
        port,
    };
    let config = Config::resolve(file, overrides);
    log::debug!("Using database {}", config.database);
    match cli.command {
        Command::Serve { open_browser, .. } => {
            let Config {
                database,
                host,
                port,
            } = config;
            if open_browser {
                // Start a separate task to open the browser once the server is up.
                let browser_host = host.clone();
                spawn(async move {
                    match wait_for_server(&browser_host, port).await {
                        Ok(_) => {
                            let _ = open::that(format!("http://{browser_host}:{port}/"));
                        }
                        Err(e) => {
                            eprintln!("Failed to connect to server: {e}");
                            exit(-1)
                        }
                    }
                });
            }
            let config = ServerConfig {
                database,
                host,
                port,
                clock: Timestamp::now,
            };
            start_server(config).await
        }
        Command::Add { front, back, deck } => {
            add_card(&config.database, front, back, deck, Timestamp::now())
        }
        Command::Due { deck, limit } => list_due(&config.database, deck, limit, Timestamp::now()),
        Command::Review { id, grade } => {
            review_card(&config.database, id, grade.into(), Timestamp::now())
        }
        Command::DeckAdd { name, description } => {
            add_deck(&config.database, name, description, Timestamp::now())
        }
    }
}
