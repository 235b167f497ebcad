// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command, arg};
use colored::Colorize;
use davsync_dav::{DavClient, Href};

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct CmdDiscover {
    pub principal: String,
}

impl CmdDiscover {
    pub const NAME: &str = "discover";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("List the calendar and address book homes reachable from a principal")
            .arg(arg!(<PRINCIPAL> "Principal URL or path, e.g. /dav/principals/alice/"))
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        let principal = matches
            .get_one::<String>("PRINCIPAL")
            .ok_or("Principal is required")?;
        Ok(Self {
            principal: principal.clone(),
        })
    }

    pub async fn run(self, config: &Config) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "discovering home sets...");

        let client = DavClient::new(config.server.clone())?;
        let homes = client
            .discover_home_sets(&Href::from(self.principal.as_str()))
            .await?;

        for (title, hrefs) in [
            ("Calendar homes", &homes.calendar_homes),
            ("Address book homes", &homes.addressbook_homes),
            ("Principals", &homes.principals),
        ] {
            println!("{}", title.bold());
            if hrefs.is_empty() {
                println!("  {}", "(none)".italic());
            }
            for href in hrefs {
                println!("  {href}");
            }
        }
        Ok(())
    }
}
