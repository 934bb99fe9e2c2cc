use anyhow::Result;
use phonebook_client::HttpDirectory;
use phonebook_core::time::now_utc;
use phonebook_core::{Directory, Outcome};
use serde::Serialize;
use std::io::{self, Write};

use crate::error::{outcome_error, CliError};
use crate::util::format_notification;

pub mod completions;
pub mod contacts;
pub mod shell;

pub struct Context {
    pub directory: Directory<HttpDirectory>,
    pub json: bool,
}

impl Context {
    /// Loads the directory, failing the command when the service is down.
    pub fn load(&mut self) -> Result<()> {
        let outcome = self.directory.load(now_utc());
        if outcome.is_success() {
            return Ok(());
        }
        let message = self
            .directory
            .last_error()
            .unwrap_or("failed to load directory")
            .to_string();
        Err(CliError::Failed(message).into())
    }

    pub fn notification_text(&self, now: i64) -> String {
        self.directory
            .notification(now)
            .map(|notification| notification.message.clone())
            .unwrap_or_default()
    }

    /// Prints the notification for a finished operation, or converts an
    /// unsuccessful outcome into an error.
    pub fn finish(&self, now: i64, outcome: &Outcome) -> Result<()> {
        if let Some(err) = outcome_error(outcome, self.notification_text(now)) {
            return Err(err);
        }
        if !self.json {
            if let Some(notification) = self.directory.notification(now) {
                println!("{}", format_notification(notification));
            }
        }
        Ok(())
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
