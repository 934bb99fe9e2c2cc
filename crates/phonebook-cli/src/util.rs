use anyhow::Result;
use phonebook_core::time::format_timestamp_time;
use phonebook_core::{Contact, ContactId, Notification};
use std::io::{self, BufRead, Write};

use crate::error::invalid_input;

pub fn parse_contact_id(raw: &str) -> Result<ContactId> {
    ContactId::new(raw).map_err(|_| invalid_input("contact id cannot be empty"))
}

pub fn format_contact(contact: &Contact) -> String {
    format!(
        "{}  {}  {}",
        contact.id,
        contact.name,
        contact.phone_numbers.join(", ")
    )
}

pub fn format_notification(notification: &Notification) -> String {
    format!(
        "[{}] {} ({})",
        notification.kind.label(),
        notification.message,
        format_timestamp_time(notification.created_at)
    )
}

/// Prints `message` and reads one line from `input`. `None` on end of input.
pub fn prompt(input: &mut impl BufRead, message: &str) -> Result<Option<String>> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "{}", message)?;
    stdout.flush()?;
    drop(stdout);

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

pub fn confirm(input: &mut impl BufRead, message: &str) -> Result<bool> {
    let answer = prompt(input, &format!("{} [y/N]: ", message))?;
    Ok(matches!(
        answer.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref(),
        Some("y") | Some("yes")
    ))
}
