use crate::commands::{print_json, Context};
use crate::util::{confirm, format_contact, format_notification, parse_contact_id, prompt};
use anyhow::Result;
use clap::Args;
use phonebook_core::time::now_utc;
use phonebook_core::Outcome;
use std::io::{self, BufRead};

const HELP: &str = "\
commands:
  list                      show contacts matching the filter
  filter [text]             set the name filter (empty clears it)
  name <text>               set the pending name
  number <text>             set the pending number
  add [<name> <number>]     add a contact (pending fields when no args)
  add <name> -- <number>    same, for numbers typed with spaces
  update <id> [number]      replace a contact's number (blank cancels)
  delete <id>               delete a contact after confirmation
  reload                    fetch the directory again
  help                      show this help
  quit                      leave the shell";

#[derive(Debug, Args)]
pub struct ShellArgs {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Empty,
    List,
    Filter(String),
    Name(String),
    Number(String),
    SubmitPending,
    Add { name: String, number: String },
    Update { id: String, number: String },
    Delete(String),
    Reload,
    Help,
    Quit,
    Usage(&'static str),
    Unknown(String),
}

pub fn run(ctx: &mut Context, _args: ShellArgs) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    run_with(ctx, &mut input)
}

fn run_with(ctx: &mut Context, input: &mut impl BufRead) -> Result<()> {
    let outcome = ctx.directory.load(now_utc());
    show(ctx, &outcome);
    println!("type 'help' for commands");

    loop {
        ctx.directory.expire_notification(now_utc());
        let Some(line) = prompt(input, "> ")? else {
            println!();
            break;
        };

        match parse_line(&line) {
            ShellCommand::Empty => {}
            ShellCommand::List => list(ctx)?,
            ShellCommand::Filter(text) => {
                ctx.directory.set_filter(text);
                list(ctx)?;
            }
            ShellCommand::Name(text) => ctx.directory.set_pending_name(text),
            ShellCommand::Number(text) => ctx.directory.set_pending_number(text),
            ShellCommand::SubmitPending => {
                let outcome = ctx.directory.submit_pending(now_utc());
                show(ctx, &outcome);
            }
            ShellCommand::Add { name, number } => {
                let outcome = ctx.directory.add(now_utc(), &name, &number);
                show(ctx, &outcome);
            }
            ShellCommand::Update { id, number } => {
                let id = match parse_contact_id(&id) {
                    Ok(id) => id,
                    Err(err) => {
                        println!("{err}");
                        continue;
                    }
                };
                let outcome = ctx.directory.update(now_utc(), &id, &number);
                show(ctx, &outcome);
            }
            ShellCommand::Delete(id) => {
                let id = match parse_contact_id(&id) {
                    Ok(id) => id,
                    Err(err) => {
                        println!("{err}");
                        continue;
                    }
                };
                let label = ctx
                    .directory
                    .contact(&id)
                    .map(|contact| contact.name.clone())
                    .unwrap_or_else(|| id.to_string());
                if !confirm(input, &format!("Confirm permanent deletion of {label}?"))? {
                    println!("deletion cancelled");
                    continue;
                }
                let outcome = ctx.directory.remove(now_utc(), &id);
                show(ctx, &outcome);
            }
            ShellCommand::Reload => {
                let outcome = ctx.directory.load(now_utc());
                show(ctx, &outcome);
            }
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => break,
            ShellCommand::Usage(usage) => println!("usage: {usage}"),
            ShellCommand::Unknown(word) => println!("unknown command: {word} (try 'help')"),
        }
    }
    Ok(())
}

fn list(ctx: &Context) -> Result<()> {
    let visible = ctx.directory.visible_contacts();
    if ctx.json {
        return print_json(&visible);
    }
    if visible.is_empty() {
        println!("no contacts");
    }
    for contact in visible {
        println!("{}", format_contact(contact));
    }
    Ok(())
}

fn show(ctx: &Context, outcome: &Outcome) {
    match outcome {
        Outcome::Cancelled => println!("update cancelled"),
        Outcome::Loaded(count) => println!("{count} contacts loaded"),
        _ => {}
    }
    if let Some(notification) = ctx.directory.notification(now_utc()) {
        println!("{}", format_notification(notification));
    }
}

fn parse_line(line: &str) -> ShellCommand {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "" => ShellCommand::Empty,
        "list" | "ls" => ShellCommand::List,
        "filter" => ShellCommand::Filter(rest.to_string()),
        "name" => ShellCommand::Name(rest.to_string()),
        "number" => ShellCommand::Number(rest.to_string()),
        "add" => {
            if rest.is_empty() {
                return ShellCommand::SubmitPending;
            }
            match split_name_and_number(rest) {
                Some((name, number)) => ShellCommand::Add { name, number },
                None => ShellCommand::Usage("add <name> <number>"),
            }
        }
        "update" => match rest.split_once(char::is_whitespace) {
            Some((id, number)) => ShellCommand::Update {
                id: id.to_string(),
                number: number.trim().to_string(),
            },
            None if !rest.is_empty() => ShellCommand::Update {
                id: rest.to_string(),
                number: String::new(),
            },
            None => ShellCommand::Usage("update <id> [number]"),
        },
        "delete" | "rm" => {
            if rest.is_empty() {
                ShellCommand::Usage("delete <id>")
            } else {
                ShellCommand::Delete(rest.to_string())
            }
        }
        "reload" => ShellCommand::Reload,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => ShellCommand::Unknown(other.to_string()),
    }
}

/// Splits `add` arguments at an explicit `--`, otherwise at the last word.
/// A trailing `NN-` word on the name side belongs to the number.
fn split_name_and_number(rest: &str) -> Option<(String, String)> {
    let (name, number) = match rest.split_once(" -- ") {
        Some((name, number)) => (name.trim(), number.trim().to_string()),
        None => {
            let (name, last) = rest.rsplit_once(char::is_whitespace)?;
            let name = name.trim_end();
            match name.rsplit_once(char::is_whitespace) {
                Some((head, area)) if is_area_prefix(area) => {
                    (head.trim_end(), format!("{area} {last}"))
                }
                _ => (name, last.to_string()),
            }
        }
    };
    if name.is_empty() || number.is_empty() {
        return None;
    }
    Some((name.to_string(), number))
}

fn is_area_prefix(word: &str) -> bool {
    word.strip_suffix('-')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}
