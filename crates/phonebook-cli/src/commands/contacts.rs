use crate::commands::{print_json, Context};
use crate::error::not_found;
use crate::util::{confirm, format_contact, parse_contact_id, prompt};
use anyhow::Result;
use clap::{ArgAction, Args};
use phonebook_core::time::now_utc;
use phonebook_core::Outcome;
use std::io;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Case-insensitive name substring
    #[arg(long)]
    pub filter: Option<String>,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub number: String,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub id: String,
    /// New number; prompted for when omitted
    #[arg(long)]
    pub number: Option<String>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub id: String,
    /// Skip the confirmation prompt
    #[arg(long, short, action = ArgAction::SetTrue)]
    pub yes: bool,
}

pub fn list_contacts(ctx: &mut Context, args: ListArgs) -> Result<()> {
    ctx.load()?;
    if let Some(filter) = args.filter {
        ctx.directory.set_filter(filter);
    }
    let visible = ctx.directory.visible_contacts();

    if ctx.json {
        print_json(&visible)?;
        return Ok(());
    }

    if visible.is_empty() {
        println!("no contacts");
        return Ok(());
    }

    for contact in visible {
        println!("{}", format_contact(contact));
    }
    Ok(())
}

pub fn add_contact(ctx: &mut Context, args: AddArgs) -> Result<()> {
    ctx.load()?;
    ctx.directory.set_pending_name(args.name);
    ctx.directory.set_pending_number(args.number);

    let now = now_utc();
    let outcome = ctx.directory.submit_pending(now);
    ctx.finish(now, &outcome)?;

    if let (true, Outcome::Added(contact)) = (ctx.json, &outcome) {
        print_json(contact)?;
    }
    Ok(())
}

pub fn update_contact(ctx: &mut Context, args: UpdateArgs) -> Result<()> {
    let id = parse_contact_id(&args.id)?;
    ctx.load()?;

    let number = match args.number {
        Some(number) => number,
        None => {
            let contact = ctx
                .directory
                .contact(&id)
                .ok_or_else(|| not_found(format!("contact {id} not found")))?;
            let current = contact.primary_number().unwrap_or_default();
            let message = format!("Update number for {} [{}]: ", contact.name, current);
            prompt(&mut io::stdin().lock(), &message)?.unwrap_or_default()
        }
    };

    let now = now_utc();
    let outcome = ctx.directory.update(now, &id, &number);
    if outcome == Outcome::Cancelled {
        if !ctx.json {
            println!("update cancelled");
        }
        return Ok(());
    }
    ctx.finish(now, &outcome)?;

    if let (true, Outcome::Updated(contact)) = (ctx.json, &outcome) {
        print_json(contact)?;
    }
    Ok(())
}

pub fn delete_contact(ctx: &mut Context, args: DeleteArgs) -> Result<()> {
    let id = parse_contact_id(&args.id)?;
    ctx.load()?;

    if !args.yes {
        let label = ctx
            .directory
            .contact(&id)
            .map(|contact| contact.name.clone())
            .unwrap_or_else(|| id.to_string());
        let message = format!("Confirm permanent deletion of {label}?");
        if !confirm(&mut io::stdin().lock(), &message)? {
            if !ctx.json {
                println!("deletion cancelled");
            }
            return Ok(());
        }
    }

    let now = now_utc();
    let outcome = ctx.directory.remove(now, &id);
    ctx.finish(now, &outcome)?;

    if ctx.json {
        print_json(&serde_json::json!({ "id": id }))?;
    }
    Ok(())
}
