//! Interactive form shell: one command per line, dispatched to the
//! catalog controller.

use std::io::{self, Write};

use client_core::{CatalogController, CatalogError};
use shared::domain::{Product, ProductId};
use tracing::debug;

pub const HELP: &str = "\
commands:
  list | refresh          reload the catalog
  name <text>             set the form name
  price <number>          set the form price
  submit                  add the product, or update it in edit mode
  add <price> <name...>   fill the form and submit
  edit <id>               load a product into the form
  cancel                  leave edit mode
  delete <id>             delete a product (asks first)
  help                    show this text
  quit                    leave the shell";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Refresh,
    Name(String),
    Price(String),
    Submit,
    Add { price: String, name: String },
    Edit(ProductId),
    Cancel,
    Delete(ProductId),
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "list" | "refresh" => ShellCommand::Refresh,
        "name" => ShellCommand::Name(rest.to_string()),
        "price" => ShellCommand::Price(rest.to_string()),
        "submit" => ShellCommand::Submit,
        "add" => {
            let (price, name) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "usage: add <price> <name...>".to_string())?;
            ShellCommand::Add {
                price: price.to_string(),
                name: name.trim().to_string(),
            }
        }
        "edit" => ShellCommand::Edit(required_id(rest, "edit")?),
        "cancel" => ShellCommand::Cancel,
        "delete" => ShellCommand::Delete(required_id(rest, "delete")?),
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        "" => return Err(String::new()),
        other => return Err(format!("unknown command '{other}'; type 'help'")),
    };
    Ok(command)
}

fn required_id(rest: &str, command: &str) -> Result<ProductId, String> {
    if rest.is_empty() || rest.contains(char::is_whitespace) {
        return Err(format!("usage: {command} <id>"));
    }
    Ok(ProductId::new(rest))
}

pub async fn execute(
    controller: &CatalogController,
    command: ShellCommand,
    out: &mut dyn Write,
) -> io::Result<Flow> {
    match command {
        ShellCommand::Refresh => controller.load_products().await,
        ShellCommand::Name(name) => controller.set_form_name(name).await,
        ShellCommand::Price(price) => controller.set_form_price(price).await,
        ShellCommand::Submit => log_failure(controller.submit().await.map(drop)),
        ShellCommand::Add { price, name } => {
            log_failure(controller.submit_with(name, price).await.map(drop))
        }
        ShellCommand::Edit(id) => match controller.begin_edit_by_id(&id).await {
            Ok(()) => {}
            Err(CatalogError::UnknownProduct(id)) => {
                writeln!(out, "no product {id} in the list; try 'refresh'")?;
            }
            Err(err) => writeln!(out, "{err}")?,
        },
        ShellCommand::Cancel => controller.cancel_edit().await,
        ShellCommand::Delete(id) => {
            if let Ok(client_core::DeleteOutcome::Declined) = controller.delete_product(&id).await
            {
                writeln!(out, "delete cancelled")?;
            }
        }
        ShellCommand::Help => writeln!(out, "{HELP}")?,
        ShellCommand::Quit => return Ok(Flow::Exit),
    }
    Ok(Flow::Continue)
}

fn log_failure(result: Result<(), CatalogError>) {
    // already on the error banner
    if let Err(err) = result {
        debug!(error = %err, "shell command failed");
    }
}

/// One-shot update through the form: load, edit `id`, fill and submit.
pub async fn update_through_form(
    controller: &CatalogController,
    id: &ProductId,
    name: String,
    price: String,
) -> Result<Product, CatalogError> {
    controller.load_products().await;
    controller.begin_edit_by_id(id).await?;
    controller.submit_with(name, price).await
}

/// Loads the catalog, then runs commands until `quit` or end of input.
pub async fn run_shell<I>(
    controller: &CatalogController,
    lines: I,
    out: &mut dyn Write,
) -> io::Result<()>
where
    I: IntoIterator<Item = io::Result<String>>,
{
    controller.load_products().await;
    controller.cancel_edit().await;

    for line in lines {
        let line = line?;
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) if message.is_empty() => continue,
            Err(message) => {
                writeln!(out, "{message}")?;
                continue;
            }
        };
        if execute(controller, command, out).await? == Flow::Exit {
            break;
        }
    }
    Ok(())
}

/// Lines typed on stdin, read one at a time so a confirmation prompt can
/// read from the same stream in between.
pub fn stdin_lines() -> impl Iterator<Item = io::Result<String>> {
    std::iter::from_fn(|| {
        print!("> ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(Ok(line)),
            Err(err) => Some(Err(err)),
        }
    })
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
