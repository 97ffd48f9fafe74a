use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    view::AlwaysConfirm, CatalogController, CatalogError, ConfirmPrompt, DeleteOutcome,
    HttpCatalogStore,
};
use shared::domain::ProductId;
use tracing_subscriber::EnvFilter;

mod config;
mod shell;
mod terminal;

use config::load_settings;
use terminal::{LinePrompt, TerminalRenderer};

#[derive(Parser, Debug)]
#[command(name = "catalog", about = "Manage a remote product catalog")]
struct Cli {
    /// Collection endpoint, e.g. http://localhost:3000/productos
    #[arg(long)]
    api_url: Option<String>,
    /// Config file (defaults to ./catalog.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive form shell (default)
    Shell,
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: String,
    },
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: String,
    },
    Delete {
        #[arg(long)]
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }
    let store = HttpCatalogStore::new(&settings.api_url)
        .with_context(|| format!("cannot use collection url '{}'", settings.api_url))?;

    let command = cli.command.unwrap_or(Command::Shell);
    let interactive = matches!(command, Command::Shell);
    let prompt: Arc<dyn ConfirmPrompt> = match &command {
        Command::Delete { yes: true, .. } => Arc::new(AlwaysConfirm),
        _ => Arc::new(LinePrompt::stdin()),
    };
    let renderer = Arc::new(TerminalRenderer::stdout(interactive));
    let controller = CatalogController::new_with_banner_ttl(
        Arc::new(store),
        renderer.clone(),
        prompt,
        settings.error_banner_ttl(),
    );

    match command {
        Command::Shell => {
            println!("{}", shell::HELP);
            let mut out = std::io::stdout();
            shell::run_shell(&controller, shell::stdin_lines(), &mut out).await?;
        }
        Command::List => {
            controller.load_products().await;
            if let Some(message) = renderer.current_error() {
                bail!(message);
            }
        }
        Command::Add { name, price } => {
            let created = controller.submit_with(name, price).await?;
            println!("created product {}", created.id);
        }
        Command::Update { id, name, price } => {
            let id = ProductId::new(id);
            match shell::update_through_form(&controller, &id, name, price).await {
                Ok(updated) => println!("updated product {}", updated.id),
                Err(CatalogError::UnknownProduct(_)) => {
                    if let Some(message) = renderer.current_error() {
                        bail!(message);
                    }
                    bail!("no product {id} in the catalog");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Delete { id, .. } => {
            match controller.delete_product(&ProductId::new(id)).await? {
                DeleteOutcome::Declined => println!("delete cancelled"),
                DeleteOutcome::Deleted => {}
            }
        }
    }

    Ok(())
}
