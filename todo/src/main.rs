//! Command-line front end for the todo store.
//!
//! Each invocation opens the list from the file-backed slot, applies one
//! command, prints the resulting list and shuts the store down.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use todo_store::{InsertOrder, Todo, TodoConfig, TodoId, TodoPatch, TodoStore};
use todo_store_core::environment::RandomIdGenerator;
use todo_store_filesystem::FileSlotStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default log filter when `RUST_LOG` is not set
const DEFAULT_LOG_FILTER: &str = "todo_store=info,todo_store_runtime=warn";

#[derive(Parser, Debug)]
#[command(name = "todo", version, about = "Keep a todo list on disk")]
struct Cli {
    /// Directory holding the list (overrides TODO_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Slot key naming the list (overrides TODO_SLOT_KEY)
    #[arg(long, global = true)]
    slot: Option<String>,

    /// Append new todos instead of putting them first
    #[arg(long, global = true)]
    oldest_first: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show every todo
    List {
        /// Print the stored JSON form instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Add a todo
    Add {
        /// Title of the new todo
        title: String,
        /// Longer description
        #[arg(long)]
        text: Option<String>,
    },
    /// Edit the title and/or text of a todo
    Update {
        /// Todo to edit
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New text
        #[arg(long)]
        text: Option<String>,
    },
    /// Remove a todo
    Remove {
        /// Todo to remove
        id: String,
    },
    /// Flip the done flag of a todo
    Toggle {
        /// Todo to toggle
        id: String,
    },
    /// Move a todo to its next status
    Advance {
        /// Todo to advance
        id: String,
    },
    /// Remove every todo
    Clear,
}

impl Cli {
    /// Environment configuration with command-line overrides applied
    fn config(&self) -> TodoConfig {
        let mut config = TodoConfig::from_env();
        if let Some(dir) = &self.data_dir {
            config.data_dir.clone_from(dir);
        }
        if let Some(slot) = &self.slot {
            config.slot_key.clone_from(slot);
        }
        if self.oldest_first {
            config.insert_order = InsertOrder::OldestFirst;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    tracing::debug!(?config, "Loaded configuration");

    let slots = Arc::new(FileSlotStore::new(&config.data_dir));
    let store = TodoStore::open(&config, slots, Arc::new(RandomIdGenerator))
        .await
        .context("invalid configuration")?;

    let json = matches!(cli.command, Command::List { json: true });
    let changed = run(&store, cli.command).await?;
    if !changed {
        eprintln!("Nothing changed.");
    }

    let todos = store.snapshot().await;
    if json {
        let rendered =
            serde_json::to_string_pretty(&*todos).context("failed to render todos as JSON")?;
        println!("{rendered}");
    } else {
        print_todos(&todos);
    }

    store
        .shutdown(config.shutdown_timeout())
        .await
        .context("failed to flush pending writes")?;
    Ok(())
}

/// Apply one command; returns false when it was ignored
async fn run(store: &TodoStore, command: Command) -> anyhow::Result<bool> {
    let changed = match command {
        Command::List { .. } => true,
        Command::Add { title, text } => {
            let id = store.add(&title, text.as_deref()).await?;
            if let Some(id) = &id {
                eprintln!("Added {id}");
            }
            id.is_some()
        },
        Command::Update { id, title, text } => {
            let patch = TodoPatch { title, text };
            store.update(&TodoId::new(id), patch).await?
        },
        Command::Remove { id } => store.remove(&TodoId::new(id)).await?,
        Command::Toggle { id } => store.toggle_done(&TodoId::new(id)).await?,
        Command::Advance { id } => store.advance_status(&TodoId::new(id)).await?,
        Command::Clear => {
            store.clear().await?;
            true
        },
    };
    Ok(changed)
}

fn print_todos(todos: &[Todo]) {
    if todos.is_empty() {
        println!("No todos.");
        return;
    }

    for todo in todos {
        let done = if todo.is_done { "x" } else { " " };
        println!(
            "[{done}] {}  {}  ({})",
            todo.id, todo.title, todo.current_status
        );
        if !todo.text.is_empty() {
            println!("      {}", todo.text);
        }
    }
}
