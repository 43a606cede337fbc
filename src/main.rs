mod artifacts;
mod assistants;
mod cli;
mod config;
mod dataset;
mod error;
mod graph;
mod poll;
mod results;
mod runner;
mod store;
mod ui;

use std::path::Path;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use artifacts::ArtifactStore;
use assistants::AssistantsClient;
use cli::{Cli, Command};
use config::SpendchartConfig;
use graph::{GraphRequest, GraphService};
use poll::Poller;
use runner::OpenAiRunner;
use store::{Expense, ExpenseStore, NewExpense};
use ui::GraphProgress;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SpendchartConfig::load_from(Path::new(path))?,
        None => SpendchartConfig::load()?,
    };
    let store = ExpenseStore::connect(Path::new(&config.database_path)).await?;

    match cli.command {
        Command::Add {
            description,
            category,
            amount,
            date,
        } => {
            let expense = store
                .add(NewExpense {
                    description,
                    category,
                    amount,
                    date,
                })
                .await?;
            println!(
                "Added expense #{}: {} ({}, {:.2}, {})",
                expense.id, expense.description, expense.category, expense.amount, expense.date
            );
        }

        Command::List => {
            let expenses = store.list().await?;
            if expenses.is_empty() {
                println!("No expenses recorded.");
            }
            for e in expenses {
                println!(
                    "#{:<5} {:<10} {:>10.2}  {}  {}",
                    e.id,
                    e.category.to_string(),
                    e.amount,
                    e.date,
                    e.description
                );
            }
        }

        Command::Update {
            id,
            description,
            category,
            amount,
            date,
        } => {
            store
                .update(&Expense {
                    id,
                    description,
                    category,
                    amount,
                    date,
                })
                .await?;
            println!("Updated expense #{id}");
        }

        Command::Delete { id } => {
            store.delete(id).await?;
            println!("Deleted expense #{id}");
        }

        Command::Graph { category, month } => {
            if config.api_key.is_empty() {
                bail!(
                    "no API key configured; set OPENAI_API_KEY or api_key in spendchart.toml"
                );
            }

            let client =
                AssistantsClient::with_base_url(config.api_key.clone(), config.base_url.clone());
            let service = GraphService::new(
                OpenAiRunner::new(client, config.model.clone()),
                ArtifactStore::new(&config.output_dir),
                Poller::new(
                    Duration::from_millis(config.poll_interval_ms),
                    config.max_poll_attempts,
                    config.status_retry_limit,
                ),
            );

            // Ctrl-C aborts the wait instead of orphaning the poll loop.
            let cancel = CancellationToken::new();
            {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        cancel.cancel();
                    }
                });
            }

            let progress = GraphProgress::start(&category.to_string(), &month);
            let request = GraphRequest { category, month };
            match service.generate(&store, &request, &cancel).await {
                Ok(outcome) => progress.finish(&outcome),
                Err(err) => {
                    progress.fail(&err);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
