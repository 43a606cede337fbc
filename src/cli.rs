//! Interface de linha de comando do spendchart baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (add, list, update,
//! delete, graph) e a flag global `--config`.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::store::Category;

/// spendchart — Controle de despesas pessoais com geração de gráficos por IA.
#[derive(Debug, Parser)]
#[command(name = "spendchart", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho para um arquivo de configuração alternativo.
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Registra uma nova despesa.
    Add {
        /// Descrição da despesa.
        description: String,

        /// Categoria da despesa.
        #[arg(value_enum)]
        category: Category,

        /// Valor (positivo).
        amount: f64,

        /// Data no formato AAAA-MM-DD.
        date: NaiveDate,
    },

    /// Lista todas as despesas registradas.
    List,

    /// Substitui os campos de uma despesa existente.
    Update {
        /// Identificador da despesa.
        id: i64,

        /// Nova descrição.
        description: String,

        /// Nova categoria.
        #[arg(value_enum)]
        category: Category,

        /// Novo valor (positivo).
        amount: f64,

        /// Nova data no formato AAAA-MM-DD.
        date: NaiveDate,
    },

    /// Remove uma despesa.
    Delete {
        /// Identificador da despesa.
        id: i64,
    },

    /// Gera um gráfico das despesas de uma categoria em um mês.
    Graph {
        /// Categoria a incluir no gráfico.
        #[arg(value_enum)]
        category: Category,

        /// Nome completo do mês (ex.: "January").
        month: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_add_subcommand() {
        let cli = Cli::parse_from([
            "spendchart",
            "add",
            "Groceries",
            "food",
            "42.5",
            "2025-01-15",
        ]);
        match cli.command {
            Command::Add {
                description,
                category,
                amount,
                date,
            } => {
                assert_eq!(description, "Groceries");
                assert_eq!(category, Category::Food);
                assert_eq!(amount, 42.5);
                assert_eq!(date, "2025-01-15".parse::<NaiveDate>().unwrap());
            }
            _ => panic!("expected Add command"),
        }
    }

    #[test]
    fn cli_parses_graph_subcommand() {
        let cli = Cli::parse_from(["spendchart", "graph", "transport", "March"]);
        match cli.command {
            Command::Graph { category, month } => {
                assert_eq!(category, Category::Transport);
                assert_eq!(month, "March");
            }
            _ => panic!("expected Graph command"),
        }
    }

    #[test]
    fn cli_parses_global_config_flag() {
        let cli = Cli::parse_from(["spendchart", "--config", "/tmp/alt.toml", "list"]);
        assert_eq!(cli.config.as_deref(), Some("/tmp/alt.toml"));
        assert!(matches!(cli.command, Command::List));
    }

    #[test]
    fn cli_rejects_unknown_category() {
        let result = Cli::try_parse_from([
            "spendchart",
            "add",
            "Groceries",
            "snacks",
            "10",
            "2025-01-01",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
