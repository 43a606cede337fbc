//! Interface de terminal do spendchart — spinner e saída colorida.
//!
//! Usa as crates `indicatif` para o spinner de progresso e `console` para
//! estilização com cores. O [`GraphProgress`] acompanha visualmente a geração
//! de um gráfico no terminal.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::SpendchartError;
use crate::graph::GraphOutcome;

/// Indicador visual de progresso para a geração de um gráfico no terminal.
///
/// Exibe um spinner animado enquanto o run externo está em andamento e
/// mensagens coloridas para sucesso (verde), avisos (amarelo) e falha
/// (vermelho).
pub struct GraphProgress {
    // Barra de progresso/spinner do indicatif.
    pb: ProgressBar,
    // Estilo verde para mensagens de sucesso.
    green: Style,
    // Estilo vermelho para mensagens de falha.
    red: Style,
    // Estilo amarelo para avisos.
    yellow: Style,
    // Estilo ciano para os papéis da narração.
    cyan: Style,
}

impl GraphProgress {
    /// Inicia o spinner com a seleção pedida e retorna a instância de progresso.
    pub fn start(category: &str, month: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("invalid template"),
        );
        pb.set_message(format!("Generating graph for {category} in {month}..."));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            cyan: Style::new().cyan().bold(),
        }
    }

    /// Finaliza o spinner e exibe a narração, os arquivos salvos e os avisos.
    pub fn finish(&self, outcome: &GraphOutcome) {
        self.pb.finish_and_clear();

        for message in &outcome.narration {
            if let Some(text) = &message.text {
                let role = message.role.to_uppercase();
                println!("{} {text}", self.cyan.apply_to(format!("[{role}]:")));
            }
        }

        println!();
        for path in &outcome.saved_files {
            println!(
                "  {} Chart saved to {}",
                self.green.apply_to("✓"),
                path.display()
            );
        }
        if outcome.saved_files.is_empty() {
            println!("  The run completed without producing any chart file.");
        }
        for warning in &outcome.warnings {
            println!("  {} {warning}", self.yellow.apply_to("⚠"));
        }
    }

    /// Finaliza o spinner e exibe a falha do workflow.
    pub fn fail(&self, err: &SpendchartError) {
        self.pb.finish_and_clear();
        println!("  {} Graph generation failed: {err}", self.red.apply_to("✗"));
    }
}
