//! Configuração do spendchart carregada a partir de `spendchart.toml`.
//!
//! A struct [`SpendchartConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `OPENAI_API_KEY` tem precedência sobre o arquivo.

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

/// Configuração de nível superior carregada de `spendchart.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SpendchartConfig {
    /// Chave da API OpenAI.
    #[serde(default)]
    pub api_key: String,

    /// URL base da API do job runner externo.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Modelo usado pelo assistant que renderiza o gráfico.
    #[serde(default = "default_model")]
    pub model: String,

    /// Caminho do banco SQLite de despesas.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Diretório onde os gráficos gerados são gravados.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Intervalo fixo entre consultas de status, em milissegundos.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Número máximo de consultas de status antes de desistir.
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Erros consecutivos de consulta tolerados antes de falhar.
    #[serde(default = "default_status_retry_limit")]
    pub status_retry_limit: u32,
}

// Valor padrão para a URL base: endpoint público da OpenAI.
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

// Valor padrão para o modelo: "gpt-4o".
fn default_model() -> String {
    "gpt-4o".to_string()
}

// Valor padrão para o banco de dados: arquivo no diretório atual.
fn default_database_path() -> String {
    "spendchart.db".to_string()
}

// Valor padrão para o diretório de saída: "charts".
fn default_output_dir() -> String {
    "charts".to_string()
}

// Valor padrão para o intervalo de polling: 1000ms.
fn default_poll_interval_ms() -> u64 {
    1000
}

// Valor padrão para tentativas máximas de polling: 300 (~5 minutos).
fn default_max_poll_attempts() -> u32 {
    300
}

// Valor padrão para erros consecutivos tolerados: 3.
fn default_status_retry_limit() -> u32 {
    3
}

impl Default for SpendchartConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            database_path: default_database_path(),
            output_dir: default_output_dir(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            status_retry_limit: default_status_retry_limit(),
        }
    }
}

impl SpendchartConfig {
    /// Carrega a configuração de `spendchart.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("spendchart.toml"))
    }

    /// Carrega a configuração a partir de um caminho explícito.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<SpendchartConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variável de ambiente tem precedência sobre o arquivo de configuração para a chave API.
        if let Ok(key) = std::env::var("OPENAI_API_KEY")
            && !key.is_empty()
        {
            config.api_key = key;
        }

        Ok(config)
    }
}
