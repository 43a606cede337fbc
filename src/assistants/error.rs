//! Tipos de erro para o cliente da API de Assistants.
//!
//! Define [`AssistantsError`] com variantes para erros da API e erros de rede.
//! Usa `thiserror` para derivar `Display` e `Error` automaticamente a partir
//! dos atributos `#[error(...)]`.

use thiserror::Error;

/// Erros que podem ocorrer ao interagir com o job runner externo.
///
/// As variantes cobrem os dois cenários de falha:
/// - [`ApiError`](AssistantsError::ApiError) — erro HTTP retornado pela API (4xx/5xx)
/// - [`Network`](AssistantsError::Network) — falha na camada de rede
#[derive(Debug, Error)]
pub enum AssistantsError {
    /// Erro retornado pela API (ex.: 401 chave inválida, 500 erro interno).
    /// Contém o código de status HTTP e a mensagem de erro do corpo da resposta.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    /// Encapsula o erro original do `reqwest` via `#[from]`.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl AssistantsError {
    /// Verdadeiro quando o servidor recusou a credencial (401/403).
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            AssistantsError::ApiError {
                status: 401 | 403,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let err = AssistantsError::ApiError {
            status: 401,
            message: "Invalid API key".into(),
        };
        assert_eq!(err.to_string(), "API error (status 401): Invalid API key");
    }

    #[test]
    fn auth_failure_detection() {
        let unauthorized = AssistantsError::ApiError {
            status: 401,
            message: "nope".into(),
        };
        assert!(unauthorized.is_auth_failure());

        let server_error = AssistantsError::ApiError {
            status: 500,
            message: "boom".into(),
        };
        assert!(!server_error.is_auth_failure());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AssistantsError>();
    }
}
