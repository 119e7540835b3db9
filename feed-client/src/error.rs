use thiserror::Error;

#[derive(Debug, Error)]
/// Ошибки клиентской библиотеки `feed-client`.
pub enum FeedClientError {
    /// Ошибка HTTP-транспорта (`reqwest`): соединение, таймаут, декодирование.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Требуется авторизация (отсутствует/некорректен токен).
    #[error("unauthorized")]
    Unauthorized,

    /// Запрошенный ресурс не найден.
    #[error("not found")]
    NotFound,

    /// Некорректный запрос (прочие 4xx).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Сервер ответил ошибкой 5xx.
    #[error("server error {status}: {message}")]
    Server {
        /// HTTP-статус ответа.
        status: u16,
        /// Текст ошибки из тела ответа или статус.
        message: String,
    },

    /// Некорректная конфигурация клиента.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Результат операций `feed-client`.
pub type FeedClientResult<T> = Result<T, FeedClientError>;

impl FeedClientError {
    pub(crate) fn from_http_status(status: reqwest::StatusCode, message: Option<String>) -> Self {
        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Self::Unauthorized
            }
            reqwest::StatusCode::NOT_FOUND => Self::NotFound,
            status if status.is_server_error() => Self::Server {
                status: status.as_u16(),
                message: message.unwrap_or_else(|| format!("http status {status}")),
            },
            _ => {
                let message = message.unwrap_or_else(|| format!("http status {status}"));
                Self::InvalidRequest(message)
            }
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_http_status(status, None);
        }
        Self::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn forbidden_maps_to_unauthorized() {
        let err = FeedClientError::from_http_status(StatusCode::FORBIDDEN, None);
        assert!(matches!(err, FeedClientError::Unauthorized));
    }

    #[test]
    fn server_errors_keep_status_and_message() {
        let err = FeedClientError::from_http_status(
            StatusCode::BAD_GATEWAY,
            Some("upstream down".to_string()),
        );
        match err {
            FeedClientError::Server { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[test]
    fn other_client_errors_fall_back_to_status_text() {
        let err = FeedClientError::from_http_status(StatusCode::CONFLICT, None);
        match err {
            FeedClientError::InvalidRequest(message) => assert!(message.contains("409")),
            other => panic!("expected invalid request, got {other:?}"),
        }
    }
}
