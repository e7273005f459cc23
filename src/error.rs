pub type AppResult<T> = Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },
    #[error("config error: {context}")]
    Config {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
        context: String,
    },
    #[error("terminal error: {0}")]
    Terminal(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<std::io::Error> for AppError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            context: "I/O operation failed".to_string(),
        }
    }
}

impl AppError {
    pub fn io_with_context(source: std::io::Error, context: impl Into<String>) -> Self {
        Self::Io {
            source,
            context: context.into(),
        }
    }

    pub fn config(
        source: impl std::error::Error + Send + Sync + 'static,
        context: impl Into<String>,
    ) -> Self {
        Self::Config {
            source: Box::new(source),
            context: context.into(),
        }
    }

    pub fn terminal(message: impl Into<String>) -> Self {
        Self::Terminal(message.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn config_error_wraps_source_and_context() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = AppError::config(inner, "reading config.toml");
        assert!(matches!(err, AppError::Config { .. }));
        assert_eq!(err.to_string(), "config error: reading config.toml");
    }
}
