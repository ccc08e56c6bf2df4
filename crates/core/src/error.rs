/// Errors raised while assembling the sweep configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidValue {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigParse(err.to_string())
    }
}

impl From<dotenvy::Error> for Error {
    fn from(err: dotenvy::Error) -> Self {
        Error::ConfigParse(format!(".env: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
