use thiserror::Error;

pub type Result<T> = std::result::Result<T, StatelessBlindsError>;

#[derive(Error, Debug)]
pub enum StatelessBlindsError {
    #[error("configuration error")]
    ConfigurationError(#[from] config::ConfigError),
    #[error("io error")]
    IoError(#[from] std::io::Error),
    #[error("yaml error")]
    YamlError(#[from] serde_yaml::Error),
    #[error("invalid http method {0:?}")]
    InvalidHttpMethod(String),
    #[error("invalid header name {0:?}")]
    InvalidHeaderName(String),
    #[error("invalid value for header {0:?}")]
    InvalidHeaderValue(String),
    #[error("http request failed")]
    HttpError(#[from] reqwest::Error),
    #[error("serialisation error")]
    SerializationError(#[from] serde_json::Error),
    #[error("invalid switch payload {0:?}")]
    InvalidSwitchPayload(String),
}
