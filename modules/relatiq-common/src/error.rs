use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelatiqError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Preference storage error: {0}")]
    Preferences(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
