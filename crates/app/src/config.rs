use thiserror::Error;
use threadscribe_core::DEFAULT_MAX_COMMENTS;
use threadscribe_infra::AUTO_HINT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub max_comments: usize,
    pub slim: bool,
    pub for_analysis: bool,
    pub source: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid integer for {0}: {1}")]
    InvalidNumber(&'static str, String),
    #[error("invalid boolean for {0}: {1}")]
    InvalidBool(&'static str, String),
    #[error("failed to load .env: {0}")]
    Dotenv(#[from] dotenvy::Error),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let max_comments = read_usize(&lookup, "THREADSCRIBE_MAX_COMMENTS", DEFAULT_MAX_COMMENTS)?;
        let slim = read_bool(&lookup, "THREADSCRIBE_SLIM", false)?;
        let for_analysis = read_bool(&lookup, "THREADSCRIBE_FOR_ANALYSIS", false)?;
        let source = read_optional_string(&lookup, "THREADSCRIBE_SOURCE")
            .unwrap_or_else(|| AUTO_HINT.to_string());

        Ok(Self {
            max_comments,
            slim,
            for_analysis,
            source,
        })
    }
}

/// Loads `.env` from the working directory if there is one. Variables already
/// set in the environment win.
pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn read_usize<F>(lookup: &F, key: &'static str, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    match read_optional_string(lookup, key) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidNumber(key, raw)),
        None => Ok(default),
    }
}

fn read_bool<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    let Some(raw) = read_optional_string(lookup, key) else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool(key, raw)),
    }
}

fn read_optional_string<F>(lookup: &F, key: &'static str) -> Option<String>
where
    F: Fn(&'static str) -> Option<String>,
{
    let value = lookup(key).unwrap_or_default();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
