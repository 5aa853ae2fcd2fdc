use crate::catalog::CatalogSource;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CATALOG: &str = "products.json";
pub const DEFAULT_COMPLETION_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub catalog: CatalogSource,
    pub completion: CompletionConfig,
    pub data_dir: PathBuf,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub json_format: bool,
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("USERPROFILE").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup so tests do not
    /// have to mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let catalog = non_empty("BLUSH_CATALOG")
            .map(|raw| CatalogSource::parse(&raw))
            .unwrap_or_else(|| CatalogSource::parse(DEFAULT_CATALOG));

        let timeout = non_empty("BLUSH_REQUEST_TIMEOUT_SECS").and_then(|raw| {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    tracing::warn!(value = %raw, "ignoring invalid BLUSH_REQUEST_TIMEOUT_SECS");
                    None
                }
            }
        });

        let completion = CompletionConfig {
            endpoint: non_empty("BLUSH_COMPLETION_URL")
                .unwrap_or_else(|| DEFAULT_COMPLETION_URL.to_string()),
            model: non_empty("BLUSH_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: non_empty("OPENAI_API_KEY"),
            timeout,
        };

        let data_dir = non_empty("BLUSH_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| home_dir().join(".blush"));

        let logging = LoggingConfig {
            json_format: lookup("LOG_FORMAT")
                .map(|value| value.to_lowercase() == "json")
                .unwrap_or(false),
        };

        Self {
            catalog,
            completion,
            data_dir,
            logging,
        }
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.data_dir.join("storage")
    }
}
