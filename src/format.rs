use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde::Serialize;

/// Output format for listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text, one line per block
    #[default]
    Text,
    /// JSON - machine-parseable
    Json,
}

impl OutputFormat {
    /// Serialize data to the requested format.
    ///
    /// # Errors
    /// Fails for [`OutputFormat::Text`], which is rendered by hand, and when
    /// JSON serialization fails.
    pub fn serialize<T: Serialize>(self, data: &T) -> Result<String> {
        match self {
            Self::Json => serde_json::to_string_pretty(data).context("JSON serialization failed"),
            Self::Text => bail!("Text format should not use serialize()"),
        }
    }
}
