use anyhow::{Context, Result};
use std::path::PathBuf;

const DEFAULT_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub history_limit: usize,
    /// When set, the rendered HTML report fragment is written here after a
    /// completed run.
    pub export_path: Option<PathBuf>,
    pub working_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let base_url = std::env::var("FINSIGHT_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let history_limit = std::env::var("FINSIGHT_HISTORY_LIMIT")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_HISTORY_LIMIT);

        let export_path = std::env::var("FINSIGHT_EXPORT_HTML")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            base_url,
            history_limit,
            export_path,
            working_dir: std::env::current_dir().context("cannot resolve working directory")?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        // Url::parse accepts "localhost:5000" by treating "localhost" as the
        // scheme, so a parse check alone lets schemeless values through.
        match reqwest::Url::parse(self.base_url.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => anyhow::bail!(
                "invalid FINSIGHT_BASE_URL '{}': expected an http(s) URL like {}",
                self.base_url,
                DEFAULT_BASE_URL
            ),
        }
        if self.history_limit == 0 {
            anyhow::bail!("FINSIGHT_HISTORY_LIMIT must be at least 1");
        }
        Ok(())
    }
}
