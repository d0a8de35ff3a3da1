//! Site pool: the read-only set of target URLs, loaded once at startup.

use std::path::Path;

use anyhow::Context;
use tracing::warn;

use crate::behavior::rng::RandomSource;

#[derive(Debug, Clone)]
pub struct SitePool {
    sites: Vec<String>,
}

impl SitePool {
    /// Loads a newline-delimited URL list from disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read site list {}", path.display()))?;
        Self::parse(&raw)
    }

    /// Parses a newline-delimited URL list. Blank and whitespace-only lines
    /// are skipped, so a trailing newline never yields an empty site; lines
    /// that are not valid URLs are skipped with a warning.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let mut sites = Vec::new();
        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if url::Url::parse(line).is_err() {
                warn!("skipping invalid site url: {}", line);
                continue;
            }
            sites.push(line.to_string());
        }
        anyhow::ensure!(!sites.is_empty(), "site list contains no usable urls");
        Ok(Self { sites })
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Uniform pick.
    pub fn choose(&self, rng: &mut dyn RandomSource) -> &str {
        let idx = (rng.next_f64() * self.sites.len() as f64) as usize;
        &self.sites[idx.min(self.sites.len() - 1)]
    }
}
