use std::path::PathBuf;
use std::time::Duration;

use crate::core::types::Viewport;

// ---------------------------------------------------------------------------
// GhostwalkConfig — file-based config loader (ghostwalk.json) with env-var
// fallback
// ---------------------------------------------------------------------------

/// Candidate pool the run loop draws each session's action count from.
pub const DEFAULT_ACTION_COUNTS: &[usize] = &[3, 10, 20, 25, 8, 25, 13, 25, 2, 9, 40];

/// Candidate pool for the per-session inter-action timeout, in milliseconds.
pub const DEFAULT_TIMEOUTS_MS: &[u64] = &[500, 700, 600, 550, 1000, 1500, 300, 590];

/// Top-level config loaded from `ghostwalk.json`.
///
/// Every field is optional; resolution order per field is JSON → env var →
/// built-in default, so a missing file behaves like an all-defaults run.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct GhostwalkConfig {
    /// Newline-delimited URL list. Default: `sites.txt` next to the process.
    pub sites_file: Option<String>,
    /// Run the browser without a visible window. Default: `false` — the
    /// simulated activity is meant to happen in a window you can watch.
    pub headless: Option<bool>,
    /// Play a tone for every dispatched action. Default: `true`.
    pub use_sound: Option<bool>,
    /// Inject the on-page cursor overlay. Default: `true`.
    pub show_cursor: Option<bool>,
    pub viewport_width: Option<u32>,
    pub viewport_height: Option<u32>,
    /// Candidate pool for per-session action counts.
    pub action_counts: Option<Vec<usize>>,
    /// Candidate pool for per-session inter-action timeouts (milliseconds).
    pub timeouts_ms: Option<Vec<u64>>,
    /// Upper bound for the post-navigation settle wait, in seconds.
    pub settle_timeout_secs: Option<u64>,
}

impl GhostwalkConfig {
    /// Site list path: JSON field → `GHOSTWALK_SITES` env var → `sites.txt`.
    pub fn resolve_sites_file(&self) -> PathBuf {
        if let Some(p) = &self.sites_file {
            if !p.trim().is_empty() {
                return PathBuf::from(expand_tilde(p.trim()));
            }
        }
        std::env::var("GHOSTWALK_SITES")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(|v| PathBuf::from(expand_tilde(&v)))
            .unwrap_or_else(|| PathBuf::from("sites.txt"))
    }

    /// Headless toggle: JSON field → `GHOSTWALK_HEADLESS` env var → `false`.
    pub fn resolve_headless(&self) -> bool {
        if let Some(b) = self.headless {
            return b;
        }
        env_truthy("GHOSTWALK_HEADLESS")
    }

    /// Sound toggle: JSON field → `GHOSTWALK_SOUND` env var (set to `0` to
    /// disable) → `true`.
    pub fn resolve_use_sound(&self) -> bool {
        if let Some(b) = self.use_sound {
            return b;
        }
        std::env::var("GHOSTWALK_SOUND")
            .map(|v| v.trim() != "0")
            .unwrap_or(true)
    }

    /// Cursor overlay toggle: JSON field → `GHOSTWALK_CURSOR` env var (set to
    /// `0` to disable) → `true`.
    pub fn resolve_show_cursor(&self) -> bool {
        if let Some(b) = self.show_cursor {
            return b;
        }
        std::env::var("GHOSTWALK_CURSOR")
            .map(|v| v.trim() != "0")
            .unwrap_or(true)
    }

    pub fn resolve_viewport(&self) -> Viewport {
        let default = Viewport::default();
        Viewport {
            width: self.viewport_width.unwrap_or(default.width),
            height: self.viewport_height.unwrap_or(default.height),
        }
    }

    /// Action-count pool; an explicitly empty pool is rejected in favor of
    /// the defaults.
    pub fn resolve_action_counts(&self) -> Vec<usize> {
        match &self.action_counts {
            Some(pool) if !pool.is_empty() => pool.clone(),
            Some(_) => {
                tracing::warn!("action_counts is empty in config — using defaults");
                DEFAULT_ACTION_COUNTS.to_vec()
            }
            None => DEFAULT_ACTION_COUNTS.to_vec(),
        }
    }

    /// Timeout pool; an explicitly empty pool is rejected in favor of the
    /// defaults.
    pub fn resolve_timeouts_ms(&self) -> Vec<u64> {
        match &self.timeouts_ms {
            Some(pool) if !pool.is_empty() => pool.clone(),
            Some(_) => {
                tracing::warn!("timeouts_ms is empty in config — using defaults");
                DEFAULT_TIMEOUTS_MS.to_vec()
            }
            None => DEFAULT_TIMEOUTS_MS.to_vec(),
        }
    }

    pub fn resolve_settle_timeout(&self) -> Duration {
        Duration::from_secs(self.settle_timeout_secs.unwrap_or(20))
    }
}

/// Load `ghostwalk.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `explicit` (the `--config` CLI argument)
/// 2. `GHOSTWALK_CONFIG` env var path
/// 3. `./ghostwalk.json` (process cwd)
/// 4. `../ghostwalk.json` (one level up, when running from a subdirectory)
///
/// Missing file → `GhostwalkConfig::default()` (silent, env fallbacks apply).
/// Parse error → log a warning, return `GhostwalkConfig::default()`.
pub fn load_config(explicit: Option<PathBuf>) -> GhostwalkConfig {
    let candidates: Vec<PathBuf> = {
        let mut v = vec![
            PathBuf::from("ghostwalk.json"),
            PathBuf::from("../ghostwalk.json"),
        ];
        if let Ok(env_path) = std::env::var("GHOSTWALK_CONFIG") {
            v.insert(0, PathBuf::from(env_path));
        }
        if let Some(p) = explicit {
            v.insert(0, p);
        }
        v
    };

    for path in &candidates {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<GhostwalkConfig>(&contents) {
                Ok(cfg) => {
                    tracing::info!("ghostwalk.json loaded from {}", path.display());
                    return cfg;
                }
                Err(e) => {
                    tracing::warn!(
                        "ghostwalk.json parse error at {}: {} — using defaults",
                        path.display(),
                        e
                    );
                    return GhostwalkConfig::default();
                }
            },
            Err(_) => continue, // file not found at this path — try next
        }
    }

    GhostwalkConfig::default()
}

fn env_truthy(key: &str) -> bool {
    let Ok(v) = std::env::var(key) else {
        return false;
    };
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn expand_tilde(raw: &str) -> String {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    raw.to_string()
}
