use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use ghostwalk::behavior::rng::{self, SystemRandom};
use ghostwalk::browser::CdpLauncher;
use ghostwalk::core::config;
use ghostwalk::features::sound::{NullSink, SoundSink, TonePlayer};
use ghostwalk::run_loop::RunLoop;
use ghostwalk::session::SessionOptions;
use ghostwalk::sites::SitePool;

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    let prefix = format!("{}=", name);
    let mut args = std::env::args().peekable();
    while let Some(a) = args.next() {
        if a == name {
            if let Some(v) = args.next() {
                return Some(PathBuf::from(v));
            }
        } else if let Some(rest) = a.strip_prefix(&prefix) {
            return Some(PathBuf::from(rest));
        }
    }
    None
}

fn flag_present(name: &str) -> bool {
    std::env::args().any(|a| a == name)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cfg = config::load_config(parse_path_arg("--config"));

    let sites_path = parse_path_arg("--sites").unwrap_or_else(|| cfg.resolve_sites_file());
    let sites = SitePool::load(&sites_path)?;
    info!("{} sites loaded. warming up...", sites.len());

    let viewport = cfg.resolve_viewport();
    let headless = flag_present("--headless") || cfg.resolve_headless();

    let launcher = CdpLauncher::discover(viewport, headless).ok_or_else(|| {
        anyhow::anyhow!("no Chromium-family browser found (set CHROME_EXECUTABLE to override)")
    })?;

    let sound: Arc<dyn SoundSink> = if cfg.resolve_use_sound() {
        Arc::new(TonePlayer)
    } else {
        Arc::new(NullSink)
    };

    let opts = SessionOptions {
        viewport,
        show_cursor: cfg.resolve_show_cursor(),
        settle_timeout: cfg.resolve_settle_timeout(),
    };

    let run_loop = RunLoop::new(
        sites,
        cfg.resolve_action_counts(),
        cfg.resolve_timeouts_ms(),
        opts,
        Arc::new(launcher),
        sound,
        rng::shared(SystemRandom::new()),
    );

    // Never returns on the happy path; the first session failure unwinds
    // here and exits non-zero.
    run_loop.run().await?;
    Ok(())
}
