//! Browser Session capability built on `chromiumoxide`.
//!
//! This module is the single source of truth for:
//! * Finding a usable browser executable (Brave → Chrome → Chromium,
//!   cross-platform).
//! * Launching one visible (or headless) session per site visit.
//! * The pointer/scroll/evaluate primitives the action catalog fires.
//! * A best-effort network-settle heuristic after navigation.
//!
//! Everything above this module talks to [`PageDriver`] / [`SessionHandle`] /
//! [`BrowserLauncher`] trait objects, so tests run against mocks and never
//! need a real browser.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::handler::viewport::Viewport as CdpViewport;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::core::types::{SessionError, Viewport};

/// The page operations the behavior layer needs. One observable effect per
/// call; errors propagate to the caller uncaught.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), SessionError>;

    /// Best-effort wait for network activity to settle after navigation.
    /// Logs and returns `Ok` on heuristic timeout; only transport failures
    /// are errors.
    async fn wait_settled(&self, timeout: Duration) -> Result<(), SessionError>;

    async fn mouse_move(&self, x: f64, y: f64) -> Result<(), SessionError>;
    async fn mouse_down(&self) -> Result<(), SessionError>;
    async fn mouse_up(&self) -> Result<(), SessionError>;

    /// Smooth vertical scroll by `dy` CSS pixels (negative scrolls up).
    async fn scroll_by(&self, dy: f64) -> Result<(), SessionError>;

    async fn evaluate(&self, js: &str) -> Result<(), SessionError>;

    /// Registers a script that runs in every new document before first paint.
    async fn install_on_new_document(&self, js: &str) -> Result<(), SessionError>;
}

/// One live browser session. Exclusively owned by the session runner; nothing
/// may touch the page once `close` begins.
#[async_trait]
pub trait SessionHandle: Send {
    fn page(&self) -> Arc<dyn PageDriver>;

    /// Tears the session down. Invoked exactly once per session.
    async fn close(&mut self) -> Result<(), SessionError>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn SessionHandle>, SessionError>;
}

// ── Browser executable discovery ─────────────────────────────────────────────

/// Find a usable Chromium-family browser executable.
///
/// Resolution order:
/// 1. `CHROME_EXECUTABLE` env var (explicit override)
/// 2. PATH scan — finds package-manager installs on all platforms.
/// 3. OS-specific well-known install paths.
pub fn find_chrome_executable() -> Option<String> {
    if let Ok(p) = std::env::var("CHROME_EXECUTABLE") {
        if Path::new(&p).exists() {
            return Some(p);
        }
    }

    if let Ok(path_var) = std::env::var("PATH") {
        let candidates = [
            "brave-browser",
            "brave",
            "google-chrome",
            "chromium",
            "chromium-browser",
            "chrome",
        ];
        for dir in std::env::split_paths(&path_var) {
            for exe in candidates {
                let full = dir.join(exe);
                if full.exists() {
                    return Some(full.to_string_lossy().to_string());
                }
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        let candidates = [
            "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "linux")]
    {
        let candidates = [
            "/usr/bin/brave-browser",
            "/usr/bin/brave",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/bin/google-chrome",
            "/usr/local/bin/chromium",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "windows")]
    {
        let candidates = [
            r"C:\Program Files\BraveSoftware\Brave-Browser\Application\brave.exe",
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    None
}

fn build_browser_config(
    exe: &str,
    viewport: Viewport,
    headless: bool,
) -> Result<BrowserConfig, SessionError> {
    let mut builder = BrowserConfig::builder()
        .chrome_executable(exe)
        .viewport(CdpViewport {
            width: viewport.width,
            height: viewport.height,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        })
        .window_size(viewport.width, viewport.height)
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--disable-infobars")
        // Cue playback inside pages must not wait for a user gesture.
        .arg("--autoplay-policy=no-user-gesture-required");

    if headless {
        builder = builder.arg("--disable-gpu").arg("--mute-audio");
    } else {
        builder = builder.with_head();
    }

    builder.build().map_err(SessionError::Launch)
}

// ── chromiumoxide-backed implementation ──────────────────────────────────────

pub struct CdpLauncher {
    executable: String,
    viewport: Viewport,
    headless: bool,
}

impl CdpLauncher {
    pub fn new(executable: impl Into<String>, viewport: Viewport, headless: bool) -> Self {
        Self {
            executable: executable.into(),
            viewport,
            headless,
        }
    }

    /// Launcher using the auto-discovered executable. `None` when no
    /// Chromium-family browser is installed on this machine.
    pub fn discover(viewport: Viewport, headless: bool) -> Option<Self> {
        find_chrome_executable().map(|exe| Self::new(exe, viewport, headless))
    }
}

#[async_trait]
impl BrowserLauncher for CdpLauncher {
    async fn launch(&self) -> Result<Box<dyn SessionHandle>, SessionError> {
        let config = build_browser_config(&self.executable, self.viewport, self.headless)?;

        info!(
            "launching browser ({}, {})",
            self.executable,
            if self.headless { "headless" } else { "visible" }
        );
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("cdp handler event error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        Ok(Box::new(CdpSession {
            browser,
            page: Arc::new(CdpPage {
                page,
                last_pointer: Mutex::new((0.0, 0.0)),
            }),
            handler_task,
            closed: false,
        }))
    }
}

pub struct CdpSession {
    browser: Browser,
    page: Arc<CdpPage>,
    handler_task: tokio::task::JoinHandle<()>,
    closed: bool,
}

#[async_trait]
impl SessionHandle for CdpSession {
    fn page(&self) -> Arc<dyn PageDriver> {
        Arc::clone(&self.page) as Arc<dyn PageDriver>
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        info!("closing browser session");
        let _ = self.browser.close().await;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        Ok(())
    }
}

pub struct CdpPage {
    page: Page,
    // CDP pointer events carry absolute coordinates; remember where the
    // pointer last moved so down/up land on the same spot.
    last_pointer: Mutex<(f64, f64)>,
}

impl CdpPage {
    async fn dispatch_mouse(
        &self,
        kind: DispatchMouseEventType,
        x: f64,
        y: f64,
        button: MouseButton,
        clicks: Option<i64>,
    ) -> Result<(), SessionError> {
        let mut builder = DispatchMouseEventParams::builder()
            .r#type(kind)
            .x(x)
            .y(y)
            .button(button);
        if let Some(n) = clicks {
            builder = builder.click_count(n);
        }
        let params = builder.build().map_err(SessionError::Capability)?;
        self.page
            .execute(params)
            .await
            .map_err(SessionError::capability)?;
        Ok(())
    }
}

#[async_trait]
impl PageDriver for CdpPage {
    async fn goto(&self, url: &str) -> Result<(), SessionError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| SessionError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn wait_settled(&self, timeout: Duration) -> Result<(), SessionError> {
        // Heuristic JS polling: chromiumoxide has no stable cross-version
        // NetworkIdle surface, so watch the resource count until it holds
        // still with the document complete.
        let timeout_ms = timeout.as_millis().min(u128::from(u64::MAX)) as u64;
        let js = format!(
            r#"(async () => {{
                const timeoutMs = {timeout_ms};
                const idleMs = 1000;
                const interval = 250;

                const start = Date.now();
                let lastCount = 0;
                let stableMs = 0;

                try {{ lastCount = performance.getEntriesByType('resource').length; }} catch (_) {{ lastCount = 0; }}

                while (Date.now() - start < timeoutMs) {{
                    await new Promise(r => setTimeout(r, interval));
                    let curCount = lastCount;
                    try {{ curCount = performance.getEntriesByType('resource').length; }} catch (_) {{ curCount = lastCount; }}

                    const ready = (document.readyState === 'complete');
                    if (ready && curCount === lastCount) {{
                        stableMs += interval;
                        if (stableMs >= idleMs) {{
                            return {{ ok: true, waitedMs: (Date.now() - start) }};
                        }}
                    }} else {{
                        stableMs = 0;
                    }}
                    lastCount = curCount;
                }}

                return {{ ok: false, waitedMs: (Date.now() - start) }};
            }})()"#,
        );

        let val = self
            .page
            .evaluate(js)
            .await
            .map_err(SessionError::capability)?;
        if let Ok(res) = val.into_value::<serde_json::Value>() {
            let ok = res.get("ok").and_then(|v| v.as_bool()).unwrap_or(false);
            let waited = res.get("waitedMs").and_then(|v| v.as_u64()).unwrap_or(0);
            if ok {
                info!("network settled after {}ms", waited);
            } else {
                warn!("network-settle heuristic timed out after {}ms", waited);
            }
        }
        Ok(())
    }

    async fn mouse_move(&self, x: f64, y: f64) -> Result<(), SessionError> {
        self.dispatch_mouse(DispatchMouseEventType::MouseMoved, x, y, MouseButton::None, None)
            .await?;
        *self.last_pointer.lock().await = (x, y);
        Ok(())
    }

    async fn mouse_down(&self) -> Result<(), SessionError> {
        let (x, y) = *self.last_pointer.lock().await;
        self.dispatch_mouse(
            DispatchMouseEventType::MousePressed,
            x,
            y,
            MouseButton::Left,
            Some(1),
        )
        .await
    }

    async fn mouse_up(&self) -> Result<(), SessionError> {
        let (x, y) = *self.last_pointer.lock().await;
        self.dispatch_mouse(
            DispatchMouseEventType::MouseReleased,
            x,
            y,
            MouseButton::Left,
            Some(1),
        )
        .await
    }

    async fn scroll_by(&self, dy: f64) -> Result<(), SessionError> {
        self.page
            .evaluate(format!(
                "window.scrollBy({{top: {}, left: 0, behavior: 'smooth'}});",
                dy
            ))
            .await
            .map_err(SessionError::capability)?;
        Ok(())
    }

    async fn evaluate(&self, js: &str) -> Result<(), SessionError> {
        self.page
            .evaluate(js.to_string())
            .await
            .map_err(SessionError::capability)?;
        Ok(())
    }

    async fn install_on_new_document(&self, js: &str) -> Result<(), SessionError> {
        self.page
            .execute(AddScriptToEvaluateOnNewDocumentParams::new(js.to_string()))
            .await
            .map_err(SessionError::capability)?;
        Ok(())
    }
}
