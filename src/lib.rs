pub mod behavior;
pub mod browser;
pub mod core;
pub mod features;
pub mod run_loop;
pub mod session;
pub mod sites;

// --- Primary core exports ---
pub use core::config;
pub use core::types;
pub use core::types::*;

// --- Convenience module paths ---
pub use behavior::{actions, rng, scheduler, sequence};
pub use browser::{BrowserLauncher, CdpLauncher, PageDriver, SessionHandle};
pub use features::{cursor, sound};
pub use run_loop::RunLoop;
pub use session::{run_session, SessionContext, SessionOptions};
pub use sites::SitePool;
