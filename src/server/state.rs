//! Server state: shared services and the editor session store.

use std::collections::HashMap;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use crate::assets::AssetProbe;
use crate::compositor::Compositor;
use crate::config::EditorConfig;
use crate::error::CardstockError;
use crate::loader::TemplateLoader;
use crate::session::EditorSession;

/// Idle time after which an editor session is dropped.
pub const SESSION_EXPIRATION_SECS: u64 = 3600;

/// An editor session plus its last access time.
pub struct StoredSession {
    pub session: EditorSession,
    pub last_accessed: Instant,
}

impl StoredSession {
    pub fn new(session: EditorSession) -> Self {
        Self {
            session,
            last_accessed: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: EditorConfig,
    pub loader: TemplateLoader,
    pub compositor: Compositor,
    pub assets: AssetProbe,
    pub sessions: RwLock<HashMap<String, StoredSession>>,
    /// Unix timestamp of server boot for cache busting.
    pub boot_time: u64,
}

impl AppState {
    /// State backed by the HTTP template service named in `config`.
    pub fn new(config: EditorConfig) -> Result<Self, CardstockError> {
        let loader = TemplateLoader::from_config(&config)?;
        Self::with_loader(config, loader)
    }

    /// State with an explicit loader (tests substitute fake services here).
    pub fn with_loader(config: EditorConfig, loader: TemplateLoader) -> Result<Self, CardstockError> {
        let boot_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Ok(Self {
            compositor: Compositor::new(&config)?,
            assets: AssetProbe::new(&config)?,
            loader,
            config,
            sessions: RwLock::new(HashMap::new()),
            boot_time,
        })
    }
}
