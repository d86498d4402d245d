//! # Cardstock - Greeting Card Template Editor
//!
//! Cardstock loads personalised greeting-card templates, composes them into
//! a scaled preview and lets a user select elements and edit their text.
//! It provides:
//!
//! - **Template loading**: fetch from a template service with a bundled fallback
//! - **Compositing**: paint order, screen geometry and image sources per side
//! - **Editing**: selection, text edits, lock flags and inside-layout swaps
//! - **Preview**: standalone SVG rendering with bleed guide and missing-asset markers
//! - **Server**: an HTTP editor surface over in-memory sessions
//!
//! ## Quick Start
//!
//! ```no_run
//! use cardstock::{
//!     Compositor, EditorConfig, EditorSession, TemplateLoader,
//!     assets::AssetReport,
//!     compositor::Viewport,
//!     config::StartupParams,
//!     svg::{SvgOptions, render_svg},
//! };
//!
//! # async fn example() -> Result<(), cardstock::CardstockError> {
//! let config = EditorConfig::default();
//! let loader = TemplateLoader::from_config(&config)?;
//! let compositor = Compositor::new(&config)?;
//!
//! // Load front and inside concurrently
//! let mut session = EditorSession::start(&loader, StartupParams::default()).await?;
//!
//! // Edit a text element on the front
//! session.select("headline");
//! session.update_text("headline", "Alles Gute\nzum Geburtstag")?;
//!
//! // Render the active side
//! let composition = session.compose(&compositor, Viewport::default())?;
//! let svg = render_svg(
//!     &composition,
//!     &SvgOptions { show_bleed: true, selected: session.selected(), assets: &AssetReport::default() },
//! );
//! # let _ = svg;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`template`] | Project, page and element data model |
//! | [`loader`] | Template service client and bundled fallbacks |
//! | [`compositor`] | Render lists, paint order and image sources |
//! | [`session`] | Selection and edit state |
//! | [`svg`] | SVG preview rendering |
//! | [`assets`] | Image asset probing |
//! | [`server`] | HTTP editor surface |
//! | [`config`] | Endpoints and startup parameters |
//! | [`error`] | Error types |

pub mod assets;
pub mod compositor;
pub mod config;
pub mod error;
pub mod loader;
pub mod server;
pub mod session;
pub mod svg;
pub mod template;

// Re-exports for convenience
pub use compositor::Compositor;
pub use config::EditorConfig;
pub use error::CardstockError;
pub use loader::TemplateLoader;
pub use session::EditorSession;
