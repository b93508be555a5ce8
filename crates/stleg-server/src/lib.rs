//! Standalone HTTP server binary support: configuration loading, hot-reload
//! watchers for the Key Directory and the revocation seed file, the
//! administrative API of the License Enforcement Gateway, and the router
//! that wires all of it together in front of the reverse-proxy handler.

pub mod admin;
pub mod config;
pub mod error;
pub mod key_source;
pub mod proxy;
pub mod router;
pub mod seed;
pub mod state;
pub mod watcher;

pub use key_source::FileKeyDirectorySource;
pub use seed::RevocationSeedReload;

pub use config::ServerConfig;
pub use error::ServerError;
pub use state::AppState;
pub use watcher::{ConfigWatcher, Reloadable};
