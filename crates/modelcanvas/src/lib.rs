mod config;
mod session;

pub use config::CanvasConfig;
pub use session::{open_backend, Session, SessionReport};
