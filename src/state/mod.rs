pub mod context;
mod persistence;
mod tool_config;

pub use context::EditorContext;
pub use persistence::{FileSessionStore, MemorySessionStore, PersistenceError, PersistenceResult, SessionStore};
pub use tool_config::ToolConfig;
