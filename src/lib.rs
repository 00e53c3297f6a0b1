#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod capture;
pub mod command;
pub mod element;
pub mod error;
pub mod export;
pub mod geometry;
pub mod input;
pub mod overlay;
pub mod presets;
pub mod raster;
pub mod renderer;
pub mod scene;
pub mod state;
pub mod texture_manager;
pub mod tools;
pub mod util;

pub use app::OverlayApp;
pub use command::{Command, CommandError, CommandResult, History};
pub use element::{Element, ElementType, ObjectId};
pub use export::{ExportError, ExportOptions, ExportOutcome};
pub use renderer::Renderer;
pub use scene::Scene;
pub use state::{EditorContext, ToolConfig};
pub use tools::{Tool, ToolKind};
