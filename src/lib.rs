pub mod cli;
pub mod error;
pub mod loader;
pub mod logging;
pub mod preloader;
pub mod settings;

pub use error::{AppError, LoadError, LoadFailure, PreloadError};
pub use loader::{MediaHandle, MediaLoader, SourceLoader, SourceLoaderConfig};
pub use preloader::{
    PreloadConfig, PreloadEvent, PreloadEvents, PreloadQueue, Preloader, ResourceStatus,
    StatusSnapshot, spawn_preloader,
};
