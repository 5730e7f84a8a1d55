pub mod archive;
pub mod codec;
pub mod error;
pub mod images;
pub mod models;
pub mod service;
pub mod store;
pub mod views;

pub use error::{Error, Result};
pub use service::{ImportMode, ImportState, ImportSummary, RecipeService, StagedImport};
