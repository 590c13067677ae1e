//! Core library for browsing and editing the `loots` table of a game server database.

pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod file_utils;
pub mod filter;
pub mod form;
pub mod models;
pub mod session;

pub use catalog::ItemCatalog;
pub use database::LootStore;
pub use error::{LootError, Result};
pub use models::{LootEntry, LootRow};
pub use session::EditorSession;
