//! Embedded history store: which pages were opened when, and which pages
//! the watch list currently carries.

mod connection;
mod helpers;
mod migrations;
mod models;
mod repositories;

pub use connection::{History, HistoryStore, OpenConflictPolicy};
pub use models::{PageOpen, WatchlistPage};
