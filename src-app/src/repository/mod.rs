//! Repository Layer
//!
//! SQLite-backed persistence gateway for the card store.

mod card_repo;
mod db;


pub use card_repo::SqliteCardGateway;
pub use db::{init_db, init_memory_db, RepoError};
