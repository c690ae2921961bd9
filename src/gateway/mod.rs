//! Persistence Gateway
//!
//! Abstract access to the backend `cards` collection.
//! Implementations can use a hosted backend, SQLite, in-memory, etc.

mod memory;
mod traits;

pub use memory::MemoryGateway;
pub use traits::CardGateway;
