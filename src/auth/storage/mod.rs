//! Storage abstraction
//!
//! The credential store contract plus an in-memory backend seeded with the
//! default roles.

pub mod memory;
pub mod seed;
pub mod r#trait;

pub use memory::MemoryStorage;
pub use r#trait::CredentialStore;
