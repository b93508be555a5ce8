//! The injected `StateStore` abstraction backing the gateway's counter,
//! idempotency, and revocation stores, plus a `DashMap`-backed in-memory
//! reference implementation.

pub mod error;
pub mod memory;
pub mod store;

pub use error::StateError;
pub use memory::MemoryStateStore;
pub use store::StateStore;
