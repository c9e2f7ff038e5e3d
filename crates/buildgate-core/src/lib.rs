// Core modules
pub mod config;
pub mod error;
pub mod gate;
pub mod lock;

// Re-export commonly used types
pub use error::{BuildgateError, Result};
pub use gate::{GateObserver, NamedGate, NoopObserver, TracingObserver};
pub use lock::{hold, FileNamedLock, HoldGuard, LockError, NamedLock};
