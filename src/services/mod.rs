pub mod live_update_service;
pub mod session_service;
pub mod vote_reconciler;

pub use live_update_service::*;
pub use session_service::*;
pub use vote_reconciler::*;

/// The one session every task shares. All reconciliation runs under this lock.
pub type SharedSession = std::sync::Arc<tokio::sync::Mutex<SessionService>>;
