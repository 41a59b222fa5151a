pub mod session;

// Re-export middleware functions
pub use session::{SESSION_HEADER, session_middleware};
