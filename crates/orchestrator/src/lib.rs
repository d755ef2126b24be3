//! Query orchestration: route, dispatch, assemble, remember.
//!
//! One query flows classifier → per-domain agent tasks → deterministic
//! assembly. Domains run as independent tokio tasks under per-domain
//! timeouts; one failing domain renders as an explicit note and never
//! drags the others down. Session memory keeps a bounded turn history
//! with a rolling summary and remembered destination slots.

pub mod assembler;
pub mod orchestrator;
pub mod session;

pub use assembler::assemble;
pub use orchestrator::{FinalResponse, Orchestrator};
pub use session::{SessionSnapshot, SessionStore};
