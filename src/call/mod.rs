//! Call orchestration
//!
//! Structure:
//! - `agent`: The call loop and the shutdown sequence
//! - `utterance`: Joins transcript fragments at utterance boundaries
//! - `session_log`: JSON log of turns, booking updates, and the final booking

pub mod agent;
pub mod session_log;
pub mod utterance;

pub use agent::{CallAgent, CallOutcome};
pub use session_log::{new_session_id, SessionLog};
pub use utterance::UtteranceAssembler;
