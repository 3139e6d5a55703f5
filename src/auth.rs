//! Token model: the redacted bearer secret and session-termination reasons.

pub mod reason;
pub mod token;

pub use reason::*;
pub use token::*;
