pub mod session;

pub use session::{Reaction, SessionState};
