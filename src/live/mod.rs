// Live streaming module
// Session-scoped event acceptance for frames arriving one at a time

pub mod session;
pub mod stream;

pub use session::{LiveSession, SessionSummary};
pub use stream::{drive_session, LiveFrame};
