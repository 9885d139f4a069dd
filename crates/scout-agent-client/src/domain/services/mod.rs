mod dispatcher;
mod findings;
mod lifecycle;
mod session;
mod state_sync;

pub use dispatcher::*;
pub use findings::*;
pub use lifecycle::*;
pub use session::*;
pub use state_sync::*;
