mod connection;
mod event;
mod finding;

pub use connection::*;
pub use event::*;
pub use finding::*;
