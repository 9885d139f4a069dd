//! Infrastructure layer providing the concrete transport.

pub mod transport;
