//! Request-scoped services.

pub mod upload;
