//! Database repositories
//!
//! Each repository owns one table. The traits in `traits` abstract them so the
//! API can run against in-memory stores in tests.

pub mod traits;
pub mod user;
pub mod video;

pub use traits::{UserStore, VideoStore};
pub use user::UserRepository;
pub use video::VideoRepository;

/// Postgres `unique_violation`.
pub(crate) const UNIQUE_VIOLATION: &str = "23505";

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}
