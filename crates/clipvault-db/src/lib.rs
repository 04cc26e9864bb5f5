//! Clipvault persistence layer
//!
//! Postgres repositories for users and video records, plus the `VideoStore` /
//! `UserStore` traits the HTTP layer and upload pipeline are written against.

pub mod db;

pub use db::{UserRepository, UserStore, VideoRepository, VideoStore};
