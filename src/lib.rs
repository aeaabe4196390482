//! Wedding party server library
//!
//! Guests belong to a party, request the music they want to hear and reserve
//! hotel rooms. This library exposes the modules used by the `party-server`
//! and `cli-admin` binaries and by the end to end tests.

pub mod config;
pub mod hotel;
pub mod music_requests;
pub mod server;
pub mod sqlite_persistence;
pub mod user;

pub use server::{make_app, run_server, RequestsLoggingLevel};
pub use sqlite_persistence::open_database;
pub use user::{SqliteUserStore, UserManager, UserStore};
