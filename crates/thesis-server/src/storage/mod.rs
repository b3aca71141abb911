//! Storage layer
//!
//! SQLite (embedded) holds accounts, theses and reviews; uploaded
//! documents live in a local directory managed by [`UploadStore`].

pub mod db;
pub mod uploads;

pub use db::{Database, ThesisFilter};
pub use uploads::UploadStore;
