//! Thesis Review Core Library
//!
//! Pure domain types and the error taxonomy for the thesis review system.
//! No async runtime, web framework, or database dependencies live here.

pub mod account;
pub mod error;
pub mod review;
pub mod thesis;

pub use account::Account;
pub use error::{Result, ThesisError};
pub use review::{Review, ReviewEntry};
pub use thesis::{Thesis, ThesisCounts, ThesisStatus, ThesisSummary};
