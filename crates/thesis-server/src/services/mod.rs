//! Business logic services

pub mod assignment;
pub mod auth;
pub mod review;
pub mod thesis;

pub use assignment::AssignmentService;
pub use auth::AuthService;
pub use review::ReviewService;
pub use thesis::ThesisService;
