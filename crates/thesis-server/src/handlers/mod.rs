//! HTTP request handlers

pub mod assignment;
pub mod auth;
pub mod health;
pub mod reviews;
pub mod stats;
pub mod thesis;
pub mod uploads;
