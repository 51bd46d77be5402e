//! HTTP request handlers.

pub mod auth;
pub mod calendar;
pub mod user;
