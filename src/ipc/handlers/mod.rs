pub mod admin;
pub mod analytics;
pub mod auth;
pub mod core;
pub mod courses;
pub mod exports;
pub mod marks;
pub mod students;
