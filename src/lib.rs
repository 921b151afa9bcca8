//! School Attendance Management System backend.
//!
//! An actix-web REST service over MySQL: JWT-authenticated roster CRUD,
//! per-grade daily attendance recording with an at-most-one-status-per-
//! student-per-date guarantee, and guardian absence notifications.

pub mod api;
pub mod attendance;
pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod model;
pub mod models;
pub mod routes;
pub mod utils;
