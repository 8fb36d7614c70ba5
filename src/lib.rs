//! Community pollution reporting backend.
//!
//! Citizens file pollution reports from the mobile app or by voice. Each new
//! report is queued and run through an orchestration pipeline (image
//! verification, hotspot prediction, health advisory) by the worker binary,
//! while the API serves nearby-pollution lookups and spoken health guidance.

pub mod app_state;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;
