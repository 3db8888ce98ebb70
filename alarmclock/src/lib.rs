//! Alarm clock library
//!
//! Daily alarms kept consistent across an in-memory list, a persisted
//! snapshot, and a notification scheduler. The runtime binary and any
//! presentation layer drive it through [`commands`].

pub mod app;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
pub mod storage;
