//! Core library for the `stagerun` CLI.
//!
//! A run resolves a load profile into a VU schedule, drives one tokio task per
//! active virtual user, and has each of them call a built-in iteration
//! function against injected HTTP and recorder capabilities. Observations are
//! aggregated by a single collector task into the end-of-run summary and
//! threshold verdict.
pub mod args;
pub mod config;
pub mod entry;
pub mod error;
pub mod http;
pub mod logger;
pub mod metrics;
pub mod profile;
pub mod runner;
pub mod script;
pub mod shutdown;
pub mod summary;
