//! Hearth Home Dashboard Backend
//!
//! This library provides the core components for the hearth energy
//! dashboard: the gateway telemetry pipeline, persistence, alerting,
//! analytics roll-ups, and the broadcast fan-out to wall displays.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod persistence;
pub mod task_runner;
