//! Clinic Queue - real-time visit token queue for a clinic.
//!
//! Patients are issued sequential tokens per doctor per day, doctors move
//! each token through `waiting -> in_progress -> completed`, and every
//! connected viewer receives the change as it happens.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
