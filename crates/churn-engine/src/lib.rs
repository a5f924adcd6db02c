//! Churn inference engine.
//!
//! Turns a loosely typed customer record into a churn probability, a risk tier and an
//! approximate attribution, falling back to a closed-form heuristic whenever no trained
//! artifact is usable.

pub mod config;
pub mod error;
pub mod inference;
pub mod telemetry;
