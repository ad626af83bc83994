//! Work-time accounting engine.
//!
//! This crate turns clock-in/clock-out punches into daily worked, expected
//! and balance minutes under effective-dated employment rules, resolving
//! holidays, absences and bridge days, and keeps a closable time-bank
//! ledger per employment.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
