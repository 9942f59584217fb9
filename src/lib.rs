//! Reflow oven controller library.
//!
//! Drives a heater along a time/temperature profile with a PID loop.
//! The domain core (`app`, `fsm`, `profile`, `control`) is I/O-free and
//! reaches hardware, time and storage only through the port traits in
//! [`app::ports`]; `adapters` holds host-side implementations.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod fsm;
pub mod profile;
pub mod sensors;
