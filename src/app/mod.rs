//! Application core — pure domain logic, zero I/O.
//!
//! The control loop for the oven: FSM orchestration, profile stepping and
//! PID control.  All interaction with hardware, time and storage happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
