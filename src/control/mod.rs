//! Closed-loop control primitives.

pub mod pid;
