//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises one area of the
//! controller against mock adapters.  No hardware required.

mod config_persistence_tests;
mod mock_hw;
mod reflow_flow_tests;
mod sensor_fault_tests;
