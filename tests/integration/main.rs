//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host with no real hardware
//! required.

// Host implementation of the critical section used by the mailbox.
use critical_section as _;

mod control_loop_tests;
mod mailbox_tests;
mod mock_hw;
