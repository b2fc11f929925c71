//! Application Layer
//!
//! This module contains:
//! - Runtime: drives one messenger session from establishment to teardown
//! - Phase: the whole-program lifecycle state machine

mod runtime;

pub use runtime::{Phase, Runtime};
