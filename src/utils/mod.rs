//! Utility functions for file handling and unit conversions

pub mod file_utils;
pub mod time;

// Re-export commonly used utility functions for convenience
pub use file_utils::*;
pub use time::{time_int_to_soe, time_soe_to_int};
