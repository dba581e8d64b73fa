//! Display formatting for dashboard values and chart labels.

pub mod num;
pub mod time;
