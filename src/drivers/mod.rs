//! Peripheral drivers: one-shot init, digital outputs, status indicator.

pub mod hw_init;
pub mod indicator;
pub mod output;
