//! Configuration sources, in override order.

pub mod environment;
pub mod global_file;
