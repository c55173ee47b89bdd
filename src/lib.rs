pub mod clean;
pub mod config;
pub mod data_io;
pub mod join;
pub mod parallel;
pub mod time_utils;

pub use time_utils::*;
