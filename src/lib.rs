pub mod booking;
pub mod checkpoint;
pub mod config;
pub mod display;
pub mod errors;
pub mod extract;
pub mod logging;
pub mod merge;
pub mod review;
pub mod ui;
pub mod util;
pub mod workflow;
