pub mod config;
pub mod detection;
pub mod pipeline;
pub mod reader;
pub mod shared;
pub mod video;
