pub mod actuation;
pub mod batch;
pub mod dto;
pub mod engine;
pub mod heatmap;
pub mod ports;
pub mod prediction;
pub mod stream;
