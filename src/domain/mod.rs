pub mod actuation;
pub mod batch;
pub mod cam;
pub mod classification;
pub mod errors;
pub mod model;
pub mod stream;
pub mod upload;
