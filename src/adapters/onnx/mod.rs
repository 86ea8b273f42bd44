pub mod cam_engine;
pub mod model_catalog;
