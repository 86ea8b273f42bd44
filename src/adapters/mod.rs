pub mod actuator;
pub mod http;
pub mod onnx;
