pub mod detection_model;
pub mod detection_result;
pub mod export_format;
pub mod frame_detector;
pub mod model_error;
