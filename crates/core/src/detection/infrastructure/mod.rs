pub mod onnx_yolo_detector;
pub mod video_detection_model;
