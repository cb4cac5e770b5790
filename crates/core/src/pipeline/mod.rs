pub mod detect_and_export_use_case;
pub mod pipeline_logger;
pub mod playback_use_case;
