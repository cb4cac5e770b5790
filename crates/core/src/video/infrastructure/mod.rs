pub mod ffmpeg_source;
pub mod image_file_sink;
pub mod image_file_writer;
pub mod log_sink;
pub mod scripted_source;
pub mod window_sink;
