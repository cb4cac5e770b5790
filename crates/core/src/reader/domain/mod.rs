pub mod cancellation;
pub mod frame_reader;
pub mod read_outcome;
pub mod reader_error;
pub mod retry_policy;
pub mod source_opener;
