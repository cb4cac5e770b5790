use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::video::domain::frame_sink::FrameSink;
use crate::video::domain::image_writer::ImageWriter;

/// Shows frames by writing each one to `dir/frame_{index:06}.png`.
///
/// Files are named by the decoded frame's own index, so a frame that is
/// decoded again after a rewind overwrites its earlier file.
pub struct ImageFileSink {
    dir: PathBuf,
    writer: Box<dyn ImageWriter>,
    written: usize,
}

impl ImageFileSink {
    pub fn new(dir: &Path, writer: Box<dyn ImageWriter>) -> Self {
        Self {
            dir: dir.to_path_buf(),
            writer,
            written: 0,
        }
    }

    pub fn frame_path(&self, frame: &Frame) -> PathBuf {
        self.dir.join(format!("frame_{:06}.png", frame.index()))
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl FrameSink for ImageFileSink {
    fn show(&mut self, frame: &Frame, _position: usize) -> Result<(), Box<dyn std::error::Error>> {
        let path = self.frame_path(frame);
        self.writer.write(&path, frame)?;
        self.written += 1;
        log::debug!("Wrote frame {} to {}", frame.index(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct RecordingWriter {
        paths: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl ImageWriter for RecordingWriter {
        fn write(&self, path: &Path, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.paths.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    struct FailingWriter;

    impl ImageWriter for FailingWriter {
        fn write(&self, _path: &Path, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            Err("disk full".into())
        }
    }

    #[test]
    fn test_names_files_by_frame_index() {
        let paths = Arc::new(Mutex::new(Vec::new()));
        let mut sink = ImageFileSink::new(
            Path::new("/tmp/frames"),
            Box::new(RecordingWriter {
                paths: paths.clone(),
            }),
        );

        sink.show(&Frame::new(vec![0; 3], 1, 1, 3, 0), 1).unwrap();
        sink.show(&Frame::new(vec![0; 3], 1, 1, 3, 41), 42).unwrap();

        let paths = paths.lock().unwrap();
        assert_eq!(paths[0], PathBuf::from("/tmp/frames/frame_000000.png"));
        assert_eq!(paths[1], PathBuf::from("/tmp/frames/frame_000041.png"));
        assert_eq!(sink.written(), 2);
    }

    #[test]
    fn test_writer_error_propagates() {
        let mut sink = ImageFileSink::new(Path::new("/tmp/frames"), Box::new(FailingWriter));
        assert!(sink.show(&Frame::new(vec![0; 3], 1, 1, 3, 0), 1).is_err());
        assert_eq!(sink.written(), 0);
    }
}
