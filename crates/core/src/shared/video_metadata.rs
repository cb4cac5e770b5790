use std::path::PathBuf;

/// Stream properties reported when a video source opens.
///
/// `total_frames` is 0 when the container does not declare a frame count.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    pub fn has_known_length(&self) -> bool {
        self.total_frames > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction() {
        let meta = VideoMetadata {
            width: 1920,
            height: 1080,
            fps: 29.97,
            total_frames: 300,
            codec: "h264".to_string(),
            source_path: Some(PathBuf::from("/tmp/C0012_10sec.MP4")),
        };
        assert_eq!(meta.width, 1920);
        assert_eq!(meta.height, 1080);
        assert_eq!(meta.total_frames, 300);
        assert_eq!(meta.codec, "h264");
        assert!(meta.has_known_length());
    }

    #[test]
    fn test_unknown_length() {
        let meta = VideoMetadata {
            width: 640,
            height: 480,
            fps: 0.0,
            total_frames: 0,
            codec: String::new(),
            source_path: None,
        };
        assert!(!meta.has_known_length());
    }
}
