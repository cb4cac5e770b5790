use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_source::{SourceError, VideoSource};

/// In-memory [`VideoSource`] that plays back a script of readiness events.
///
/// Frames are synthetic: every byte of frame `i` is `i % 256`. A stall of
/// `k` at position `p` makes the first `k` reads of frame `p` report not
/// ready; an open delay of `n` makes the first `n` opens fail the same way.
///
/// The script syntax accepted by [`FromStr`] is a comma-separated list of
/// `frames=N`, `size=WxH`, `open_delay=N`, `missing` and repeatable
/// `stall=POS:TIMES`, e.g. `frames=120,size=64x48,stall=10:3`.
#[derive(Clone, Debug)]
pub struct ScriptedSource {
    width: u32,
    height: u32,
    frame_count: usize,
    stalls: HashMap<usize, u32>,
    open_delay: u32,
    missing: bool,
    opened_path: Option<PathBuf>,
    position: usize,
    reads: usize,
    opens: usize,
}

impl ScriptedSource {
    pub fn new(frame_count: usize, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_count,
            stalls: HashMap::new(),
            open_delay: 0,
            missing: false,
            opened_path: None,
            position: 0,
            reads: 0,
            opens: 0,
        }
    }

    /// The first `times` reads of frame `position` report not ready.
    pub fn with_stall(mut self, position: usize, times: u32) -> Self {
        *self.stalls.entry(position).or_insert(0) += times;
        self
    }

    /// The first `attempts` opens report not ready.
    pub fn with_open_delay(mut self, attempts: u32) -> Self {
        self.open_delay = attempts;
        self
    }

    /// Every open reports the resource as missing.
    pub fn missing(mut self) -> Self {
        self.missing = true;
        self
    }

    /// Number of read attempts made so far.
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// Number of open attempts made so far.
    pub fn opens(&self) -> usize {
        self.opens
    }

    fn synthetic_frame(&self, index: usize) -> Frame {
        let len = self.width as usize * self.height as usize * 3;
        Frame::new(vec![(index % 256) as u8; len], self.width, self.height, 3, index)
    }
}

impl VideoSource for ScriptedSource {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, SourceError> {
        self.opens += 1;
        if self.missing {
            return Err(SourceError::NotFound(path.to_path_buf()));
        }
        if self.open_delay > 0 {
            self.open_delay -= 1;
            return Err(SourceError::NotReady("header not written yet".into()));
        }

        self.opened_path = Some(path.to_path_buf());
        self.position = 0;
        Ok(VideoMetadata {
            width: self.width,
            height: self.height,
            fps: 30.0,
            total_frames: self.frame_count,
            codec: "scripted".to_string(),
            source_path: Some(path.to_path_buf()),
        })
    }

    fn is_open(&self) -> bool {
        self.opened_path.is_some()
    }

    fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        if !self.is_open() {
            return Err(SourceError::NotOpen);
        }
        let index = self.position;
        self.position += 1;
        self.reads += 1;

        if index >= self.frame_count {
            return Ok(None);
        }
        if let Some(remaining) = self.stalls.get_mut(&index) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(None);
            }
        }
        Ok(Some(self.synthetic_frame(index)))
    }

    fn position(&self) -> usize {
        self.position
    }

    fn set_position(&mut self, position: usize) -> Result<(), SourceError> {
        if !self.is_open() {
            return Err(SourceError::NotOpen);
        }
        if position > self.frame_count {
            return Err(SourceError::backend(format!(
                "seek to {position} past end of {}-frame stream",
                self.frame_count
            )));
        }
        self.position = position;
        Ok(())
    }

    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn close(&mut self) {
        self.opened_path = None;
    }
}

impl FromStr for ScriptedSource {
    type Err = String;

    fn from_str(script: &str) -> Result<Self, Self::Err> {
        let mut source = ScriptedSource::new(0, 64, 48);
        for item in script.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = item.split_once('=').unwrap_or((item, ""));
            match key {
                "frames" => source.frame_count = parse_num(key, value)?,
                "size" => {
                    let (w, h) = value
                        .split_once('x')
                        .ok_or_else(|| format!("size must be WxH, got '{value}'"))?;
                    source.width = parse_num("size", w)?;
                    source.height = parse_num("size", h)?;
                }
                "open_delay" => source.open_delay = parse_num(key, value)?,
                "missing" => source.missing = true,
                "stall" => {
                    let (pos, times) = value
                        .split_once(':')
                        .ok_or_else(|| format!("stall must be POS:TIMES, got '{value}'"))?;
                    source = source.with_stall(parse_num(key, pos)?, parse_num(key, times)?);
                }
                other => return Err(format!("unknown script key '{other}'")),
            }
        }
        if source.frame_count == 0 {
            return Err("script must set frames=N with N > 0".to_string());
        }
        if source.width == 0 || source.height == 0 {
            return Err("size must be non-zero".to_string());
        }
        Ok(source)
    }
}

fn parse_num<T: FromStr>(key: &str, value: &str) -> Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("invalid value '{value}' for {key}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn opened(source: ScriptedSource) -> ScriptedSource {
        let mut source = source;
        source.open(Path::new("scripted.mp4")).unwrap();
        source
    }

    #[test]
    fn test_read_before_open_fails() {
        let mut source = ScriptedSource::new(3, 4, 4);
        assert!(matches!(source.read(), Err(SourceError::NotOpen)));
    }

    #[test]
    fn test_reads_advance_cursor() {
        let mut source = opened(ScriptedSource::new(3, 4, 4));
        let frame = source.read().unwrap().unwrap();
        assert_eq!(frame.index(), 0);
        assert_eq!(source.position(), 1);
        assert_eq!(frame.data()[0], 0);

        let frame = source.read().unwrap().unwrap();
        assert_eq!(frame.index(), 1);
        assert_eq!(frame.data()[0], 1);
    }

    #[test]
    fn test_stall_consumes_cursor_slot() {
        let mut source = opened(ScriptedSource::new(3, 4, 4).with_stall(0, 2));
        assert!(source.read().unwrap().is_none());
        assert_eq!(source.position(), 1);

        source.set_position(0).unwrap();
        assert!(source.read().unwrap().is_none());
        source.set_position(0).unwrap();
        assert_eq!(source.read().unwrap().unwrap().index(), 0);
        assert_eq!(source.reads(), 3);
    }

    #[test]
    fn test_open_delay_reports_not_ready() {
        let mut source = ScriptedSource::new(3, 4, 4).with_open_delay(2);
        let path = Path::new("late.mp4");
        assert!(matches!(source.open(path), Err(SourceError::NotReady(_))));
        assert!(matches!(source.open(path), Err(SourceError::NotReady(_))));
        let meta = source.open(path).unwrap();
        assert_eq!(meta.total_frames, 3);
        assert_eq!(source.opens(), 3);
        assert!(source.is_open());
    }

    #[test]
    fn test_missing_reports_not_found() {
        let mut source = ScriptedSource::new(3, 4, 4).missing();
        assert!(matches!(
            source.open(Path::new("gone.mp4")),
            Err(SourceError::NotFound(_))
        ));
    }

    #[test]
    fn test_seek_past_end_fails() {
        let mut source = opened(ScriptedSource::new(3, 4, 4));
        assert!(source.set_position(3).is_ok());
        assert!(source.set_position(4).is_err());
    }

    #[test]
    fn test_close_idempotent() {
        let mut source = opened(ScriptedSource::new(1, 4, 4));
        source.close();
        source.close();
        assert!(!source.is_open());
    }

    #[test]
    fn test_parse_full_script() {
        let source: ScriptedSource = "frames=120, size=32x16, open_delay=2, stall=10:3, stall=10:1"
            .parse()
            .unwrap();
        assert_eq!(source.frame_count, 120);
        assert_eq!((source.width, source.height), (32, 16));
        assert_eq!(source.open_delay, 2);
        assert_eq!(source.stalls.get(&10), Some(&4));
    }

    #[rstest]
    #[case::no_frames("size=10x10")]
    #[case::bad_size("frames=3,size=10")]
    #[case::zero_size("frames=3,size=0x10")]
    #[case::bad_stall("frames=3,stall=4")]
    #[case::unknown_key("frames=3,speed=2")]
    #[case::bad_number("frames=many")]
    fn test_parse_rejects_invalid_script(#[case] script: &str) {
        assert!(script.parse::<ScriptedSource>().is_err());
    }
}
