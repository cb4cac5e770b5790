use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_source::{SourceError, VideoSource};

/// Decodes video frames via ffmpeg-next (libavformat + libavcodec).
///
/// Each decoded picture is converted to RGB24 and wrapped in a [`Frame`].
/// Running out of packets is reported as "not ready" rather than end of
/// stream: the input stays open, so a file that is still being written can
/// be polled again. The decoder catches up with the cursor lazily on the next
/// read, which makes rewinding by one frame free.
pub struct FfmpegSource {
    path: Option<PathBuf>,
    state: Option<DecodeState>,
    /// Cursor: index of the next frame the caller wants.
    position: usize,
    /// Frames pulled out of the decoder since the input was (re)opened.
    decoded: usize,
    frame_count: usize,
}

// Safety: FfmpegSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegSource {}

impl FfmpegSource {
    pub fn new() -> Self {
        Self {
            path: None,
            state: None,
            position: 0,
            decoded: 0,
            frame_count: 0,
        }
    }

    fn reopen(&mut self) -> Result<(), SourceError> {
        let path = self.path.clone().ok_or(SourceError::NotOpen)?;
        let (state, _) = open_decoder(&path)?;
        self.state = Some(state);
        self.decoded = 0;
        Ok(())
    }

    /// Moves the decoder to `target`. Returns `false` if the frames in
    /// between are not available yet.
    fn sync_to(&mut self, target: usize) -> Result<bool, SourceError> {
        if target < self.decoded {
            log::debug!("Rewinding from frame {} to {target}", self.decoded);
            self.reopen()?;
        }
        let state = self.state.as_mut().ok_or(SourceError::NotOpen)?;
        while self.decoded < target {
            if state.next_pixels()?.is_none() {
                return Ok(false);
            }
            self.decoded += 1;
        }
        Ok(true)
    }
}

impl Default for FfmpegSource {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoSource for FfmpegSource {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, SourceError> {
        if !path.exists() {
            return Err(SourceError::NotFound(path.to_path_buf()));
        }
        let (state, metadata) = open_decoder(path)?;

        self.frame_count = metadata.total_frames;
        self.path = Some(path.to_path_buf());
        self.state = Some(state);
        self.position = 0;
        self.decoded = 0;
        Ok(metadata)
    }

    fn is_open(&self) -> bool {
        self.state.is_some()
    }

    fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        if self.state.is_none() {
            return Err(SourceError::NotOpen);
        }
        let target = self.position;
        self.position += 1;

        if !self.sync_to(target)? {
            return Ok(None);
        }
        let state = self.state.as_mut().ok_or(SourceError::NotOpen)?;
        match state.next_pixels()? {
            Some(pixels) => {
                let frame = Frame::new(pixels, state.width, state.height, 3, self.decoded);
                self.decoded += 1;
                Ok(Some(frame))
            }
            None => Ok(None),
        }
    }

    fn position(&self) -> usize {
        self.position
    }

    fn set_position(&mut self, position: usize) -> Result<(), SourceError> {
        if self.state.is_none() {
            return Err(SourceError::NotOpen);
        }
        if self.frame_count > 0 && position > self.frame_count {
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
        self.state = None;
        self.path = None;
        self.position = 0;
        self.decoded = 0;
        self.frame_count = 0;
    }
}

struct DecodeState {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    video_stream_index: usize,
    width: u32,
    height: u32,
    /// Pictures drained from the decoder at the last end of input.
    pending: VecDeque<Vec<u8>>,
}

impl DecodeState {
    /// Next decoded RGB picture, or `None` when the input has no more packets
    /// for now.
    fn next_pixels(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        if let Some(pixels) = self.pending.pop_front() {
            return Ok(Some(pixels));
        }

        loop {
            if let Some(pixels) = self.try_receive()? {
                return Ok(Some(pixels));
            }

            let packet = match self.ictx.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() != self.video_stream_index {
                        continue;
                    }
                    Some(packet)
                }
                None => None,
            };

            match packet {
                Some(packet) => {
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        log::debug!("Skipping undecodable packet: {e}");
                    }
                }
                None => {
                    self.drain()?;
                    return Ok(self.pending.pop_front());
                }
            }
        }
    }

    fn try_receive(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler
            .run(&decoded, &mut rgb_frame)
            .map_err(SourceError::backend)?;
        Ok(Some(extract_rgb_pixels(&rgb_frame, self.width, self.height)))
    }

    /// Flushes pictures the decoder is holding back, then resets it so that
    /// packets appended to a growing file can still be decoded.
    fn drain(&mut self) -> Result<(), SourceError> {
        if self.decoder.send_eof().is_err() {
            return Ok(());
        }
        while let Some(pixels) = self.try_receive()? {
            self.pending.push_back(pixels);
        }
        self.decoder.flush();
        Ok(())
    }
}

/// Opens the container and sets up decoding of its best video stream.
///
/// A missing or truncated header surfaces as `NotReady`: the file may still
/// be in the middle of being written.
fn open_decoder(path: &Path) -> Result<(DecodeState, VideoMetadata), SourceError> {
    ffmpeg_next::init().map_err(SourceError::backend)?;

    let ictx = ffmpeg_next::format::input(path)
        .map_err(|e| SourceError::NotReady(format!("cannot read container header: {e}")))?;

    let stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or_else(|| SourceError::NotReady("no video stream found yet".to_string()))?;

    let video_stream_index = stream.index();
    let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
        .map_err(SourceError::backend)?;
    let decoder = codec_ctx.decoder().video().map_err(SourceError::backend)?;

    let rate = stream.rate();
    let fps = if rate.denominator() != 0 {
        rate.numerator() as f64 / rate.denominator() as f64
    } else {
        0.0
    };
    let total_frames = stream.frames().max(0) as usize;

    let width = decoder.width();
    let height = decoder.height();
    if width == 0 || height == 0 {
        return Err(SourceError::NotReady(
            "stream dimensions not known yet".to_string(),
        ));
    }

    let scaler = ffmpeg_next::software::scaling::Context::get(
        decoder.format(),
        width,
        height,
        ffmpeg_next::format::Pixel::RGB24,
        width,
        height,
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    )
    .map_err(SourceError::backend)?;

    let metadata = VideoMetadata {
        width,
        height,
        fps,
        total_frames,
        codec: decoder
            .codec()
            .map(|c| c.name().to_string())
            .unwrap_or_default(),
        source_path: Some(path.to_path_buf()),
    };

    let state = DecodeState {
        ictx,
        decoder,
        scaler,
        video_stream_index,
        width,
        height,
        pending: VecDeque::new(),
    };
    Ok((state, metadata))
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may have padding bytes at the end of each row (stride > width*3).
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
