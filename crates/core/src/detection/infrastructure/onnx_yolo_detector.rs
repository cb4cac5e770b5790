/// YOLOv8 object detector using ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing, inference, and per-class NMS
/// post-processing of the `[1, 4 + classes, anchors]` output head.
use std::path::Path;

use crate::detection::domain::frame_detector::FrameDetector;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::DEFAULT_IOU_THRESHOLD;
use crate::shared::frame::Frame;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Box coordinates preceding the class scores in each output row.
const BOX_VALUES: usize = 4;

/// Letterbox padding value (YOLO convention).
const PAD_VALUE: f32 = 114.0 / 255.0;

/// YOLO detector backed by an ONNX Runtime session.
pub struct OnnxYoloDetector {
    session: ort::session::Session,
    confidence: f64,
    iou_threshold: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_execution_providers(platform_execution_providers())?
            .commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { shape, .. } if shape.len() >= 4 && shape[2] > 0 => {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);
        log::debug!("Loaded {} (input {input_size}px)", model_path.display());

        Ok(Self {
            session,
            confidence,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            input_size,
        })
    }
}

impl FrameDetector for OnnxYoloDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(Vec::new());
        }

        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let mut candidates = parse_detections(
            data,
            tensor.shape(),
            self.confidence,
            scale,
            (pad_x as f64, pad_y as f64),
        )?;
        let kept = nms(&mut candidates, self.iou_threshold);

        Ok(kept
            .into_iter()
            .map(|b| b.clamped(frame.width(), frame.height()))
            .collect())
    }
}

fn platform_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        Vec::new()
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox-resize a frame to `target_size` x `target_size`.
///
/// Single-channel frames are replicated into all three input planes.
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let mut tensor = ndarray::Array4::<f32>::from_elem(
        (1, 3, target_size as usize, target_size as usize),
        PAD_VALUE,
    );

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let last_channel = frame.channels().saturating_sub(1) as usize;

    // Nearest-neighbor resize
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c.min(last_channel)]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

// ---------------------------------------------------------------------------
// Post-processing
// ---------------------------------------------------------------------------

/// Decodes a raw YOLOv8 output tensor into frame-space boxes.
///
/// Accepts both `[1, features, anchors]` and `[1, anchors, features]`; the
/// smaller of the two trailing axes is taken as the feature axis. Each row is
/// `[cx, cy, w, h, score_0, .., score_n]` in letterbox pixels.
fn parse_detections(
    data: &[f32],
    shape: &[usize],
    confidence: f64,
    scale: f64,
    pad: (f64, f64),
) -> Result<Vec<BoundingBox>, String> {
    if shape.len() != 3 {
        return Err(format!("Unexpected YOLO output shape: {shape:?}"));
    }
    let transposed = shape[1] < shape[2];
    let (num_anchors, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats <= BOX_VALUES {
        return Err(format!("YOLO output has no class scores: {shape:?}"));
    }
    if data.len() < num_anchors * num_feats {
        return Err(format!(
            "YOLO output holds {} values, shape {shape:?} needs {}",
            data.len(),
            num_anchors * num_feats
        ));
    }

    let value = |anchor: usize, feat: usize| -> f64 {
        let i = if transposed {
            feat * num_anchors + anchor
        } else {
            anchor * num_feats + feat
        };
        data[i] as f64
    };

    let (pad_x, pad_y) = pad;
    let mut boxes = Vec::new();
    for anchor in 0..num_anchors {
        let (class_id, score) = (BOX_VALUES..num_feats)
            .map(|f| (f - BOX_VALUES, value(anchor, f)))
            .fold((0, f64::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });
        if score < confidence {
            continue;
        }

        let cx = value(anchor, 0);
        let cy = value(anchor, 1);
        let w = value(anchor, 2);
        let h = value(anchor, 3);
        boxes.push(BoundingBox {
            x1: ((cx - w / 2.0) - pad_x) / scale,
            y1: ((cy - h / 2.0) - pad_y) / scale,
            x2: ((cx + w / 2.0) - pad_x) / scale,
            y2: ((cy + h / 2.0) - pad_y) / scale,
            confidence: score,
            class_id,
        });
    }
    Ok(boxes)
}

/// Greedy per-class NMS: sort by confidence descending, suppress boxes of
/// the same class that overlap a kept box.
fn nms(dets: &mut [BoundingBox], iou_thresh: f64) -> Vec<BoundingBox> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<BoundingBox> = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i].clone());
        for j in (i + 1)..dets.len() {
            if suppressed[j] || dets[j].class_id != dets[i].class_id {
                continue;
            }
            if dets[i].iou(&dets[j]) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
