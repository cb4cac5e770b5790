use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::detection::domain::detection_model::DetectionModel;
use crate::detection::domain::detection_result::DetectionResult;
use crate::detection::domain::export_format::ExportFormat;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::video::domain::image_writer::ImageWriter;

#[derive(Clone, Debug, PartialEq)]
pub struct DetectionSummary {
    pub saved: Vec<PathBuf>,
    pub total_boxes: usize,
    pub exported: Option<PathBuf>,
}

/// Runs a detection model over a video, saves one annotated image per
/// frame as soon as it is analysed, then optionally exports the model.
pub struct DetectAndExportUseCase {
    model: Box<dyn DetectionModel>,
    writer: Box<dyn ImageWriter>,
    logger: Box<dyn PipelineLogger>,
}

impl DetectAndExportUseCase {
    pub fn new(
        model: Box<dyn DetectionModel>,
        writer: Box<dyn ImageWriter>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            model,
            writer,
            logger,
        }
    }

    /// Annotated images are written as `{stem}_{frame_index:06}.jpg` in
    /// `output_dir`, where `stem` is the source file stem.
    pub fn execute(
        &mut self,
        source: &Path,
        output_dir: &Path,
        export: Option<ExportFormat>,
    ) -> Result<DetectionSummary, Box<dyn std::error::Error>> {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "frame".to_string());

        let mut saved = Vec::new();
        let mut total_boxes = 0;
        let writer = self.writer.as_ref();
        let logger = &mut self.logger;
        let detect_start = Instant::now();
        let analysed = self.model.detect(source, &mut |result: DetectionResult| {
            let path = output_dir.join(format!("{stem}_{:06}.jpg", result.frame_index));
            let start = Instant::now();
            result.save(writer, &path)?;
            logger.timing("save", start.elapsed().as_secs_f64() * 1000.0);
            logger.progress(result.frame_index + 1, 0);
            total_boxes += result.boxes.len();
            saved.push(path);
            Ok(())
        })?;
        self.logger.timing(
            "detect_video",
            detect_start.elapsed().as_secs_f64() * 1000.0,
        );
        self.logger.info(&format!(
            "{analysed} frames analysed in {}; saved {} images with {total_boxes} detections to {}",
            source.display(),
            saved.len(),
            output_dir.display()
        ));

        let exported = match export {
            Some(format) => {
                let path = self.model.export(format, output_dir)?;
                self.logger
                    .info(&format!("Exported model as {format} to {}", path.display()));
                Some(path)
            }
            None => None,
        };

        self.logger.summary();
        Ok(DetectionSummary {
            saved,
            total_boxes,
            exported,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::detection::domain::detection_model::ResultHandler;
    use crate::detection::domain::model_error::ModelError;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::frame::Frame;

    /// Hands out one 4x4 frame per entry of `boxes_per_frame`, noting how
    /// many images had been written before each result.
    struct StubModel {
        boxes_per_frame: Vec<usize>,
        exports: Arc<Mutex<Vec<ExportFormat>>>,
        written: Arc<Mutex<Vec<PathBuf>>>,
        saved_before_each: Arc<Mutex<Vec<usize>>>,
    }

    impl DetectionModel for StubModel {
        fn detect(
            &mut self,
            _source: &Path,
            on_result: ResultHandler<'_>,
        ) -> Result<usize, Box<dyn std::error::Error>> {
            for (i, &n) in self.boxes_per_frame.iter().enumerate() {
                let boxes = (0..n)
                    .map(|k| BoundingBox {
                        x1: k as f64,
                        y1: 0.0,
                        x2: k as f64 + 1.0,
                        y2: 1.0,
                        confidence: 0.5,
                        class_id: k,
                    })
                    .collect();
                let written = self.written.lock().unwrap().len();
                self.saved_before_each.lock().unwrap().push(written);
                on_result(DetectionResult::new(
                    Frame::new(vec![0; 4 * 4 * 3], 4, 4, 3, i * 2),
                    boxes,
                ))?;
            }
            Ok(self.boxes_per_frame.len())
        }

        fn export(&self, format: ExportFormat, output_dir: &Path) -> Result<PathBuf, ModelError> {
            if format != ExportFormat::Onnx {
                return Err(ModelError::UnsupportedExport(format));
            }
            self.exports.lock().unwrap().push(format);
            Ok(output_dir.join("model.onnx"))
        }
    }

    struct RecordingWriter {
        paths: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl ImageWriter for RecordingWriter {
        fn write(&self, path: &Path, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.paths.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    struct Fixture {
        uc: DetectAndExportUseCase,
        paths: Arc<Mutex<Vec<PathBuf>>>,
        exports: Arc<Mutex<Vec<ExportFormat>>>,
        saved_before_each: Arc<Mutex<Vec<usize>>>,
    }

    fn fixture(boxes_per_frame: Vec<usize>) -> Fixture {
        let paths = Arc::new(Mutex::new(Vec::new()));
        let exports = Arc::new(Mutex::new(Vec::new()));
        let saved_before_each = Arc::new(Mutex::new(Vec::new()));
        let uc = DetectAndExportUseCase::new(
            Box::new(StubModel {
                boxes_per_frame,
                exports: exports.clone(),
                written: paths.clone(),
                saved_before_each: saved_before_each.clone(),
            }),
            Box::new(RecordingWriter {
                paths: paths.clone(),
            }),
            Box::new(NullPipelineLogger),
        );
        Fixture {
            uc,
            paths,
            exports,
            saved_before_each,
        }
    }

    #[test]
    fn test_saves_one_image_per_result_without_overwriting() {
        let mut f = fixture(vec![1, 0, 3]);
        let summary = f
            .uc
            .execute(Path::new("videos/street.mp4"), Path::new("out"), None)
            .unwrap();

        let expected = vec![
            PathBuf::from("out/street_000000.jpg"),
            PathBuf::from("out/street_000002.jpg"),
            PathBuf::from("out/street_000004.jpg"),
        ];
        assert_eq!(summary.saved, expected);
        assert_eq!(*f.paths.lock().unwrap(), expected);
        assert_eq!(summary.total_boxes, 4);
        assert!(summary.exported.is_none());
        assert!(f.exports.lock().unwrap().is_empty());
    }

    #[test]
    fn test_each_result_is_saved_before_the_next_is_produced() {
        let mut f = fixture(vec![1, 2, 0, 1]);
        f.uc.execute(Path::new("clip.mp4"), Path::new("out"), None)
            .unwrap();

        assert_eq!(*f.saved_before_each.lock().unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(f.paths.lock().unwrap().len(), 4);
    }

    #[test]
    fn test_exports_after_detection() {
        let mut f = fixture(vec![2]);
        let summary = f
            .uc
            .execute(Path::new("a.mp4"), Path::new("out"), Some(ExportFormat::Onnx))
            .unwrap();
        assert_eq!(summary.exported, Some(PathBuf::from("out/model.onnx")));
        assert_eq!(*f.exports.lock().unwrap(), vec![ExportFormat::Onnx]);
    }

    #[test]
    fn test_unsupported_export_fails_after_saving() {
        let mut f = fixture(vec![1]);
        let err = f
            .uc
            .execute(Path::new("a.mp4"), Path::new("out"), Some(ExportFormat::TfLite))
            .unwrap_err();
        assert!(err.to_string().contains("tflite"));
        assert_eq!(f.paths.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_saved_images_are_real_files() {
        use crate::video::infrastructure::image_file_writer::ImageFileWriter;

        let dir = tempfile::tempdir().unwrap();
        let mut uc = DetectAndExportUseCase::new(
            Box::new(StubModel {
                boxes_per_frame: vec![1, 1],
                exports: Arc::new(Mutex::new(Vec::new())),
                written: Arc::new(Mutex::new(Vec::new())),
                saved_before_each: Arc::new(Mutex::new(Vec::new())),
            }),
            Box::new(ImageFileWriter::new()),
            Box::new(NullPipelineLogger),
        );
        let summary = uc.execute(Path::new("clip.mp4"), dir.path(), None).unwrap();

        for path in &summary.saved {
            let img = image::open(path).unwrap();
            assert_eq!((img.width(), img.height()), (4, 4));
        }
    }
}
