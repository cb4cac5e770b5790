use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Interchange formats a trained model can be serialized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Onnx,
    TorchScript,
    OpenVino,
    CoreMl,
    TfLite,
    Engine,
}

impl ExportFormat {
    pub const ALL: &[ExportFormat] = &[
        ExportFormat::Onnx,
        ExportFormat::TorchScript,
        ExportFormat::OpenVino,
        ExportFormat::CoreMl,
        ExportFormat::TfLite,
        ExportFormat::Engine,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExportFormat::Onnx => "onnx",
            ExportFormat::TorchScript => "torchscript",
            ExportFormat::OpenVino => "openvino",
            ExportFormat::CoreMl => "coreml",
            ExportFormat::TfLite => "tflite",
            ExportFormat::Engine => "engine",
        }
    }

    /// File extension (or directory suffix) of the exported artifact.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Onnx => "onnx",
            ExportFormat::TorchScript => "torchscript",
            ExportFormat::OpenVino => "openvino_model",
            ExportFormat::CoreMl => "mlpackage",
            ExportFormat::TfLite => "tflite",
            ExportFormat::Engine => "engine",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        ExportFormat::ALL
            .iter()
            .copied()
            .find(|f| f.name() == lower)
            .ok_or_else(|| {
                let names: Vec<&str> = ExportFormat::ALL.iter().map(|f| f.name()).collect();
                format!("unknown export format '{s}', expected one of: {}", names.join(", "))
            })
    }
}
