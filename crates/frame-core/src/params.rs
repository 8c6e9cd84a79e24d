//! Operator parameters and their declarations

use frame_inference_common::{DownloadMode, ProcessingError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Host parameter name of the model file path
pub const MODEL_FILE_PARAM: &str = "ModelFile";

/// Host parameter name of the download mode menu
pub const IMAGE_DOWNLOAD_PARAM: &str = "ImageDownload";

/// Configured parameter values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    /// Path to a serialized model (empty = not configured)
    #[serde(rename = "ModelFile")]
    pub model_file: String,

    /// When the host downloads the input frame
    #[serde(rename = "ImageDownload")]
    pub image_download: DownloadMode,
}

impl ParameterSet {
    pub fn new(model_file: impl Into<String>, image_download: DownloadMode) -> Self {
        Self {
            model_file: model_file.into(),
            image_download,
        }
    }

    /// Build from raw host parameter strings
    pub fn from_host_values(model_file: &str, image_download: &str) -> Self {
        Self {
            model_file: model_file.to_string(),
            image_download: DownloadMode::from_host_str(image_download),
        }
    }

    /// Load parameters from a YAML file
    pub fn from_yaml(yaml_path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(yaml_path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Update one parameter by host name
    ///
    /// # Errors
    /// Returns [`ProcessingError::InvalidConfig`] for unknown parameter names.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            MODEL_FILE_PARAM => self.model_file = value.to_string(),
            IMAGE_DOWNLOAD_PARAM => self.image_download = DownloadMode::from_host_str(value),
            other => {
                return Err(ProcessingError::InvalidConfig(format!(
                    "unknown parameter: {other}"
                )))
            }
        }
        Ok(())
    }
}

/// Kind of control a parameter is declared as
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ParameterKind {
    /// Menu of fixed string entries
    Menu { names: Vec<String>, labels: Vec<String> },

    /// File path chooser
    File,
}

/// Declaration of one host parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterDefinition {
    pub name: String,
    pub label: String,
    pub default_value: String,
    #[serde(flatten)]
    pub kind: ParameterKind,
}

/// Parameters the operator declares to its host, in display order
pub fn parameter_definitions() -> Vec<ParameterDefinition> {
    let menu_entries: Vec<String> = DownloadMode::NAMES.iter().map(|s| s.to_string()).collect();

    vec![
        ParameterDefinition {
            name: IMAGE_DOWNLOAD_PARAM.to_string(),
            label: "Image Download".to_string(),
            default_value: DownloadMode::default().as_str().to_string(),
            kind: ParameterKind::Menu {
                names: menu_entries.clone(),
                labels: menu_entries,
            },
        },
        ParameterDefinition {
            name: MODEL_FILE_PARAM.to_string(),
            label: "Model File".to_string(),
            default_value: String::new(),
            kind: ParameterKind::File,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let params = ParameterSet::default();
        assert_eq!(params.model_file, "");
        assert_eq!(params.image_download, DownloadMode::Instant);
    }

    #[test]
    fn test_from_host_values() {
        let params = ParameterSet::from_host_values("models/udnie.onnx", "Delayed");
        assert_eq!(params.model_file, "models/udnie.onnx");
        assert_eq!(params.image_download, DownloadMode::Delayed);

        let params = ParameterSet::from_host_values("", "bogus");
        assert_eq!(params.image_download, DownloadMode::Instant);
    }

    #[test]
    fn test_set_by_name() {
        let mut params = ParameterSet::default();
        params.set(MODEL_FILE_PARAM, "a.onnx").unwrap();
        params.set(IMAGE_DOWNLOAD_PARAM, "Delayed").unwrap();
        assert_eq!(params, ParameterSet::new("a.onnx", DownloadMode::Delayed));

        assert!(matches!(
            params.set("Brightness", "1.0"),
            Err(ProcessingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_yaml_round_trip_uses_host_names() {
        let params = ParameterSet::new("models/mosaic.onnx", DownloadMode::Delayed);
        let yaml = params.to_yaml().unwrap();
        assert!(yaml.contains("ModelFile: models/mosaic.onnx"));
        assert!(yaml.contains("ImageDownload: Delayed"));
    }

    #[test]
    fn test_yaml_missing_fields_use_defaults() {
        let params = ParameterSet::from_yaml_str("ModelFile: candy.onnx\n").unwrap();
        assert_eq!(params.model_file, "candy.onnx");
        assert_eq!(params.image_download, DownloadMode::Instant);
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ModelFile: rain_princess.onnx").unwrap();
        writeln!(file, "ImageDownload: Delayed").unwrap();

        let params = ParameterSet::from_yaml(file.path()).unwrap();
        assert_eq!(
            params,
            ParameterSet::new("rain_princess.onnx", DownloadMode::Delayed)
        );
    }

    #[test]
    fn test_invalid_yaml() {
        let err = ParameterSet::from_yaml_str("ImageDownload: Sometimes\n").unwrap_err();
        assert!(matches!(err, ProcessingError::YamlError(_)));
    }

    #[test]
    fn test_parameter_definitions() {
        let defs = parameter_definitions();
        assert_eq!(defs.len(), 2);

        assert_eq!(defs[0].name, "ImageDownload");
        assert_eq!(defs[0].default_value, "Instant");
        match &defs[0].kind {
            ParameterKind::Menu { names, labels } => {
                assert_eq!(names, &["Instant", "Delayed"]);
                assert_eq!(labels, names);
            }
            other => panic!("expected menu, got {other:?}"),
        }

        assert_eq!(defs[1].name, "ModelFile");
        assert_eq!(defs[1].label, "Model File");
        assert_eq!(defs[1].default_value, "");
        assert_eq!(defs[1].kind, ParameterKind::File);
    }
}
