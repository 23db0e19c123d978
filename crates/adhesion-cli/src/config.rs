use adhesion_plms::EmbedderKind;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "ADHESION_DATA_DIR";
pub const MODELS_DIR_ENV: &str = "ADHESION_MODELS_DIR";

/// Default locations, relative to the working directory unless overridden
/// through [`DATA_DIR_ENV`] or [`MODELS_DIR_ENV`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub data_dir: PathBuf,
    pub models_dir: PathBuf,
}

impl Defaults {
    pub fn new(data_dir: impl Into<PathBuf>, models_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            models_dir: models_dir.into(),
        }
    }

    pub fn from_env() -> Self {
        let dir = |var: &str, fallback: &str| {
            std::env::var_os(var)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(fallback))
        };
        Self::new(dir(DATA_DIR_ENV, "data"), dir(MODELS_DIR_ENV, "models"))
    }

    pub fn positive_dir(&self) -> PathBuf {
        self.data_dir.join("positive")
    }
    pub fn negative_dir(&self) -> PathBuf {
        self.data_dir.join("negative")
    }
    pub fn input_dir(&self) -> PathBuf {
        self.data_dir.join("input")
    }

    /// `<models>/adhesion_model_<kind>.safetensors`
    pub fn model_path(&self, kind: EmbedderKind) -> PathBuf {
        self.models_dir
            .join(format!("adhesion_model_{}.safetensors", kind))
    }
}

/// `<cwd>/<name>.adhesion_predict.csv`, where `name` is the stem of an input
/// file or the name of an input directory.
pub fn default_predictions_path(cwd: &Path, input: &Path) -> PathBuf {
    let name = if input.is_dir() {
        input.file_name()
    } else {
        input.file_stem()
    }
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| "input".to_string());
    cwd.join(format!("{}.adhesion_predict.csv", name))
}
