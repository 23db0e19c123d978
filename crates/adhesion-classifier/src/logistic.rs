use crate::error::ClassifierError;
use adhesion_plms::EmbedderKind;
use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{ops::sigmoid, AdamW, Optimizer, ParamsAdamW};
use ndarray::Array2;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Version written into saved models.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct LogisticConfig {
    /// Inverse regularization strength.
    pub c: f64,
    pub max_iter: usize,
    /// Stop once the loss changes by less than this between iterations.
    pub tol: f64,
    pub lr: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-6,
            lr: 0.05,
        }
    }
}

/// What a saved classifier was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelMetadata {
    pub embedder: EmbedderKind,
    pub dim: usize,
    pub format_version: u32,
}

/// Binary L2-regularized logistic regression.
///
/// Minimizes `mean(log_loss) + |w|^2 / (2 C n)` with full-batch AdamW from a
/// zero start, so a given input always yields the same weights. Runs on the
/// CPU.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    weight: Tensor,
    bias: Tensor,
}

fn to_tensor(x: &Array2<f32>, device: &Device) -> candle_core::Result<Tensor> {
    Tensor::from_iter(x.iter().copied(), device)?.reshape(x.dim())
}

/// `relu(z) + log(1 + exp(-|z|)) - y z`, the log loss written to avoid overflow.
fn log_loss(logits: &Tensor, targets: &Tensor) -> candle_core::Result<Tensor> {
    let softplus = (logits.relu()? + logits.abs()?.neg()?.exp()?.affine(1.0, 1.0)?.log()?)?;
    (softplus - (targets * logits)?)?.mean_all()
}

impl LogisticRegression {
    pub fn fit(x: &Array2<f32>, y: &[u8], config: &LogisticConfig) -> Result<Self, ClassifierError> {
        let (n, d) = x.dim();
        if n != y.len() {
            return Err(ClassifierError::LengthMismatch {
                samples: n,
                labels: y.len(),
            });
        }
        if n == 0 {
            return Err(ClassifierError::Empty);
        }
        if y.iter().all(|&l| l == y[0]) {
            return Err(ClassifierError::SingleClass);
        }

        let device = Device::Cpu;
        let xs = to_tensor(x, &device)?;
        let targets = Tensor::from_iter(y.iter().map(|&l| if l > 0 { 1f32 } else { 0f32 }), &device)?;
        let weight = Var::zeros(d, DType::F32, &device)?;
        let bias = Var::zeros(1, DType::F32, &device)?;
        let mut optimizer = AdamW::new(
            vec![weight.clone(), bias.clone()],
            ParamsAdamW {
                lr: config.lr,
                weight_decay: 0.0,
                ..Default::default()
            },
        )?;
        let penalty_scale = 1.0 / (2.0 * config.c * n as f64);

        let mut previous = f64::INFINITY;
        for iter in 0..config.max_iter {
            let logits = xs
                .matmul(&weight.as_tensor().unsqueeze(1)?)?
                .squeeze(1)?
                .broadcast_add(bias.as_tensor())?;
            let penalty = (weight.as_tensor().sqr()?.sum_all()? * penalty_scale)?;
            let loss = (log_loss(&logits, &targets)? + penalty)?;
            optimizer.backward_step(&loss)?;

            let current = loss.to_scalar::<f32>()? as f64;
            if (previous - current).abs() < config.tol {
                debug!("Converged after {} iterations, loss {:.6}", iter + 1, current);
                break;
            }
            previous = current;
        }

        Ok(Self {
            weight: Tensor::from_vec(weight.as_tensor().to_vec1::<f32>()?, d, &device)?,
            bias: Tensor::from_vec(bias.as_tensor().to_vec1::<f32>()?, 1, &device)?,
        })
    }

    /// Number of features the model was fitted on.
    pub fn dim(&self) -> usize {
        self.weight.elem_count()
    }

    pub fn weights(&self) -> Result<Vec<f32>, ClassifierError> {
        Ok(self.weight.to_vec1()?)
    }

    pub fn bias(&self) -> Result<f32, ClassifierError> {
        Ok(self.bias.to_vec1::<f32>()?[0])
    }

    pub fn check_dimension(&self, dim: usize) -> Result<(), ClassifierError> {
        if dim != self.dim() {
            return Err(ClassifierError::DimensionMismatch {
                expected: self.dim(),
                found: dim,
            });
        }
        Ok(())
    }

    /// `[P(0), P(1)]` per row.
    pub fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<[f32; 2]>, ClassifierError> {
        let (n, d) = x.dim();
        self.check_dimension(d)?;
        if n == 0 {
            return Ok(Vec::new());
        }
        let xs = to_tensor(x, self.weight.device())?;
        let logits = xs
            .matmul(&self.weight.unsqueeze(1)?)?
            .squeeze(1)?
            .broadcast_add(&self.bias)?;
        let p1: Vec<f32> = sigmoid(&logits)?.to_vec1()?;
        Ok(p1.into_iter().map(|p| [1.0 - p, p]).collect())
    }

    /// Hard labels. A probability of exactly one half goes to class 0.
    pub fn predict(&self, x: &Array2<f32>) -> Result<Vec<u8>, ClassifierError> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|[_, p1]| u8::from(p1 > 0.5))
            .collect())
    }

    /// Accuracy on `(x, y)`.
    pub fn score(&self, x: &Array2<f32>, y: &[u8]) -> Result<f64, ClassifierError> {
        let predictions = self.predict(x)?;
        if predictions.len() != y.len() {
            return Err(ClassifierError::LengthMismatch {
                samples: predictions.len(),
                labels: y.len(),
            });
        }
        Ok(crate::metrics::accuracy(y, &predictions))
    }

    /// Write `weight` and `bias` as safetensors, recording `embedder` and
    /// the feature dimension in the header.
    pub fn save<P: AsRef<Path>>(&self, path: P, embedder: EmbedderKind) -> Result<(), ClassifierError> {
        let path = path.as_ref();
        let metadata = HashMap::from([
            ("embedder".to_string(), embedder.to_string()),
            ("dim".to_string(), self.dim().to_string()),
            ("format_version".to_string(), FORMAT_VERSION.to_string()),
        ]);
        let tensors = [("weight", &self.weight), ("bias", &self.bias)];
        safetensors::serialize_to_file(tensors, &Some(metadata), path)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<(Self, ModelMetadata), ClassifierError> {
        let path = path.as_ref();
        let buffer = std::fs::read(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => ClassifierError::ModelNotFound {
                path: path.to_path_buf(),
            },
            _ => ClassifierError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let (_, header) = safetensors::SafeTensors::read_metadata(&buffer)?;
        let metadata = parse_metadata(header.metadata().as_ref())?;

        let mut tensors = candle_core::safetensors::load_buffer(&buffer, &Device::Cpu)?;
        let mut take = |name: &str| {
            tensors
                .remove(name)
                .ok_or_else(|| ClassifierError::Metadata(format!("missing tensor `{}`", name)))
        };
        let weight = take("weight")?.to_dtype(DType::F32)?;
        let bias = take("bias")?.to_dtype(DType::F32)?;
        let model = Self { weight, bias };
        model.check_dimension(metadata.dim)?;
        Ok((model, metadata))
    }
}

fn parse_metadata(header: Option<&HashMap<String, String>>) -> Result<ModelMetadata, ClassifierError> {
    let header = header.ok_or_else(|| ClassifierError::Metadata("no metadata".to_string()))?;
    let field = |key: &str| {
        header
            .get(key)
            .ok_or_else(|| ClassifierError::Metadata(format!("missing `{}`", key)))
    };
    let embedder = field("embedder")?
        .parse::<EmbedderKind>()
        .map_err(|e| ClassifierError::Metadata(format!("embedder: {}", e)))?;
    let dim = field("dim")?
        .parse::<usize>()
        .map_err(|e| ClassifierError::Metadata(format!("dim: {}", e)))?;
    let format_version = field("format_version")?
        .parse::<u32>()
        .map_err(|e| ClassifierError::Metadata(format!("format_version: {}", e)))?;
    if format_version > FORMAT_VERSION {
        return Err(ClassifierError::Metadata(format!(
            "format version {} is newer than supported version {}",
            format_version, FORMAT_VERSION
        )));
    }
    Ok(ModelMetadata {
        embedder,
        dim,
        format_version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f32>, Vec<u8>) {
        let x = array![
            [0.9f32, 0.1],
            [0.8, 0.2],
            [0.7, 0.1],
            [0.95, 0.3],
            [0.1, 0.9],
            [0.2, 0.8],
            [0.3, 0.95],
            [0.15, 0.7],
        ];
        (x, vec![1, 1, 1, 1, 0, 0, 0, 0])
    }

    #[test]
    fn test_separable_data() {
        let (x, y) = separable();
        let model = LogisticRegression::fit(&x, &y, &LogisticConfig::default()).unwrap();
        assert_eq!(model.dim(), 2);
        assert_eq!(model.predict(&x).unwrap(), y);
        assert_eq!(model.score(&x, &y).unwrap(), 1.0);
        let w = model.weights().unwrap();
        assert!(w[0] > 0.0 && w[1] < 0.0);
    }

    #[test]
    fn test_probabilities() {
        let (x, y) = separable();
        let model = LogisticRegression::fit(&x, &y, &LogisticConfig::default()).unwrap();
        let proba = model.predict_proba(&x).unwrap();
        let labels = model.predict(&x).unwrap();
        for (p, label) in proba.iter().zip(labels) {
            assert!((0.0..=1.0).contains(&p[0]) && (0.0..=1.0).contains(&p[1]));
            assert!((p[0] + p[1] - 1.0).abs() < 1e-6);
            assert_eq!(label, u8::from(p[1] > p[0]));
        }
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = separable();
        let a = LogisticRegression::fit(&x, &y, &LogisticConfig::default()).unwrap();
        let b = LogisticRegression::fit(&x, &y, &LogisticConfig::default()).unwrap();
        assert_eq!(a.weights().unwrap(), b.weights().unwrap());
        assert_eq!(a.bias().unwrap(), b.bias().unwrap());
    }

    #[test]
    fn test_tie_goes_to_negative() {
        let model = LogisticRegression {
            weight: Tensor::zeros(3, DType::F32, &Device::Cpu).unwrap(),
            bias: Tensor::zeros(1, DType::F32, &Device::Cpu).unwrap(),
        };
        let x = Array2::<f32>::ones((2, 3));
        assert_eq!(model.predict(&x).unwrap(), vec![0, 0]);
        assert_eq!(model.predict_proba(&x).unwrap()[0], [0.5, 0.5]);
    }

    #[test]
    fn test_rejects_bad_input() {
        let (x, y) = separable();
        assert!(matches!(
            LogisticRegression::fit(&x, &y[..3], &LogisticConfig::default()),
            Err(ClassifierError::LengthMismatch { .. })
        ));
        assert!(matches!(
            LogisticRegression::fit(&x, &[1; 8], &LogisticConfig::default()),
            Err(ClassifierError::SingleClass)
        ));
        let model = LogisticRegression::fit(&x, &y, &LogisticConfig::default()).unwrap();
        assert!(matches!(
            model.predict(&Array2::zeros((1, 5))),
            Err(ClassifierError::DimensionMismatch {
                expected: 2,
                found: 5
            })
        ));
    }

    #[test]
    fn test_save_load_round_trip() {
        let (x, y) = separable();
        let model = LogisticRegression::fit(&x, &y, &LogisticConfig::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.safetensors");
        model.save(&path, EmbedderKind::Composition).unwrap();

        let (loaded, metadata) = LogisticRegression::load(&path).unwrap();
        assert_eq!(
            metadata,
            ModelMetadata {
                embedder: EmbedderKind::Composition,
                dim: 2,
                format_version: FORMAT_VERSION
            }
        );
        assert_eq!(loaded.predict(&x).unwrap(), model.predict(&x).unwrap());
        assert_eq!(
            loaded.predict_proba(&x).unwrap(),
            model.predict_proba(&x).unwrap()
        );
    }

    #[test]
    fn test_missing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = LogisticRegression::load(dir.path().join("absent.safetensors"));
        assert!(matches!(result, Err(ClassifierError::ModelNotFound { .. })));
    }
}
