// SVM cough model - binary cough detector from an exported scikit-learn SVC
//
// Reads the JSON export of a fitted `sklearn.svm.SVC` (support vectors, dual
// coefficients, intercept, gamma, kernel, C, support indices, per-class
// support counts) and evaluates its decision function on feature vectors:
//
//   f(x) = Σ dual_coef[0][i] · K(sv_i, x) + intercept[0]
//
// Positive decision values are the cough class. Supported kernels are `rbf`
// (K = exp(-γ‖a - b‖²)) and `linear` (K = a · b).

use serde::Deserialize;
use std::path::Path;

use crate::analysis::cough_gate::{CoughDecision, CoughDetector, DetectorKind};
use crate::analysis::features::FeatureVector;
use crate::error::CorpusError;

/// Kernel function of the exported model
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SvmKernel {
    Rbf { gamma: f32 },
    Linear,
}

impl SvmKernel {
    fn apply(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            SvmKernel::Rbf { gamma } => {
                let squared: f32 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
                (-gamma * squared).exp()
            }
            SvmKernel::Linear => a.iter().zip(b).map(|(x, y)| x * y).sum(),
        }
    }
}

/// `gamma` is either a number or a scikit-learn keyword
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GammaSpec {
    Value(f32),
    Keyword(String),
}

/// On-disk layout written by the export script
#[derive(Debug, Deserialize)]
struct SvmExport {
    support_vectors: Vec<Vec<f32>>,
    dual_coef: Vec<Vec<f32>>,
    intercept: Vec<f32>,
    gamma: Option<GammaSpec>,
    #[serde(rename = "C", default)]
    c: Option<f32>,
    kernel: String,
    #[serde(default)]
    support: Vec<usize>,
    #[serde(default)]
    n_support: Vec<usize>,
}

/// Fitted binary SVM used as a cough detector
#[derive(Debug, Clone)]
pub struct SvmCoughModel {
    support_vectors: Vec<Vec<f32>>,
    dual_coef: Vec<f32>,
    intercept: f32,
    kernel: SvmKernel,
    dimension: usize,
}

impl SvmCoughModel {
    /// Parse and validate an exported model
    pub fn from_json(data: &str) -> Result<Self, CorpusError> {
        let export: SvmExport = serde_json::from_str(data)?;
        Self::from_export(export)
    }

    /// Read an exported model from disk
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| CorpusError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        let model = Self::from_json(&contents)?;
        log::info!(
            "Loaded SVM cough model from {}: {} support vectors, dimension {}",
            path.display(),
            model.support_vectors.len(),
            model.dimension
        );
        Ok(model)
    }

    fn from_export(export: SvmExport) -> Result<Self, CorpusError> {
        let dimension = match export.support_vectors.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => return Err(CorpusError::invalid("SVM model has no support vectors")),
        };
        if export.support_vectors.iter().any(|sv| sv.len() != dimension) {
            return Err(CorpusError::invalid(
                "SVM support vectors have inconsistent dimensions",
            ));
        }

        let dual_coef = match export.dual_coef.as_slice() {
            [row] => row.clone(),
            rows => {
                return Err(CorpusError::invalid(format!(
                    "expected a binary SVM with one dual coefficient row, found {}",
                    rows.len()
                )))
            }
        };
        if dual_coef.len() != export.support_vectors.len() {
            return Err(CorpusError::invalid(format!(
                "{} dual coefficients for {} support vectors",
                dual_coef.len(),
                export.support_vectors.len()
            )));
        }
        if !export.support.is_empty() && export.support.len() != export.support_vectors.len() {
            return Err(CorpusError::invalid("support index count does not match support vectors"));
        }
        if !export.n_support.is_empty()
            && export.n_support.iter().sum::<usize>() != export.support_vectors.len()
        {
            return Err(CorpusError::invalid("n_support does not add up to the support vector count"));
        }
        if let Some(c) = export.c {
            if c <= 0.0 || !c.is_finite() {
                return Err(CorpusError::invalid("SVM regularization C must be > 0"));
            }
        }

        let intercept = match export.intercept.as_slice() {
            [value] => *value,
            _ => return Err(CorpusError::invalid("expected exactly one intercept")),
        };

        let kernel = match export.kernel.as_str() {
            "linear" => SvmKernel::Linear,
            "rbf" => SvmKernel::Rbf {
                gamma: resolve_gamma(export.gamma, dimension)?,
            },
            other => {
                return Err(CorpusError::invalid(format!(
                    "unsupported SVM kernel: {}",
                    other
                )))
            }
        };

        let finite = export
            .support_vectors
            .iter()
            .flatten()
            .chain(dual_coef.iter())
            .all(|v| v.is_finite())
            && intercept.is_finite();
        if !finite {
            return Err(CorpusError::invalid("SVM model contains non-finite values"));
        }

        Ok(Self {
            support_vectors: export.support_vectors,
            dual_coef,
            intercept,
            kernel,
            dimension,
        })
    }

    /// Input length the model was trained on
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn kernel(&self) -> SvmKernel {
        self.kernel
    }

    /// Signed distance from the separating surface; positive means cough
    pub fn decision_function(&self, x: &[f32]) -> f32 {
        self.support_vectors
            .iter()
            .zip(&self.dual_coef)
            .map(|(sv, coef)| coef * self.kernel.apply(sv, x))
            .sum::<f32>()
            + self.intercept
    }
}

impl CoughDetector for SvmCoughModel {
    fn evaluate(&self, features: &FeatureVector) -> CoughDecision {
        if features.len() != self.dimension {
            log::warn!(
                "SVM cough model expects {} features, got {}",
                self.dimension,
                features.len()
            );
            return CoughDecision {
                is_cough: false,
                confidence: 0.0,
                score: 0.0,
                detector: DetectorKind::Svm,
            };
        }

        let decision = self.decision_function(features.values());
        let decision = if decision.is_finite() { decision } else { 0.0 };
        CoughDecision {
            is_cough: decision > 0.0,
            confidence: 1.0 / (1.0 + (-decision).exp()),
            score: decision,
            detector: DetectorKind::Svm,
        }
    }
}

/// Numeric gamma, or `"auto"` = 1 / n_features
fn resolve_gamma(gamma: Option<GammaSpec>, dimension: usize) -> Result<f32, CorpusError> {
    match gamma {
        Some(GammaSpec::Value(value)) if value > 0.0 && value.is_finite() => Ok(value),
        Some(GammaSpec::Value(value)) => Err(CorpusError::invalid(format!(
            "SVM gamma must be positive, got {}",
            value
        ))),
        Some(GammaSpec::Keyword(keyword)) if keyword == "auto" => Ok(1.0 / dimension as f32),
        Some(GammaSpec::Keyword(keyword)) => Err(CorpusError::invalid(format!(
            "SVM gamma '{}' cannot be resolved without training data; export a numeric gamma",
            keyword
        ))),
        None => Err(CorpusError::invalid("rbf kernel requires gamma")),
    }
}
