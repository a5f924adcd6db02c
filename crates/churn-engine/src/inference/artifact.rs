//! Trained artifacts and the capability interface the engine calls them through.
//!
//! Artifacts are exported from training as JSON documents tagged by `"estimator"`. Each
//! estimator declares up front which probability-producing capability it offers, so the
//! registry can record it once at load time instead of probing on every request.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::encoder::EncodedRow;
use super::logistic;

/// Best probability-producing call an artifact supports, in engine preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Probability,
    DecisionFunction,
    HardPrediction,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Probability => "predict_proba",
            Capability::DecisionFunction => "decision_function",
            Capability::HardPrediction => "predict",
        };
        f.write_str(name)
    }
}

/// Per-column weights an artifact exposes for attribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Attribution<'a> {
    Coefficients(&'a [f64]),
    Importances(&'a [f64]),
}

impl<'a> Attribution<'a> {
    pub fn weights(&self) -> &'a [f64] {
        match self {
            Attribution::Coefficients(weights) | Attribution::Importances(weights) => *weights,
        }
    }
}

/// Capability interface over a loaded artifact. Only the methods matching
/// [`ChurnClassifier::capability`] (and anything richer it happens to offer) need overriding.
pub trait ChurnClassifier: Send + Sync + fmt::Debug {
    fn capability(&self) -> Capability;

    /// Number of input values the artifact consumes.
    fn width(&self) -> usize;

    /// Named input columns, when the artifact resolves its input by name.
    fn input_columns(&self) -> Option<&[String]> {
        None
    }

    fn predict_proba(&self, _input: &[f64]) -> Result<f64, InvocationError> {
        Err(InvocationError::Unsupported(Capability::Probability))
    }

    fn decision_function(&self, _input: &[f64]) -> Result<f64, InvocationError> {
        Err(InvocationError::Unsupported(Capability::DecisionFunction))
    }

    fn predict(&self, _input: &[f64]) -> Result<u8, InvocationError> {
        Err(InvocationError::Unsupported(Capability::HardPrediction))
    }

    fn attribution(&self) -> Option<Attribution<'_>> {
        None
    }

    /// Lays the encoded row out in the order this artifact consumes it.
    fn prepare(&self, row: &EncodedRow) -> Result<Vec<f64>, InvocationError> {
        resolve_input(self.input_columns(), self.width(), row)
    }
}

/// Per-request invocation failure. Always recovered by the heuristic path.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvocationError {
    #[error("artifact does not support {0}")]
    Unsupported(Capability),
    #[error("encoded row has {actual} values, artifact expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("encoded row is missing column '{0}'")]
    MissingColumn(String),
    #[error("artifact produced an unusable score {0}")]
    InvalidOutput(f64),
    #[error("decision tree walk did not reach a leaf")]
    MalformedTree,
}

/// Load-time failure. The registry swallows these and serves the heuristic.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid artifact document {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("artifact rejected: {0}")]
    Invalid(String),
}

/// Drops a `"<step>__"` prefix added by column transformers, e.g. `cat__Contract_Two year`.
pub(crate) fn strip_transformer_prefix(column: &str) -> &str {
    column
        .split_once("__")
        .map(|(_, rest)| rest)
        .unwrap_or(column)
}

fn resolve_input(
    columns: Option<&[String]>,
    width: usize,
    row: &EncodedRow,
) -> Result<Vec<f64>, InvocationError> {
    match columns {
        Some(columns) => columns
            .iter()
            .map(|column| {
                row.value(column)
                    .or_else(|| row.value(strip_transformer_prefix(column)))
                    .ok_or_else(|| InvocationError::MissingColumn(column.clone()))
            })
            .collect(),
        None if row.len() == width => Ok(row.values().to_vec()),
        None => Err(InvocationError::DimensionMismatch {
            expected: width,
            actual: row.len(),
        }),
    }
}

/// On-disk artifact document.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "estimator", rename_all = "snake_case")]
pub enum ArtifactDocument {
    LogisticRegression(LinearSpec),
    LinearSvm(LinearSpec),
    DecisionTree(TreeSpec),
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinearSpec {
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
    #[serde(default)]
    pub scaler: Option<ScalerSpec>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

/// Standardization applied before the linear step: `(x - mean) / scale`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScalerSpec {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeSpec {
    pub nodes: Vec<TreeNode>,
    #[serde(default)]
    pub feature_importances: Option<Vec<f64>>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub n_features: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        column: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: u8,
    },
}

impl ArtifactDocument {
    pub fn from_path(path: &Path) -> Result<Self, ArtifactError> {
        let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ArtifactError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validates the document and builds the classifier it describes.
    pub fn into_classifier(self) -> Result<Box<dyn ChurnClassifier>, ArtifactError> {
        match self {
            ArtifactDocument::LogisticRegression(spec) => Ok(Box::new(LinearModel::new(
                LinearKind::LogisticRegression,
                spec,
            )?)),
            ArtifactDocument::LinearSvm(spec) => {
                Ok(Box::new(LinearModel::new(LinearKind::LinearSvm, spec)?))
            }
            ArtifactDocument::DecisionTree(spec) => Ok(Box::new(DecisionTree::new(spec)?)),
        }
    }
}

pub fn load_classifier(path: &Path) -> Result<Box<dyn ChurnClassifier>, ArtifactError> {
    ArtifactDocument::from_path(path)?.into_classifier()
}

/// Reads the ordered feature-name list shipped next to a legacy artifact.
pub fn load_feature_names(path: &Path) -> Result<Vec<String>, ArtifactError> {
    let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let names: Vec<String> = serde_json::from_str(&raw).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if names.is_empty() {
        return Err(ArtifactError::Invalid(format!(
            "{} declares no feature names",
            path.display()
        )));
    }
    Ok(names)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinearKind {
    LogisticRegression,
    LinearSvm,
}

#[derive(Debug)]
struct LinearModel {
    kind: LinearKind,
    coefficients: Vec<f64>,
    intercept: f64,
    scaler: Option<ScalerSpec>,
    columns: Option<Vec<String>>,
}

impl LinearModel {
    fn new(kind: LinearKind, spec: LinearSpec) -> Result<Self, ArtifactError> {
        let width = spec.coefficients.len();
        if width == 0 {
            return Err(ArtifactError::Invalid("linear model has no coefficients".into()));
        }
        if !spec.intercept.is_finite() || spec.coefficients.iter().any(|w| !w.is_finite()) {
            return Err(ArtifactError::Invalid(
                "linear model weights must be finite".into(),
            ));
        }
        if let Some(columns) = &spec.columns {
            check_len("columns", columns.len(), width)?;
        }
        if let Some(scaler) = &spec.scaler {
            check_len("scaler.mean", scaler.mean.len(), width)?;
            check_len("scaler.scale", scaler.scale.len(), width)?;
        }

        Ok(Self {
            kind,
            coefficients: spec.coefficients,
            intercept: spec.intercept,
            scaler: spec.scaler,
            columns: spec.columns,
        })
    }

    fn margin(&self, input: &[f64]) -> Result<f64, InvocationError> {
        if input.len() != self.coefficients.len() {
            return Err(InvocationError::DimensionMismatch {
                expected: self.coefficients.len(),
                actual: input.len(),
            });
        }

        let margin = input
            .iter()
            .enumerate()
            .map(|(index, value)| self.scaled(index, *value) * self.coefficients[index])
            .sum::<f64>()
            + self.intercept;

        if margin.is_finite() {
            Ok(margin)
        } else {
            Err(InvocationError::InvalidOutput(margin))
        }
    }

    fn scaled(&self, index: usize, value: f64) -> f64 {
        match &self.scaler {
            Some(scaler) => {
                let scale = scaler.scale[index];
                let scale = if scale == 0.0 { 1.0 } else { scale };
                (value - scaler.mean[index]) / scale
            }
            None => value,
        }
    }
}

impl ChurnClassifier for LinearModel {
    fn capability(&self) -> Capability {
        match self.kind {
            LinearKind::LogisticRegression => Capability::Probability,
            LinearKind::LinearSvm => Capability::DecisionFunction,
        }
    }

    fn width(&self) -> usize {
        self.coefficients.len()
    }

    fn input_columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    fn predict_proba(&self, input: &[f64]) -> Result<f64, InvocationError> {
        match self.kind {
            LinearKind::LogisticRegression => self.margin(input).map(logistic),
            LinearKind::LinearSvm => Err(InvocationError::Unsupported(Capability::Probability)),
        }
    }

    fn decision_function(&self, input: &[f64]) -> Result<f64, InvocationError> {
        self.margin(input)
    }

    fn predict(&self, input: &[f64]) -> Result<u8, InvocationError> {
        self.margin(input).map(|margin| u8::from(margin > 0.0))
    }

    fn attribution(&self) -> Option<Attribution<'_>> {
        Some(Attribution::Coefficients(&self.coefficients))
    }
}

#[derive(Debug)]
struct DecisionTree {
    nodes: Vec<TreeNode>,
    feature_importances: Option<Vec<f64>>,
    columns: Option<Vec<String>>,
    width: usize,
}

impl DecisionTree {
    fn new(spec: TreeSpec) -> Result<Self, ArtifactError> {
        let width = spec
            .columns
            .as_ref()
            .map(Vec::len)
            .or(spec.n_features)
            .or_else(|| spec.feature_importances.as_ref().map(Vec::len))
            .ok_or_else(|| {
                ArtifactError::Invalid(
                    "decision tree must declare columns, n_features or feature_importances".into(),
                )
            })?;

        if let Some(importances) = &spec.feature_importances {
            check_len("feature_importances", importances.len(), width)?;
        }
        if spec.nodes.is_empty() {
            return Err(ArtifactError::Invalid("decision tree has no nodes".into()));
        }

        for (index, node) in spec.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    column,
                    threshold,
                    left,
                    right,
                } => {
                    if column >= width || !threshold.is_finite() {
                        return Err(ArtifactError::Invalid(format!(
                            "node {index} splits on an unknown column or threshold"
                        )));
                    }
                    // Children always sit after their parent, which rules out cycles.
                    let in_range = |child: usize| child > index && child < spec.nodes.len();
                    if !in_range(left) || !in_range(right) {
                        return Err(ArtifactError::Invalid(format!(
                            "node {index} points at an invalid child"
                        )));
                    }
                }
                TreeNode::Leaf { class } if class > 1 => {
                    return Err(ArtifactError::Invalid(format!(
                        "leaf {index} predicts unknown class {class}"
                    )));
                }
                TreeNode::Leaf { .. } => {}
            }
        }

        Ok(Self {
            nodes: spec.nodes,
            feature_importances: spec.feature_importances,
            columns: spec.columns,
            width,
        })
    }
}

impl ChurnClassifier for DecisionTree {
    fn capability(&self) -> Capability {
        Capability::HardPrediction
    }

    fn width(&self) -> usize {
        self.width
    }

    fn input_columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    fn predict(&self, input: &[f64]) -> Result<u8, InvocationError> {
        let mut index = 0;
        for _ in 0..self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { class }) => return Ok(*class),
                Some(TreeNode::Split {
                    column,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = input.get(*column).copied().ok_or(
                        InvocationError::DimensionMismatch {
                            expected: self.width,
                            actual: input.len(),
                        },
                    )?;
                    index = if value <= *threshold { *left } else { *right };
                }
                None => break,
            }
        }
        Err(InvocationError::MalformedTree)
    }

    fn attribution(&self) -> Option<Attribution<'_>> {
        self.feature_importances
            .as_deref()
            .map(Attribution::Importances)
    }
}

fn check_len(field: &str, actual: usize, expected: usize) -> Result<(), ArtifactError> {
    if actual == expected {
        Ok(())
    } else {
        Err(ArtifactError::Invalid(format!(
            "{field} has {actual} entries, expected {expected}"
        )))
    }
}
