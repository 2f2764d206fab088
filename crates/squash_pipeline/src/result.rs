//! Transformation results.

use std::sync::Arc;

/// Marks a result produced by a plugin rather than the untouched input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// Output of one plugin.
    Generated,
}

/// One output of [`generate`](crate::TransformPipeline::generate).
#[derive(Debug, Clone, PartialEq)]
pub struct TransformResult {
    /// Output filename. Generated results may carry a new extension.
    pub filename: String,
    /// Output bytes. For the baseline, the original input.
    pub data: Arc<[u8]>,
    /// Non-fatal diagnostics.
    pub warnings: Vec<String>,
    /// Failures. Only the baseline ever carries errors.
    pub errors: Vec<String>,
    /// `None` for the baseline, `Some(Generated)` for plugin output.
    pub kind: Option<ResultKind>,
}

impl TransformResult {
    /// The untouched input.
    pub fn baseline(filename: impl Into<String>, data: Arc<[u8]>) -> Self {
        Self {
            filename: filename.into(),
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            kind: None,
        }
    }

    /// Output of one plugin.
    pub fn generated(filename: impl Into<String>, data: Arc<[u8]>, warnings: Vec<String>) -> Self {
        Self {
            filename: filename.into(),
            data,
            warnings,
            errors: Vec::new(),
            kind: Some(ResultKind::Generated),
        }
    }

    /// Returns `true` for plugin output.
    pub fn is_generated(&self) -> bool {
        self.kind == Some(ResultKind::Generated)
    }

    /// Size of the output in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Returns the smallest result; ties go to the earliest, so the baseline wins
/// unless some plugin actually shrank the input.
pub fn select_smallest(results: &[TransformResult]) -> Option<&TransformResult> {
    results
        .iter()
        .enumerate()
        .min_by_key(|(index, result)| (result.size(), *index))
        .map(|(_, result)| result)
}
