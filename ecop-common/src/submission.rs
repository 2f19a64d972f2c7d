//! Annotation form validation

use std::collections::HashMap;
use thiserror::Error;

use crate::annotations::Labels;
use crate::poem_id::PoemId;

/// Rejected submission: at least one shown neighbor has no label
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} of {} recommended poems have no label", .missing.len(), .shown)]
pub struct IncompleteSubmission {
    pub missing: Vec<PoemId>,
    pub shown: usize,
}

/// Collect one label per shown neighbor
///
/// Accepted only if every neighbor has a non-blank value. Form fields that
/// are not neighbor keys are ignored. Labels are stored trimmed.
pub fn validate_labels(
    neighbors: &[PoemId],
    form: &HashMap<String, String>,
) -> Result<Labels, IncompleteSubmission> {
    let mut labels = Labels::new();
    let mut missing = Vec::new();

    for neighbor in neighbors {
        match form.get(&neighbor.to_string()).map(|v| v.trim()) {
            Some(value) if !value.is_empty() => {
                labels.insert(neighbor.clone(), value.to_string());
            }
            _ => missing.push(neighbor.clone()),
        }
    }

    if missing.is_empty() {
        Ok(labels)
    } else {
        Err(IncompleteSubmission {
            missing,
            shown: neighbors.len(),
        })
    }
}
