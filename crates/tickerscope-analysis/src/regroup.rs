//! Flatten / regroup pair used to push nested request groups through the
//! flat, batch-oriented inference path.

use crate::error::AnalysisError;

/// Flattens groups into one sequence and remembers each group's length.
#[must_use]
pub fn flatten<T>(groups: Vec<Vec<T>>) -> (Vec<T>, Vec<usize>) {
    let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
    let flat = groups.into_iter().flatten().collect();
    (flat, sizes)
}

/// Restores the grouping recorded by [`flatten`].
///
/// The i-th output group holds exactly `group_sizes[i]` consecutive elements
/// of `flat`, in order. Empty groups are preserved.
///
/// # Errors
///
/// Returns [`AnalysisError::GroupSizeMismatch`] when the sizes do not sum to
/// `flat.len()`. No partial grouping is produced.
pub fn regroup<T>(flat: Vec<T>, group_sizes: &[usize]) -> Result<Vec<Vec<T>>, AnalysisError> {
    let declared = group_sizes
        .iter()
        .try_fold(0usize, |acc, n| acc.checked_add(*n))
        .unwrap_or(usize::MAX);
    if declared != flat.len() {
        return Err(AnalysisError::GroupSizeMismatch {
            declared,
            actual: flat.len(),
        });
    }

    let mut rest = flat.into_iter();
    let groups = group_sizes
        .iter()
        .map(|&n| rest.by_ref().take(n).collect::<Vec<T>>())
        .collect();
    Ok(groups)
}
