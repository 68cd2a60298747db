/// Fraction of predictions equal to the reference labels, over the
/// pairs both slices cover.
pub fn accuracy(predicted: &[usize], truth: &[usize]) -> f32 {
    let n = predicted.len().min(truth.len());
    if n == 0 {
        return 0.0;
    }
    let hits = predicted.iter().zip(truth).filter(|(p, t)| p == t).count();
    hits as f32 / n as f32
}

/// Occurrences of each label code in `0..n_classes`.
pub fn class_counts(labels: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &label in labels {
        if let Some(c) = counts.get_mut(label) {
            *c += 1;
        }
    }
    counts
}
