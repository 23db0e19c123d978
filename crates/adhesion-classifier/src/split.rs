use crate::error::ClassifierError;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Row indices of a train/test partition, each sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

fn class_indices(labels: &[u8]) -> [Vec<usize>; 2] {
    let mut classes = [Vec::new(), Vec::new()];
    for (i, &label) in labels.iter().enumerate() {
        classes[usize::from(label > 0)].push(i);
    }
    classes
}

/// Sample count of the smaller class.
pub fn minority_count(labels: &[u8]) -> usize {
    let [neg, pos] = class_indices(labels);
    neg.len().min(pos.len())
}

/// Stratified train/test split preserving class ratios.
///
/// Each class is shuffled with a `ChaCha8Rng` seeded by `seed` and gives
/// `round(n * test_fraction)` samples to the test side, clamped so both sides
/// keep at least one sample of every class.
pub fn stratified_split(
    labels: &[u8],
    test_fraction: f64,
    seed: u64,
) -> Result<Split, ClassifierError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(ClassifierError::TestSize(test_fraction));
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();
    for (label, mut indices) in class_indices(labels).into_iter().enumerate() {
        if indices.len() < 2 {
            return Err(ClassifierError::TooFewSamples {
                label: label as u8,
                count: indices.len(),
                needed: 2,
            });
        }
        indices.shuffle(&mut rng);
        let n_test = ((indices.len() as f64 * test_fraction).round() as usize)
            .clamp(1, indices.len() - 1);
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    Ok(Split { train, test })
}

/// `k` stratified folds without shuffling.
///
/// Samples are dealt to folds the way scikit-learn's `StratifiedKFold` does:
/// the sorted label list is distributed round-robin to decide how many of each
/// class every fold receives, then each class fills the folds in index order.
pub fn stratified_kfold(labels: &[u8], k: usize) -> Result<Vec<Split>, ClassifierError> {
    let classes = class_indices(labels);
    for (label, indices) in classes.iter().enumerate() {
        if indices.len() < k.max(2) {
            return Err(ClassifierError::TooFewSamples {
                label: label as u8,
                count: indices.len(),
                needed: k.max(2),
            });
        }
    }

    let mut sorted: Vec<usize> = labels.iter().map(|&l| usize::from(l > 0)).collect();
    sorted.sort_unstable();
    let mut allocation = vec![[0usize; 2]; k];
    for (i, &class) in sorted.iter().enumerate() {
        allocation[i % k][class] += 1;
    }

    let mut fold_of = vec![0usize; labels.len()];
    for (class, indices) in classes.iter().enumerate() {
        let folds = allocation
            .iter()
            .enumerate()
            .flat_map(|(fold, counts)| std::iter::repeat(fold).take(counts[class]));
        for (&i, fold) in indices.iter().zip(folds) {
            fold_of[i] = fold;
        }
    }

    Ok((0..k)
        .map(|fold| {
            let (test, train): (Vec<usize>, Vec<usize>) =
                (0..labels.len()).partition(|&i| fold_of[i] == fold);
            Split { train, test }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pos: usize, neg: usize) -> Vec<u8> {
        std::iter::repeat(1)
            .take(pos)
            .chain(std::iter::repeat(0).take(neg))
            .collect()
    }

    #[test]
    fn test_split_preserves_ratio() {
        let y = labels(10, 40);
        let split = stratified_split(&y, 0.2, 42).unwrap();
        let test_pos = split.test.iter().filter(|&&i| y[i] == 1).count();
        assert_eq!(split.test.len(), 10);
        assert_eq!(test_pos, 2);
        assert_eq!(split.train.len() + split.test.len(), 50);
        assert!(split.train.iter().all(|i| !split.test.contains(i)));
    }

    #[test]
    fn test_split_is_seeded() {
        let y = labels(20, 20);
        assert_eq!(
            stratified_split(&y, 0.25, 7).unwrap(),
            stratified_split(&y, 0.25, 7).unwrap()
        );
        assert_ne!(
            stratified_split(&y, 0.25, 7).unwrap(),
            stratified_split(&y, 0.25, 8).unwrap()
        );
    }

    #[test]
    fn test_split_small_classes() {
        // round(3 * 0.2) = 1 and round(2 * 0.2) = 0 -> clamped to 1
        let split = stratified_split(&labels(3, 2), 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 2);
        assert!(matches!(
            stratified_split(&labels(1, 5), 0.2, 42),
            Err(ClassifierError::TooFewSamples { label: 1, count: 1, .. })
        ));
        assert!(matches!(
            stratified_split(&labels(5, 5), 1.0, 42),
            Err(ClassifierError::TestSize(_))
        ));
    }

    #[test]
    fn test_kfold_allocation() {
        // sorted labels 0,0,0,0,1,1,1,1,1,1 dealt to 3 folds
        let y = labels(6, 4);
        let folds = stratified_kfold(&y, 3).unwrap();
        assert_eq!(folds.len(), 3);
        let sizes: Vec<usize> = folds.iter().map(|f| f.test.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
        let mut seen: Vec<usize> = folds.iter().flat_map(|f| f.test.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
        // positives come first in index order and fill fold 0 first
        assert_eq!(folds[0].test, vec![0, 1, 6, 7]);
        for fold in &folds {
            assert_eq!(fold.train.len() + fold.test.len(), 10);
        }
    }

    #[test]
    fn test_kfold_needs_enough_per_class() {
        assert!(stratified_kfold(&labels(2, 10), 3).is_err());
    }
}
