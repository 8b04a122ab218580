//! Fixed-size batching of generator inputs

use std::path::PathBuf;

/// Files passed to closurets per invocation
pub const DEFAULT_BATCH_SIZE: usize = 15;

/// Consecutive, order-preserving batches of at most `cap` files
///
/// The last batch may be shorter. A `cap` of zero is treated as one.
pub fn file_batches(files: &[PathBuf], cap: usize) -> std::slice::Chunks<'_, PathBuf> {
    files.chunks(cap.max(1))
}

/// Number of batches `file_batches` yields for `len` files
pub fn batch_count(len: usize, cap: usize) -> usize {
    let cap = cap.max(1);
    (len + cap - 1) / cap
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn paths(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("f{}.js", i))).collect()
    }

    #[test]
    fn test_thirty_one_files() {
        let files = paths(31);
        let sizes: Vec<usize> = file_batches(&files, DEFAULT_BATCH_SIZE)
            .map(|b| b.len())
            .collect();
        assert_eq!(sizes, vec![15, 15, 1]);
    }

    #[test]
    fn test_empty_and_exact() {
        assert_eq!(file_batches(&[], 15).count(), 0);
        assert_eq!(batch_count(0, 15), 0);
        assert_eq!(file_batches(&paths(30), 15).count(), 2);
        assert_eq!(file_batches(&paths(3), 0).count(), 3);
    }

    proptest! {
        #[test]
        fn prop_batches_cover_input_in_order(n in 0usize..200, cap in 1usize..40) {
            let files = paths(n);
            let batches: Vec<&[PathBuf]> = file_batches(&files, cap).collect();

            prop_assert_eq!(batches.len(), batch_count(n, cap));
            prop_assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= cap));

            let flattened: Vec<PathBuf> = batches.concat();
            prop_assert_eq!(flattened, files);
        }
    }
}
