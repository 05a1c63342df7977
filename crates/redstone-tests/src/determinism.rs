//! Determinism checks for generated files.
//!
//! Given the same audio, parameters and timestamp, every schematic byte must
//! be identical across runs.

use std::fmt;

/// Result of a determinism verification.
#[derive(Debug, Clone)]
pub struct DeterminismResult {
    /// Whether all runs produced identical output.
    pub is_deterministic: bool,
    pub runs: usize,
    /// Size of the first run's output in bytes.
    pub output_size: usize,
    /// BLAKE3 hash of the first run's output.
    pub hash: String,
    /// First differing byte offset and the run it was found in.
    pub first_difference: Option<(usize, usize)>,
}

impl DeterminismResult {
    /// Panic with a detailed message if not deterministic.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            panic!("Non-deterministic output detected!\n{}", self);
        }
    }
}

impl fmt::Display for DeterminismResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "runs: {}, size: {} bytes, hash: {}",
            self.runs, self.output_size, self.hash
        )?;
        if let Some((offset, run)) = self.first_difference {
            write!(f, ", first difference at byte {} in run {}", offset, run)?;
        }
        Ok(())
    }
}

/// Run generation `runs` times and compare every output with the first.
pub fn verify_determinism<F, O>(generate_fn: F, runs: usize) -> DeterminismResult
where
    F: Fn() -> O,
    O: AsRef<[u8]>,
{
    assert!(runs >= 2, "Must run at least 2 times to verify determinism");

    let reference = generate_fn();
    let reference = reference.as_ref();
    let mut result = DeterminismResult {
        is_deterministic: true,
        runs,
        output_size: reference.len(),
        hash: compute_hash(reference),
        first_difference: None,
    };

    for run_index in 1..runs {
        let output = generate_fn();
        let output = output.as_ref();
        let offset = reference
            .iter()
            .zip(output)
            .position(|(a, b)| a != b)
            .or_else(|| (reference.len() != output.len()).then(|| reference.len().min(output.len())));
        if let Some(offset) = offset {
            result.is_deterministic = false;
            result.first_difference = Some((offset, run_index));
            break;
        }
    }
    result
}

/// Compute BLAKE3 hash of data.
pub fn compute_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_identical_runs() {
        let result = verify_determinism(|| vec![1u8, 2, 3], 3);
        assert!(result.is_deterministic);
        assert_eq!(result.output_size, 3);
        assert_eq!(result.hash, compute_hash(&[1, 2, 3]));
    }

    #[test]
    fn test_detects_difference() {
        let counter = Cell::new(0u8);
        let result = verify_determinism(
            || {
                counter.set(counter.get() + 1);
                vec![0u8, counter.get()]
            },
            2,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.first_difference, Some((1, 1)));
    }

    #[test]
    fn test_detects_length_change() {
        let counter = Cell::new(0usize);
        let result = verify_determinism(
            || {
                counter.set(counter.get() + 1);
                vec![7u8; counter.get()]
            },
            2,
        );
        assert_eq!(result.first_difference, Some((1, 1)));
    }
}
