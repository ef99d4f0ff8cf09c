//! Per-sample bit signatures.
//!
//! The matrix has one row per hash function and one column per sample
//! (canonical dataset order). Bit `[h][s]` is 1 iff sample `s` fell in the
//! "plus" half-space of hyperplane `h`. Column `s` read top to bottom is the
//! `r*b`-bit signature of sample `s`.
//!
//! Rows are packed into `u64` words, least significant bit first.

use crate::error::{LshError, Result};
use crate::hash::hyperplane::{HashStore, Side};

/// `[hash][sample]` bit matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitSignatureMatrix {
    num_hashes: usize,
    num_samples: usize,
    words_per_row: usize,
    words: Vec<u64>,
}

impl BitSignatureMatrix {
    /// Build the matrix from a hash store. `O(r*b*N)`.
    ///
    /// Fails with an internal-invariant error if some sample is in neither
    /// (or both) of a hyperplane's half-spaces.
    pub fn build(store: &HashStore) -> Result<Self> {
        let num_hashes = store.num_hashes();
        let num_samples = store.num_samples();
        let words_per_row = num_samples.div_ceil(64);
        let mut words = vec![0u64; num_hashes * words_per_row];

        for (h, partition) in store.partitions().iter().enumerate() {
            let row = &mut words[h * words_per_row..(h + 1) * words_per_row];
            for s in 0..num_samples {
                match partition.side_of(s) {
                    Some(Side::Plus) => row[s / 64] |= 1u64 << (s % 64),
                    Some(Side::Minus) => {}
                    None => {
                        return Err(LshError::InternalInvariant(format!(
                            "sample {s} is not in exactly one half-space of hyperplane {h}"
                        )))
                    }
                }
            }
        }

        Ok(Self {
            num_hashes,
            num_samples,
            words_per_row,
            words,
        })
    }

    pub fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Bit for hash function `hash` and sample `sample`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    #[inline]
    pub fn bit(&self, hash: usize, sample: usize) -> bool {
        assert!(hash < self.num_hashes && sample < self.num_samples);
        let word = self.words[hash * self.words_per_row + sample / 64];
        (word >> (sample % 64)) & 1 == 1
    }

    /// Full signature of one sample, in hyperplane order.
    pub fn signature(&self, sample: usize) -> Vec<bool> {
        (0..self.num_hashes).map(|h| self.bit(h, sample)).collect()
    }

    /// Number of signature positions where two samples differ.
    pub fn hamming_distance(&self, x: usize, y: usize) -> usize {
        (0..self.num_hashes)
            .filter(|&h| self.bit(h, x) != self.bit(h, y))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::error::ErrorKind;
    use crate::hash::hyperplane::{HyperplaneFamily, Partition};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn store(num_samples: usize, seed: u64) -> (Dataset, HashStore) {
        let mut rng = StdRng::seed_from_u64(seed);
        let ds = Dataset::from_samples(
            3,
            (0..num_samples).map(|i| {
                let t = i as f32 * 0.37;
                (format!("s{i:03}"), vec![t.cos(), t.sin(), (2.0 * t).cos()])
            }),
        )
        .unwrap();
        let family = HyperplaneFamily::generate(3, 20, &mut rng).unwrap();
        let store = HashStore::build(family, &ds).unwrap();
        (ds, store)
    }

    #[test]
    fn test_bits_follow_partitions() {
        // More than 64 samples so rows span several words.
        let (_, store) = store(150, 11);
        let m = BitSignatureMatrix::build(&store).unwrap();
        assert_eq!(m.num_hashes(), 20);
        assert_eq!(m.num_samples(), 150);
        for (h, p) in store.partitions().iter().enumerate() {
            for s in 0..150 {
                assert_eq!(m.bit(h, s), p.plus().contains(&s));
            }
        }
    }

    #[test]
    fn test_signature_and_hamming() {
        let (_, store) = store(10, 5);
        let m = BitSignatureMatrix::build(&store).unwrap();
        let sig = m.signature(3);
        assert_eq!(sig.len(), 20);
        assert_eq!(m.hamming_distance(3, 3), 0);
        let manual = m
            .signature(3)
            .iter()
            .zip(m.signature(7).iter())
            .filter(|(a, b)| a != b)
            .count();
        assert_eq!(m.hamming_distance(3, 7), manual);
    }

    #[test]
    fn test_missing_sample_is_internal_error() {
        let (ds, store) = store(4, 1);
        let mut broken = store.clone();
        let mut p: Partition = broken.partitions()[0].clone();
        p.plus.remove(&2);
        p.minus.remove(&2);
        broken.replace_partition(0, p);
        let err = BitSignatureMatrix::build(&broken).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalInvariant);
        assert_eq!(ds.len(), 4);
    }
}
