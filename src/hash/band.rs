//! Banded AND-OR bucketing.
//!
//! The `r*b` signature bits are cut into `b` consecutive bands of `r` bits.
//! Within a band, a sample's `r` bits form its bucket key:
//!
//! - **AND**: two samples share a bucket in band `k` only if all `r` bits of
//!   band `k` agree. This suppresses false positives.
//! - **OR**: two samples are neighbors if they share a bucket in *any* band.
//!   This restores the recall lost to the AND step.
//!
//! Keys carry their band number, so equal bit patterns in different bands
//! never collide.
//!
//! ## Scaling caveat
//!
//! Neighborhood extraction costs the sum of squared bucket sizes. A single
//! giant bucket (e.g. `r` too small for the data) makes it quadratic in the
//! bucket size; [`BandIndex::collision_work`] reports that number.

use std::collections::BTreeMap;
use std::fmt;

use smallvec::{smallvec, SmallVec};

use crate::error::{LshError, Result};
use crate::hash::signature::BitSignatureMatrix;

/// Packed `r`-bit sub-signature, least significant bit first.
pub type BandBits = SmallVec<[u64; 2]>;

/// Band-tagged bucket key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BandKey {
    band: usize,
    width: usize,
    bits: BandBits,
}

impl BandKey {
    pub fn band(&self) -> usize {
        self.band
    }

    /// Number of bits (`r`).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Bit `i` of the sub-signature (`i < r`).
    pub fn bit(&self, i: usize) -> bool {
        i < self.width && (self.bits[i / 64] >> (i % 64)) & 1 == 1
    }

    pub fn bits(&self) -> &BandBits {
        &self.bits
    }
}

impl fmt::Display for BandKey {
    /// `band3 10110`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "band{} ", self.band)?;
        for i in 0..self.width {
            f.write_str(if self.bit(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Buckets of one band: sub-signature -> sample positions (ascending).
type BandBuckets = BTreeMap<BandBits, Vec<usize>>;

/// Bucket index over all bands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandIndex {
    r: usize,
    b: usize,
    num_samples: usize,
    /// `[band * num_samples + sample]`
    keys: Vec<BandBits>,
    buckets: Vec<BandBuckets>,
}

impl BandIndex {
    /// Bucket every sample in every band.
    ///
    /// Deterministic given the matrix.
    pub fn build(matrix: &BitSignatureMatrix, r: usize, b: usize) -> Result<Self> {
        if r == 0 || b == 0 {
            return Err(LshError::Configuration(format!(
                "r and b must be greater than 0 (r={r}, b={b})"
            )));
        }
        if r.checked_mul(b) != Some(matrix.num_hashes()) {
            return Err(LshError::Configuration(format!(
                "r * b = {} * {} does not match the {} hash functions of the signature matrix",
                r,
                b,
                matrix.num_hashes()
            )));
        }

        #[cfg(feature = "parallel")]
        let per_band: Vec<(Vec<BandBits>, BandBuckets)> = {
            use rayon::prelude::*;
            (0..b)
                .into_par_iter()
                .map(|band| build_band(matrix, band, r))
                .collect()
        };
        #[cfg(not(feature = "parallel"))]
        let per_band: Vec<(Vec<BandBits>, BandBuckets)> =
            (0..b).map(|band| build_band(matrix, band, r)).collect();

        let num_samples = matrix.num_samples();
        let mut keys = Vec::with_capacity(b * num_samples);
        let mut buckets = Vec::with_capacity(b);
        for (band_keys, band_buckets) in per_band {
            keys.extend(band_keys);
            buckets.push(band_buckets);
        }

        let index = Self {
            r,
            b,
            num_samples,
            keys,
            buckets,
        };
        tracing::debug!(
            bands = b,
            rows = r,
            buckets = index.num_buckets(),
            max_bucket = index.max_bucket_size(),
            "built band buckets"
        );
        Ok(index)
    }

    /// Rows per band (`r`).
    pub fn rows_per_band(&self) -> usize {
        self.r
    }

    /// Number of bands (`b`).
    pub fn num_bands(&self) -> usize {
        self.b
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Bucket key of `sample` in `band`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn key(&self, sample: usize, band: usize) -> BandKey {
        assert!(sample < self.num_samples && band < self.b);
        BandKey {
            band,
            width: self.r,
            bits: self.keys[band * self.num_samples + sample].clone(),
        }
    }

    /// Members of a bucket.
    pub fn bucket(&self, key: &BandKey) -> Option<&[usize]> {
        if key.width != self.r {
            return None;
        }
        self.buckets
            .get(key.band)
            .and_then(|m| m.get(&key.bits))
            .map(Vec::as_slice)
    }

    /// All buckets, ordered by band then sub-signature.
    pub fn buckets(&self) -> impl Iterator<Item = (BandKey, &[usize])> + '_ {
        let r = self.r;
        self.buckets.iter().enumerate().flat_map(move |(band, m)| {
            m.iter().map(move |(bits, members)| {
                (
                    BandKey {
                        band,
                        width: r,
                        bits: bits.clone(),
                    },
                    members.as_slice(),
                )
            })
        })
    }

    /// Member lists of all buckets, without materializing keys.
    pub(crate) fn bucket_members(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.buckets
            .iter()
            .flat_map(|m| m.values().map(Vec::as_slice))
    }

    /// Total number of non-empty buckets across bands.
    pub fn num_buckets(&self) -> usize {
        self.buckets.iter().map(BTreeMap::len).sum()
    }

    /// Member count of every bucket, in [`buckets`](Self::buckets) order.
    pub fn bucket_sizes(&self) -> Vec<usize> {
        self.bucket_members().map(<[usize]>::len).collect()
    }

    pub fn max_bucket_size(&self) -> usize {
        self.bucket_members().map(<[usize]>::len).max().unwrap_or(0)
    }

    /// Sum of squared bucket sizes: the cost of neighborhood extraction.
    pub fn collision_work(&self) -> usize {
        self.bucket_members().map(|m| m.len() * m.len()).sum()
    }

    /// Bands in which `x` and `y` have identical sub-signatures.
    ///
    /// # Panics
    ///
    /// Panics if either sample is out of range.
    pub fn colliding_bands(&self, x: usize, y: usize) -> impl Iterator<Item = usize> + '_ {
        assert!(x < self.num_samples && y < self.num_samples);
        let n = self.num_samples;
        (0..self.b).filter(move |&band| self.keys[band * n + x] == self.keys[band * n + y])
    }

    /// Whether `x` and `y` share a bucket in at least one band.
    ///
    /// # Panics
    ///
    /// Panics if either sample is out of range.
    pub fn share_bucket(&self, x: usize, y: usize) -> bool {
        self.colliding_bands(x, y).next().is_some()
    }

    /// Log every bucket at trace level (`band3 10110 => [...]`).
    pub fn trace_buckets(&self, ids: &[&str]) {
        if !tracing::enabled!(tracing::Level::TRACE) {
            return;
        }
        for (key, members) in self.buckets() {
            let names: Vec<&str> = members.iter().filter_map(|&s| ids.get(s).copied()).collect();
            tracing::trace!(bucket = %key, members = ?names, "band bucket");
        }
    }
}

fn band_bits(matrix: &BitSignatureMatrix, band: usize, r: usize, sample: usize) -> BandBits {
    let mut bits: BandBits = smallvec![0u64; r.div_ceil(64)];
    for i in 0..r {
        if matrix.bit(band * r + i, sample) {
            bits[i / 64] |= 1u64 << (i % 64);
        }
    }
    bits
}

fn build_band(matrix: &BitSignatureMatrix, band: usize, r: usize) -> (Vec<BandBits>, BandBuckets) {
    let mut keys = Vec::with_capacity(matrix.num_samples());
    let mut buckets = BandBuckets::new();
    for sample in 0..matrix.num_samples() {
        let bits = band_bits(matrix, band, r, sample);
        buckets.entry(bits.clone()).or_default().push(sample);
        keys.push(bits);
    }
    (keys, buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::error::ErrorKind;
    use crate::hash::hyperplane::{HashStore, HyperplaneFamily};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn matrix(hyperplanes: Vec<Vec<f32>>) -> BitSignatureMatrix {
        let ds = Dataset::from_samples(
            2,
            [
                ("a", vec![1.0, 0.0]),
                ("b", vec![0.99, 0.01]),
                ("c", vec![0.0, 1.0]),
                ("d", vec![0.01, 0.99]),
            ],
        )
        .unwrap();
        let family = HyperplaneFamily::from_vectors(2, hyperplanes).unwrap();
        let store = HashStore::build(family, &ds).unwrap();
        BitSignatureMatrix::build(&store).unwrap()
    }

    #[test]
    fn test_key_display() {
        // a: (1,0) -> +,-,+ ; band0 = [1,0], band1 = [1,0]
        let m = matrix(vec![
            vec![1.0, 0.0],
            vec![-1.0, 0.5],
            vec![1.0, -1.0],
            vec![-1.0, 0.2],
        ]);
        let index = BandIndex::build(&m, 2, 2).unwrap();
        assert_eq!(index.key(0, 0).to_string(), "band0 10");
        assert_eq!(index.key(0, 1).to_string(), "band1 10");
        assert_ne!(index.key(0, 0), index.key(0, 1));
    }

    #[test]
    fn test_buckets_partition_each_band() {
        let mut rng = StdRng::seed_from_u64(9);
        let ds = Dataset::from_samples(
            4,
            (0..40).map(|i| {
                let t = i as f32;
                (format!("x{i:02}"), vec![t.sin(), t.cos(), (t * 0.3).sin(), 1.0])
            }),
        )
        .unwrap();
        let family = HyperplaneFamily::generate(4, 3 * 5, &mut rng).unwrap();
        let store = HashStore::build(family, &ds).unwrap();
        let m = BitSignatureMatrix::build(&store).unwrap();
        let index = BandIndex::build(&m, 3, 5).unwrap();

        for band in 0..5 {
            let mut seen: Vec<usize> = index
                .buckets()
                .filter(|(k, _)| k.band() == band)
                .flat_map(|(_, members)| members.to_vec())
                .collect();
            seen.sort_unstable();
            assert_eq!(seen, (0..40).collect::<Vec<_>>());
        }
        for (key, members) in index.buckets() {
            for &s in members {
                assert_eq!(index.key(s, key.band()), key);
            }
            assert_eq!(index.bucket(&key), Some(members));
        }
        let sizes = index.bucket_sizes();
        assert_eq!(sizes.len(), index.num_buckets());
        assert_eq!(sizes.iter().sum::<usize>(), 40 * 5);
        assert_eq!(sizes.iter().copied().max(), Some(index.max_bucket_size()));
    }

    #[test]
    fn test_share_bucket() {
        let m = matrix(vec![
            vec![1.0, -1.0],
            vec![-1.0, 1.0],
            vec![2.0, -1.0],
            vec![-1.0, 3.0],
        ]);
        let index = BandIndex::build(&m, 1, 4).unwrap();
        assert!(index.share_bucket(0, 1));
        assert!(index.share_bucket(2, 3));
        assert!(!index.share_bucket(0, 2));
        assert_eq!(index.colliding_bands(0, 1).count(), 4);
        assert_eq!(index.max_bucket_size(), 2);
        assert_eq!(index.collision_work(), 8 * 4);
    }

    #[test]
    #[should_panic]
    fn test_share_bucket_rejects_unknown_sample() {
        // One band per hyperplane, everyone on the plus side: without a
        // bounds check, sample 4 would alias sample 0 in band 1.
        let m = matrix(vec![vec![1.0, 1.0], vec![1.0, 1.0]]);
        let index = BandIndex::build(&m, 1, 2).unwrap();
        assert_eq!(index.num_samples(), 4);
        let _ = index.share_bucket(0, 4);
    }

    #[test]
    fn test_shape_mismatch() {
        let m = matrix(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let err = BandIndex::build(&m, 3, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        let err = BandIndex::build(&m, 0, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
