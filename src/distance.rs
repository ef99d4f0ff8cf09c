//! Dense vector arithmetic.
//!
//! Hyperplane hashing only needs the sign of a dot product, and the L2 merge
//! strategies need Euclidean distance and means. All functions here are
//! portable scalar loops so results are bit-identical between the
//! sequential and `parallel` builds.
//!
//! ## Important nuance
//!
//! [`dot`] accumulates left to right. Changing the summation order (e.g.
//! tree reduction) could flip the sign of a near-zero projection and move a
//! sample to the other half-space, so keep it sequential.

/// Dot product.
#[inline]
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// L2 norm of a vector.
#[inline]
#[must_use]
pub fn norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

/// L2 (Euclidean) distance.
///
/// If dimensions mismatch, this returns `f32::INFINITY` (so it is never selected as a
/// nearest centroid).
#[inline]
#[must_use]
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

/// Normalize a vector to unit L2 norm.
///
/// Returns `None` for (near-)zero vectors, which have no direction.
#[inline]
#[must_use]
pub fn normalize(v: &[f32]) -> Option<Vec<f32>> {
    let n = norm(v);
    if n.is_nan() || n < 1e-10 {
        return None;
    }
    Some(v.iter().map(|x| x / n).collect())
}

/// Coordinate-wise mean of a non-empty set of equal-length vectors.
pub fn mean<'a, I>(vectors: I, dim: usize) -> Option<Vec<f32>>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut sums = vec![0.0f64; dim];
    let mut count = 0usize;
    for v in vectors {
        for (s, &x) in sums.iter_mut().zip(v.iter()) {
            *s += x as f64;
        }
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(sums.into_iter().map(|s| (s / count as f64) as f32).collect())
}
