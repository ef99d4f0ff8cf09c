//! Random-hyperplane LSH with banding.
//!
//! This module turns dense vectors into bucket memberships. The core idea:
//! **design hash functions where similar items collide more often than
//! dissimilar ones**.
//!
//! ## Pipeline
//!
//! ```text
//! HyperplaneFamily ──► HashStore ──► BitSignatureMatrix ──► BandIndex
//!   r*b unit normals    plus/minus      [hash][sample] bits    band-tagged buckets
//! ```
//!
//! ## Random Hyperplanes: Angular Similarity
//!
//! **Key insight** (Charikar 2002): Project vectors onto random hyperplanes
//! through the origin. Similar vectors land on the same side more often.
//!
//! ```text
//! P[sign(h·a) = sign(h·b)] = 1 - θ(a,b)/π
//! ```
//!
//! With `θ` in degrees this is the `p = (180 - d)/180` used by
//! [`LshParams`](crate::LshParams) to reason about `r` and `b`.
//!
//! ## Amplification with bands
//!
//! Divide the `r*b`-bit signature into `b` bands of `r` rows. Two samples
//! collide if *any* band matches exactly:
//!
//! ```text
//! P = 1 - (1 - p^r)^b
//! ```
//!
//! The AND-OR relation is not transitive: `x ~ y` and `y ~ z` do not imply
//! `x ~ z`. Clustering on top of it is best-effort (see [`crate::cluster`]).
//!
//! ```rust
//! use kinship::hash::{BandIndex, BitSignatureMatrix, HashStore, HyperplaneFamily};
//! use kinship::Dataset;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let ds = Dataset::from_samples(2, [("a", vec![1.0, 0.0]), ("b", vec![0.9, 0.1])]).unwrap();
//! let family = HyperplaneFamily::generate(2, 2 * 4, &mut StdRng::seed_from_u64(42)).unwrap();
//! let store = HashStore::build(family, &ds).unwrap();
//! let matrix = BitSignatureMatrix::build(&store).unwrap();
//! let index = BandIndex::build(&matrix, 2, 4).unwrap();
//! assert_eq!(index.num_bands(), 4);
//! ```
//!
//! ## References
//!
//! - Charikar (2002). "Similarity estimation techniques from rounding algorithms."
//! - Indyk & Motwani (1998). "Approximate nearest neighbors: towards removing
//!   the curse of dimensionality." (LSH theory)
//! - Leskovec, Rajaraman & Ullman. "Mining of Massive Datasets", ch. 3 (banding)

pub mod band;
pub mod hyperplane;
pub mod signature;

pub use band::{BandBits, BandIndex, BandKey};
pub use hyperplane::{HashStore, Hyperplane, HyperplaneFamily, Partition, Side};
pub use signature::BitSignatureMatrix;
