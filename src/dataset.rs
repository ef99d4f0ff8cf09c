//! Sample storage.
//!
//! A [`Dataset`] maps unique identifiers to fixed-dimension vectors. Samples
//! are kept sorted by identifier; that order is the canonical sample order
//! used by every downstream stage (signature columns, bucket contents,
//! similarity group order), so two builds over the same data see the samples
//! in the same sequence regardless of insertion order.

use std::collections::BTreeMap;
use std::io::BufRead;

use crate::error::{LshError, Result};

/// Identifier -> vector mapping with a uniform dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    dim: usize,
    samples: BTreeMap<String, Vec<f32>>,
}

impl Dataset {
    /// Create an empty dataset of the given dimension.
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(LshError::Configuration(
                "dim must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            dim,
            samples: BTreeMap::new(),
        })
    }

    /// Build a dataset from `(id, vector)` pairs.
    pub fn from_samples<I, S>(dim: usize, samples: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let mut ds = Self::new(dim)?;
        for (id, v) in samples {
            ds.insert(id, v)?;
        }
        Ok(ds)
    }

    /// Add one sample.
    ///
    /// Fails on a duplicate identifier, a wrong vector length, or a
    /// non-finite coordinate.
    pub fn insert(&mut self, id: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        let id = id.into();
        if vector.len() != self.dim {
            return Err(LshError::DimensionMismatch {
                id,
                expected: self.dim,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(LshError::DataIntegrity(format!(
                "sample {id:?} has a non-finite coordinate"
            )));
        }
        if self.samples.contains_key(&id) {
            return Err(LshError::DuplicateIdentifier(id));
        }
        self.samples.insert(id, vector);
        Ok(())
    }

    /// Add one sample from unparsed coordinate fields.
    pub fn insert_fields(&mut self, id: impl Into<String>, fields: &[&str]) -> Result<()> {
        let id = id.into();
        let mut vector = Vec::with_capacity(fields.len());
        for field in fields {
            let x: f32 = field
                .trim()
                .parse()
                .map_err(|_| LshError::NonNumericCoordinate {
                    id: id.clone(),
                    field: field.trim().to_string(),
                })?;
            vector.push(x);
        }
        self.insert(id, vector)
    }

    /// Read comma-delimited records of the form `id,x1,...,xdim`.
    ///
    /// Blank lines and lines starting with `#` are skipped. Surrounding
    /// double quotes are stripped from the identifier.
    pub fn from_reader<R: BufRead>(reader: R, dim: usize) -> Result<Self> {
        let mut ds = Self::new(dim)?;
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split(',');
            let id = parts.next().unwrap_or_default().trim().trim_matches('"');
            if id.is_empty() {
                return Err(LshError::DataIntegrity(format!(
                    "line {}: missing sample identifier",
                    lineno + 1
                )));
            }
            let fields: Vec<&str> = parts.collect();
            ds.insert_fields(id, &fields)?;
        }
        tracing::debug!(samples = ds.len(), dim, "loaded dataset");
        Ok(ds)
    }

    /// Vector dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Vector for an identifier.
    pub fn get(&self, id: &str) -> Option<&[f32]> {
        self.samples.get(id).map(Vec::as_slice)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.samples.contains_key(id)
    }

    /// Identifiers in canonical order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.samples.keys().map(String::as_str)
    }

    /// `(id, vector)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> + '_ {
        self.samples
            .iter()
            .map(|(id, v)| (id.as_str(), v.as_slice()))
    }

    /// Vectors in canonical order.
    pub fn vectors(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.samples.values().map(Vec::as_slice)
    }

    /// Canonical index of an identifier.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.samples.keys().position(|k| k == id)
    }

    /// Identifier at a canonical index.
    pub fn id_at(&self, index: usize) -> Option<&str> {
        self.samples.keys().nth(index).map(String::as_str)
    }

    /// Vector at a canonical index.
    pub fn vector_at(&self, index: usize) -> Option<&[f32]> {
        self.samples.values().nth(index).map(Vec::as_slice)
    }

    /// Vector for an identifier, or a data-integrity error naming it.
    pub(crate) fn require(&self, id: &str) -> Result<&[f32]> {
        self.get(id).ok_or_else(|| {
            LshError::DataIntegrity(format!("unknown sample identifier {id:?}"))
        })
    }
}
