//! Variable ordering: the map from keys to column blocks of the linear system.
//!
//! Keys occupy consecutive column ranges in insertion order. The offset of a key is the
//! sum of the tangent dimensions of all keys before it.

use crate::core::key::Key;
use crate::error::{ApexError, ApexResult};
use std::collections::HashMap;

/// Ordered, duplicate-free sequence of keys with their tangent dimensions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ordering {
    keys: Vec<Key>,
    dims: Vec<usize>,
    offsets: Vec<usize>,
    positions: HashMap<Key, usize>,
    total_dimension: usize,
}

impl Ordering {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(key, dim)` pairs, rejecting repeated keys.
    pub fn from_keys<I>(entries: I) -> ApexResult<Self>
    where
        I: IntoIterator<Item = (Key, usize)>,
    {
        let mut ordering = Self::new();
        for (key, dim) in entries {
            ordering.push(key, dim)?;
        }
        Ok(ordering)
    }

    /// Build an ordering from entries whose keys are already known to be distinct.
    pub(crate) fn from_unique_keys<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Key, usize)>,
    {
        let mut ordering = Self::new();
        for (key, dim) in entries {
            ordering.append(key, dim);
        }
        ordering
    }

    /// Append `key` at the end, occupying `dim` columns.
    pub fn push(&mut self, key: Key, dim: usize) -> ApexResult<()> {
        if self.positions.contains_key(&key) {
            return Err(ApexError::DuplicateVariable {
                key,
                container: "ordering",
            });
        }
        self.append(key, dim);
        Ok(())
    }

    fn append(&mut self, key: Key, dim: usize) {
        self.positions.insert(key, self.keys.len());
        self.keys.push(key);
        self.dims.push(dim);
        self.offsets.push(self.total_dimension);
        self.total_dimension += dim;
    }

    /// Position of `key` in the ordering.
    pub fn index_of(&self, key: Key) -> ApexResult<usize> {
        self.positions
            .get(&key)
            .copied()
            .ok_or(ApexError::UnknownVariable {
                key,
                container: "ordering",
            })
    }

    /// First column of `key` in the stacked tangent vector.
    pub fn offset_of(&self, key: Key) -> ApexResult<usize> {
        Ok(self.offsets[self.index_of(key)?])
    }

    pub fn dim_of(&self, key: Key) -> ApexResult<usize> {
        Ok(self.dims[self.index_of(key)?])
    }

    /// Tangent dimension of the variable at block `index`.
    pub fn dim_at(&self, index: usize) -> Option<usize> {
        self.dims.get(index).copied()
    }

    pub fn key_at(&self, index: usize) -> Option<Key> {
        self.keys.get(index).copied()
    }

    pub fn contains(&self, key: Key) -> bool {
        self.positions.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Sum of all tangent dimensions.
    pub fn total_dimension(&self) -> usize {
        self.total_dimension
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// `(key, offset, dim)` in column order.
    pub fn iter(&self) -> impl Iterator<Item = (Key, usize, usize)> + '_ {
        self.keys
            .iter()
            .zip(self.offsets.iter().zip(self.dims.iter()))
            .map(|(&key, (&offset, &dim))| (key, offset, dim))
    }
}
