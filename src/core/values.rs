//! Value store: the current estimate of every variable, keyed by [`Key`].
//!
//! Entries keep their insertion order for iteration; [`Values::ordering_arbitrary`]
//! ignores it and enumerates keys in ascending order, so the derived ordering depends only
//! on the key set.

use crate::core::key::Key;
use crate::core::ordering::Ordering;
use crate::core::variable::Value;
use crate::error::{ApexError, ApexResult};
use nalgebra::DVector;
use std::collections::HashMap;
use tracing::warn;

/// What `insert` does when the key is already present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fail with `DuplicateVariable`
    #[default]
    Reject,
    /// Replace the stored value
    Overwrite,
}

/// Configuration of a [`Values`] store, fixed for its lifetime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValuesConfig {
    pub duplicate_policy: DuplicatePolicy,
}

impl ValuesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values {
    entries: Vec<(Key, Value)>,
    index: HashMap<Key, usize>,
    config: ValuesConfig,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValuesConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ValuesConfig {
        &self.config
    }

    /// Insert a new variable. Behaviour on an existing key follows the store's
    /// [`DuplicatePolicy`].
    pub fn insert(&mut self, key: Key, value: impl Into<Value>) -> ApexResult<()> {
        let value = value.into();
        match self.index.get(&key) {
            Some(&slot) => match self.config.duplicate_policy {
                DuplicatePolicy::Reject => Err(ApexError::DuplicateVariable {
                    key,
                    container: "values",
                }),
                DuplicatePolicy::Overwrite => {
                    warn!("Overwriting value of {key}");
                    self.entries[slot].1 = value;
                    Ok(())
                }
            },
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((key, value));
                Ok(())
            }
        }
    }

    /// Replace the value of an existing variable.
    pub fn update(&mut self, key: Key, value: impl Into<Value>) -> ApexResult<()> {
        let slot = self.slot(key)?;
        self.entries[slot].1 = value.into();
        Ok(())
    }

    fn slot(&self, key: Key) -> ApexResult<usize> {
        self.index
            .get(&key)
            .copied()
            .ok_or(ApexError::UnknownVariable {
                key,
                container: "values",
            })
    }

    /// Value of `key`, or `UnknownVariable`.
    pub fn at(&self, key: Key) -> ApexResult<&Value> {
        Ok(&self.entries[self.slot(key)?].1)
    }

    pub fn get(&self, key: Key) -> Option<&Value> {
        self.index.get(&key).map(|&slot| &self.entries[slot].1)
    }

    pub fn contains(&self, key: Key) -> bool {
        self.index.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    /// `(key, value)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Key, &Value)> + '_ {
        self.entries.iter().map(|(key, value)| (*key, value))
    }

    /// Total tangent dimension of all variables.
    pub fn dim(&self) -> usize {
        self.entries.iter().map(|(_, value)| value.dim()).sum()
    }

    /// Ordering of every key in ascending key order.
    pub fn ordering_arbitrary(&self) -> Ordering {
        let mut keyed: Vec<(Key, usize)> = self
            .entries
            .iter()
            .map(|(key, value)| (*key, value.dim()))
            .collect();
        keyed.sort_unstable_by_key(|(key, _)| *key);
        Ordering::from_unique_keys(keyed)
    }

    /// Ordering of `keys` in the given sequence, with dimensions taken from this store.
    pub fn ordering_for(&self, keys: &[Key]) -> ApexResult<Ordering> {
        let mut ordering = Ordering::new();
        for &key in keys {
            ordering.push(key, self.at(key)?.dim())?;
        }
        Ok(ordering)
    }

    /// Apply a stacked tangent step laid out by `ordering`.
    ///
    /// Every variable of the store must be in the ordering; variables of the ordering
    /// that are not stored are an error.
    pub fn retract(&self, delta: &DVector<f64>, ordering: &Ordering) -> ApexResult<Values> {
        if delta.len() != ordering.total_dimension() {
            return Err(ApexError::DimensionMismatch {
                context: "stacked tangent step".to_string(),
                expected: ordering.total_dimension(),
                actual: delta.len(),
            });
        }

        let mut result = self.clone();
        for (key, value) in result.entries.iter_mut() {
            let offset = ordering.offset_of(*key)?;
            let dim = ordering.dim_of(*key)?;
            let step = delta.rows(offset, dim).into_owned();
            *value = value.retract(&step)?;
        }
        for key in ordering.keys() {
            self.slot(*key)?;
        }
        Ok(result)
    }

    /// Stacked local coordinates of `other` around `self`; inverse of [`retract`](Self::retract).
    pub fn local_coordinates(&self, other: &Values, ordering: &Ordering) -> ApexResult<DVector<f64>> {
        let mut delta = DVector::zeros(ordering.total_dimension());
        for (key, offset, dim) in ordering.iter() {
            let local = self.at(key)?.local_coordinates(other.at(key)?)?;
            if local.len() != dim {
                return Err(ApexError::DimensionMismatch {
                    context: format!("local coordinates of {key}"),
                    expected: dim,
                    actual: local.len(),
                });
            }
            delta.rows_mut(offset, dim).copy_from(&local);
        }
        Ok(delta)
    }
}
