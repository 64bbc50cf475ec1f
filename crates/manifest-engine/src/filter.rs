//! Resource filters
//!
//! A filter sees the whole decoded batch before anything is sent to the cluster.
//! Rejecting the batch therefore has no side effects.

use crate::error::EngineError;
use crate::object::GenericResourceObject;

/// Narrows or rejects a batch of decoded objects
pub trait ResourceFilter: Send + Sync {
    /// Return the objects to process, in their original order, or reject the batch
    fn select(&self, candidates: Vec<GenericResourceObject>) -> Result<Vec<GenericResourceObject>, EngineError>;
}

/// Keep only objects of one kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindFilter {
    kind: String,
}

impl KindFilter {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }
}

impl ResourceFilter for KindFilter {
    fn select(&self, candidates: Vec<GenericResourceObject>) -> Result<Vec<GenericResourceObject>, EngineError> {
        Ok(candidates
            .into_iter()
            .filter(|object| object.kind == self.kind)
            .collect())
    }
}

/// Require the batch to be exactly one object of one kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactlyOneOfKind {
    kind: String,
}

impl ExactlyOneOfKind {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }
}

impl ResourceFilter for ExactlyOneOfKind {
    fn select(&self, candidates: Vec<GenericResourceObject>) -> Result<Vec<GenericResourceObject>, EngineError> {
        match candidates.as_slice() {
            [only] if only.kind == self.kind => Ok(candidates),
            [only] => Err(EngineError::FilterRejected(format!(
                "expected a {}, got {}",
                self.kind,
                only.describe()
            ))),
            _ => Err(EngineError::FilterRejected(format!(
                "expected exactly one {}, got {} objects",
                self.kind,
                candidates.len()
            ))),
        }
    }
}

impl<F> ResourceFilter for F
where
    F: Fn(Vec<GenericResourceObject>) -> Result<Vec<GenericResourceObject>, EngineError> + Send + Sync,
{
    fn select(&self, candidates: Vec<GenericResourceObject>) -> Result<Vec<GenericResourceObject>, EngineError> {
        self(candidates)
    }
}
