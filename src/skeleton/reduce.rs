use std::fmt;

use rayon::prelude::*;

use crate::config::Strategy;
use crate::{ConfigError, FractalError, HookError, StateError};

/// One member of a [`FlatReduce`] collection.
pub trait Member: Default + Send + Sync {
    /// Value every member grows from
    type Seed: Sync;

    /// Grow the member at `position` from the shared seed.
    fn grow(&mut self, seed: &Self::Seed, position: usize) -> Result<(), HookError>;
}

/// Fixed-width collection reduced in one step
pub struct FlatReduce<M: Member> {
    members: Vec<M>,
    strategy: Strategy,
}

impl<M: Member> FlatReduce<M> {
    /// Create an empty collection
    pub fn new(strategy: Strategy) -> Self {
        Self {
            members: Vec::new(),
            strategy,
        }
    }

    /// Grow `width` members from `seed`.
    pub fn grow(&mut self, width: usize, seed: M::Seed) -> Result<&mut Self, FractalError> {
        if width == 0 {
            return Err(ConfigError::ZeroWidth.into());
        }
        self.members.clear();

        let sprout = |position: usize| -> Result<M, HookError> {
            let mut member = M::default();
            member.grow(&seed, position)?;
            Ok(member)
        };
        let members = match self.strategy {
            Strategy::Parallel => (0..width)
                .into_par_iter()
                .map(sprout)
                .collect::<Result<Vec<M>, HookError>>(),
            Strategy::Sequential => (0..width).map(sprout).collect::<Result<Vec<M>, HookError>>(),
        }
        .map_err(FractalError::Hook)?;

        self.members = members;
        tracing::debug!(width, strategy = %self.strategy, "flat reduce grown");
        Ok(self)
    }

    /// Drop members from the back until `width` remain.
    pub fn shrink(&mut self, width: usize) -> Result<(), FractalError> {
        if width > self.members.len() {
            return Err(StateError::ShrinkBeyondWidth {
                width: self.members.len(),
                requested: width,
            }
            .into());
        }
        self.members.truncate(width);
        Ok(())
    }

    /// Set injected data on every member, in position order.
    pub fn inject<F>(&mut self, mut func: F) -> Result<(), FractalError>
    where
        F: FnMut(usize, &mut M),
    {
        if self.members.is_empty() {
            return Err(StateError::NotGrown.into());
        }
        for (position, member) in self.members.iter_mut().enumerate() {
            func(position, member);
        }
        Ok(())
    }

    /// Map every member, then combine the results in position order.
    pub fn compute<R, F, C>(&self, map: F, combine: C) -> Result<R, FractalError>
    where
        R: Send,
        F: Fn(usize, &M) -> Result<R, HookError> + Sync + Send,
        C: FnOnce(&[R]) -> Result<R, HookError>,
    {
        if self.members.is_empty() {
            return Err(StateError::NotGrown.into());
        }

        let mapped = match self.strategy {
            Strategy::Parallel => self
                .members
                .par_iter()
                .enumerate()
                .map(|(position, member)| map(position, member))
                .collect::<Result<Vec<R>, HookError>>(),
            Strategy::Sequential => self
                .members
                .iter()
                .enumerate()
                .map(|(position, member)| map(position, member))
                .collect::<Result<Vec<R>, HookError>>(),
        }
        .map_err(FractalError::Hook)?;

        combine(&mapped).map_err(FractalError::Hook)
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in position order
    pub fn members(&self) -> &[M] {
        &self.members
    }
}

impl<M: Member> fmt::Debug for FlatReduce<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatReduce")
            .field("width", &self.members.len())
            .field("strategy", &self.strategy)
            .finish()
    }
}
