use std::fmt;

use crate::{ConfigError, FractalError, HookError, StateError};

/// One element of a [`LinearFold`] chain.
pub trait Link: Default {
    /// Value threaded from each link to the next during growth
    type Seed;

    /// Grow from the incoming seed and return the seed for the next link.
    fn grow(&mut self, seed: Self::Seed, position: usize) -> Result<Self::Seed, HookError>;
}

/// Ordered chain of links
///
/// Growth runs front-to-back, compute runs back-to-front: the last link sees
/// the initial carry, the first link produces the result.
pub struct LinearFold<L: Link> {
    links: Vec<L>,
}

impl<L: Link> LinearFold<L> {
    /// Create an empty chain
    pub fn new() -> Self {
        Self { links: Vec::new() }
    }

    /// Build `width` links, threading `seed` through them in order.
    pub fn grow(&mut self, width: usize, seed: L::Seed) -> Result<&mut Self, FractalError> {
        if width == 0 {
            return Err(ConfigError::ZeroWidth.into());
        }
        self.links.clear();

        let mut links = Vec::with_capacity(width);
        let mut carry = seed;
        for position in 0..width {
            let mut link = L::default();
            carry = link.grow(carry, position).map_err(FractalError::Hook)?;
            links.push(link);
        }

        self.links = links;
        tracing::debug!(width, "linear fold grown");
        Ok(self)
    }

    /// Drop links from the back until `width` remain.
    pub fn shrink(&mut self, width: usize) -> Result<(), FractalError> {
        if width > self.links.len() {
            return Err(StateError::ShrinkBeyondWidth {
                width: self.links.len(),
                requested: width,
            }
            .into());
        }
        self.links.truncate(width);
        Ok(())
    }

    /// Set injected data on every link, front-to-back.
    pub fn inject<F>(&mut self, mut func: F) -> Result<(), FractalError>
    where
        F: FnMut(usize, &mut L),
    {
        if self.links.is_empty() {
            return Err(StateError::NotGrown.into());
        }
        for (position, link) in self.links.iter_mut().enumerate() {
            func(position, link);
        }
        Ok(())
    }

    /// Fold `func` from the last link to the first, starting from `init`.
    pub fn compute<R, F>(&self, init: R, func: F) -> Result<R, FractalError>
    where
        F: Fn(&L, R) -> Result<R, HookError>,
    {
        if self.links.is_empty() {
            return Err(StateError::NotGrown.into());
        }
        self.links
            .iter()
            .rev()
            .try_fold(init, |carry, link| func(link, carry))
            .map_err(FractalError::Hook)
    }

    /// Number of links
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether the chain is empty
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Links in chain order
    pub fn links(&self) -> &[L] {
        &self.links
    }
}

impl<L: Link> fmt::Debug for LinearFold<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinearFold")
            .field("width", &self.links.len())
            .finish()
    }
}
