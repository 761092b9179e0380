//! Flat skeletons sharing the tree's `grow / inject / compute` API
//!
//! - [`LinearFold`]: ordered chain, seed threaded front-to-back, result
//!   folded back-to-front
//! - [`FlatReduce`]: fixed-width collection, every member mapped (in
//!   parallel when asked) and the ordered results combined once

mod fold;
mod reduce;

pub use fold::{LinearFold, Link};
pub use reduce::{FlatReduce, Member};
