//! Customization interface of the skeleton.
//!
//! Users plug a growth rule in by implementing [`Element`] and a fold by
//! supplying a [`ComputeFunction`] (or any closure of the same shape). The
//! tree itself stays generic over both.

mod hooks;

pub use hooks::{ComputeFunction, Element};
