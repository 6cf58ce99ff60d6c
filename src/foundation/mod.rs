//! Value types, error taxonomy and deterministic math shared by every stage.

pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod math;
