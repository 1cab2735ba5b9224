//! Procedural noise synthesis.

pub(crate) mod synth;
