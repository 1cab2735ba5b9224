//! Storage for one generated animation loop.

pub(crate) mod frame_set;
