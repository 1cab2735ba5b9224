pub(crate) mod cancel;
pub(crate) mod generation;
pub(crate) mod plan;
pub(crate) mod progress;
