pub(crate) mod composer;
pub(crate) mod pipeline;
pub(crate) mod sink;
