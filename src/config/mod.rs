//! Configuration snapshot, persisted key names and change events.

pub(crate) mod color;
pub(crate) mod settings;
