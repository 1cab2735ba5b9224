//! Geometric amplification and compositing of noise layers.
//!
//! A frame is produced as: reduced-resolution noise -> [`tile::tile`] -> [`scale::scale`] ->
//! [`blend::composite`] over the [`gradient::build_gradient`] background.

pub(crate) mod blend;
pub(crate) mod gradient;
pub(crate) mod scale;
pub(crate) mod tile;
