//! Core data models for the strokes-gained engine.

mod ids;
mod model;
mod raw;
pub(crate) mod shot;
mod surface;

pub use ids::*;
pub use model::*;
pub use raw::*;
pub use shot::{HoleKey, ShotRecord};
pub use surface::*;
