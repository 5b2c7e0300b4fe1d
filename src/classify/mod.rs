//! Shot classification.
//!
//! Pure row functions: lie codes map to shot types and refined surfaces,
//! end codes map to outcome direction and location. Both are total, unknown
//! codes never produce an error.

mod end_location;
mod shot_type;

pub use end_location::{classify_end_location, direction_of, location_of};
pub use shot_type::{Lie, ShotTypeClassifier};

use crate::models::ShotType;

/// An approach that left more than `advanced_pct` of its start distance.
pub fn is_advanced(shot_type: ShotType, start_distance: u32, distance_left: u32, advanced_pct: f64) -> bool {
    shot_type == ShotType::App && f64::from(distance_left) > advanced_pct * f64::from(start_distance)
}

/// A tee shot that went nowhere and was replayed.
pub fn is_re_tee(shot_type: ShotType, start_distance: u32, distance_left: u32) -> bool {
    shot_type == ShotType::Tee && start_distance == distance_left
}

/// The ball was moved between shots (drop), judged against the previous distance left.
pub fn is_drop(start_distance: u32, prev_distance_left: u32) -> bool {
    prev_distance_left != 0 && start_distance != prev_distance_left
}
