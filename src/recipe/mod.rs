//! Recipe pipeline stages that run after the model has answered
//!
//! Model text goes through [`normalize`] (with the [`repair`] ladder), then
//! [`coerce`] into a typed recipe, then the [`duplicate`] guard. When no JSON
//! can be recovered at all, [`fallback`] builds a recipe offline.

pub mod catalog;
pub mod coerce;
pub mod duplicate;
pub mod fallback;
pub mod normalize;
pub mod repair;

pub use coerce::{to_named_dish_recipe, to_recipe};
pub use duplicate::{DuplicateGuard, DuplicateThresholds};
pub use fallback::fallback_recipe;
pub use normalize::{extract_json, recover_json, RepairError};
