//! Model point data structures and loading

mod data;
pub mod loader;

pub use data::{ModelPoint, Sex};
pub use loader::{load_model_points, load_model_points_from_reader};
