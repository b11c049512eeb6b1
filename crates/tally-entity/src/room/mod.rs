//! Room domain entities.

pub mod direction;
pub mod model;

pub use direction::Direction;
pub use model::Room;
