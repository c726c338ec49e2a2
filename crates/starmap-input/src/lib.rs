//! Pointer input for the starmap viewer: mouse tracking and the orbit controls
//! that take over the camera once the user interacts.

pub mod controls;
pub mod mouse;

pub use controls::{OrbitControls, OrbitLimits};
pub use mouse::{MouseState, PointerDown};
