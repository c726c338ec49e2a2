//! Starmap viewer application: window, event handling and the frame loop.

pub mod frame_driver;
pub mod redraw;
pub mod render_context;
pub mod window;

pub use frame_driver::{DriverState, FrameDriver, orbit_position};
pub use redraw::{RedrawQueue, RedrawReason};
pub use render_context::{FrameOutcome, RenderContext};
pub use window::{App, AppEvent, run};
