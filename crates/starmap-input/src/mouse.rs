//! Mouse state tracker.
//!
//! [`MouseState`] accumulates winit pointer events between renders. Drag and
//! wheel deltas are drained with [`take_drag`](MouseState::take_drag) and
//! [`take_scroll`](MouseState::take_scroll) when the orbit controls consume
//! them, so nothing is lost if several events arrive before the next frame.

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

/// Pixel deltas reported by touchpads are normalized to wheel lines at this rate.
pub const PIXELS_PER_LINE: f64 = 40.0;

/// A button press and where it happened, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerDown {
    pub button: MouseButton,
    pub position: Vec2,
}

/// Maps the buttons the viewer cares about to a slot. Other buttons are ignored.
fn button_index(button: MouseButton) -> Option<usize> {
    match button {
        MouseButton::Left => Some(0),
        MouseButton::Right => Some(1),
        MouseButton::Middle => Some(2),
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct MouseState {
    position: Vec2,
    drag: Vec2,
    pressed: [bool; 3],
    scroll: f32,
    cursor_in_window: bool,
}

impl MouseState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a `CursorMoved` event. Movement while the left button is held
    /// accumulates into the drag delta.
    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let new_pos = Vec2::new(x as f32, y as f32);
        if self.pressed[0] {
            self.drag += new_pos - self.position;
        }
        self.position = new_pos;
    }

    /// Process a `MouseInput` event. Returns the press when a tracked button
    /// goes down.
    pub fn on_button(&mut self, button: MouseButton, state: ElementState) -> Option<PointerDown> {
        let idx = button_index(button)?;
        match state {
            ElementState::Pressed => {
                self.pressed[idx] = true;
                Some(PointerDown {
                    button,
                    position: self.position,
                })
            }
            ElementState::Released => {
                self.pressed[idx] = false;
                None
            }
        }
    }

    /// Process a `MouseWheel` event. Positive is scrolling up (zoom in).
    pub fn on_scroll(&mut self, delta: MouseScrollDelta) {
        match delta {
            MouseScrollDelta::LineDelta(_x, y) => self.scroll += y,
            MouseScrollDelta::PixelDelta(pos) => self.scroll += (pos.y / PIXELS_PER_LINE) as f32,
        }
    }

    pub fn on_cursor_entered(&mut self) {
        self.cursor_in_window = true;
    }

    /// Leaving the window drops any held buttons; the release may never arrive.
    pub fn on_cursor_left(&mut self) {
        self.cursor_in_window = false;
        self.pressed = [false; 3];
    }

    /// Drain the accumulated drag delta.
    pub fn take_drag(&mut self) -> Vec2 {
        std::mem::take(&mut self.drag)
    }

    /// Drain the accumulated wheel lines.
    pub fn take_scroll(&mut self) -> f32 {
        std::mem::take(&mut self.scroll)
    }

    /// Current cursor position in physical pixels.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[must_use]
    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        button_index(button).is_some_and(|idx| self.pressed[idx])
    }

    #[must_use]
    pub fn is_cursor_in_window(&self) -> bool {
        self.cursor_in_window
    }
}
