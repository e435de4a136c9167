//! Keyboard and mouse state tracking

use std::collections::HashSet;
use winit::event::ElementState;
pub use winit::keyboard::KeyCode;

/// Accumulated input state for one frame
#[derive(Debug)]
pub struct InputState {
    keys_pressed: HashSet<KeyCode>,
    mouse_delta: (f32, f32),
    cursor_locked: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            keys_pressed: HashSet::new(),
            mouse_delta: (0.0, 0.0),
            cursor_locked: true,
        }
    }

    pub fn process_key(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.keys_pressed.insert(key);
            }
            ElementState::Released => {
                self.keys_pressed.remove(&key);
            }
        }
    }

    pub fn process_mouse_motion(&mut self, delta: (f64, f64)) {
        self.mouse_delta.0 += delta.0 as f32;
        self.mouse_delta.1 += delta.1 as f32;
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Returns the accumulated pointer delta and resets it. While the
    /// cursor is unlocked the delta is discarded so the view does not jump
    /// when the window regains the pointer.
    pub fn take_mouse_delta(&mut self) -> (f32, f32) {
        let delta = self.mouse_delta;
        self.mouse_delta = (0.0, 0.0);
        if self.cursor_locked {
            delta
        } else {
            (0.0, 0.0)
        }
    }

    pub fn is_cursor_locked(&self) -> bool {
        self.cursor_locked
    }

    pub fn set_cursor_locked(&mut self, locked: bool) {
        self.cursor_locked = locked;
        self.mouse_delta = (0.0, 0.0);
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
