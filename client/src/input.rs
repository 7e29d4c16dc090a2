//! Raw mouse and keyboard sampling with edge detection

use macroquad::prelude::*;

/// Input edges observed during one frame, in window coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp,
    Char(char),
    Backspace,
    Enter,
    Tab,
}

pub struct InputManager {
    last_mouse: (f32, f32),

    // Previous frame button state for edge detection
    prev_left_down: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            last_mouse: (0.0, 0.0),
            prev_left_down: false,
        }
    }

    /// Samples this frame's input and returns the edges in the order they apply.
    pub fn update(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();

        let (x, y) = mouse_position();
        let left_down = is_mouse_button_down(MouseButton::Left);
        let moved = (x, y) != self.last_mouse;

        if left_down && !self.prev_left_down {
            events.push(InputEvent::PointerDown { x, y });
        } else if left_down && moved {
            events.push(InputEvent::PointerMove { x, y });
        }
        if !left_down && self.prev_left_down {
            events.push(InputEvent::PointerUp);
        }

        self.prev_left_down = left_down;
        self.last_mouse = (x, y);

        while let Some(c) = get_char_pressed() {
            // Enter, backspace and tab also surface as chars on some platforms.
            if !c.is_control() {
                events.push(InputEvent::Char(c));
            }
        }

        if is_key_pressed(KeyCode::Backspace) {
            events.push(InputEvent::Backspace);
        }
        if is_key_pressed(KeyCode::Enter) || is_key_pressed(KeyCode::KpEnter) {
            events.push(InputEvent::Enter);
        }
        if is_key_pressed(KeyCode::Tab) {
            events.push(InputEvent::Tab);
        }

        events
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}
