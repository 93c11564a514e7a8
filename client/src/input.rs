use glam::Vec2;
use std::collections::HashSet;
use winit::keyboard::KeyCode;

pub struct InputState {
    pressed_keys: HashSet<KeyCode>,
    mouse_delta: (f32, f32),
    pub cursor_grabbed: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            pressed_keys: HashSet::new(),
            mouse_delta: (0.0, 0.0),
            cursor_grabbed: false,
        }
    }

    pub fn handle_key_press(&mut self, key: KeyCode) {
        self.pressed_keys.insert(key);
    }

    pub fn handle_key_release(&mut self, key: KeyCode) {
        self.pressed_keys.remove(&key);
    }

    /// Drops every held key, e.g. when the window loses focus and the
    /// matching release events will never arrive.
    pub fn release_all(&mut self) {
        self.pressed_keys.clear();
    }

    pub fn handle_mouse_move(&mut self, dx: f32, dy: f32) {
        self.mouse_delta.0 += dx;
        self.mouse_delta.1 += dy;
    }

    pub fn consume_mouse_delta(&mut self) -> (f32, f32) {
        let delta = self.mouse_delta;
        self.mouse_delta = (0.0, 0.0);
        delta
    }

    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// Raw movement intent: x is strafe (right positive), y is forward.
    /// Opposite keys cancel out. Not normalized.
    pub fn move_axes(&self) -> Vec2 {
        let mut axes = Vec2::ZERO;
        if self.is_pressed(KeyCode::KeyW) || self.is_pressed(KeyCode::ArrowUp) {
            axes.y += 1.0;
        }
        if self.is_pressed(KeyCode::KeyS) || self.is_pressed(KeyCode::ArrowDown) {
            axes.y -= 1.0;
        }
        if self.is_pressed(KeyCode::KeyD) || self.is_pressed(KeyCode::ArrowRight) {
            axes.x += 1.0;
        }
        if self.is_pressed(KeyCode::KeyA) || self.is_pressed(KeyCode::ArrowLeft) {
            axes.x -= 1.0;
        }
        axes
    }

    pub fn jump_held(&self) -> bool {
        self.is_pressed(KeyCode::Space)
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_keys_cancel() {
        let mut input = InputState::new();
        input.handle_key_press(KeyCode::KeyW);
        input.handle_key_press(KeyCode::KeyS);
        input.handle_key_press(KeyCode::KeyD);
        assert_eq!(input.move_axes(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn arrows_mirror_wasd() {
        let mut input = InputState::new();
        input.handle_key_press(KeyCode::ArrowUp);
        input.handle_key_press(KeyCode::ArrowLeft);
        assert_eq!(input.move_axes(), Vec2::new(-1.0, 1.0));
        input.handle_key_release(KeyCode::ArrowUp);
        assert_eq!(input.move_axes(), Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn mouse_delta_accumulates_until_consumed() {
        let mut input = InputState::new();
        input.handle_mouse_move(3.0, -1.0);
        input.handle_mouse_move(2.0, 4.0);
        assert_eq!(input.consume_mouse_delta(), (5.0, 3.0));
        assert_eq!(input.consume_mouse_delta(), (0.0, 0.0));
    }

    #[test]
    fn release_all_clears_jump() {
        let mut input = InputState::new();
        input.handle_key_press(KeyCode::Space);
        assert!(input.jump_held());
        input.release_all();
        assert!(!input.jump_held());
    }
}
