//! Pointer-to-splat translation.
//!
//! Owns all interaction state; the runner feeds it raw window events and the
//! app drains one [`Interaction`] per frame. Window pixels have their origin
//! top-left while the fluid domain's origin is bottom-left, so y is flipped
//! both for positions and drag deltas.

/// Normalized pointer deltas are multiplied by this before becoming splat
/// momentum, so a full-window drag injects a visible impulse.
pub const DRAG_FORCE_GAIN: f32 = 10.0;

/// One frame's worth of pointer interaction, in normalized [0,1] domain
/// coordinates with the origin bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub color: [f32; 3],
}

pub struct PointerTranslator {
    window_width: f32,
    window_height: f32,
    position: Option<(f32, f32)>,
    pressed: bool,
    drag_dx: f32,
    drag_dy: f32,
    time: f32,
}

impl PointerTranslator {
    pub fn new(window_width: u32, window_height: u32) -> Self {
        Self {
            window_width: window_width as f32,
            window_height: window_height as f32,
            position: None,
            pressed: false,
            drag_dx: 0.0,
            drag_dy: 0.0,
            time: 0.0,
        }
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_width = width.max(1) as f32;
        self.window_height = height.max(1) as f32;
    }

    pub fn on_move(&mut self, x: f32, y: f32) {
        if self.pressed {
            if let Some((px, py)) = self.position {
                self.drag_dx += x - px;
                self.drag_dy += y - py;
            }
        }
        self.position = Some((x, y));
    }

    pub fn on_button(&mut self, pressed: bool) {
        self.pressed = pressed;
        // A fresh press starts a new drag; leftovers from the previous one
        // must not leak into the first frame.
        self.drag_dx = 0.0;
        self.drag_dy = 0.0;
    }

    pub fn advance(&mut self, dt: f32) {
        self.time += dt;
    }

    /// Drain the accumulated drag into one interaction. Returns `None`
    /// unless the pointer is held down inside the window.
    pub fn take_interaction(&mut self) -> Option<Interaction> {
        if !self.pressed {
            return None;
        }
        let (px, py) = self.position?;

        let dx = self.drag_dx / self.window_width * DRAG_FORCE_GAIN;
        let dy = -self.drag_dy / self.window_height * DRAG_FORCE_GAIN;
        self.drag_dx = 0.0;
        self.drag_dy = 0.0;

        Some(Interaction {
            x: px / self.window_width,
            y: 1.0 - py / self.window_height,
            dx,
            dy,
            color: self.dye_color(),
        })
    }

    /// Hue cycles with wall time so successive strokes differ visibly.
    fn dye_color(&self) -> [f32; 3] {
        let t = self.time;
        [
            (0.5 + 0.5 * (2.0 * t).sin()) * 0.8,
            (0.5 + 0.5 * (3.0 * t + 1.0).sin()) * 0.8,
            (0.5 + 0.5 * (4.0 * t + 2.0).sin()) * 0.8,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_interaction_while_released() {
        let mut input = PointerTranslator::new(800, 800);
        input.on_move(400.0, 400.0);
        assert!(input.take_interaction().is_none());
    }

    #[test]
    fn test_position_is_normalized_with_y_flip() {
        let mut input = PointerTranslator::new(800, 800);
        input.on_move(200.0, 600.0);
        input.on_button(true);
        let it = input.take_interaction().unwrap();
        assert!((it.x - 0.25).abs() < 1e-6);
        assert!((it.y - 0.25).abs() < 1e-6, "window y is top-down");
        assert_eq!(it.dx, 0.0);
        assert_eq!(it.dy, 0.0);
    }

    #[test]
    fn test_drag_delta_is_scaled_and_drained() {
        let mut input = PointerTranslator::new(800, 800);
        input.on_move(400.0, 400.0);
        input.on_button(true);
        input.on_move(480.0, 320.0);

        let it = input.take_interaction().unwrap();
        assert!((it.dx - 1.0).abs() < 1e-6, "80px right over 800px, gain 10");
        assert!((it.dy - 1.0).abs() < 1e-6, "80px up after the flip");

        let next = input.take_interaction().unwrap();
        assert_eq!(next.dx, 0.0, "delta drains once per frame");
        assert_eq!(next.dy, 0.0);
    }

    #[test]
    fn test_press_resets_stale_drag() {
        let mut input = PointerTranslator::new(800, 800);
        input.on_move(100.0, 100.0);
        input.on_button(true);
        input.on_move(300.0, 300.0);
        input.on_button(false);
        // Pointer travels while released, then presses again.
        input.on_move(700.0, 700.0);
        input.on_button(true);
        let it = input.take_interaction().unwrap();
        assert_eq!(it.dx, 0.0, "released motion must not leak into a new drag");
        assert_eq!(it.dy, 0.0);
    }

    #[test]
    fn test_dye_color_stays_in_display_range() {
        let mut input = PointerTranslator::new(800, 800);
        input.on_move(1.0, 1.0);
        input.on_button(true);
        for _ in 0..100 {
            input.advance(0.13);
            let it = input.take_interaction().unwrap();
            for c in it.color {
                assert!((0.0..=0.8).contains(&c));
            }
        }
    }
}
