use std::time::Duration;
use web_time::Instant;

const FPS_WINDOW: Duration = Duration::from_secs(1);

/// Counts frames and reports the average rate once per window.
pub struct FpsCounter {
    frames: u32,
    window_start: Instant,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        Self {
            frames: 0,
            window_start: now,
        }
    }

    /// Records a frame. Returns the frame rate when a full window has
    /// elapsed, then starts a new window.
    pub fn tick(&mut self, now: Instant) -> Option<u32> {
        self.frames += 1;
        let elapsed = now.duration_since(self.window_start);
        if elapsed < FPS_WINDOW {
            return None;
        }
        let fps = (self.frames as f32 / elapsed.as_secs_f32()).round() as u32;
        self.frames = 0;
        self.window_start = now;
        Some(fps)
    }
}

pub struct Hud {
    fps: FpsCounter,
    shown_score: Option<u32>,
}

impl Hud {
    pub fn new() -> Self {
        Self {
            fps: FpsCounter::new(Instant::now()),
            shown_score: None,
        }
    }

    pub fn update(&mut self, score: u32) {
        if let Some(fps) = self.fps.tick(Instant::now()) {
            show_fps(fps);
        }
        if self.shown_score != Some(score) {
            show_score(score);
            self.shown_score = Some(score);
        }
    }
}

impl Default for Hud {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[cfg(target_arch = "wasm32")]
fn doc() -> Option<web_sys::Document> {
    web_sys::window().and_then(|w| w.document())
}

#[cfg(target_arch = "wasm32")]
fn set_text(id: &str, text: &str) {
    if let Some(el) = doc().and_then(|d| d.get_element_by_id(id)) {
        el.set_text_content(Some(text));
    }
}

#[cfg(target_arch = "wasm32")]
fn show_fps(fps: u32) {
    set_text("fps-counter", &format!("FPS: {fps}"));
}

#[cfg(target_arch = "wasm32")]
fn show_score(score: u32) {
    set_text("coin-counter", &format!("Coins: {score}"));
}

#[cfg(not(target_arch = "wasm32"))]
fn show_fps(fps: u32) {
    log::info!("FPS: {fps}");
}

#[cfg(not(target_arch = "wasm32"))]
fn show_score(score: u32) {
    log::info!("Coins: {score}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_once_per_second() {
        let start = Instant::now();
        let mut counter = FpsCounter::new(start);
        for i in 1..60 {
            assert_eq!(counter.tick(start + Duration::from_millis(i * 16)), None);
        }
        assert_eq!(counter.tick(start + Duration::from_secs(1)), Some(60));
        // The next window starts empty.
        assert_eq!(counter.tick(start + Duration::from_millis(1500)), None);
    }

    #[test]
    fn slow_frames_report_fractional_rates_rounded() {
        let start = Instant::now();
        let mut counter = FpsCounter::new(start);
        assert_eq!(counter.tick(start + Duration::from_millis(400)), None);
        assert_eq!(counter.tick(start + Duration::from_millis(800)), None);
        assert_eq!(counter.tick(start + Duration::from_millis(1100)), Some(3));
    }
}
