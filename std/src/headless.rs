use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;
use vm::Color;

use crate::graphics::Graphics;

/// One call received by [`HeadlessGraphics`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrawCall {
    InitWindow {
        width: i32,
        height: i32,
        title: String,
    },
    CloseWindow,
    SetTargetFps(i32),
    BeginDrawing,
    EndDrawing,
    ClearBackground(Color),
    DrawText {
        text: String,
        x: i32,
        y: i32,
        font_size: i32,
        color: Color,
    },
}

/// Shared view of the calls a headless backend has seen. Clone it before
/// attaching the backend to keep inspecting it afterwards.
#[derive(Clone, Debug, Default)]
pub struct Recording {
    calls: Rc<RefCell<Vec<DrawCall>>>,
}

impl Recording {
    pub fn calls(&self) -> Vec<DrawCall> {
        self.calls.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }

    pub fn last(&self) -> Option<DrawCall> {
        self.calls.borrow().last().cloned()
    }

    fn push(&self, call: DrawCall) {
        self.calls.borrow_mut().push(call);
    }
}

/// Graphics backend without a display.
///
/// Records every call, paces `end_drawing` to the target frame rate and can
/// ask the guest to close after a fixed number of frames.
#[derive(Debug, Default)]
pub struct HeadlessGraphics {
    recording: Recording,
    window: Option<(i32, i32)>,
    target_fps: i32,
    frames: u64,
    close_after: Option<u64>,
    last_frame: Option<Instant>,
}

impl HeadlessGraphics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `window_should_close` once `frames` frames have ended.
    pub fn close_after_frames(mut self, frames: u64) -> Self {
        self.close_after = Some(frames);
        self
    }

    pub fn recording(&self) -> Recording {
        self.recording.clone()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn window_size(&self) -> Option<(i32, i32)> {
        self.window
    }

    fn frame_budget(&self) -> Option<Duration> {
        (self.target_fps > 0).then(|| Duration::from_secs(1) / self.target_fps as u32)
    }
}

impl Graphics for HeadlessGraphics {
    fn init_window(&mut self, width: i32, height: i32, title: &str) {
        self.window = Some((width, height));
        self.frames = 0;
        self.last_frame = None;
        self.recording.push(DrawCall::InitWindow {
            width,
            height,
            title: title.to_string(),
        });
    }

    fn close_window(&mut self) {
        self.window = None;
        self.recording.push(DrawCall::CloseWindow);
    }

    fn is_window_ready(&self) -> bool {
        self.window.is_some()
    }

    fn set_target_fps(&mut self, fps: i32) {
        self.target_fps = fps;
        self.recording.push(DrawCall::SetTargetFps(fps));
    }

    fn window_should_close(&mut self) -> bool {
        match (self.window, self.close_after) {
            (None, _) => true,
            (Some(_), Some(limit)) => self.frames >= limit,
            (Some(_), None) => false,
        }
    }

    fn begin_drawing(&mut self) {
        self.recording.push(DrawCall::BeginDrawing);
    }

    fn end_drawing(&mut self) {
        if let (Some(budget), Some(last)) = (self.frame_budget(), self.last_frame) {
            let elapsed = last.elapsed();
            if elapsed < budget {
                trace!(wait = ?(budget - elapsed), "pacing frame");
                thread::sleep(budget - elapsed);
            }
        }
        self.last_frame = Some(Instant::now());
        self.frames += 1;
        self.recording.push(DrawCall::EndDrawing);
    }

    fn clear_background(&mut self, color: Color) {
        self.recording.push(DrawCall::ClearBackground(color));
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, font_size: i32, color: Color) {
        self.recording.push(DrawCall::DrawText {
            text: text.to_string(),
            x,
            y,
            font_size,
            color,
        });
    }
}
