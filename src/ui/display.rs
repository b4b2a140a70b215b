/// Font size classes the layout uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontSize {
    Large,
    Small,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawColor {
    On,
    Off,
}

impl DrawColor {
    pub fn inverted(self) -> Self {
        match self {
            DrawColor::On => DrawColor::Off,
            DrawColor::Off => DrawColor::On,
        }
    }
}

/// Drawing primitives of a small monochrome screen. Calls build up a frame
/// that only becomes visible on `present`.
pub trait Display {
    fn clear(&mut self);
    fn set_draw_color(&mut self, color: DrawColor);
    fn draw_text(&mut self, x: i32, y: i32, text: &str, font: FontSize);
    fn draw_indicator(&mut self, x: i32, y: i32, radius: i32);
    fn present(&mut self);
}

/// A primitive call as seen by [`RecordingDisplay`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    SetDrawColor(DrawColor),
    Text {
        x: i32,
        y: i32,
        text: String,
        font: FontSize,
    },
    Indicator {
        x: i32,
        y: i32,
        radius: i32,
    },
    Present,
}

/// Display that records every call, for tests.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    ops: Vec<DrawOp>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn presents(&self) -> usize {
        self.ops.iter().filter(|op| **op == DrawOp::Present).count()
    }

    pub fn clears(&self) -> usize {
        self.ops.iter().filter(|op| **op == DrawOp::Clear).count()
    }

    /// Texts drawn since the last clear.
    pub fn current_texts(&self) -> Vec<&str> {
        let start = self
            .ops
            .iter()
            .rposition(|op| *op == DrawOp::Clear)
            .map_or(0, |i| i + 1);
        self.ops[start..]
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Display for RecordingDisplay {
    fn clear(&mut self) {
        self.ops.push(DrawOp::Clear);
    }

    fn set_draw_color(&mut self, color: DrawColor) {
        self.ops.push(DrawOp::SetDrawColor(color));
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str, font: FontSize) {
        self.ops.push(DrawOp::Text {
            x,
            y,
            text: text.to_string(),
            font,
        });
    }

    fn draw_indicator(&mut self, x: i32, y: i32, radius: i32) {
        self.ops.push(DrawOp::Indicator { x, y, radius });
    }

    fn present(&mut self) {
        self.ops.push(DrawOp::Present);
    }
}
