use super::display::{Display, DrawColor, FontSize};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

#[derive(Debug, Clone, PartialEq)]
enum Item {
    Text { x: i32, y: i32, text: String },
    Indicator { lit: bool },
}

/// Terminal stand-in for the OLED: a single status line on an indicatif
/// spinner, composed from the primitives of the current frame.
pub struct TerminalDisplay {
    status: ProgressBar,
    items: Vec<Item>,
    color: DrawColor,
}

fn create_status_line(target: ProgressDrawTarget) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(None, target);
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix("beatclock");
    pb
}

impl TerminalDisplay {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    pub fn with_draw_target(target: ProgressDrawTarget) -> Self {
        Self {
            status: create_status_line(target),
            items: Vec::new(),
            color: DrawColor::On,
        }
    }

    /// The line `present` would show for the current frame.
    pub fn compose(&self) -> String {
        let mut texts: Vec<(i32, i32, &str)> = Vec::new();
        let mut indicator = "  ";
        for item in &self.items {
            match item {
                Item::Text { x, y, text } => texts.push((*y, *x, text.trim())),
                Item::Indicator { lit } => indicator = if *lit { "● " } else { "○ " },
            }
        }
        // Top row first, then left to right.
        texts.sort_by_key(|(y, x, _)| (*y, *x));

        let body: Vec<&str> = texts.into_iter().map(|(_, _, text)| text).collect();
        format!("{}{}", indicator, body.join("  "))
    }
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TerminalDisplay {
    fn clear(&mut self) {
        self.items.clear();
    }

    fn set_draw_color(&mut self, color: DrawColor) {
        self.color = color;
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str, _font: FontSize) {
        self.items.push(Item::Text {
            x,
            y,
            text: text.to_string(),
        });
    }

    fn draw_indicator(&mut self, _x: i32, _y: i32, _radius: i32) {
        let lit = self.color == DrawColor::On;
        self.items.retain(|item| !matches!(item, Item::Indicator { .. }));
        self.items.push(Item::Indicator { lit });
    }

    fn present(&mut self) {
        let line = self.compose();
        self.status.set_message(line);
        self.status.tick();
    }
}
