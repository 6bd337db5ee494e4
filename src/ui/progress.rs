// Single-line progress bar - the whole UI of segue
// Pure rendering plus a tiny memo so we only write when the line changes

use std::io::{self, Write};

/// Columns reserved for brackets, percentage and time labels
const RESERVED_COLUMNS: usize = 30;
const MIN_BAR_WIDTH: usize = 10;
const FALLBACK_WIDTH: usize = 80;
const FILL: char = '=';

/// Format milliseconds as `M:SS` (minutes never roll over into hours)
pub fn format_time(ms: i64) -> String {
    if ms <= 0 {
        return "0:00".to_string();
    }
    let total_seconds = ms / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Number of filled cells for a given position
pub fn filled_cells(current_ms: i64, total_ms: i64, bar_width: usize) -> usize {
    (fraction(current_ms, total_ms) * bar_width as f64).floor() as usize
}

pub fn bar_width(terminal_width: usize) -> usize {
    terminal_width
        .saturating_sub(RESERVED_COLUMNS)
        .max(MIN_BAR_WIDTH)
}

fn fraction(current_ms: i64, total_ms: i64) -> f64 {
    let total = if total_ms <= 0 { 1 } else { total_ms };
    let current = current_ms.max(0);
    (current as f64 / total as f64).min(1.0)
}

/// Render one frame, exactly `terminal_width` characters wide
pub fn render(current_ms: i64, total_ms: i64, terminal_width: usize) -> String {
    let total_ms = if total_ms <= 0 { 1 } else { total_ms };
    let progress = fraction(current_ms, total_ms);
    let width = bar_width(terminal_width);
    let filled = filled_cells(current_ms, total_ms, width);

    let mut bar = String::with_capacity(width);
    bar.extend(std::iter::repeat(FILL).take(filled));
    bar.extend(std::iter::repeat(' ').take(width - filled));

    let text = format!(
        "[{}] {}% | {}/{}",
        bar,
        (progress * 100.0).round() as u32,
        format_time(current_ms),
        format_time(total_ms),
    );

    let len = text.chars().count();
    if len > terminal_width {
        text.chars().take(terminal_width).collect()
    } else {
        let mut padded = text;
        padded.extend(std::iter::repeat(' ').take(terminal_width - len));
        padded
    }
}

/// Current terminal width, or 80 columns when stdout is not a terminal
pub fn terminal_width() -> usize {
    match crossterm::terminal::size() {
        Ok((cols, _)) if cols > 0 => cols as usize,
        _ => FALLBACK_WIDTH,
    }
}

/// Remembers the last drawn line so identical frames are not rewritten
#[derive(Debug, Default)]
pub struct ProgressLine {
    last: Option<String>,
}

impl ProgressLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the current terminal line if `line` changed. Returns whether it wrote.
    pub fn draw<W: Write>(&mut self, out: &mut W, line: String) -> io::Result<bool> {
        if self.last.as_deref() == Some(line.as_str()) {
            return Ok(false);
        }
        write!(out, "\r{}", line)?;
        out.flush()?;
        self.last = Some(line);
        Ok(true)
    }

    /// Forget the last frame, e.g. after other output moved to a new line
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(-5), "0:00");
        assert_eq!(format_time(999), "0:00");
        assert_eq!(format_time(61_000), "1:01");
        assert_eq!(format_time(3_600_000), "60:00");
    }

    #[test]
    fn test_render_half_way() {
        // width 50 -> bar of 20 cells
        let line = render(30_000, 60_000, 50);
        assert_eq!(line.chars().count(), 50);
        assert!(line.starts_with("[==========          ] 50% | 0:30/1:00"));
        assert!(line.ends_with(' '));
    }

    #[test]
    fn test_render_pads_or_truncates_to_width() {
        for width in [0usize, 5, 20, 39, 40, 41, 80, 200] {
            for (current, total) in [(0, 0), (1, 1), (500, 1_000), (5_000, 1_000), (-10, 300)] {
                let line = render(current, total, width);
                assert_eq!(line.chars().count(), width, "width {width}");
            }
        }
    }

    #[test]
    fn test_render_never_shrinks_bar_below_minimum() {
        // narrow terminal: natural content is 10-cell bar plus labels, then truncated
        let line = render(0, 1_000, 15);
        assert_eq!(line, "[          ] 0%");
    }

    #[test]
    fn test_render_clamps_overrun_and_zero_total() {
        let line = render(90_000, 60_000, 40);
        assert!(line.starts_with("[==========] 100% | 1:30/1:00"));

        let line = render(0, 0, 40);
        assert!(line.starts_with("[          ] 0% | 0:00/0:00"));
    }

    #[test]
    fn test_percentage_is_rounded() {
        let line = render(2, 3, 60);
        assert!(line.contains(" 67% "));
    }

    #[test]
    fn test_filled_is_monotonic_and_bounded() {
        let total = 7_919;
        let width = bar_width(97);
        let mut previous = 0;
        for current in (0..=total).step_by(13).chain([total]) {
            let filled = filled_cells(current, total, width);
            assert!(filled >= previous);
            assert!(filled <= width);
            previous = filled;
        }
        assert_eq!(previous, width);
    }

    #[test]
    fn test_render_is_pure_and_redraw_is_suppressed() {
        let first = render(12_345, 200_000, 72);
        let second = render(12_345, 200_000, 72);
        assert_eq!(first, second);

        let mut line = ProgressLine::new();
        let mut out = Vec::new();
        assert!(line.draw(&mut out, first).unwrap());
        assert!(!line.draw(&mut out, second).unwrap());
        assert_eq!(out.iter().filter(|&&b| b == b'\r').count(), 1);

        line.reset();
        assert!(line.draw(&mut out, render(12_345, 200_000, 72)).unwrap());
    }
}
