// Terminal output - one overwritten progress line, nothing fancier

pub mod progress;

pub use progress::{format_time, render, terminal_width, ProgressLine};
