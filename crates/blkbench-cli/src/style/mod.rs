//! Terminal styling for the text report.

use std::sync::atomic::{AtomicBool, Ordering};

mod colors;
mod output;

pub use output::print_report;

static NO_COLOR: AtomicBool = AtomicBool::new(false);

pub fn set_no_color(value: bool) {
    NO_COLOR.store(value, Ordering::SeqCst);
}

/// Checks if colors are disabled.
pub fn no_color() -> bool {
    NO_COLOR.load(Ordering::SeqCst)
}
