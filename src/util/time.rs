//! Time helpers for the terminal view

/// Format a second count as zero-padded `mm:ss`
pub fn format_mmss(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
