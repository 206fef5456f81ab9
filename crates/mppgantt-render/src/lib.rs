//! # mppgantt-render
//!
//! Rendering backends for mppgantt.
//!
//! This crate provides:
//! - `GanttRenderer`: an Excel workbook with a calendar-aligned Gantt chart
//!   drawn by conditional formatting
//! - `TreeRenderer`: a plain-text outline of the task tree

pub mod excel;
pub mod text;

pub use excel::GanttRenderer;
pub use text::TreeRenderer;

/// Spreadsheet column letters for a 0-based column index (`0` → `A`, `26` → `AA`)
pub fn column_letter(col: u16) -> String {
    let mut n = u32::from(col) + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}
