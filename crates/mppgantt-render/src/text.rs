//! Plain-text task tree
//!
//! ```text
//! Office Move (8 tasks)
//! 1  Planning
//!   2  Site survey  [Aiko Tanaka]  2025/04/01 - 2025/04/03  100%
//! ```

use mppgantt_core::{Project, RenderError, Renderer, Task};
use std::fmt::Write;

/// Text outline renderer
#[derive(Clone, Debug)]
pub struct TreeRenderer {
    /// Spaces per nesting level
    pub indent_width: usize,
}

impl Default for TreeRenderer {
    fn default() -> Self {
        Self { indent_width: 2 }
    }
}

impl TreeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn line(&self, task: &Task, depth: usize) -> String {
        let mut line = format!(
            "{}{}  {}",
            " ".repeat(depth * self.indent_width),
            task.display_id(),
            task.name
        );
        if !task.resources.is_empty() {
            let _ = write!(line, "  [{}]", task.resource_label());
        }
        if !task.is_summary() {
            if let (Some(start), Some(finish)) = (task.start, task.finish) {
                let _ = write!(
                    line,
                    "  {} - {}  {:.0}%",
                    start.format("%Y/%m/%d"),
                    finish.format("%Y/%m/%d"),
                    task.done_ratio() * 100.0
                );
            }
        }
        line
    }
}

impl Renderer for TreeRenderer {
    type Output = String;

    fn render(&self, project: &Project) -> Result<String, RenderError> {
        let mut out = format!("{} ({} tasks)\n", project.name, project.task_count());
        for flat in project.walk() {
            out.push_str(&self.line(flat.task, flat.depth));
            out.push('\n');
        }
        Ok(out)
    }
}
