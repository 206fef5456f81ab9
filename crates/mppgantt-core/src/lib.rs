//! # mppgantt-core
//!
//! Core domain model for the mppgantt converter.
//!
//! This crate provides:
//! - Domain types: `Project`, `Task`, `FlatTask`
//! - Gantt chart configuration (`config.json`) and the working-day calendar
//! - The `Renderer` trait and rendering error type
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use mppgantt_core::{Project, Task};
//!
//! let d = |day| NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
//!
//! let mut project = Project::new("Office Move");
//! project.tasks.push(
//!     Task::new(1, "Planning")
//!         .child(Task::new(2, "Survey").dates(d(3), d(5)).resource("Aiko"))
//!         .child(Task::new(3, "Floor plan").dates(d(6), d(7))),
//! );
//!
//! let rows = project.walk();
//! assert_eq!(rows.len(), 3);
//! assert_eq!(rows[1].depth, 1);
//! assert!(rows[0].task.is_summary());
//! ```

pub mod calendar;
pub mod config;

pub use calendar::WorkCalendar;
pub use config::{ConfigError, GanttConfig};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Unique identifier of a task inside a project file
pub type TaskUid = i64;

// ============================================================================
// Project
// ============================================================================

/// A project as read from a schedule file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Project name (or title)
    pub name: String,
    /// Project start date, if the file declares one
    pub start: Option<NaiveDate>,
    /// Project finish date, if the file declares one
    pub finish: Option<NaiveDate>,
    /// Top-level tasks (outline level 1). The project summary task is not
    /// part of the tree.
    pub tasks: Vec<Task>,
}

impl Project {
    /// Create an empty project with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: None,
            finish: None,
            tasks: Vec::new(),
        }
    }

    /// Number of tasks in the tree, at every depth
    pub fn task_count(&self) -> usize {
        fn count(tasks: &[Task]) -> usize {
            tasks.iter().map(|t| 1 + count(&t.children)).sum()
        }
        count(&self.tasks)
    }

    /// Flatten the task tree depth-first, parents before their children.
    ///
    /// Top-level tasks have depth 0.
    pub fn walk(&self) -> Vec<FlatTask<'_>> {
        fn visit<'a>(tasks: &'a [Task], depth: usize, out: &mut Vec<FlatTask<'a>>) {
            for task in tasks {
                out.push(FlatTask { task, depth });
                visit(&task.children, depth + 1, out);
            }
        }
        let mut rows = Vec::with_capacity(self.task_count());
        visit(&self.tasks, 0, &mut rows);
        rows
    }

    /// Earliest start and latest finish over all leaf tasks that carry dates
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut span: Option<(NaiveDate, NaiveDate)> = None;
        for flat in self.walk() {
            let task = flat.task;
            if task.is_summary() {
                continue;
            }
            for date in [task.start, task.finish].into_iter().flatten() {
                span = Some(match span {
                    None => (date, date),
                    Some((lo, hi)) => (lo.min(date), hi.max(date)),
                });
            }
        }
        span
    }

    /// Find a task anywhere in the tree by unique id
    pub fn get_task(&self, uid: TaskUid) -> Option<&Task> {
        self.walk().into_iter().map(|f| f.task).find(|t| t.uid == uid)
    }
}

// ============================================================================
// Task
// ============================================================================

/// A work item in the task tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique id (stable across edits in Project)
    pub uid: TaskUid,
    /// Row id as shown in Project's task sheet
    pub id: Option<i64>,
    /// Task name
    pub name: String,
    /// Outline level as stored in the file (1 = top level)
    pub outline_level: u32,
    /// Scheduled start
    pub start: Option<NaiveDate>,
    /// Scheduled finish
    pub finish: Option<NaiveDate>,
    /// Actual finish date, set once the task is closed
    pub actual_finish: Option<NaiveDate>,
    /// Completion percentage, 0 to 100
    pub percent_complete: f64,
    /// Zero-duration milestone
    pub milestone: bool,
    /// Names of the assigned resources, in assignment order
    pub resources: Vec<String>,
    /// Child tasks
    pub children: Vec<Task>,
}

impl Task {
    pub fn new(uid: TaskUid, name: impl Into<String>) -> Self {
        Self {
            uid,
            id: None,
            name: name.into(),
            outline_level: 1,
            start: None,
            finish: None,
            actual_finish: None,
            percent_complete: 0.0,
            milestone: false,
            resources: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set the row id
    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Set scheduled start and finish
    pub fn dates(mut self, start: NaiveDate, finish: NaiveDate) -> Self {
        self.start = Some(start);
        self.finish = Some(finish);
        self
    }

    /// Set completion percentage (0 to 100)
    pub fn complete(mut self, percent: f64) -> Self {
        self.percent_complete = percent;
        self
    }

    /// Set the actual finish date
    pub fn actual_finish(mut self, date: NaiveDate) -> Self {
        self.actual_finish = Some(date);
        self
    }

    /// Assign a resource by name
    pub fn resource(mut self, name: impl Into<String>) -> Self {
        self.resources.push(name.into());
        self
    }

    /// Mark as milestone
    pub fn milestone(mut self) -> Self {
        self.milestone = true;
        self
    }

    /// Add a child task, moving its subtree one level below this task
    pub fn child(mut self, mut child: Task) -> Self {
        child.relevel(self.outline_level + 1);
        self.children.push(child);
        self
    }

    fn relevel(&mut self, level: u32) {
        self.outline_level = level;
        for child in &mut self.children {
            child.relevel(level + 1);
        }
    }

    /// A summary task has at least one child
    pub fn is_summary(&self) -> bool {
        !self.children.is_empty()
    }

    /// Id shown in the `#` column: the row id, or the unique id if the file
    /// has none
    pub fn display_id(&self) -> i64 {
        self.id.unwrap_or(self.uid)
    }

    /// Assigned resource names joined with `", "`
    pub fn resource_label(&self) -> String {
        self.resources.join(", ")
    }

    /// Completion as a ratio in `0.0..=1.0`.
    ///
    /// A task with an actual finish date counts as complete regardless of
    /// its percentage.
    pub fn done_ratio(&self) -> f64 {
        if self.actual_finish.is_some() {
            return 1.0;
        }
        (self.percent_complete / 100.0).clamp(0.0, 1.0)
    }
}

/// A task together with its depth in the tree, as produced by [`Project::walk`]
#[derive(Clone, Copy, Debug)]
pub struct FlatTask<'a> {
    pub task: &'a Task,
    pub depth: usize,
}

// ============================================================================
// Traits
// ============================================================================

/// Output rendering
pub trait Renderer {
    type Output;

    /// Render a project to the output format
    fn render(&self, project: &Project) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================
