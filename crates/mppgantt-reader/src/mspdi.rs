//! MSPDI reader
//!
//! Streams the XML with `quick-xml` and collects the handful of elements the
//! Gantt chart needs. Only direct children of `Task`, `Resource` and
//! `Assignment` are read, so the `Start`/`Finish` elements nested in
//! baselines and timephased data never overwrite the scheduled dates.
//!
//! The file lists tasks flat, in outline order; the tree is rebuilt from
//! `OutlineLevel`.

use crate::{ProjectReader, ReadError};
use chrono::NaiveDate;
use mppgantt_core::{Project, Task, TaskUid};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Resource UID Project uses for "no resource" assignments
const UNASSIGNED_RESOURCE_UID: i64 = -65535;

/// Reader for Microsoft Project XML (MSPDI) files
#[derive(Clone, Debug, Default)]
pub struct MspdiReader;

impl MspdiReader {
    pub fn new() -> Self {
        Self
    }
}

impl ProjectReader for MspdiReader {
    fn read_bytes(&self, bytes: &[u8]) -> Result<Project, ReadError> {
        let body = bytes.strip_prefix(&crate::UTF8_BOM).unwrap_or(bytes);
        let raw = parse_document(body)?;
        Ok(raw.into_project())
    }
}

/// Task fields as they appear in the file
#[derive(Debug, Default)]
struct RawTask {
    uid: Option<TaskUid>,
    id: Option<i64>,
    name: Option<String>,
    outline_level: Option<u32>,
    start: Option<NaiveDate>,
    finish: Option<NaiveDate>,
    actual_finish: Option<NaiveDate>,
    percent_complete: Option<f64>,
    milestone: bool,
    is_null: bool,
}

#[derive(Debug, Default)]
struct RawResource {
    uid: Option<i64>,
    name: Option<String>,
}

#[derive(Debug, Default)]
struct RawAssignment {
    task_uid: Option<TaskUid>,
    resource_uid: Option<i64>,
}

#[derive(Debug, Default)]
struct RawDocument {
    name: Option<String>,
    title: Option<String>,
    start: Option<NaiveDate>,
    finish: Option<NaiveDate>,
    tasks: Vec<RawTask>,
    resources: Vec<RawResource>,
    assignments: Vec<RawAssignment>,
}

fn parse_document(xml: &[u8]) -> Result<RawDocument, ReadError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut doc = RawDocument::default();
    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|source| ReadError::Xml {
                position: reader.buffer_position(),
                source,
            })?;

        match event {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                match (path_tail(&path), name.as_str()) {
                    (["Project", "Tasks"], "Task") => doc.tasks.push(RawTask::default()),
                    (["Project", "Resources"], "Resource") => {
                        doc.resources.push(RawResource::default())
                    }
                    (["Project", "Assignments"], "Assignment") => {
                        doc.assignments.push(RawAssignment::default())
                    }
                    _ => {}
                }
                path.push(name);
                text.clear();
            }
            Event::Text(t) => {
                let unescaped = t.unescape().map_err(|source| ReadError::Xml {
                    position: reader.buffer_position(),
                    source,
                })?;
                text.push_str(&unescaped);
            }
            Event::CData(t) => text.push_str(&String::from_utf8_lossy(&t)),
            Event::End(_) => {
                apply_field(&mut doc, &path, &text)?;
                path.pop();
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if doc.tasks.is_empty() && doc.name.is_none() && doc.title.is_none() {
        return Err(ReadError::MissingElement("Project".into()));
    }

    debug!(
        tasks = doc.tasks.len(),
        resources = doc.resources.len(),
        assignments = doc.assignments.len(),
        "parsed MSPDI document"
    );
    Ok(doc)
}

/// The last two path segments, or the whole path if shorter
fn path_tail(path: &[String]) -> [&str; 2] {
    match path {
        [.., a, b] => [a.as_str(), b.as_str()],
        [b] => ["", b.as_str()],
        [] => ["", ""],
    }
}

/// Store the text of the element that just closed, if it is one we read
fn apply_field(doc: &mut RawDocument, path: &[String], text: &str) -> Result<(), ReadError> {
    let segments: Vec<&str> = path.iter().map(String::as_str).collect();
    match segments.as_slice() {
        ["Project", field] => match *field {
            "Name" => doc.name = non_empty(text),
            "Title" => doc.title = non_empty(text),
            "StartDate" => doc.start = parse_date(field, text)?,
            "FinishDate" => doc.finish = parse_date(field, text)?,
            _ => {}
        },
        ["Project", "Tasks", "Task", field] => {
            let Some(task) = doc.tasks.last_mut() else {
                return Ok(());
            };
            match *field {
                "UID" => task.uid = parse_int(field, text)?,
                "ID" => task.id = parse_int(field, text)?,
                "Name" => task.name = Some(text.to_string()),
                "OutlineLevel" => {
                    task.outline_level = parse_int(field, text)?.map(|l: i64| l.max(0) as u32)
                }
                "Start" => task.start = parse_date(field, text)?,
                "Finish" => task.finish = parse_date(field, text)?,
                "ActualFinish" => task.actual_finish = parse_date(field, text)?,
                "PercentComplete" => task.percent_complete = parse_float(field, text)?,
                "Milestone" => task.milestone = parse_bool(text),
                "IsNull" => task.is_null = parse_bool(text),
                _ => {}
            }
        }
        ["Project", "Resources", "Resource", field] => {
            let Some(resource) = doc.resources.last_mut() else {
                return Ok(());
            };
            match *field {
                "UID" => resource.uid = parse_int(field, text)?,
                "Name" => resource.name = non_empty(text),
                _ => {}
            }
        }
        ["Project", "Assignments", "Assignment", field] => {
            let Some(assignment) = doc.assignments.last_mut() else {
                return Ok(());
            };
            match *field {
                "TaskUID" => assignment.task_uid = parse_int(field, text)?,
                "ResourceUID" => assignment.resource_uid = parse_int(field, text)?,
                _ => {}
            }
        }
        _ => {}
    }
    Ok(())
}

impl RawDocument {
    fn into_project(self) -> Project {
        let resource_names: HashMap<i64, String> = self
            .resources
            .into_iter()
            .filter_map(|r| match (r.uid, r.name) {
                (Some(uid), Some(name)) => Some((uid, name)),
                (Some(uid), None) => {
                    debug!(uid, "resource without a name");
                    None
                }
                (None, _) => {
                    warn!("skipping resource without UID");
                    None
                }
            })
            .collect();

        let mut task_resources: HashMap<TaskUid, Vec<String>> = HashMap::new();
        for assignment in self.assignments {
            let (Some(task_uid), Some(resource_uid)) = (assignment.task_uid, assignment.resource_uid)
            else {
                continue;
            };
            if resource_uid == UNASSIGNED_RESOURCE_UID {
                continue;
            }
            match resource_names.get(&resource_uid) {
                Some(name) => task_resources.entry(task_uid).or_default().push(name.clone()),
                None => debug!(task_uid, resource_uid, "assignment to unknown or unnamed resource"),
            }
        }

        let mut project = Project::new(self.name.or(self.title).unwrap_or_default());
        project.start = self.start;
        project.finish = self.finish;

        let mut flat = Vec::with_capacity(self.tasks.len());
        for raw in self.tasks {
            if raw.is_null {
                continue;
            }
            let Some(uid) = raw.uid else {
                warn!(name = ?raw.name, "skipping task without UID");
                continue;
            };
            let level = raw.outline_level.unwrap_or(1);
            if level == 0 {
                // Project summary task
                project.start = project.start.or(raw.start);
                project.finish = project.finish.or(raw.finish);
                if project.name.is_empty() {
                    project.name = raw.name.unwrap_or_default();
                }
                continue;
            }

            let mut task = Task::new(uid, raw.name.unwrap_or_default());
            task.id = raw.id;
            task.outline_level = level;
            task.start = raw.start;
            task.finish = raw.finish;
            task.actual_finish = raw.actual_finish;
            task.percent_complete = raw.percent_complete.unwrap_or(0.0);
            task.milestone = raw.milestone;
            task.resources = task_resources.remove(&uid).unwrap_or_default();
            flat.push(task);
        }

        project.tasks = build_tree(flat);
        project
    }
}

/// Rebuild the task tree from tasks listed in outline order.
///
/// A task whose level jumps more than one below the previous task becomes a
/// child of the nearest open task with a lower level.
fn build_tree(tasks: Vec<Task>) -> Vec<Task> {
    fn close(stack: &mut Vec<Task>, roots: &mut Vec<Task>) {
        if let Some(done) = stack.pop() {
            match stack.last_mut() {
                Some(parent) => parent.children.push(done),
                None => roots.push(done),
            }
        }
    }

    let mut roots = Vec::new();
    let mut stack: Vec<Task> = Vec::new();
    for task in tasks {
        while stack
            .last()
            .is_some_and(|open| open.outline_level >= task.outline_level)
        {
            close(&mut stack, &mut roots);
        }
        stack.push(task);
    }
    while !stack.is_empty() {
        close(&mut stack, &mut roots);
    }
    roots
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn invalid(element: &str, value: &str) -> ReadError {
    ReadError::InvalidValue {
        element: element.to_string(),
        value: value.to_string(),
    }
}

fn parse_int(element: &str, text: &str) -> Result<Option<i64>, ReadError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse().map(Some).map_err(|_| invalid(element, text))
}

fn parse_float(element: &str, text: &str) -> Result<Option<f64>, ReadError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse().map(Some).map_err(|_| invalid(element, text))
}

fn parse_bool(text: &str) -> bool {
    matches!(text.trim(), "1" | "true")
}

/// Parse `YYYY-MM-DDTHH:MM:SS`, keeping the date part
fn parse_date(element: &str, text: &str) -> Result<Option<NaiveDate>, ReadError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let date_part = text.split('T').next().unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| invalid(element, text))
}
