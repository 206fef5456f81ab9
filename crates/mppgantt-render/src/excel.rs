//! Excel Gantt chart renderer
//!
//! Writes a single worksheet: seven task columns followed by one narrow
//! column per calendar day. The bars are not baked into the cells; they are
//! conditional formatting rules evaluated by Excel against the Start, Due and
//! Done columns, so editing a date or a percentage in the workbook moves the
//! bar.
//!
//! ## Sheet Layout
//!
//! ```text
//! |  #  | Subject      | Assigned | Start      | Due        | Closed | Done(%) | 04 |    |    | ...
//! |     |              |          |            |            |        |         | 01 | 02 | 03 | ...
//! |  1  | Planning     |          |            |            |        |    0%   |    |    |    |
//! |  2  |   Survey     | Aiko     | 2025/04/01 | 2025/04/03 |        |   50%   | ## | ## | ## |
//! ```
//!
//! ## Conditional Rules
//!
//! Calendar area, highest priority first:
//! - completed share of the bar (`Done(%)` of the task's days) in blue
//! - bar days after today in gray
//! - remaining bar days in red
//!
//! Plus a hatched column for today, a yellow Due cell for overdue
//! unfinished tasks, and a data bar in the `Done(%)` column.

use crate::column_letter;
use chrono::{Datelike, NaiveDate};
use mppgantt_core::{GanttConfig, Project, RenderError, Renderer, WorkCalendar};
use rust_xlsxwriter::{
    ConditionalFormatDataBar, ConditionalFormatFormula, ConditionalFormatType, ExcelDateTime,
    Format, FormatAlign, FormatBorder, FormatPattern, Workbook, Worksheet, XlsxError,
};
use std::path::Path;
use tracing::{debug, info, warn};

// Task columns (0-based)
const COL_ID: u16 = 0;
const COL_SUBJECT: u16 = 1;
const COL_ASSIGNED: u16 = 2;
const COL_START: u16 = 3;
const COL_DUE: u16 = 4;
const COL_CLOSED: u16 = 5;
const COL_DONE: u16 = 6;

/// First calendar column (H)
pub const FIRST_DAY_COL: u16 = 7;

const MONTH_ROW: u32 = 0;
const DAY_ROW: u32 = 1;

/// First task row (Excel row 3)
pub const FIRST_TASK_ROW: u32 = 2;

/// Columns available in an xlsx worksheet
const MAX_COLUMNS: u32 = 16_384;

/// Excel's indent limit
const MAX_INDENT: u8 = 15;

const HEADERS: [(u16, &str, u16); 7] = [
    (COL_ID, "#", 8),
    (COL_SUBJECT, "Subject", 50),
    (COL_ASSIGNED, "Assigned", 16),
    (COL_START, "Start", 12),
    (COL_DUE, "Due", 12),
    (COL_CLOSED, "Closed", 12),
    (COL_DONE, "Done(%)", 12),
];

const DAY_COLUMN_WIDTH: u16 = 4;
const DATE_FORMAT: &str = "yyyy/mm/dd";

const HOLIDAY_HEADER_COLOR: u32 = 0xFFCCFF;
const HOLIDAY_CELL_COLOR: u32 = 0xFFDCFF;
const GRID_COLOR: u32 = 0xAAAAAA;
const DONE_BAR_COLOR: u32 = 0x31869B;
const COMPLETED_COLOR: u32 = 0x8888FF;
const REMAINING_COLOR: u32 = 0xFF8888;
const FUTURE_COLOR: u32 = 0xCCCCCC;
const TODAY_COLOR: u32 = 0x31869B;
const OVERDUE_COLOR: u32 = 0xFFFF88;

/// Excel Gantt chart renderer
#[derive(Clone, Debug)]
pub struct GanttRenderer {
    /// Font, tab title and date window
    pub config: GanttConfig,
    /// Non-working days shaded in the calendar area
    pub calendar: WorkCalendar,
}

/// One calendar column
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayColumn {
    pub col: u16,
    pub date: NaiveDate,
    /// Month label shown above this column
    pub month_label: bool,
    pub holiday: bool,
}

/// One task row as written to the sheet
#[derive(Clone, Debug, PartialEq)]
pub struct GanttRow {
    pub row: u32,
    pub id: i64,
    pub name: String,
    pub indent: u8,
    pub summary: bool,
    pub resources: String,
    pub start: Option<NaiveDate>,
    pub finish: Option<NaiveDate>,
    pub closed: Option<NaiveDate>,
    pub done_ratio: f64,
}

/// Everything the sheet needs, computed before touching the workbook
#[derive(Clone, Debug, PartialEq)]
pub struct GanttLayout {
    pub days: Vec<DayColumn>,
    pub rows: Vec<GanttRow>,
}

impl GanttLayout {
    /// Last calendar column
    pub fn last_day_col(&self) -> u16 {
        self.days.last().map_or(FIRST_DAY_COL, |d| d.col)
    }

    /// Last task row, or `None` when there are no tasks
    pub fn last_task_row(&self) -> Option<u32> {
        self.rows.last().map(|r| r.row)
    }
}

impl GanttRenderer {
    pub fn new(config: &GanttConfig) -> Self {
        Self {
            config: config.clone(),
            calendar: config.calendar(),
        }
    }

    /// Compute calendar columns and task rows
    pub fn layout(&self, project: &Project) -> Result<GanttLayout, RenderError> {
        let config = &self.config;
        if config.end_date < config.start_date {
            return Err(RenderError::InvalidData(format!(
                "chart ends ({}) before it starts ({})",
                config.end_date, config.start_date
            )));
        }
        let day_count = config.day_count();
        let max_days = (MAX_COLUMNS - u32::from(FIRST_DAY_COL)) as usize;
        if day_count > max_days {
            return Err(RenderError::InvalidData(format!(
                "{day_count} days do not fit in a worksheet (at most {max_days})"
            )));
        }

        let days = config
            .days()
            .enumerate()
            .map(|(i, date)| DayColumn {
                col: FIRST_DAY_COL + i as u16,
                date,
                month_label: i == 0 || date.day() == 1,
                holiday: self.calendar.is_holiday(date),
            })
            .collect();

        let rows = project
            .walk()
            .iter()
            .enumerate()
            .map(|(i, flat)| {
                let task = flat.task;
                let summary = task.is_summary();
                GanttRow {
                    row: FIRST_TASK_ROW + i as u32,
                    id: task.display_id(),
                    name: task.name.clone(),
                    indent: flat.depth.min(usize::from(MAX_INDENT)) as u8,
                    summary,
                    resources: task.resource_label(),
                    start: if summary { None } else { task.start },
                    finish: if summary { None } else { task.finish },
                    closed: if summary { None } else { task.actual_finish },
                    done_ratio: if summary { 0.0 } else { task.done_ratio() },
                }
            })
            .collect();

        Ok(GanttLayout { days, rows })
    }

    /// Generate the workbook bytes
    pub fn render_to_bytes(&self, project: &Project) -> Result<Vec<u8>, RenderError> {
        let layout = self.layout(project)?;
        self.warn_outside_window(project);

        let mut workbook = Workbook::new();
        let formats = self.create_formats();
        let sheet = workbook.add_worksheet();
        sheet.set_name(&self.config.tab_title).map_err(xlsx_err)?;

        self.write_headers(sheet, &formats)?;
        self.write_day_columns(sheet, &layout, &formats)?;
        for row in &layout.rows {
            self.write_task_row(sheet, row, &formats)?;
        }
        self.write_calendar_grid(sheet, &layout, &formats)?;

        let last_row = layout.last_task_row().unwrap_or(DAY_ROW);
        sheet.set_freeze_panes(FIRST_TASK_ROW, FIRST_DAY_COL).map_err(xlsx_err)?;
        sheet.autofilter(DAY_ROW, COL_ID, last_row, COL_DONE).map_err(xlsx_err)?;

        if let Some(last_task_row) = layout.last_task_row() {
            self.add_conditional_formats(sheet, last_task_row, layout.last_day_col())?;
        }

        info!(
            rows = layout.rows.len(),
            days = layout.days.len(),
            sheet = %self.config.tab_title,
            "rendered Gantt worksheet"
        );

        workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))
    }

    /// Render and write the workbook to `path`
    pub fn save(&self, project: &Project, path: &Path) -> Result<(), RenderError> {
        let bytes = self.render_to_bytes(project)?;
        std::fs::write(path, bytes)?;
        info!(path = %path.display(), "saved workbook");
        Ok(())
    }

    fn warn_outside_window(&self, project: &Project) {
        let config = &self.config;
        if let Some((first, last)) = project.date_span() {
            if first < config.start_date || last > config.end_date {
                warn!(
                    tasks_from = %first,
                    tasks_to = %last,
                    chart_from = %config.start_date,
                    chart_to = %config.end_date,
                    "some task dates fall outside the chart window"
                );
            }
        }
    }

    fn base_format(&self) -> Format {
        Format::new().set_font_name(&self.config.font_name)
    }

    fn centered(&self) -> Format {
        self.base_format()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
    }

    fn create_formats(&self) -> GanttFormats {
        let grid = Format::new()
            .set_border(FormatBorder::Thin)
            .set_border_color(GRID_COLOR);

        GanttFormats {
            header: self.centered(),
            month: self.centered().set_num_format("mm"),
            day: self.centered().set_num_format("dd"),
            day_holiday: self
                .centered()
                .set_num_format("dd")
                .set_background_color(HOLIDAY_HEADER_COLOR),
            id: self.centered(),
            text_center: self.centered(),
            date: self.centered().set_num_format(DATE_FORMAT),
            percent: self.centered().set_num_format("0%"),
            grid_holiday: grid.clone().set_background_color(HOLIDAY_CELL_COLOR),
            grid,
        }
    }

    fn subject_format(&self, row: &GanttRow) -> Format {
        let format = self
            .base_format()
            .set_align(FormatAlign::VerticalCenter)
            .set_indent(row.indent);
        if row.summary {
            format.set_bold()
        } else {
            format
        }
    }

    /// Column widths and the merged two-row headers of the task columns
    fn write_headers(&self, sheet: &mut Worksheet, formats: &GanttFormats) -> Result<(), RenderError> {
        for (col, title, width) in HEADERS {
            sheet.set_column_width(col, width).map_err(xlsx_err)?;
            sheet
                .merge_range(MONTH_ROW, col, DAY_ROW, col, title, &formats.header)
                .map_err(xlsx_err)?;
        }
        Ok(())
    }

    /// Month and day header cells of the calendar columns
    fn write_day_columns(
        &self,
        sheet: &mut Worksheet,
        layout: &GanttLayout,
        formats: &GanttFormats,
    ) -> Result<(), RenderError> {
        for day in &layout.days {
            sheet
                .set_column_width(day.col, DAY_COLUMN_WIDTH)
                .map_err(xlsx_err)?;
            let date = excel_date(day.date)?;
            if day.month_label {
                sheet
                    .write_with_format(MONTH_ROW, day.col, &date, &formats.month)
                    .map_err(xlsx_err)?;
            }
            let day_format = if day.holiday { &formats.day_holiday } else { &formats.day };
            sheet
                .write_with_format(DAY_ROW, day.col, &date, day_format)
                .map_err(xlsx_err)?;
        }
        Ok(())
    }

    fn write_task_row(
        &self,
        sheet: &mut Worksheet,
        row: &GanttRow,
        formats: &GanttFormats,
    ) -> Result<(), RenderError> {
        let r = row.row;
        sheet
            .write_number_with_format(r, COL_ID, row.id as f64, &formats.id)
            .map_err(xlsx_err)?;
        sheet
            .write_string_with_format(r, COL_SUBJECT, &row.name, &self.subject_format(row))
            .map_err(xlsx_err)?;
        sheet
            .write_string_with_format(r, COL_ASSIGNED, &row.resources, &formats.text_center)
            .map_err(xlsx_err)?;

        for (col, value) in [(COL_START, row.start), (COL_DUE, row.finish), (COL_CLOSED, row.closed)] {
            match value {
                Some(date) => {
                    sheet
                        .write_with_format(r, col, &excel_date(date)?, &formats.date)
                        .map_err(xlsx_err)?;
                }
                None => {
                    sheet.write_blank(r, col, &formats.date).map_err(xlsx_err)?;
                }
            }
        }

        sheet
            .write_number_with_format(r, COL_DONE, row.done_ratio, &formats.percent)
            .map_err(xlsx_err)?;
        Ok(())
    }

    /// Thin borders over the whole calendar area, holiday columns shaded
    fn write_calendar_grid(
        &self,
        sheet: &mut Worksheet,
        layout: &GanttLayout,
        formats: &GanttFormats,
    ) -> Result<(), RenderError> {
        for row in &layout.rows {
            for day in &layout.days {
                let format = if day.holiday { &formats.grid_holiday } else { &formats.grid };
                sheet.write_blank(row.row, day.col, format).map_err(xlsx_err)?;
            }
        }
        Ok(())
    }

    fn add_conditional_formats(
        &self,
        sheet: &mut Worksheet,
        last_row: u32,
        last_col: u16,
    ) -> Result<(), RenderError> {
        let rules = GanttRules::new(FIRST_TASK_ROW, FIRST_DAY_COL);
        debug!(?rules, "conditional formatting rules");

        let done_bar = ConditionalFormatDataBar::new()
            .set_minimum(ConditionalFormatType::Number, 0)
            .set_maximum(ConditionalFormatType::Number, 1)
            .set_fill_color(DONE_BAR_COLOR);
        sheet
            .add_conditional_format(FIRST_TASK_ROW, COL_DONE, last_row, COL_DONE, &done_bar)
            .map_err(xlsx_err)?;

        // Rules added first take priority when several match the same cell
        let bar_rules = [
            (&rules.completed, COMPLETED_COLOR),
            (&rules.future, FUTURE_COLOR),
            (&rules.remaining, REMAINING_COLOR),
        ];
        for (formula, color) in bar_rules {
            let rule = ConditionalFormatFormula::new()
                .set_rule(formula.as_str())
                .set_format(Format::new().set_background_color(color));
            sheet
                .add_conditional_format(FIRST_TASK_ROW, FIRST_DAY_COL, last_row, last_col, &rule)
                .map_err(xlsx_err)?;
        }

        let today = ConditionalFormatFormula::new()
            .set_rule(rules.today.as_str())
            .set_format(
                Format::new()
                    .set_pattern(FormatPattern::LightGray)
                    .set_foreground_color(TODAY_COLOR),
            );
        sheet
            .add_conditional_format(DAY_ROW, FIRST_DAY_COL, last_row, last_col, &today)
            .map_err(xlsx_err)?;

        let overdue = ConditionalFormatFormula::new()
            .set_rule(rules.overdue.as_str())
            .set_format(Format::new().set_background_color(OVERDUE_COLOR));
        sheet
            .add_conditional_format(FIRST_TASK_ROW, COL_DUE, last_row, COL_DUE, &overdue)
            .map_err(xlsx_err)?;

        Ok(())
    }
}

impl Renderer for GanttRenderer {
    type Output = Vec<u8>;

    fn render(&self, project: &Project) -> Result<Vec<u8>, RenderError> {
        self.render_to_bytes(project)
    }
}

/// Formula text of the conditional rules.
///
/// References are written relative to the top-left cell of the range each
/// rule is applied to: `$D3` pins the column and follows the row, `H$2` pins
/// the day header row and follows the column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GanttRules {
    pub completed: String,
    pub future: String,
    pub remaining: String,
    pub today: String,
    pub overdue: String,
}

impl GanttRules {
    /// Rules for a sheet whose first task row and first calendar column are
    /// given (0-based)
    pub fn new(first_task_row: u32, first_day_col: u16) -> Self {
        let r = first_task_row + 1;
        let header = first_task_row;
        let day = column_letter(first_day_col);
        let start = column_letter(COL_START);
        let due = column_letter(COL_DUE);
        let done = column_letter(COL_DONE);

        Self {
            completed: format!(
                "=AND(${start}{r}<={day}${header}, {day}${header}<=ROUNDDOWN((${due}{r}-${start}{r}+1)*${done}{r},0)+${start}{r}-1)"
            ),
            future: format!(
                "=AND(${start}{r}<={day}${header}, {day}${header}<=${due}{r}, TODAY()<{day}${header})"
            ),
            remaining: format!("=AND(${start}{r}<={day}${header}, {day}${header}<=${due}{r})"),
            today: format!("={day}${header}=TODAY()"),
            overdue: format!("=AND(${due}{r}<>\"\", ${due}{r}<TODAY(), ${done}{r}<1)"),
        }
    }
}

struct GanttFormats {
    header: Format,
    month: Format,
    day: Format,
    day_holiday: Format,
    id: Format,
    text_center: Format,
    date: Format,
    percent: Format,
    grid: Format,
    grid_holiday: Format,
}

fn excel_date(date: NaiveDate) -> Result<ExcelDateTime, RenderError> {
    ExcelDateTime::from_ymd(date.year() as u16, date.month() as u8, date.day() as u8)
        .map_err(xlsx_err)
}

fn xlsx_err(e: XlsxError) -> RenderError {
    RenderError::Format(e.to_string())
}
