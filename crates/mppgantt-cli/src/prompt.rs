//! Interactive prompts on the terminal.
//!
//! Generic over the input and output streams so the save loop can be driven
//! from tests.

use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const INPUT_PROMPT: &str = "Input Microsoft Project file name : ";
pub const NAME_PROMPT: &str = "Input file name (It doesn't need '.xlsx' extension.) : ";
pub const RETRY_PROMPT: &str = "Do you want to try again? [_/n] : ";

/// Line-oriented question/answer over a pair of streams
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `question` without a newline and read one answer line.
    ///
    /// Returns `None` at end of input.
    pub fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Print a line
    pub fn say(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{message}")
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.output
    }
}

/// Line editor helper completing file names on Tab
struct PathHelper {
    files: FilenameCompleter,
}

impl PathHelper {
    fn new() -> Self {
        Self {
            files: FilenameCompleter::new(),
        }
    }
}

impl Completer for PathHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        self.files.complete(line, pos, ctx)
    }
}

impl Hinter for PathHelper {
    type Hint = String;
}

impl Highlighter for PathHelper {}

impl Validator for PathHelper {}

impl Helper for PathHelper {}

/// Ask for a file path on an interactive terminal, completing file names on Tab.
///
/// Returns `None` on end of input or Ctrl-C.
pub fn ask_path(question: &str) -> io::Result<Option<String>> {
    let mut editor = Editor::<PathHelper>::new().map_err(readline_err)?;
    editor.set_helper(Some(PathHelper::new()));
    match editor.readline(question) {
        Ok(line) => Ok(Some(line)),
        Err(ReadlineError::Eof | ReadlineError::Interrupted) => Ok(None),
        Err(e) => Err(readline_err(e)),
    }
}

fn readline_err(e: ReadlineError) -> io::Error {
    match e {
        ReadlineError::Io(e) => e,
        other => io::Error::other(other.to_string()),
    }
}

/// Result of the save loop
#[derive(Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    Aborted,
}

/// Append `.xlsx` unless the name already ends with it
pub fn with_xlsx_extension(name: &str) -> String {
    if name.to_ascii_lowercase().ends_with(".xlsx") {
        name.to_string()
    } else {
        format!("{name}.xlsx")
    }
}

/// Strip whitespace and the quotes a shell or file manager may add
pub fn clean_path_input(input: &str) -> String {
    input.trim().trim_matches('"').trim().to_string()
}

/// Ask for an output name and save, until saving succeeds or the user gives up.
///
/// `initial` is used as the first name instead of prompting. Existing files
/// are only overwritten after confirmation unless `force` is set. A failed
/// save offers a retry with a new name.
pub fn save_interactively<R, W, F>(
    prompter: &mut Prompter<R, W>,
    dir: &Path,
    initial: Option<String>,
    force: bool,
    mut save: F,
) -> io::Result<SaveOutcome>
where
    R: BufRead,
    W: Write,
    F: FnMut(&Path) -> io::Result<()>,
{
    let mut pending = initial;
    loop {
        let answer = match pending.take() {
            Some(name) => name,
            None => match prompter.ask(NAME_PROMPT)? {
                Some(name) => name,
                None => return Ok(SaveOutcome::Aborted),
            },
        };

        let name = answer.trim();
        if name.is_empty() {
            prompter.say("File name can't be empty.")?;
            continue;
        }

        let file_name = with_xlsx_extension(name);
        let path = dir.join(&file_name);

        if path.exists() && !force {
            let question =
                format!("'{file_name}' already exists. Do you want to overwrite it? [y/_] : ");
            match prompter.ask(&question)? {
                Some(yes) if yes.trim().eq_ignore_ascii_case("y") => {}
                Some(_) => continue,
                None => return Ok(SaveOutcome::Aborted),
            }
        }

        match save(&path) {
            Ok(()) => return Ok(SaveOutcome::Saved(path)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "save failed");
                prompter.say(&format!("Error : Can't save to '{file_name}'"))?;
                match prompter.ask(RETRY_PROMPT)? {
                    Some(no) if no.trim().eq_ignore_ascii_case("n") => {
                        return Ok(SaveOutcome::Aborted)
                    }
                    Some(_) => continue,
                    None => return Ok(SaveOutcome::Aborted),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn transcript(prompter: Prompter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(prompter.into_output()).unwrap()
    }

    fn write_file(path: &Path) -> io::Result<()> {
        std::fs::write(path, b"xlsx")
    }

    #[test]
    fn ask_trims_line_endings() {
        let mut p = prompter("plan.xml\r\nnext\n");
        assert_eq!(p.ask("? ").unwrap(), Some("plan.xml".into()));
        assert_eq!(p.ask("? ").unwrap(), Some("next".into()));
        assert_eq!(p.ask("? ").unwrap(), None);
    }

    #[test]
    fn tab_completes_file_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("office_move.xml"), b"<Project/>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let history = rustyline::history::History::new();
        let ctx = Context::new(&history);
        let line = format!("{}/off", dir.path().display());
        let (start, candidates) = PathHelper::new().complete(&line, line.len(), &ctx).unwrap();

        let replacements: Vec<&str> = candidates.iter().map(|c| c.replacement.as_str()).collect();
        assert_eq!(replacements.len(), 1);
        assert!(replacements[0].ends_with("office_move.xml"));
        assert!(start <= line.len());
    }

    #[test]
    fn extension_added_once() {
        assert_eq!(with_xlsx_extension("plan"), "plan.xlsx");
        assert_eq!(with_xlsx_extension("plan.xlsx"), "plan.xlsx");
        assert_eq!(with_xlsx_extension("PLAN.XLSX"), "PLAN.XLSX");
        assert_eq!(with_xlsx_extension("plan.v2"), "plan.v2.xlsx");
    }

    #[test]
    fn clean_path_strips_quotes() {
        assert_eq!(clean_path_input("  \"C:\\work\\plan.xml\" \n"), "C:\\work\\plan.xml");
        assert_eq!(clean_path_input("plan.xml"), "plan.xml");
    }

    #[test]
    fn empty_name_reprompts() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = prompter("\n  \nplan\n");

        let outcome = save_interactively(&mut p, dir.path(), None, false, write_file).unwrap();

        assert_eq!(outcome, SaveOutcome::Saved(dir.path().join("plan.xlsx")));
        assert!(dir.path().join("plan.xlsx").exists());
        let out = transcript(p);
        assert_eq!(out.matches("File name can't be empty.").count(), 2);
        assert_eq!(out.matches(NAME_PROMPT).count(), 3);
    }

    #[test]
    fn initial_name_skips_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = prompter("");

        let outcome = save_interactively(&mut p, dir.path(), Some("out".into()), false, write_file)
            .unwrap();

        assert_eq!(outcome, SaveOutcome::Saved(dir.path().join("out.xlsx")));
        assert_eq!(transcript(p), "");
    }

    #[test]
    fn existing_file_declined_then_new_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("plan.xlsx"), b"old").unwrap();
        let mut p = prompter("plan\nn\nplan2\n");

        let outcome = save_interactively(&mut p, dir.path(), None, false, write_file).unwrap();

        assert_eq!(outcome, SaveOutcome::Saved(dir.path().join("plan2.xlsx")));
        assert_eq!(std::fs::read(dir.path().join("plan.xlsx")).unwrap(), b"old");
        assert!(transcript(p).contains("'plan.xlsx' already exists."));
    }

    #[test]
    fn existing_file_confirmed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("plan.xlsx"), b"old").unwrap();
        let mut p = prompter("plan\nY\n");

        let outcome = save_interactively(&mut p, dir.path(), None, false, write_file).unwrap();

        assert_eq!(outcome, SaveOutcome::Saved(dir.path().join("plan.xlsx")));
        assert_eq!(std::fs::read(dir.path().join("plan.xlsx")).unwrap(), b"xlsx");
    }

    #[test]
    fn force_overwrites_without_asking() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("plan.xlsx"), b"old").unwrap();
        let mut p = prompter("");

        let outcome =
            save_interactively(&mut p, dir.path(), Some("plan".into()), true, write_file).unwrap();

        assert_eq!(outcome, SaveOutcome::Saved(dir.path().join("plan.xlsx")));
        assert!(!transcript(p).contains("already exists"));
    }

    #[test]
    fn save_failure_then_retry_with_new_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut attempts = 0;
        let mut p = prompter("locked\n\nfree\n");

        let outcome = save_interactively(&mut p, dir.path(), None, false, |path| {
            attempts += 1;
            if path.ends_with("locked.xlsx") {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "in use"))
            } else {
                write_file(path)
            }
        })
        .unwrap();

        assert_eq!(outcome, SaveOutcome::Saved(dir.path().join("free.xlsx")));
        assert_eq!(attempts, 2);
        let out = transcript(p);
        assert!(out.contains("Error : Can't save to 'locked.xlsx'"));
        assert!(out.contains(RETRY_PROMPT));
    }

    #[test]
    fn save_failure_then_abort() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = prompter("n\n");

        let outcome = save_interactively(&mut p, dir.path(), Some("x".into()), false, |_| {
            Err(io::Error::other("disk full"))
        })
        .unwrap();

        assert_eq!(outcome, SaveOutcome::Aborted);
    }

    #[test]
    fn end_of_input_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = prompter("\n");

        let outcome = save_interactively(&mut p, dir.path(), None, false, write_file).unwrap();

        assert_eq!(outcome, SaveOutcome::Aborted);
    }
}
