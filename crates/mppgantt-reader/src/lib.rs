//! # mppgantt-reader
//!
//! Readers for Microsoft Project schedule files.
//!
//! This crate provides:
//! - Content-based format detection (`detect_format`)
//! - The `ProjectReader` trait
//! - An MSPDI reader for the XML format written by Project's "Save As XML"
//! - `UniversalProjectReader`, which sniffs the content and dispatches
//!
//! Binary `.mpp` files are recognised but not decoded; they must be saved as
//! XML from Microsoft Project first.
//!
//! ## Example
//!
//! ```rust
//! use mppgantt_reader::{ProjectReader, UniversalProjectReader};
//!
//! let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
//! <Project xmlns="http://schemas.microsoft.com/project">
//!   <Name>Demo</Name>
//!   <Tasks>
//!     <Task><UID>1</UID><ID>1</ID><Name>Kickoff</Name><OutlineLevel>1</OutlineLevel>
//!       <Start>2025-04-01T08:00:00</Start><Finish>2025-04-01T17:00:00</Finish></Task>
//!   </Tasks>
//! </Project>"#;
//!
//! let project = UniversalProjectReader::new().read_bytes(xml.as_bytes()).unwrap();
//! assert_eq!(project.name, "Demo");
//! assert_eq!(project.tasks[0].name, "Kickoff");
//! ```

pub mod mspdi;

pub use mspdi::MspdiReader;

use mppgantt_core::Project;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Compound File Binary signature that starts every `.mpp` file
const OLE2_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Reading error
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML error at byte {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid value '{value}' in <{element}>")]
    InvalidValue { element: String, value: String },

    #[error("Missing element: {0}")]
    MissingElement(String),
}

/// Schedule file formats recognised by content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Microsoft Project XML (MSPDI)
    MspdiXml,
    /// Binary Microsoft Project file (.mpp)
    MppBinary,
    /// Anything else
    Unknown,
}

impl FileFormat {
    pub fn describe(self) -> &'static str {
        match self {
            Self::MspdiXml => "Microsoft Project XML (MSPDI)",
            Self::MppBinary => "Microsoft Project binary (.mpp)",
            Self::Unknown => "unknown",
        }
    }
}

/// Detect the file format from its first bytes
pub fn detect_format(bytes: &[u8]) -> FileFormat {
    if bytes.starts_with(&OLE2_SIGNATURE) {
        return FileFormat::MppBinary;
    }

    let body = bytes.strip_prefix(&UTF8_BOM).unwrap_or(bytes);
    let first = body.iter().position(|b| !b.is_ascii_whitespace());
    match first {
        Some(i) if body[i] == b'<' && root_is_project(&body[i..]) => FileFormat::MspdiXml,
        _ => FileFormat::Unknown,
    }
}

/// Whether the first element of the document is `Project`, in any namespace
/// prefix. Declarations, comments and doctypes before it are skipped.
fn root_is_project(xml: &[u8]) -> bool {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e) | Event::Empty(e)) => return e.local_name().as_ref() == b"Project",
            Ok(Event::Eof) | Err(_) => return false,
            Ok(_) => {}
        }
        buf.clear();
    }
}

/// A reader that turns schedule file content into a [`Project`]
pub trait ProjectReader {
    /// Parse a project from file content
    fn read_bytes(&self, bytes: &[u8]) -> Result<Project, ReadError>;

    /// Parse a project from a file on disk
    fn read_file(&self, path: &Path) -> Result<Project, ReadError> {
        let bytes = std::fs::read(path).map_err(|source| ReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.read_bytes(&bytes)
    }
}

/// Reader that detects the format and delegates to the matching reader
#[derive(Clone, Debug, Default)]
pub struct UniversalProjectReader {
    mspdi: MspdiReader,
}

impl UniversalProjectReader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectReader for UniversalProjectReader {
    fn read_bytes(&self, bytes: &[u8]) -> Result<Project, ReadError> {
        let format = detect_format(bytes);
        info!(format = format.describe(), "detected project file format");
        match format {
            FileFormat::MspdiXml => self.mspdi.read_bytes(bytes),
            FileFormat::MppBinary => Err(ReadError::UnsupportedFormat(
                "binary .mpp files cannot be read directly; \
                 open the file in Microsoft Project and use Save As > XML (*.xml)"
                    .into(),
            )),
            FileFormat::Unknown => Err(ReadError::UnsupportedFormat(
                "not a Microsoft Project XML (MSPDI) file".into(),
            )),
        }
    }
}

/// Read a project file from disk, detecting its format
pub fn read_project(path: &Path) -> Result<Project, ReadError> {
    UniversalProjectReader::new().read_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_mpp_binary() {
        let mut bytes = OLE2_SIGNATURE.to_vec();
        bytes.extend_from_slice(&[0u8; 504]);
        assert_eq!(detect_format(&bytes), FileFormat::MppBinary);
    }

    #[test]
    fn detect_mspdi_with_declaration() {
        let xml = br#"<?xml version="1.0"?><Project xmlns="http://schemas.microsoft.com/project"/>"#;
        assert_eq!(detect_format(xml), FileFormat::MspdiXml);
    }

    #[test]
    fn detect_mspdi_with_bom_and_whitespace() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"\r\n  <Project><Name>x</Name></Project>");
        assert_eq!(detect_format(&bytes), FileFormat::MspdiXml);
    }

    #[test]
    fn detect_prefixed_root() {
        let xml = br#"<?xml version="1.0"?>
<msp:Project xmlns:msp="http://schemas.microsoft.com/project"><msp:Name>x</msp:Name></msp:Project>"#;
        assert_eq!(detect_format(xml), FileFormat::MspdiXml);
    }

    #[test]
    fn detect_requires_project_root_element() {
        assert_eq!(
            detect_format(b"<ProjectSummary><Name>x</Name></ProjectSummary>"),
            FileFormat::Unknown
        );
        assert_eq!(
            detect_format(b"<!-- exported from <Project> --><workbook><Project/></workbook>"),
            FileFormat::Unknown
        );
        assert_eq!(
            detect_format(b"<?xml version=\"1.0\"?><!-- plan --><Project/>"),
            FileFormat::MspdiXml
        );
    }

    #[test]
    fn universal_reads_prefixed_document() {
        let xml = r#"<msp:Project xmlns:msp="http://schemas.microsoft.com/project">
  <msp:Name>Prefixed</msp:Name>
  <msp:Tasks>
    <msp:Task><msp:UID>1</msp:UID><msp:ID>1</msp:ID><msp:Name>Only</msp:Name><msp:OutlineLevel>1</msp:OutlineLevel></msp:Task>
  </msp:Tasks>
</msp:Project>"#;
        let project = UniversalProjectReader::new().read_bytes(xml.as_bytes()).unwrap();
        assert_eq!(project.name, "Prefixed");
        assert_eq!(project.tasks[0].name, "Only");
    }

    #[test]
    fn detect_other_xml_is_unknown() {
        assert_eq!(detect_format(b"<workbook/>"), FileFormat::Unknown);
    }

    #[test]
    fn detect_text_is_unknown() {
        assert_eq!(detect_format(b"MPX,Microsoft Project,4.0"), FileFormat::Unknown);
        assert_eq!(detect_format(b""), FileFormat::Unknown);
    }

    #[test]
    fn universal_rejects_mpp_with_hint() {
        let mut bytes = OLE2_SIGNATURE.to_vec();
        bytes.extend_from_slice(&[0u8; 64]);
        let err = UniversalProjectReader::new().read_bytes(&bytes).unwrap_err();
        assert!(matches!(err, ReadError::UnsupportedFormat(_)));
        assert!(err.to_string().contains("Save As"));
    }

    #[test]
    fn read_file_not_found() {
        let err = read_project(Path::new("/nonexistent/plan.xml")).unwrap_err();
        assert!(matches!(err, ReadError::Io { .. }));
        assert!(err.to_string().contains("plan.xml"));
    }
}
