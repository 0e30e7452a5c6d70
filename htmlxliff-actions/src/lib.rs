//! Host actions for HTML <-> XLIFF conversion.
//!
//! Each action is stateless: download the input from a `FileStorage`,
//! convert it with `htmlxliff`, upload the result. The host platform supplies
//! the storage; `MemoryStorage` is a self-contained implementation for tests
//! and embedders.
//!
//! Failures come in two kinds. `ActionError::Configuration` means the caller
//! handed over something unusable (wrong extension, malformed XLIFF) and can
//! fix it. `ActionError::Application` wraps anything else. Nothing is
//! uploaded when an action fails.

use std::collections::HashMap;
use std::path::Path;

use htmlxliff::ConvertOptions;
use htmlxliff::convert::DEFAULT_LANGUAGE;
use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::debug;

#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($tt:tt)*) => {};
}

pub const XLIFF_CONTENT_TYPE: &str = "application/xml";
pub const HTML_CONTENT_TYPE: &str = "text/html";

/// Extensions accepted by `ConvertXliffToHtml`, compared case-insensitively.
pub const XLIFF_EXTENSIONS: &[&str] = &["xliff", "xlf"];

/// Handle to a file held by the host's storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub name: String,
    pub content_type: Option<String>,
}

impl FileRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// File storage provided by the host.
pub trait FileStorage {
    fn download(&self, file: &FileRef) -> Result<Vec<u8>, StorageError>;

    fn upload(
        &mut self,
        bytes: Vec<u8>,
        content_type: &str,
        file_name: &str,
    ) -> Result<FileRef, StorageError>;
}

/// In-memory `FileStorage`, keyed by file name.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: HashMap<String, StoredFile>,
}

#[derive(Debug)]
struct StoredFile {
    content_type: String,
    bytes: Vec<u8>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a file and return its handle. Replaces any file with the same name.
    pub fn insert(
        &mut self,
        name: &str,
        content_type: &str,
        bytes: impl Into<Vec<u8>>,
    ) -> FileRef {
        self.files.insert(
            name.to_owned(),
            StoredFile {
                content_type: content_type.to_owned(),
                bytes: bytes.into(),
            },
        );
        FileRef::new(name).with_content_type(content_type)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(|f| f.bytes.as_slice())
    }

    pub fn content_type(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(|f| f.content_type.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileStorage for MemoryStorage {
    fn download(&self, file: &FileRef) -> Result<Vec<u8>, StorageError> {
        self.get(&file.name)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| StorageError::NotFound(file.name.clone()))
    }

    fn upload(
        &mut self,
        bytes: Vec<u8>,
        content_type: &str,
        file_name: &str,
    ) -> Result<FileRef, StorageError> {
        Ok(self.insert(file_name, content_type, bytes))
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ActionError {
    /// The input cannot be processed as given; the caller can fix it.
    #[error("{0}")]
    Configuration(String),

    /// Unexpected failure during conversion.
    #[error("{context}: {source}")]
    Application {
        context: &'static str,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ActionError {
    fn application(context: &'static str, source: impl Into<BoxError>) -> Self {
        ActionError::Application {
            context,
            source: source.into(),
        }
    }
}

/// Convert an HTML file into an XLIFF 1.2 file named `<stem>.xliff`.
#[derive(Debug, Clone)]
pub struct ConvertHtmlToXliff {
    pub file: FileRef,
    /// Default: "en"
    pub source_language: Option<String>,
    /// Default: "en"
    pub target_language: Option<String>,
}

impl ConvertHtmlToXliff {
    pub fn new(file: FileRef) -> Self {
        Self {
            file,
            source_language: None,
            target_language: None,
        }
    }

    pub fn source_language(mut self, lang: impl Into<String>) -> Self {
        self.source_language = Some(lang.into());
        self
    }

    pub fn target_language(mut self, lang: impl Into<String>) -> Self {
        self.target_language = Some(lang.into());
        self
    }

    pub fn run(&self, storage: &mut impl FileStorage) -> Result<FileRef, ActionError> {
        debug!(file = %self.file.name, "converting HTML to XLIFF");

        let bytes = storage.download(&self.file)?;
        let html = decode_text(&bytes);

        let opts = ConvertOptions::new()
            .file_name(self.file.name.as_str())
            .source_language(language_or_default(self.source_language.as_deref()))
            .target_language(language_or_default(self.target_language.as_deref()));

        let xliff = htmlxliff::html_to_xliff(&html, &opts)
            .map_err(|err| ActionError::application("Error converting HTML to XLIFF", err))?;

        let name = output_name(&self.file.name, "xliff");
        let uploaded = storage.upload(xliff.into_bytes(), XLIFF_CONTENT_TYPE, &name)?;
        debug!(output = %uploaded.name, "uploaded XLIFF");
        Ok(uploaded)
    }
}

/// Convert an XLIFF file produced by `ConvertHtmlToXliff` back into
/// `<stem>.html`, with translations applied.
#[derive(Debug, Clone)]
pub struct ConvertXliffToHtml {
    pub file: FileRef,
}

impl ConvertXliffToHtml {
    pub fn new(file: FileRef) -> Self {
        Self { file }
    }

    pub fn run(&self, storage: &mut impl FileStorage) -> Result<FileRef, ActionError> {
        debug!(file = %self.file.name, "converting XLIFF to HTML");

        check_xliff_extension(&self.file.name)?;

        let bytes = storage.download(&self.file)?;
        let xliff = decode_text(&bytes);

        let html = htmlxliff::xliff_to_html(&xliff).map_err(|err| {
            if err.is_invalid_input() {
                ActionError::Configuration(err.to_string())
            } else {
                ActionError::application("Error converting XLIFF to HTML", err)
            }
        })?;

        let name = output_name(&self.file.name, "html");
        let uploaded = storage.upload(html.into_bytes(), HTML_CONTENT_TYPE, &name)?;
        debug!(output = %uploaded.name, "uploaded HTML");
        Ok(uploaded)
    }
}

/// Reject anything not named `*.xliff` / `*.xlf`.
pub fn check_xliff_extension(file_name: &str) -> Result<(), ActionError> {
    let accepted = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| XLIFF_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(ext)));

    if accepted {
        Ok(())
    } else {
        Err(ActionError::Configuration(format!(
            "Invalid file extension for '{file_name}': expected .xliff or .xlf"
        )))
    }
}

/// `report.html` + `xliff` gives `report.xliff`.
pub fn output_name(input_name: &str, extension: &str) -> String {
    let stem = Path::new(input_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("document");
    format!("{stem}.{extension}")
}

fn language_or_default(lang: Option<&str>) -> &str {
    match lang {
        Some(lang) if !lang.trim().is_empty() => lang,
        _ => DEFAULT_LANGUAGE,
    }
}

/// UTF-8 with an optional byte order mark; invalid sequences are replaced.
fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
