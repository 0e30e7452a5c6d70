//! Conversion entry points.
//!
//! `html_to_xliff` extracts segments and embeds the source HTML in the
//! XLIFF file. `xliff_to_html` re-parses that embedded copy and overlays the
//! translations. The generated XLIFF structure itself is never used to
//! rebuild the page.

use crate::dom::{self, Document};
use crate::error::Result;
use crate::inline::revert_inline;
use crate::segment::{extract_segments, translatable_body_children};
use crate::tracing_macros::{debug, warn};
use crate::xliff::{self, TransUnit, WriteOptions, XliffFile};

/// Used when the XLIFF file carries no original document.
pub const EMPTY_HTML: &str = "<html><head><title></title></head><body></body></html>";

pub const DEFAULT_LANGUAGE: &str = "en";

/// Options for HTML to XLIFF conversion.
#[derive(Clone, Debug)]
pub struct ConvertOptions {
    /// Value of the `original` attribute (default: empty)
    pub file_name: String,
    /// Default: "en"
    pub source_language: String,
    /// Default: "en"
    pub target_language: String,
    pub write: WriteOptions,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            file_name: String::new(),
            source_language: DEFAULT_LANGUAGE.to_string(),
            target_language: DEFAULT_LANGUAGE.to_string(),
            write: WriteOptions::default(),
        }
    }
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    pub fn source_language(mut self, lang: impl Into<String>) -> Self {
        self.source_language = lang.into();
        self
    }

    pub fn target_language(mut self, lang: impl Into<String>) -> Self {
        self.target_language = lang.into();
        self
    }

    pub fn write_options(mut self, write: WriteOptions) -> Self {
        self.write = write;
        self
    }
}

/// Build the XLIFF model for an HTML document.
///
/// Segments are extracted from the same cleaned-up text that is embedded as
/// `originalFile`, so the reverse pass sees the same translatable nodes.
pub fn build_xliff(html: &str, opts: &ConvertOptions) -> Result<XliffFile> {
    let html = xliff::xml_safe(html);
    let doc = dom::parse(&html);
    let extraction = extract_segments(&doc);

    let units = extraction
        .segments
        .iter()
        .map(TransUnit::from_segment)
        .collect::<Result<Vec<_>>>()?;

    Ok(XliffFile {
        original: opts.file_name.clone(),
        source_language: opts.source_language.clone(),
        target_language: opts.target_language.clone(),
        datatype: "html".to_string(),
        original_file: Some(html.into_owned()),
        units,
    })
}

/// Convert an HTML document into an XLIFF 1.2 document.
pub fn html_to_xliff(html: &str, opts: &ConvertOptions) -> Result<String> {
    let file = build_xliff(html, opts)?;
    debug!(
        file_name = %opts.file_name,
        units = file.units.len(),
        "converted HTML to XLIFF"
    );
    xliff::write_xliff(&file, &opts.write)
}

/// Rebuild the HTML document from an XLIFF file, applying translations.
pub fn xliff_to_html(xliff_text: &str) -> Result<String> {
    let file = xliff::read_xliff(xliff_text)?;
    Ok(apply_translations(&file).to_html())
}

/// Overlay the units of `file` onto its embedded original document.
///
/// Units are taken in order of the numeric suffix of their id (units without
/// one go last). The first title unit goes to `<title>`; the rest are paired
/// with the translatable children of `<body>` in document order. When the two
/// counts differ only the common prefix is applied.
pub fn apply_translations(file: &XliffFile) -> Document {
    let mut doc = match file.original_file.as_deref() {
        Some(html) if !html.trim().is_empty() => dom::parse(html),
        _ => {
            debug!("no embedded original document, using an empty skeleton");
            dom::parse(EMPTY_HTML)
        }
    };

    let mut units: Vec<&TransUnit> = file.units.iter().collect();
    units.sort_by_key(|unit| match unit.numeric_id() {
        Some(n) => (0, n),
        None => (1, 0),
    });

    let title_index = units.iter().position(|unit| unit.is_title());
    if let Some(index) = title_index {
        let unit = units.remove(index);
        if let Some(title) = doc.title() {
            doc.set_inner_html(title, &revert_inline(unit.translation()));
        }
    }

    let nodes = translatable_body_children(&doc);
    if nodes.len() != units.len() {
        warn!(
            nodes = nodes.len(),
            units = units.len(),
            "segment count mismatch, applying the overlapping prefix only"
        );
    }

    for (node, unit) in nodes.into_iter().zip(units) {
        doc.set_inner_html(node, &revert_inline(unit.translation()));
    }

    doc
}
