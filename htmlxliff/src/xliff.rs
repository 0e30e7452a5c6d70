//! XLIFF 1.2 documents: model, writer and reader.
//!
//! `<source>` and `<target>` hold mixed content (text plus inline codes), so
//! the model keeps their raw inner XML rather than a parsed tree. The writer
//! emits that content without indentation; any whitespace it added there
//! would become part of the translation.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::borrow::Cow;
use std::fmt::Display;

use crate::error::{Error, Result};
use crate::inline::InlineNode;
use crate::segment::Segment;

pub const XLIFF_NAMESPACE: &str = "urn:oasis:names:tc:xliff:document:1.2";
pub const XLIFF_VERSION: &str = "1.2";

/// The `<file>` element of an XLIFF document and everything below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XliffFile {
    pub original: String,
    pub source_language: String,
    pub target_language: String,
    pub datatype: String,
    /// Verbatim copy of the source document, carried for reconstruction.
    pub original_file: Option<String>,
    pub units: Vec<TransUnit>,
}

/// One `<trans-unit>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransUnit {
    pub id: String,
    pub slug: String,
    pub tag: String,
    /// Raw inner XML of `<source>`
    pub source: String,
    /// Raw inner XML of `<target>`
    pub target: String,
}

impl TransUnit {
    /// Build a unit from an extracted segment.
    pub fn from_segment(segment: &Segment) -> Result<Self> {
        Ok(Self {
            id: segment.id.to_string(),
            slug: segment.slug.clone(),
            tag: segment.tag.clone(),
            source: inline_to_xml(&segment.source)?,
            target: segment.target.clone(),
        })
    }

    /// Trailing digits of `id` (`"tu-12"` gives 12), if any.
    pub fn numeric_id(&self) -> Option<u64> {
        let prefix = self.id.trim_end_matches(|c: char| c.is_ascii_digit());
        self.id[prefix.len()..].parse().ok()
    }

    pub fn is_title(&self) -> bool {
        self.slug.eq_ignore_ascii_case("title") && self.tag.eq_ignore_ascii_case("title")
    }

    /// The target if it has any non-blank content, else the source.
    pub fn translation(&self) -> &str {
        if self.target.trim().is_empty() {
            &self.source
        } else {
            &self.target
        }
    }
}

/// Writer configuration.
#[derive(Clone, Debug)]
pub struct WriteOptions {
    /// Byte used for indentation (default: space)
    pub indent_char: u8,
    /// Indentation width per level (default: 2)
    pub indent_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            indent_char: b' ',
            indent_size: 2,
        }
    }
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indent with tabs, one per level.
    pub fn tabs(mut self) -> Self {
        self.indent_char = b'\t';
        self.indent_size = 1;
        self
    }
}

/// Remove code points that XML 1.0 forbids in text content.
pub fn strip_invalid_xml_chars(text: &str) -> Cow<'_, str> {
    fn invalid(c: char) -> bool {
        matches!(c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}')
    }

    if text.contains(invalid) {
        Cow::Owned(text.chars().filter(|&c| !invalid(c)).collect())
    } else {
        Cow::Borrowed(text)
    }
}

/// Text as it goes into the XLIFF document: `\r\n` and lone `\r` become
/// `\n`, and code points XML 1.0 forbids are removed.
pub fn xml_safe(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return strip_invalid_xml_chars(text);
    }
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    Cow::Owned(strip_invalid_xml_chars(&normalized).into_owned())
}

/// Serialize inline nodes as XLIFF mixed content (no indentation).
pub fn inline_to_xml(nodes: &[InlineNode]) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    for node in nodes {
        match node {
            InlineNode::Text(text) => {
                writer.write_event(Event::Text(BytesText::new(&xml_safe(text))))?;
            }
            InlineNode::Ph { id, code }
            | InlineNode::Bpt { id, code }
            | InlineNode::Ept { id, code } => {
                let name = node.element_name().unwrap_or("ph");
                let id = id.to_string();
                let mut start = BytesStart::new(name);
                start.push_attribute(("id", id.as_str()));
                writer.write_event(Event::Start(start))?;
                writer.write_event(Event::Text(BytesText::new(&xml_safe(code))))?;
                writer.write_event(Event::End(BytesEnd::new(name)))?;
            }
        }
    }
    Ok(String::from_utf8(writer.into_inner())?)
}

/// Serialize a complete XLIFF 1.2 document.
pub fn write_xliff(file: &XliffFile, opts: &WriteOptions) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), opts.indent_char, opts.indent_size);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut root = BytesStart::new("xliff");
    root.push_attribute(("version", XLIFF_VERSION));
    root.push_attribute(("xmlns", XLIFF_NAMESPACE));
    writer.write_event(Event::Start(root))?;

    let mut file_start = BytesStart::new("file");
    file_start.push_attribute(("original", &*xml_safe(&file.original)));
    file_start.push_attribute(("source-language", &*xml_safe(&file.source_language)));
    file_start.push_attribute(("target-language", &*xml_safe(&file.target_language)));
    file_start.push_attribute(("datatype", &*xml_safe(&file.datatype)));
    writer.write_event(Event::Start(file_start))?;

    if let Some(original) = &file.original_file {
        writer.write_event(Event::Start(BytesStart::new("originalFile")))?;
        writer.write_event(Event::Text(BytesText::new(&xml_safe(original))))?;
        writer.write_event(Event::End(BytesEnd::new("originalFile")))?;
    }

    writer.write_event(Event::Start(BytesStart::new("body")))?;
    for unit in &file.units {
        let mut start = BytesStart::new("trans-unit");
        start.push_attribute(("id", &*xml_safe(&unit.id)));
        start.push_attribute(("slug", &*xml_safe(&unit.slug)));
        start.push_attribute(("tag", &*xml_safe(&unit.tag)));
        writer.write_event(Event::Start(start))?;
        write_mixed(&mut writer, "source", &unit.source)?;
        write_mixed(&mut writer, "target", &unit.target)?;
        writer.write_event(Event::End(BytesEnd::new("trans-unit")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("body")))?;

    writer.write_event(Event::End(BytesEnd::new("file")))?;
    writer.write_event(Event::End(BytesEnd::new("xliff")))?;

    let mut xml = String::from_utf8(writer.into_inner())?;
    xml.push('\n');
    Ok(xml)
}

/// Write an element whose content is already-escaped mixed XML.
fn write_mixed(writer: &mut Writer<Vec<u8>>, name: &str, inner: &str) -> Result<()> {
    if inner.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(name)))?;
        return Ok(());
    }
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    // A text event suppresses indentation until the matching end tag
    writer.write_event(Event::Text(BytesText::from_escaped(xml_safe(inner))))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn malformed(err: impl Display) -> Error {
    Error::invalid(err.to_string())
}

/// Parse an XLIFF document.
///
/// Elements are matched by local name, so `originalFile` and
/// `x:originalFile` are the same thing. Only the first `<file>` is read.
pub fn read_xliff(xml: &str) -> Result<XliffFile> {
    let mut reader = Reader::from_str(xml);

    let mut file = XliffFile {
        original: String::new(),
        source_language: String::new(),
        target_language: String::new(),
        datatype: String::new(),
        original_file: None,
        units: Vec::new(),
    };

    let mut depth = 0usize;
    let mut saw_root = false;
    let mut files_seen = 0usize;
    let mut original_text: Option<String> = None;
    let mut unit: Option<TransUnit> = None;
    // Depth of the open trans-unit's direct children
    let mut unit_depth = 0usize;

    loop {
        let event = reader.read_event().map_err(|err| {
            Error::invalid(format!(
                "malformed XML at byte {}: {err}",
                reader.buffer_position()
            ))
        })?;

        match event {
            Event::Eof => break,
            Event::Start(start) => {
                saw_root = true;
                let local = start.local_name();
                match local.as_ref() {
                    b"file" => {
                        files_seen += 1;
                        if files_seen == 1 {
                            read_file_attributes(&start, &mut file)?;
                        }
                    }
                    b"originalFile" if files_seen == 1 && file.original_file.is_none() => {
                        original_text = Some(String::new());
                    }
                    b"trans-unit" if files_seen == 1 => {
                        unit = Some(read_unit_attributes(&start)?);
                        unit_depth = depth + 1;
                    }
                    // Only direct children; alt-trans carries its own source/target
                    b"source" | b"target" if unit.is_some() && depth == unit_depth => {
                        // Mixed content: keep the raw markup for the reverter
                        let raw = reader.read_text(start.name()).map_err(malformed)?;
                        if let Some(unit) = unit.as_mut() {
                            if local.as_ref() == b"source" {
                                unit.source = raw.into_owned();
                            } else {
                                unit.target = raw.into_owned();
                            }
                        }
                        continue;
                    }
                    _ => {}
                }
                depth += 1;
            }
            Event::Empty(start) => {
                saw_root = true;
                match start.local_name().as_ref() {
                    b"file" => {
                        files_seen += 1;
                        if files_seen == 1 {
                            read_file_attributes(&start, &mut file)?;
                        }
                    }
                    b"trans-unit" if files_seen == 1 => {
                        file.units.push(read_unit_attributes(&start)?);
                    }
                    b"originalFile" if files_seen == 1 && file.original_file.is_none() => {
                        file.original_file = Some(String::new());
                    }
                    _ => {}
                }
            }
            Event::End(end) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::invalid("unexpected closing tag"))?;
                match end.local_name().as_ref() {
                    b"originalFile" => {
                        if let Some(text) = original_text.take() {
                            file.original_file = Some(text);
                        }
                    }
                    b"trans-unit" => {
                        if let Some(unit) = unit.take() {
                            file.units.push(unit);
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(text) => {
                if let Some(buf) = original_text.as_mut() {
                    buf.push_str(&text.unescape().map_err(malformed)?);
                }
            }
            Event::CData(cdata) => {
                if let Some(buf) = original_text.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&cdata));
                }
            }
            _ => {}
        }
    }

    if !saw_root {
        return Err(Error::invalid("document has no root element"));
    }
    if depth != 0 {
        return Err(Error::invalid("unexpected end of document"));
    }

    Ok(file)
}

fn read_file_attributes(start: &BytesStart<'_>, file: &mut XliffFile) -> Result<()> {
    for attr in start.attributes() {
        let attr = attr.map_err(malformed)?;
        let value = attr.unescape_value().map_err(malformed)?.into_owned();
        match attr.key.local_name().as_ref() {
            b"original" => file.original = value,
            b"source-language" => file.source_language = value,
            b"target-language" => file.target_language = value,
            b"datatype" => file.datatype = value,
            _ => {}
        }
    }
    Ok(())
}

fn read_unit_attributes(start: &BytesStart<'_>) -> Result<TransUnit> {
    let mut unit = TransUnit::default();
    for attr in start.attributes() {
        let attr = attr.map_err(malformed)?;
        let value = attr.unescape_value().map_err(malformed)?.into_owned();
        match attr.key.local_name().as_ref() {
            b"id" => unit.id = value,
            b"slug" => unit.slug = value,
            b"tag" => unit.tag = value,
            _ => {}
        }
    }
    Ok(unit)
}
