// NFO document load/save.
//
// Parsing goes through quick-xml's pull reader with text trimming disabled,
// so whitespace, comments and declarations survive a load/save round trip
// unchanged. Saving writes a sibling temp file and renames it over the target.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::element::{Element, Layout, Node, INDENT};
use crate::error::NfoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn native() -> Self {
        if cfg!(windows) {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    /// The document's own convention, or the platform's if it has no line breaks.
    ///
    /// An existing convention wins over the platform's: a CRLF file edited on
    /// Linux stays CRLF, so inserted lines match the rest of the file.
    pub fn detect(xml: &str) -> Self {
        if xml.contains("\r\n") {
            LineEnding::CrLf
        } else if xml.contains('\n') {
            LineEnding::Lf
        } else {
            Self::native()
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// A parsed metadata file: one root element plus whatever surrounds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NfoDocument {
    prolog: Vec<Node>,
    root: Element,
    epilog: Vec<Node>,
    line_ending: LineEnding,
}

impl NfoDocument {
    pub fn load(path: &Path) -> Result<Self, NfoError> {
        let xml = fs::read_to_string(path).map_err(|source| NfoError::Io {
            operation: "Failed to read",
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&xml)
    }

    pub fn parse(xml: &str) -> Result<Self, NfoError> {
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
        let line_ending = LineEnding::detect(xml);

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root: Option<Element> = None;
        let mut open: Vec<Element> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|source| NfoError::Xml {
                position: reader.error_position() as u64,
                source,
            })?;

            let node = match event {
                Event::Start(start) => {
                    open.push(element_from_start(&start, false)?);
                    continue;
                }
                Event::End(_) => match open.pop() {
                    Some(element) => Node::Element(element),
                    None => return Err(NfoError::Malformed("unexpected end tag".into())),
                },
                Event::Empty(start) => Node::Element(element_from_start(&start, true)?),
                Event::Text(text) => Node::Text(raw(&text)?),
                Event::CData(data) => Node::CData(raw(&data)?),
                Event::Comment(comment) => Node::Comment(raw(&comment)?),
                Event::Decl(decl) => Node::Declaration(raw(&decl)?),
                Event::PI(pi) => Node::ProcessingInstruction(raw(&pi)?),
                Event::DocType(doctype) => Node::DocType(raw(&doctype)?),
                Event::Eof => break,
            };

            if let Some(parent) = open.last_mut() {
                parent.push(node);
                continue;
            }

            match node {
                Node::Element(element) if root.is_none() => root = Some(element),
                Node::Element(element) => {
                    return Err(NfoError::Malformed(format!(
                        "second root element <{}>",
                        element.name()
                    )))
                }
                Node::Text(text) if !text.trim().is_empty() => {
                    return Err(NfoError::Malformed("text outside the root element".into()))
                }
                other if root.is_none() => prolog.push(other),
                other => epilog.push(other),
            }
        }

        if let Some(unclosed) = open.last() {
            return Err(NfoError::Malformed(format!(
                "unclosed element <{}>",
                unclosed.name()
            )));
        }
        let root = root.ok_or_else(|| NfoError::Malformed("no root element".into()))?;

        Ok(Self {
            prolog,
            root,
            epilog,
            line_ending,
        })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Layout for inserted markup: the root's child indentation as the step,
    /// or [`INDENT`] when the document has none.
    pub fn layout(&self) -> Layout {
        let unit = self
            .root
            .child_indent()
            .filter(|indent| !indent.is_empty())
            .unwrap_or(INDENT);
        Layout::new(unit, self.line_ending)
    }

    /// Serialize as UTF-8 (no byte-order mark).
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        for node in &self.prolog {
            node.write_to(&mut out);
        }
        self.root.write_to(&mut out);
        for node in &self.epilog {
            node.write_to(&mut out);
        }
        out
    }

    /// Replace the file at `path` with this document.
    ///
    /// The content is written to a temp file in the same directory, given
    /// the original file's permissions, and renamed over `path`, so readers
    /// see either the old or the new file.
    pub fn save(&self, path: &Path) -> Result<(), NfoError> {
        let xml = self.to_xml();
        let io_error = |operation: &'static str| {
            move |source: std::io::Error| NfoError::Io {
                operation,
                path: path.to_path_buf(),
                source,
            }
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = tempfile::NamedTempFile::new_in(dir)
            .map_err(io_error("Failed to create temp file for"))?;
        temp.write_all(xml.as_bytes())
            .map_err(io_error("Failed to write"))?;
        temp.as_file()
            .sync_all()
            .map_err(io_error("Failed to flush"))?;

        if let Ok(metadata) = fs::metadata(path) {
            temp.as_file()
                .set_permissions(metadata.permissions())
                .map_err(io_error("Failed to copy permissions to"))?;
        }

        temp.persist(path)
            .map_err(|e| io_error("Failed to replace")(e.error))?;

        tracing::debug!(path = %path.display(), bytes = xml.len(), "Saved document");
        Ok(())
    }
}

fn element_from_start(start: &BytesStart, self_closing: bool) -> Result<Element, NfoError> {
    let name = str::from_utf8(start.name().as_ref())?.to_string();

    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = str::from_utf8(attribute.key.as_ref())?.to_string();
        let value = str::from_utf8(&attribute.value)?.to_string();
        attributes.push((key, value));
    }

    Ok(Element::from_parts(name, attributes, self_closing))
}

fn raw(bytes: &[u8]) -> Result<String, NfoError> {
    Ok(str::from_utf8(bytes)?.to_string())
}
