use std::borrow::Cow;

use quick_xml::escape::{escape, partial_escape, unescape};

use crate::document::LineEnding;

/// Indentation step used when a document has no indented content to copy.
pub const INDENT: &str = "  ";

/// How inserted markup is laid out: one indentation step and the line break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub unit: String,
    pub line_ending: LineEnding,
}

impl Layout {
    pub fn new(unit: impl Into<String>, line_ending: LineEnding) -> Self {
        Self {
            unit: unit.into(),
            line_ending,
        }
    }

    /// Indentation one level below `indent`.
    pub fn nested(&self, indent: &str) -> String {
        format!("{indent}{}", self.unit)
    }
}

/// A node in the document tree.
///
/// Text, attribute values and markup are kept exactly as they appeared in the
/// source (entities still escaped), so untouched parts of a document are
/// written back byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    /// `<?xml ...?>` body.
    Declaration(String),
    ProcessingInstruction(String),
    DocType(String),
}

impl Node {
    /// Plain text, escaped for use as character data.
    pub fn text(plain: &str) -> Self {
        Node::Text(partial_escape(plain).into_owned())
    }

    /// True for text nodes that hold only whitespace.
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Node::Text(raw) if raw.trim().is_empty())
    }

    pub(crate) fn write_to(&self, out: &mut String) {
        match self {
            Node::Element(element) => element.write_to(out),
            Node::Text(raw) => out.push_str(raw),
            Node::CData(raw) => {
                out.push_str("<![CDATA[");
                out.push_str(raw);
                out.push_str("]]>");
            }
            Node::Comment(raw) => {
                out.push_str("<!--");
                out.push_str(raw);
                out.push_str("-->");
            }
            Node::Declaration(raw) | Node::ProcessingInstruction(raw) => {
                out.push_str("<?");
                out.push_str(raw);
                out.push_str("?>");
            }
            Node::DocType(raw) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(raw.trim_start());
                out.push('>');
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    /// `(name, raw value)` in source order.
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
    /// Written as `<name/>` while it has no children.
    self_closing: bool,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: false,
        }
    }

    pub(crate) fn from_parts(name: String, attributes: Vec<(String, String)>, self_closing: bool) -> Self {
        Self {
            name,
            attributes,
            children: Vec::new(),
            self_closing,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: &str) -> Self {
        self.attributes.push((name.into(), escape(value).into_owned()));
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.children = vec![Node::text(text)];
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unescaped value of an attribute.
    pub fn attribute(&self, name: &str) -> Option<Cow<'_, str>> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, raw)| unescape_lossy(raw))
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub(crate) fn push(&mut self, node: Node) {
        self.children.push(node);
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn find_child(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|element| element.name == name)
    }

    /// First descendant (document order) matching `pred`.
    pub fn find_descendant<P>(&self, pred: &P) -> Option<&Element>
    where
        P: Fn(&Element) -> bool,
    {
        for child in self.child_elements() {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(pred) {
                return Some(found);
            }
        }
        None
    }

    /// Unescaped character data of the direct children, CDATA included.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for child in &self.children {
            match child {
                Node::Text(raw) => text.push_str(&unescape_lossy(raw)),
                Node::CData(raw) => text.push_str(raw),
                _ => {}
            }
        }
        text
    }

    /// Remove every child element matching `pred`, together with the
    /// indentation whitespace in front of it. Returns how many were removed.
    pub fn remove_children<P>(&mut self, pred: P) -> usize
    where
        P: Fn(&Element) -> bool,
    {
        let mut removed = 0;
        let mut i = 0;
        while i < self.children.len() {
            if matches!(&self.children[i], Node::Element(element) if pred(element)) {
                self.children.remove(i);
                if i > 0 && self.children[i - 1].is_whitespace() {
                    self.children.remove(i - 1);
                    i -= 1;
                }
                removed += 1;
            } else {
                i += 1;
            }
        }
        removed
    }

    /// Append `child` on its own line.
    ///
    /// `indent` is the leading whitespace of this element's own line. The
    /// child copies the indentation of existing siblings when there are any,
    /// otherwise it goes one [`Layout::unit`] deeper than `indent`. The end
    /// tag is lined up with `indent` unless whitespace before it already
    /// exists, in which case that is kept.
    pub fn append_indented(&mut self, child: Element, indent: &str, layout: &Layout) {
        let eol = layout.line_ending.as_str();
        let child_indent = self
            .sibling_indent()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{eol}{}", layout.nested(indent)));
        let closing_indent = format!("{eol}{indent}");

        self.self_closing = false;

        if self.children.iter().all(Node::is_whitespace) {
            self.children = vec![
                Node::Text(child_indent),
                Node::Element(child),
                Node::Text(closing_indent),
            ];
        } else if self.children.last().is_some_and(Node::is_whitespace) {
            let at = self.children.len() - 1;
            self.children.insert(at, Node::Element(child));
            self.children.insert(at, Node::Text(child_indent));
        } else {
            self.children.push(Node::Text(child_indent));
            self.children.push(Node::Element(child));
            self.children.push(Node::Text(closing_indent));
        }
    }

    /// The first child element called `name`, appended (indented) if missing.
    pub fn child_or_append(&mut self, name: &str, indent: &str, layout: &Layout) -> &mut Element {
        let is_named = |node: &Node| matches!(node, Node::Element(element) if element.name == name);

        let index = match self.children.iter().position(is_named) {
            Some(index) => index,
            None => {
                self.append_indented(Element::new(name), indent, layout);
                self.children
                    .iter()
                    .rposition(is_named)
                    .unwrap_or_else(|| unreachable!("<{name}> was just appended"))
            }
        };

        match &mut self.children[index] {
            Node::Element(element) => element,
            _ => unreachable!("index points at an element"),
        }
    }

    /// Leading whitespace on the line of the first child element that starts
    /// a line of its own.
    pub fn child_indent(&self) -> Option<&str> {
        self.sibling_indent().map(line_indent)
    }

    /// Leading whitespace on the line of the first child element called
    /// `name`, if it starts a line of its own.
    pub fn child_indent_of(&self, name: &str) -> Option<&str> {
        self.children.windows(2).find_map(|pair| match pair {
            [Node::Text(raw), Node::Element(element)] if element.name == name => {
                is_line_break(raw).then(|| line_indent(raw))
            }
            _ => None,
        })
    }

    /// Whitespace in front of the first child element that starts a line.
    fn sibling_indent(&self) -> Option<&str> {
        self.children.windows(2).find_map(|pair| match pair {
            [Node::Text(raw), Node::Element(_)] if is_line_break(raw) => Some(raw.as_str()),
            _ => None,
        })
    }

    pub(crate) fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (name, raw) in &self.attributes {
            // Raw values keep their source escaping; only the quote changes.
            let quote = if raw.contains('"') { '\'' } else { '"' };
            out.push(' ');
            out.push_str(name);
            out.push('=');
            out.push(quote);
            out.push_str(raw);
            out.push(quote);
        }

        if self.children.is_empty() && self.self_closing {
            out.push_str("/>");
            return;
        }

        out.push('>');
        for child in &self.children {
            child.write_to(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn is_line_break(raw: &str) -> bool {
    raw.trim().is_empty() && raw.contains('\n')
}

// Whitespace after the last line break.
fn line_indent(raw: &str) -> &str {
    raw.rsplit('\n').next().unwrap_or(raw)
}

fn unescape_lossy(raw: &str) -> Cow<'_, str> {
    unescape(raw).unwrap_or(Cow::Borrowed(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_spaces() -> Layout {
        Layout::new(INDENT, LineEnding::Lf)
    }

    fn rendered(element: &Element) -> String {
        let mut out = String::new();
        element.write_to(&mut out);
        out
    }

    #[test]
    fn test_text_and_attributes_are_escaped() {
        let element = Element::new("title")
            .with_attribute("lang", "a\"b")
            .with_text("Tom & Jerry <1>");

        assert_eq!(element.attribute("lang").as_deref(), Some("a\"b"));
        assert_eq!(element.text(), "Tom & Jerry <1>");
        assert_eq!(
            rendered(&element),
            "<title lang=\"a&quot;b\">Tom &amp; Jerry &lt;1&gt;</title>"
        );
    }

    #[test]
    fn test_append_into_empty_element() {
        let mut parent = Element::new("ratings");
        parent.append_indented(Element::new("rating").with_text("x"), "  ", &two_spaces());

        assert_eq!(rendered(&parent), "<ratings>\n    <rating>x</rating>\n  </ratings>");
    }

    #[test]
    fn test_append_reuses_sibling_indent() {
        let mut parent = Element::new("movie");
        parent.push(Node::Text("\n\t".into()));
        parent.push(Node::Element(Element::new("title").with_text("Heat")));
        parent.push(Node::Text("\n".into()));

        parent.append_indented(Element::new("year").with_text("1995"), "", &two_spaces());

        assert_eq!(
            rendered(&parent),
            "<movie>\n\t<title>Heat</title>\n\t<year>1995</year>\n</movie>"
        );
    }

    #[test]
    fn test_append_follows_tab_indentation() {
        let mut parent = Element::new("ratings");
        parent.append_indented(Element::new("rating"), "\t", &Layout::new("\t", LineEnding::CrLf));

        assert_eq!(rendered(&parent), "<ratings>\r\n\t\t<rating></rating>\r\n\t</ratings>");
    }

    #[test]
    fn test_child_indent() {
        let mut movie = Element::new("movie");
        movie.push(Node::Element(Element::new("title")));
        movie.push(Node::Text("\n\n    ".into()));
        movie.push(Node::Element(Element::new("year")));
        movie.push(Node::Text("\n".into()));

        assert_eq!(movie.child_indent(), Some("    "));
        assert_eq!(movie.child_indent_of("year"), Some("    "));
        assert_eq!(movie.child_indent_of("title"), None);
        assert_eq!(Element::new("empty").child_indent(), None);
    }

    #[test]
    fn test_remove_children_takes_leading_whitespace() {
        let mut parent = Element::new("ratings");
        let layout = two_spaces();
        parent.append_indented(Element::new("rating").with_attribute("name", "tmdb"), "  ", &layout);
        parent.append_indented(Element::new("rating").with_attribute("name", "imdb"), "  ", &layout);

        let removed = parent.remove_children(|e| e.attribute("name").as_deref() == Some("imdb"));

        assert_eq!(removed, 1);
        assert_eq!(
            rendered(&parent),
            "<ratings>\n    <rating name=\"tmdb\"></rating>\n  </ratings>"
        );
    }

    #[test]
    fn test_find_descendant_in_document_order() {
        let mut inner = Element::new("set");
        inner.push(Node::Element(Element::new("uniqueid").with_text("first")));
        let mut root = Element::new("movie");
        root.push(Node::Element(inner));
        root.push(Node::Element(Element::new("uniqueid").with_text("second")));

        let found = root.find_descendant(&|e: &Element| e.name() == "uniqueid").unwrap();
        assert_eq!(found.text(), "first");
    }

    #[test]
    fn test_text_keeps_unknown_entities() {
        let mut element = Element::new("plot");
        element.push(Node::Text("caf&eacute; &amp; bar".into()));
        assert_eq!(element.text(), "caf&eacute; &amp; bar");
    }
}
