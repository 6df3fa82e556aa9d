//! Serializes a parsed [`Html`] document in an indented, one-node-per-line
//! layout: every tag and every non-blank text node gets its own line,
//! indented by one space per level of nesting. Whitespace-only text is
//! dropped so that re-parsing and re-printing a document is stable.
//!
//! The printer can also splice a single element in as the first child of
//! another element while printing, which is how the index gains new entries
//! without mutating the parsed tree.

use pulldown_cmark::escape::escape_html;
use scraper::{ElementRef, Html, Node};
use std::io;

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link",
    "meta", "param", "source", "track", "wbr",
];

/// Elements whose contents are whitespace-sensitive or raw text. They are
/// printed exactly as parsed, on a single line.
const VERBATIM_ELEMENTS: &[&str] = &["pre", "textarea", "script", "style"];

/// Pretty-prints `document`.
pub fn prettify(document: &Html) -> io::Result<String> {
    let mut printer = Printer::default();
    printer.document(document)?;
    Ok(printer.out)
}

/// Pretty-prints `document` with `child` inserted as the first child of
/// `parent`. `parent` must belong to `document`.
pub fn prettify_with_first_child<'a>(
    document: &'a Html,
    parent: ElementRef<'a>,
    child: ElementRef<'a>,
) -> io::Result<String> {
    let mut printer = Printer {
        out: String::new(),
        prepend: Some((parent, child)),
    };
    printer.document(document)?;
    Ok(printer.out)
}

#[derive(Default)]
struct Printer<'a> {
    out: String,
    prepend: Option<(ElementRef<'a>, ElementRef<'a>)>,
}

impl<'a> Printer<'a> {
    fn document(&mut self, document: &'a Html) -> io::Result<()> {
        for node in document.tree.root().children() {
            match node.value() {
                Node::Doctype(doctype) => {
                    let mut line = format!("<!DOCTYPE {}", doctype.name());
                    if !doctype.public_id().is_empty() {
                        line.push_str(&format!(r#" PUBLIC "{}""#, doctype.public_id()));
                    }
                    if !doctype.system_id().is_empty() {
                        line.push_str(&format!(r#" "{}""#, doctype.system_id()));
                    }
                    line.push('>');
                    self.line(0, &line);
                }
                Node::Comment(comment) => self.comment(0, comment),
                Node::Element(_) => {
                    if let Some(element) = ElementRef::wrap(node) {
                        self.element(element, 0)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn element(&mut self, element: ElementRef<'a>, depth: usize) -> io::Result<()> {
        let name = element.value().name();

        if VERBATIM_ELEMENTS.contains(&name) {
            self.line(depth, &element.html());
            return Ok(());
        }

        let mut open = format!("<{}", name);
        for (attr, value) in element.value().attrs() {
            open.push(' ');
            open.push_str(attr);
            open.push_str("=\"");
            escape_html(&mut open, value)?;
            open.push('"');
        }
        if VOID_ELEMENTS.contains(&name) {
            open.push_str("/>");
            self.line(depth, &open);
            return Ok(());
        }
        open.push('>');
        self.line(depth, &open);

        if let Some((parent, child)) = self.prepend {
            if parent == element {
                self.element(child, depth + 1)?;
            }
        }

        for node in element.children() {
            match node.value() {
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(node) {
                        self.element(child, depth + 1)?;
                    }
                }
                Node::Text(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        let mut escaped = String::new();
                        escape_html(&mut escaped, text)?;
                        self.line(depth + 1, &escaped);
                    }
                }
                Node::Comment(comment) => self.comment(depth + 1, comment),
                _ => {}
            }
        }

        self.line(depth, &format!("</{}>", name));
        Ok(())
    }

    fn comment(&mut self, depth: usize, comment: &str) {
        self.line(depth, &format!("<!--{}-->", comment));
    }

    fn line(&mut self, depth: usize, s: &str) {
        for _ in 0..depth {
            self.out.push(' ');
        }
        self.out.push_str(s);
        self.out.push('\n');
    }
}
