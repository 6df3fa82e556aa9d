//! A deliberately small markdown-like converter. It understands exactly what
//! the blog's text posts use: `#`/`##`/`###` headers, `**strong**` and
//! `*emphasis*` spans, `-` bullet lists, `1.` numbered lists and blank-line
//! separated paragraphs. Nested lists, inline code, links and escaping are
//! not supported.
//!
//! The passes run in a fixed order and later passes see the output of earlier
//! ones: headers, then strong, then emphasis, then lists, then paragraphs.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref H1: Regex = Regex::new(r"(?m)^# (.+)$").unwrap();
    static ref H2: Regex = Regex::new(r"(?m)^## (.+)$").unwrap();
    static ref H3: Regex = Regex::new(r"(?m)^### (.+)$").unwrap();
    static ref STRONG: Regex = Regex::new(r"\*\*(.+?)\*\*").unwrap();
    static ref EMPHASIS: Regex = Regex::new(r"\*(.+?)\*").unwrap();
    static ref BULLET: Regex = Regex::new(r"^- (.+)$").unwrap();
    static ref NUMBERED: Regex = Regex::new(r"^\d+\. (.+)$").unwrap();
    static ref HEADING: Regex = Regex::new(r"^<h[1-3]>.*</h[1-3]>$").unwrap();
}

/// Converts `text` to an HTML fragment. Blocks are separated by `\n`.
pub fn to_html(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let text = inline(&headers(&text));
    blocks(&text)
}

fn headers(text: &str) -> String {
    // `^# ` can't match `## `, so the order between levels doesn't matter.
    let text = H1.replace_all(text, "<h1>$1</h1>");
    let text = H2.replace_all(&text, "<h2>$1</h2>");
    H3.replace_all(&text, "<h3>$1</h3>").into_owned()
}

fn inline(text: &str) -> String {
    let text = STRONG.replace_all(text, "<strong>$1</strong>");
    EMPHASIS.replace_all(&text, "<em>$1</em>").into_owned()
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

/// The block a single line belongs to.
enum Line<'a> {
    Blank,
    Heading(&'a str),
    Item(ListKind, &'a str),
    Text(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    if line.trim().is_empty() {
        Line::Blank
    } else if HEADING.is_match(line) {
        Line::Heading(line)
    } else if let Some(c) = BULLET.captures(line) {
        Line::Item(ListKind::Unordered, c.get(1).map_or("", |m| m.as_str()))
    } else if let Some(c) = NUMBERED.captures(line) {
        Line::Item(ListKind::Ordered, c.get(1).map_or("", |m| m.as_str()))
    } else {
        Line::Text(line)
    }
}

/// Groups lines into headings, lists and paragraphs.
fn blocks(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut list: Option<(ListKind, Vec<&str>)> = None;

    for line in text.split('\n') {
        let line = classify(line);

        // Anything other than a list item of the same kind ends the open
        // list; anything other than text ends the open paragraph.
        let continues_list = match (&line, &list) {
            (Line::Item(kind, _), Some((open, _))) => kind == open,
            _ => false,
        };
        if !continues_list {
            if let Some((kind, items)) = list.take() {
                out.push(render_list(kind, &items));
            }
        }
        if !matches!(line, Line::Text(_)) && !paragraph.is_empty() {
            out.push(render_paragraph(&paragraph));
            paragraph.clear();
        }

        match line {
            Line::Blank => {}
            Line::Heading(heading) => out.push(heading.to_owned()),
            Line::Item(kind, item) => match &mut list {
                Some((_, items)) => items.push(item),
                None => list = Some((kind, vec![item])),
            },
            Line::Text(text) => paragraph.push(text),
        }
    }

    if let Some((kind, items)) = list.take() {
        out.push(render_list(kind, &items));
    }
    if !paragraph.is_empty() {
        out.push(render_paragraph(&paragraph));
    }
    out.join("\n")
}

fn render_list(kind: ListKind, items: &[&str]) -> String {
    let mut html = format!("<{}>\n", kind.tag());
    for item in items {
        html.push_str("<li>");
        html.push_str(item);
        html.push_str("</li>\n");
    }
    html.push_str(&format!("</{}>", kind.tag()));
    html
}

fn render_paragraph(lines: &[&str]) -> String {
    format!("<p>{}</p>", lines.join("\n"))
}
