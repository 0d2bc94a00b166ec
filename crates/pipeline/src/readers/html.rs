//! HTML reader.

use scraper::{ElementRef, Html, Selector};
use strata_schema::Value;

/// Visible text is cut to this many characters.
const MAX_TEXT_CHARS: usize = 1000;

/// Read an HTML page into title, headings, links and visible text.
///
/// `category` and `author` are lifted from the last `span.category` /
/// `span.author` when the page has them. Content that is not UTF-8 is not a
/// page and yields `None`.
pub fn read_html(content: &[u8]) -> Option<Value> {
    let Ok(source) = std::str::from_utf8(content) else {
        tracing::debug!("HTML content is not valid UTF-8");
        return None;
    };
    let document = Html::parse_document(source);

    let title = select_all(&document, "title")
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string());

    let headings: Vec<Value> = select_all(&document, "h1, h2, h3")
        .map(|el| Value::Text(stripped_text(&el)))
        .collect();

    let links: Vec<Value> = select_all(&document, "a[href]")
        .filter_map(|el| el.value().attr("href"))
        .map(Value::from)
        .collect();

    let mut fields = vec![
        ("title", Value::from(title)),
        ("headings", Value::List(headings)),
        ("links", Value::List(links)),
        ("text", Value::Text(visible_text(&document))),
    ];

    for (key, selector) in [("category", "span.category"), ("author", "span.author")] {
        if let Some(el) = select_all(&document, selector).last() {
            fields.push((key, Value::Text(stripped_text(&el))));
        }
    }

    Some(Value::map(fields))
}

fn select_all<'a>(document: &'a Html, selector: &str) -> impl Iterator<Item = ElementRef<'a>> {
    let selector = Selector::parse(selector).ok();
    let matches: Vec<ElementRef<'a>> = match &selector {
        Some(selector) => document.select(selector).collect(),
        None => {
            tracing::warn!("Invalid CSS selector, ignoring");
            Vec::new()
        }
    };
    matches.into_iter()
}

/// Concatenate an element's text pieces, each trimmed.
fn stripped_text(el: &ElementRef<'_>) -> String {
    el.text().map(str::trim).collect()
}

/// All text nodes outside `<script>`/`<style>`, trimmed and joined by one
/// space.
fn visible_text(document: &Html) -> String {
    let mut pieces = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|el| el.name()))
            .map(|name| matches!(name, "script" | "style"))
            .unwrap_or(false);
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            pieces.push(trimmed);
        }
    }

    pieces.join(" ").chars().take(MAX_TEXT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>  Field Notes  </title>
  <style>body { color: red; }</style>
  <script>var hidden = true;</script>
</head>
<body>
  <h1>Intro</h1>
  <p>First <b>bold</b> paragraph.</p>
  <h3>Details</h3>
  <a href="/one">one</a>
  <a name="anchor">no href</a>
  <a href="https://example.com/two">two</a>
  <span class="category">Nature</span>
  <span class="author">A. Writer</span>
  <span class="author">B. Writer</span>
  <h2>Outro</h2>
</body>
</html>"#;

    fn fields(value: Value) -> std::collections::BTreeMap<String, Value> {
        match value {
            Value::Map(fields) => fields,
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn test_reads_page_structure() {
        let fields = fields(read_html(PAGE.as_bytes()).unwrap());

        assert_eq!(fields["title"], Value::from("Field Notes"));
        assert_eq!(
            fields["headings"],
            Value::from(vec!["Intro", "Details", "Outro"])
        );
        assert_eq!(
            fields["links"],
            Value::from(vec!["/one", "https://example.com/two"])
        );
        assert_eq!(fields["category"], Value::from("Nature"));
        assert_eq!(fields["author"], Value::from("B. Writer"));
    }

    #[test]
    fn test_visible_text_skips_scripts_and_styles() {
        let fields = fields(read_html(PAGE.as_bytes()).unwrap());
        let Value::Text(text) = &fields["text"] else {
            panic!("text should be a string");
        };

        assert!(text.starts_with("Field Notes Intro First bold paragraph."));
        assert!(!text.contains("hidden"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn test_text_is_truncated() {
        let page = format!("<html><body><p>{}</p></body></html>", "é".repeat(1500));
        let fields = fields(read_html(page.as_bytes()).unwrap());
        let Value::Text(text) = &fields["text"] else {
            panic!("text should be a string");
        };
        assert_eq!(text.chars().count(), MAX_TEXT_CHARS);
    }

    #[test]
    fn test_minimal_page() {
        let fields = fields(read_html(b"<p>just text</p>").unwrap());
        assert_eq!(fields["title"], Value::Null);
        assert_eq!(fields["headings"], Value::List(vec![]));
        assert!(!fields.contains_key("category"));
        assert!(!fields.contains_key("author"));
    }

    #[test]
    fn test_binary_content_is_not_a_page() {
        assert!(read_html(&[0xff, 0xd8, 0xff, 0xe0, 0x00]).is_none());
    }
}
