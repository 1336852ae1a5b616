//! Markdown to Atlassian Document Format (ADF) conversion.
//!
//! Jira's REST v3 only accepts rich-text bodies as ADF documents. Handlers
//! take markdown from the pipeline and convert it here. Tables, images and
//! footnotes are flattened to their text.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use serde_json::{Value as JsonValue, json};

use crate::jira::error::TrackerError;

/// Convert markdown to an ADF `doc` node.
pub fn from_markdown(markdown: &str) -> JsonValue {
    let mut builder = AdfBuilder::new();
    builder.process(Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH));
    builder.finish()
}

/// Like [`from_markdown`], rejecting blank input before anything is sent.
pub fn from_markdown_checked(markdown: &str) -> Result<JsonValue, TrackerError> {
    if markdown.trim().is_empty() {
        return Err(TrackerError::Validation(
            "comment body must not be empty".to_owned(),
        ));
    }
    Ok(from_markdown(markdown))
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

struct Frame {
    node_type: &'static str,
    attrs: Option<JsonValue>,
    content: Vec<JsonValue>,
    /// Paragraph opened only to hold inline content of a tight list item or
    /// block quote.
    implicit: bool,
}

impl Frame {
    fn new(node_type: &'static str, attrs: Option<JsonValue>) -> Self {
        Self {
            node_type,
            attrs,
            content: Vec::new(),
            implicit: false,
        }
    }

    fn into_json(self) -> JsonValue {
        let mut node = json!({ "type": self.node_type, "content": self.content });
        if let Some(attrs) = self.attrs {
            node["attrs"] = attrs;
        }
        node
    }

    fn holds_inline(&self) -> bool {
        matches!(self.node_type, "paragraph" | "heading" | "codeBlock")
    }
}

struct AdfBuilder {
    stack: Vec<Frame>,
    marks: Vec<JsonValue>,
}

impl AdfBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Frame::new("doc", None)],
            marks: Vec::new(),
        }
    }

    fn top(&mut self) -> &mut Frame {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn open(&mut self, node_type: &'static str, attrs: Option<JsonValue>) {
        self.close_implicit();
        self.stack.push(Frame::new(node_type, attrs));
    }

    fn close(&mut self) {
        self.close_implicit();
        // The doc frame is never popped here.
        if self.stack.len() > 1
            && let Some(mut frame) = self.stack.pop()
        {
            // A list item must hold at least one block.
            if frame.node_type == "listItem" && frame.content.is_empty() {
                frame.content.push(json!({ "type": "paragraph", "content": [] }));
            }
            let node = frame.into_json();
            self.top().content.push(node);
        }
    }

    fn close_implicit(&mut self) {
        if self.stack.len() > 1 && self.top().implicit {
            if let Some(frame) = self.stack.pop() {
                let node = frame.into_json();
                self.top().content.push(node);
            }
        }
    }

    fn push_block(&mut self, node: JsonValue) {
        self.close_implicit();
        self.top().content.push(node);
    }

    fn push_inline(&mut self, node: JsonValue) {
        if !self.top().holds_inline() {
            let mut paragraph = Frame::new("paragraph", None);
            paragraph.implicit = true;
            self.stack.push(paragraph);
        }
        self.top().content.push(node);
    }

    fn push_text(&mut self, text: &str, code: bool) {
        if text.is_empty() {
            return;
        }
        let in_code_block = self.top().node_type == "codeBlock";
        let mut node = json!({ "type": "text", "text": text });
        if !in_code_block {
            // `code` only combines with `link`.
            let mut marks: Vec<JsonValue> = if code {
                self.marks
                    .iter()
                    .filter(|m| m["type"] == "link")
                    .cloned()
                    .collect()
            } else {
                self.marks.clone()
            };
            if code {
                marks.push(json!({ "type": "code" }));
            }
            if !marks.is_empty() {
                node["marks"] = JsonValue::Array(marks);
            }
        }
        self.push_inline(node);
    }

    fn process<'a>(&mut self, parser: impl Iterator<Item = Event<'a>>) {
        for event in parser {
            match event {
                Event::Start(Tag::Paragraph) => self.open("paragraph", None),
                Event::Start(Tag::Heading { level, .. }) => {
                    self.open("heading", Some(json!({ "level": level as u8 })));
                }
                Event::Start(Tag::BlockQuote(_)) => self.open("blockquote", None),
                Event::Start(Tag::CodeBlock(kind)) => {
                    let attrs = match kind {
                        CodeBlockKind::Fenced(lang) if !lang.is_empty() => {
                            Some(json!({ "language": lang.as_ref() }))
                        }
                        _ => None,
                    };
                    self.open("codeBlock", attrs);
                }
                Event::Start(Tag::List(Some(start))) => {
                    self.open("orderedList", Some(json!({ "order": start })));
                }
                Event::Start(Tag::List(None)) => self.open("bulletList", None),
                Event::Start(Tag::Item) => self.open("listItem", None),
                Event::Start(Tag::Emphasis) => self.marks.push(json!({ "type": "em" })),
                Event::Start(Tag::Strong) => self.marks.push(json!({ "type": "strong" })),
                Event::Start(Tag::Strikethrough) => self.marks.push(json!({ "type": "strike" })),
                Event::Start(Tag::Link { dest_url, .. }) => {
                    self.marks.push(json!({
                        "type": "link",
                        "attrs": { "href": dest_url.as_ref() },
                    }));
                }

                Event::End(
                    TagEnd::Paragraph
                    | TagEnd::Heading(_)
                    | TagEnd::BlockQuote(_)
                    | TagEnd::CodeBlock
                    | TagEnd::List(_)
                    | TagEnd::Item,
                ) => self.close(),
                Event::End(
                    TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link,
                ) => {
                    self.marks.pop();
                }

                Event::Text(text) => self.push_text(&text, false),
                Event::Code(code) => self.push_text(&code, true),
                Event::SoftBreak => self.push_text(" ", false),
                Event::HardBreak => self.push_inline(json!({ "type": "hardBreak" })),
                Event::Rule => self.push_block(json!({ "type": "rule" })),
                Event::Html(html) | Event::InlineHtml(html) => {
                    if !html.trim_start().starts_with("<!--") {
                        self.push_text(&html, false);
                    }
                }
                _ => {}
            }
        }
    }

    fn finish(mut self) -> JsonValue {
        while self.stack.len() > 1 {
            self.close();
        }
        let content = self
            .stack
            .pop()
            .map(|doc| doc.content)
            .unwrap_or_default();
        json!({ "type": "doc", "version": 1, "content": content })
    }
}
