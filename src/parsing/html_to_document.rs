use crate::markdown::{
    Block, Document, HeadingLevel, Inline, ListItem, ListKind, Node, Style, TaskStatus, Text,
    TextNode,
};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use log::warn;
use markup5ever_rcdom::{NodeData, RcDom};
use std::cell::RefCell;
use std::rc::Rc;

type DomNode = Rc<markup5ever_rcdom::Node>;

/// Converts editor-exported HTML into the block tree reviews are anchored to.
///
/// Block elements (`p`, `h1`-`h6`, `pre`, `blockquote`, `ul`/`ol`/`li`, `hr`)
/// become nodes; inline formatting is folded into [`Text`] runs. Loose inline
/// content inside a list item or quote is wrapped in an implicit paragraph, so
/// `<li>text</li>` and `<li><p>text</p></li>` index the same way.
///
/// # Usage
///
/// ```rust
/// use judgemark::parsing::html_to_document::HtmlToDocumentConverter;
///
/// let doc = HtmlToDocumentConverter::new().convert("<p>Hello world</p>");
/// assert_eq!(doc.leaf_count(), 1);
/// ```
pub struct HtmlToDocumentConverter {}

impl HtmlToDocumentConverter {
    pub fn new() -> Self {
        HtmlToDocumentConverter {}
    }

    pub fn convert(&self, html: &str) -> Document {
        let dom = match parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
        {
            Ok(dom) => dom,
            Err(e) => {
                warn!("Failed to read HTML input, using empty document: {e}");
                return Document::new();
            }
        };

        Document {
            blocks: self.visit_flow(&dom.document),
        }
    }

    /// Collects the block children of a flow container (body, div, li, blockquote).
    fn visit_flow(&self, node: &DomNode) -> Vec<Node> {
        let mut blocks = Vec::new();
        let mut pending = Text::default();

        for child in node.children.borrow().iter() {
            if self.is_block_element(child) {
                self.flush_implicit_paragraph(&mut pending, &mut blocks);
                self.visit_block(child, &mut blocks);
            } else {
                self.collect_formatted_content(child, &mut pending, None);
            }
        }
        self.flush_implicit_paragraph(&mut pending, &mut blocks);

        blocks
    }

    fn flush_implicit_paragraph(&self, pending: &mut Text, blocks: &mut Vec<Node>) {
        let content = std::mem::take(pending).trimmed();
        if !content.is_empty() {
            blocks.push(Node::new(Block::Paragraph { content }));
        }
    }

    fn is_block_element(&self, node: &DomNode) -> bool {
        match &node.data {
            NodeData::Element { name, .. } => matches!(
                name.local.as_ref(),
                "html"
                    | "head"
                    | "body"
                    | "div"
                    | "section"
                    | "article"
                    | "p"
                    | "h1"
                    | "h2"
                    | "h3"
                    | "h4"
                    | "h5"
                    | "h6"
                    | "pre"
                    | "blockquote"
                    | "ul"
                    | "ol"
                    | "hr"
                    | "style"
                    | "script"
            ),
            NodeData::Document => true,
            _ => false,
        }
    }

    fn visit_block(&self, node: &DomNode, blocks: &mut Vec<Node>) {
        let NodeData::Element {
            ref name,
            ref attrs,
            ..
        } = node.data
        else {
            blocks.extend(self.visit_flow(node));
            return;
        };

        let tag_name = name.local.as_ref();
        match tag_name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag_name[1..]
                    .parse::<u8>()
                    .ok()
                    .and_then(HeadingLevel::from_u8)
                    .unwrap_or(HeadingLevel::H1);
                let content = self.extract_formatted_content(node);
                blocks.push(Node::new(Block::Heading { level, content }));
            }
            "p" => {
                let content = self.extract_formatted_content(node);
                blocks.push(Node::new(Block::Paragraph { content }));
            }
            "pre" => {
                let language = self.find_code_language(node);
                let mut content = String::new();
                collect_raw_text(node, &mut content);
                if content.ends_with('\n') {
                    content.pop();
                }
                blocks.push(Node::new(Block::CodeBlock { language, content }));
            }
            "blockquote" => {
                let content = self.visit_flow(node);
                blocks.push(Node::new(Block::Quote { content }));
            }
            "ul" | "ol" => {
                let kind = if tag_name == "ol" {
                    let start = self
                        .get_attr_value(attrs, "start")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(1);
                    ListKind::Ordered { start }
                } else {
                    ListKind::Unordered
                };
                let items = self.collect_list_items(node);
                blocks.push(Node::new(Block::List { kind, items }));
            }
            "hr" => blocks.push(Node::new(Block::ThematicBreak)),
            "style" | "script" | "head" => {
                // Do nothing
            }
            _ => blocks.extend(self.visit_flow(node)),
        }
    }

    fn collect_list_items(&self, list: &DomNode) -> Vec<ListItem> {
        let mut items = Vec::new();
        for child in list.children.borrow().iter() {
            let NodeData::Element {
                ref name,
                ref attrs,
                ..
            } = child.data
            else {
                continue;
            };
            if name.local.as_ref() != "li" {
                continue;
            }

            let content = self.visit_flow(child);
            let item = match self.get_attr_value(attrs, "data-checked").as_deref() {
                Some("true") => ListItem::new_task(content, TaskStatus::Checked),
                Some(_) => ListItem::new_task(content, TaskStatus::Unchecked),
                None => ListItem::new(content),
            };
            items.push(item);
        }
        items
    }

    fn find_code_language(&self, pre: &DomNode) -> Option<String> {
        pre.children.borrow().iter().find_map(|child| match &child.data {
            NodeData::Element { name, attrs, .. } if name.local.as_ref() == "code" => self
                .get_attr_value(attrs, "class")
                .and_then(|class| {
                    class
                        .split_whitespace()
                        .find_map(|c| c.strip_prefix("language-").map(str::to_string))
                }),
            _ => None,
        })
    }

    fn extract_formatted_content(&self, node: &DomNode) -> Text {
        let mut text = Text::default();
        for child in node.children.borrow().iter() {
            self.collect_formatted_content(child, &mut text, None);
        }
        text.trimmed()
    }

    fn collect_formatted_content(&self, node: &DomNode, text: &mut Text, current_style: Option<Style>) {
        match &node.data {
            NodeData::Text { contents } => {
                let content = collapse_whitespace(&contents.borrow());
                if !content.is_empty() {
                    text.push_text(TextNode::new(content, current_style));
                }
            }
            NodeData::Element { name, attrs, .. } => {
                let tag_name = name.local.as_ref();

                let style = match tag_name {
                    "strong" | "b" => Some(Style::Strong),
                    "em" | "i" => Some(Style::Emphasis),
                    "code" => Some(Style::Code),
                    "del" | "s" | "strike" => Some(Style::Strikethrough),
                    "a" => {
                        let mut link_text = Text::default();
                        for child in node.children.borrow().iter() {
                            self.collect_formatted_content(child, &mut link_text, current_style.clone());
                        }
                        match self.get_attr_value(attrs, "href") {
                            Some(url) => text.push_inline(Inline::Link {
                                text: link_text,
                                url,
                                title: self.get_attr_value(attrs, "title"),
                            }),
                            None => {
                                for item in link_text {
                                    text.push(item);
                                }
                            }
                        }
                        return;
                    }
                    "img" => {
                        if let Some(url) = self.get_attr_value(attrs, "src") {
                            text.push_inline(Inline::Image {
                                alt_text: self.get_attr_value(attrs, "alt").unwrap_or_default(),
                                url,
                                title: self.get_attr_value(attrs, "title"),
                            });
                        }
                        return;
                    }
                    "br" => {
                        text.push_inline(Inline::LineBreak);
                        return;
                    }
                    _ => current_style.clone(),
                };

                for child in node.children.borrow().iter() {
                    self.collect_formatted_content(child, text, style.clone());
                }
            }
            _ => {
                for child in node.children.borrow().iter() {
                    self.collect_formatted_content(child, text, current_style.clone());
                }
            }
        }
    }

    fn get_attr_value(&self, attrs: &RefCell<Vec<html5ever::Attribute>>, name: &str) -> Option<String> {
        attrs
            .borrow()
            .iter()
            .find(|attr| attr.name.local.as_ref() == name)
            .map(|attr| attr.value.to_string())
    }
}

impl Default for HtmlToDocumentConverter {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_raw_text(node: &DomNode, out: &mut String) {
    match &node.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        _ => {
            for child in node.children.borrow().iter() {
                collect_raw_text(child, out);
            }
        }
    }
}

fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_space = false;
    for c in input.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}
