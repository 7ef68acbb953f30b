/// Block tree a review pass is anchored to.
///
/// Positions inside the tree follow a structural addressing scheme rather than
/// plain-text offsets: document content starts at 0, every block node (list
/// items included) costs one position for its opening token and one for its
/// closing token, text costs one position per `char`, and inline atoms
/// (images, line breaks) cost one position each.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub blocks: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading {
        level: HeadingLevel,
        content: Text,
    },
    Paragraph {
        content: Text,
    },
    CodeBlock {
        language: Option<String>,
        content: String,
    },
    Quote {
        content: Vec<Node>,
    },
    List {
        kind: ListKind,
        items: Vec<ListItem>,
    },
    ThematicBreak,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Style {
    Code,
    Emphasis,
    Strong,
    Strikethrough,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextNode {
    pub content: String,
    pub style: Option<Style>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Text(Vec<TextOrInline>);

#[derive(Debug, Clone, PartialEq)]
pub enum TextOrInline {
    Text(TextNode),
    Inline(Inline),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Link {
        text: Text,
        url: String,
        title: Option<String>,
    },
    Image {
        alt_text: String,
        url: String,
        title: Option<String>,
    },
    LineBreak,
    SoftBreak,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeadingLevel {
    H1 = 1,
    H2 = 2,
    H3 = 3,
    H4 = 4,
    H5 = 5,
    H6 = 6,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListKind {
    Ordered { start: u32 },
    Unordered,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskStatus {
    Checked,
    Unchecked,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub content: Vec<Node>,
    pub task_status: Option<TaskStatus>,
}

impl HeadingLevel {
    pub fn from_u8(level: u8) -> Option<Self> {
        match level {
            1 => Some(HeadingLevel::H1),
            2 => Some(HeadingLevel::H2),
            3 => Some(HeadingLevel::H3),
            4 => Some(HeadingLevel::H4),
            5 => Some(HeadingLevel::H5),
            6 => Some(HeadingLevel::H6),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl Node {
    pub fn new(block: Block) -> Self {
        Self { block }
    }

    /// Positions this node occupies, including its own open/close tokens.
    pub fn node_size(&self) -> usize {
        match &self.block {
            Block::ThematicBreak => 1,
            block => block.content_size() + 2,
        }
    }
}

impl Block {
    /// Leaf text-bearing blocks: one review "line" each.
    pub fn is_text_block(&self) -> bool {
        matches!(
            self,
            Block::Heading { .. } | Block::Paragraph { .. } | Block::CodeBlock { .. }
        )
    }

    /// Positions between this block's open and close tokens.
    pub fn content_size(&self) -> usize {
        match self {
            Block::Heading { content, .. } | Block::Paragraph { content } => content.size(),
            Block::CodeBlock { content, .. } => content.chars().count(),
            Block::Quote { content } => nodes_size(content),
            Block::List { items, .. } => items.iter().map(ListItem::node_size).sum(),
            Block::ThematicBreak => 0,
        }
    }

    /// Plain text of a leaf block; container blocks yield an empty string.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Heading { content, .. } | Block::Paragraph { content } => content.plain_text(),
            Block::CodeBlock { content, .. } => content.clone(),
            _ => String::new(),
        }
    }

    /// Replaces the first occurrence of `from` in a leaf block's text.
    ///
    /// The edit stays inside the run that holds the match, so styling, links
    /// and atoms around it survive. A match straddling runs flattens the block
    /// to unstyled text. Returns `false` when `from` is empty or absent.
    pub fn replace_first(&mut self, from: &str, to: &str) -> bool {
        if from.is_empty() {
            return false;
        }
        match self {
            Block::Heading { content, .. } | Block::Paragraph { content } => {
                if content.replace_in_run(from, to) {
                    return true;
                }
                let flat = content.plain_text();
                if !flat.contains(from) {
                    return false;
                }
                *content = Text::from(flat.replacen(from, to, 1));
                true
            }
            Block::CodeBlock { content, .. } => {
                if !content.contains(from) {
                    return false;
                }
                *content = content.replacen(from, to, 1);
                true
            }
            _ => false,
        }
    }

    /// Replaces a leaf block's content with unstyled text. Containers are left untouched.
    pub fn set_plain_text(&mut self, text: String) {
        match self {
            Block::Heading { content, .. } | Block::Paragraph { content } => {
                *content = Text::from(text);
            }
            Block::CodeBlock { content, .. } => *content = text,
            _ => {}
        }
    }
}

fn nodes_size(nodes: &[Node]) -> usize {
    nodes.iter().map(Node::node_size).sum()
}

impl Document {
    pub fn new() -> Self {
        Document { blocks: Vec::new() }
    }

    /// Total positions between the document's (implicit) open and close tokens.
    pub fn content_size(&self) -> usize {
        nodes_size(&self.blocks)
    }

    pub fn leaf_count(&self) -> usize {
        fn count(nodes: &[Node]) -> usize {
            nodes
                .iter()
                .map(|node| match &node.block {
                    block if block.is_text_block() => 1,
                    Block::Quote { content } => count(content),
                    Block::List { items, .. } => items.iter().map(|item| count(&item.content)).sum(),
                    _ => 0,
                })
                .sum()
        }
        count(&self.blocks)
    }

    /// Leaf text-bearing blocks in document order; entry `n` is review line `n + 1`.
    pub fn leaf_blocks(&self) -> Vec<&Block> {
        fn collect<'a>(nodes: &'a [Node], out: &mut Vec<&'a Block>) {
            for node in nodes {
                match &node.block {
                    block if block.is_text_block() => out.push(block),
                    Block::Quote { content } => collect(content, out),
                    Block::List { items, .. } => {
                        for item in items {
                            collect(&item.content, out);
                        }
                    }
                    _ => {}
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.blocks, &mut out);
        out
    }

    /// Mutable access to the leaf block numbered `line` (1-based, same order as the line index).
    pub fn leaf_text_mut(&mut self, line: usize) -> Option<&mut Block> {
        if line == 0 {
            return None;
        }
        let mut seen = 0;
        find_leaf_mut(&mut self.blocks, line, &mut seen)
    }
}

fn find_leaf_mut<'a>(nodes: &'a mut [Node], target: usize, seen: &mut usize) -> Option<&'a mut Block> {
    for node in nodes.iter_mut() {
        if node.block.is_text_block() {
            *seen += 1;
            if *seen == target {
                return Some(&mut node.block);
            }
            continue;
        }
        match &mut node.block {
            Block::Quote { content } => {
                if let Some(found) = find_leaf_mut(content, target, seen) {
                    return Some(found);
                }
            }
            Block::List { items, .. } => {
                for item in items.iter_mut() {
                    if let Some(found) = find_leaf_mut(&mut item.content, target, seen) {
                        return Some(found);
                    }
                }
            }
            _ => {}
        }
    }
    None
}

impl TextNode {
    pub fn new(content: String, style: Option<Style>) -> Self {
        Self { content, style }
    }
}

impl ListItem {
    pub fn new(content: Vec<Node>) -> Self {
        ListItem {
            content,
            task_status: None,
        }
    }

    pub fn new_task(content: Vec<Node>, status: TaskStatus) -> Self {
        ListItem {
            content,
            task_status: Some(status),
        }
    }

    pub fn node_size(&self) -> usize {
        nodes_size(&self.content) + 2
    }
}

// From implementations for Text
impl From<&str> for Text {
    fn from(value: &str) -> Self {
        TextNode::from(value).into()
    }
}

impl From<String> for Text {
    fn from(value: String) -> Self {
        TextNode::from(value).into()
    }
}

impl From<TextNode> for Text {
    fn from(value: TextNode) -> Self {
        Self(vec![TextOrInline::Text(value)])
    }
}

impl From<Vec<TextOrInline>> for Text {
    fn from(value: Vec<TextOrInline>) -> Self {
        Self(value)
    }
}

impl From<&str> for TextNode {
    fn from(value: &str) -> Self {
        value.to_string().into()
    }
}

impl From<String> for TextNode {
    fn from(value: String) -> Self {
        Self {
            content: value,
            ..Default::default()
        }
    }
}

impl Text {
    pub fn push(&mut self, item: TextOrInline) {
        self.0.push(item);
    }

    pub fn push_text(&mut self, node: TextNode) {
        self.0.push(TextOrInline::Text(node));
    }

    pub fn push_inline(&mut self, inline: Inline) {
        self.0.push(TextOrInline::Inline(inline));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TextOrInline> {
        self.0.iter()
    }

    /// Strips leading whitespace of the first run and trailing whitespace of the
    /// last one, dropping runs that end up empty.
    pub fn trimmed(mut self) -> Text {
        if let Some(TextOrInline::Text(first)) = self.0.first_mut() {
            first.content = first.content.trim_start().to_string();
        }
        if let Some(TextOrInline::Text(last)) = self.0.last_mut() {
            last.content = last.content.trim_end().to_string();
        }
        self.0
            .retain(|item| !matches!(item, TextOrInline::Text(node) if node.content.is_empty()));
        self
    }

    /// Replaces the first occurrence of `from` found entirely inside one text
    /// run (link labels included). Image alt text is never edited.
    fn replace_in_run(&mut self, from: &str, to: &str) -> bool {
        for item in self.0.iter_mut() {
            match item {
                TextOrInline::Text(node) if node.content.contains(from) => {
                    node.content = node.content.replacen(from, to, 1);
                    return true;
                }
                TextOrInline::Inline(Inline::Link { text, .. }) => {
                    if text.replace_in_run(from, to) {
                        return true;
                    }
                }
                _ => {}
            }
        }
        false
    }

    /// Structural size: chars of text runs, link labels inline, atoms count one.
    pub fn size(&self) -> usize {
        self.0
            .iter()
            .map(|item| match item {
                TextOrInline::Text(node) => node.content.chars().count(),
                TextOrInline::Inline(Inline::Link { text, .. }) => text.size(),
                TextOrInline::Inline(_) => 1,
            })
            .sum()
    }

    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for item in &self.0 {
            match item {
                TextOrInline::Text(node) => out.push_str(&node.content),
                TextOrInline::Inline(Inline::Link { text, .. }) => out.push_str(&text.plain_text()),
                TextOrInline::Inline(Inline::Image { alt_text, .. }) => {
                    if !alt_text.is_empty() {
                        out.push_str(alt_text);
                    }
                }
                TextOrInline::Inline(Inline::LineBreak) => out.push('\n'),
                TextOrInline::Inline(Inline::SoftBreak) => out.push(' '),
            }
        }
        out
    }
}

impl IntoIterator for Text {
    type Item = TextOrInline;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(text: &str) -> Node {
        Node::new(
            Block::Paragraph {
                content: Text::from(text),
            },
        )
    }

    #[test]
    fn test_sizes_count_open_and_close_tokens() {
        let doc = Document {
            blocks: vec![
                paragraph("abc"),
                Node::new(Block::ThematicBreak),
                Node::new(
                    Block::List {
                        kind: ListKind::Unordered,
                        items: vec![ListItem::new(vec![paragraph("de")])],
                    },
                ),
            ],
        };

        // paragraph 3+2, rule 1, list (item (para 2+2) +2) +2
        assert_eq!(doc.content_size(), 5 + 1 + 8);
        assert_eq!(doc.leaf_count(), 2);
    }

    #[test]
    fn test_inline_atoms_and_links() {
        let mut text = Text::from("ab");
        text.push_inline(Inline::LineBreak);
        text.push_inline(Inline::Link {
            text: Text::from("xyz"),
            url: "https://example.com".to_string(),
            title: None,
        });

        assert_eq!(text.size(), 2 + 1 + 3);
        assert_eq!(text.plain_text(), "ab\nxyz");
    }

    #[test]
    fn test_leaf_text_mut_walks_nested_lists_in_order() {
        let mut doc = Document {
            blocks: vec![
                paragraph("one"),
                Node::new(
                    Block::List {
                        kind: ListKind::Ordered { start: 1 },
                        items: vec![ListItem::new(vec![
                            paragraph("two"),
                            Node::new(
                                Block::List {
                                    kind: ListKind::Unordered,
                                    items: vec![ListItem::new(vec![paragraph("three")])],
                                },
                            ),
                        ])],
                    },
                ),
                paragraph("four"),
            ],
        };

        assert_eq!(doc.leaf_text_mut(3).map(|b| b.plain_text()), Some("three".to_string()));
        assert_eq!(doc.leaf_text_mut(4).map(|b| b.plain_text()), Some("four".to_string()));
        assert!(doc.leaf_text_mut(0).is_none());
        assert!(doc.leaf_text_mut(5).is_none());
    }

    fn styled_paragraph() -> Block {
        let mut content = Text::from("The ");
        content.push_text(TextNode::new("rover".to_string(), Some(Style::Strong)));
        content.push_text(TextNode::from(" launches, see "));
        content.push_inline(Inline::Link {
            text: Text::from("docs"),
            url: "https://example.com/docs".to_string(),
            title: None,
        });
        content.push_text(TextNode::from(" "));
        content.push_inline(Inline::Image {
            alt_text: "diagram".to_string(),
            url: "diagram.png".to_string(),
            title: None,
        });
        Block::Paragraph { content }
    }

    #[test]
    fn test_replace_first_keeps_styles_links_and_images() {
        let mut block = styled_paragraph();
        let before = block.content_size();

        assert!(block.replace_first("launches", "flies"));
        assert_eq!(block.plain_text(), "The rover flies, see docs diagram");
        assert_eq!(block.content_size(), before - 3);

        let Block::Paragraph { content } = &block else {
            panic!("expected paragraph");
        };
        let items: Vec<&TextOrInline> = content.iter().collect();
        assert_eq!(items.len(), 6);
        assert!(matches!(items[1], TextOrInline::Text(node) if node.style == Some(Style::Strong)));
        assert!(matches!(items[3], TextOrInline::Inline(Inline::Link { .. })));
        assert!(matches!(items[5], TextOrInline::Inline(Inline::Image { .. })));
    }

    #[test]
    fn test_replace_first_inside_link_label() {
        let mut block = styled_paragraph();
        assert!(block.replace_first("docs", "manual"));

        let Block::Paragraph { content } = &block else {
            panic!("expected paragraph");
        };
        let link = content.iter().nth(3);
        assert!(matches!(
            link,
            Some(TextOrInline::Inline(Inline::Link { text, url, .. }))
                if text.plain_text() == "manual" && url == "https://example.com/docs"
        ));
    }

    #[test]
    fn test_replace_first_across_runs_flattens() {
        let mut block = styled_paragraph();
        assert!(block.replace_first("The rover", "A lander"));
        assert_eq!(block.plain_text(), "A lander launches, see docs diagram");

        assert!(!block.replace_first("absent", "x"));
        assert!(!block.replace_first("", "x"));
    }
}
