use crate::markdown::Document;
use crate::mentions;
use crate::theme;
use crate::threads::{CommentThread, ThreadStore};

/// Renders a review session as a Markdown summary: open threads first, then
/// resolved ones, each with the anchored text quoted above the conversation.
pub struct ReviewExporter<'a> {
    store: &'a ThreadStore,
    document: &'a Document,
    title: &'a str,
}

impl<'a> ReviewExporter<'a> {
    pub fn new(store: &'a ThreadStore, document: &'a Document, title: &'a str) -> Self {
        Self {
            store,
            document,
            title,
        }
    }

    pub fn generate_markdown(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("# {}\n\n", self.title));

        let (mut open, mut resolved): (Vec<&CommentThread>, Vec<&CommentThread>) =
            self.store.all().iter().partition(|t| !t.is_resolved());
        for group in [&mut open, &mut resolved] {
            group.sort_by(|a, b| {
                a.anchor
                    .start_line
                    .cmp(&b.anchor.start_line)
                    .then(a.severity.rank().cmp(&b.severity.rank()))
            });
        }

        if open.is_empty() && resolved.is_empty() {
            output.push_str("_No review threads._\n");
            return output;
        }

        for (heading, threads) in [("Open", &open), ("Resolved", &resolved)] {
            if threads.is_empty() {
                continue;
            }
            output.push_str(&format!("## {heading} ({})\n\n", threads.len()));
            for thread in threads.iter() {
                self.export_thread(thread, &mut output);
            }
        }

        output
    }

    fn export_thread(&self, thread: &CommentThread, output: &mut String) {
        let label = theme::presentation(thread.severity).label;
        let lines = if thread.anchor.start_line == thread.anchor.end_line {
            format!("line {}", thread.anchor.start_line)
        } else {
            format!("lines {}-{}", thread.anchor.start_line, thread.anchor.end_line)
        };
        output.push_str(&format!("### [{label}] {} ({lines})\n\n", thread.judge_name));

        if let Some(criterion) = &thread.criterion {
            output.push_str(&format!("Criterion: {criterion}\n\n"));
        }

        for line in self.anchored_text(thread).lines() {
            output.push_str("> ");
            output.push_str(line);
            output.push('\n');
        }
        output.push('\n');

        for message in &thread.messages {
            let timestamp = message.created_at.format("%m-%d-%Y %H:%M");
            output.push_str(&message.body);
            output.push('\n');
            let plain = mentions::strip(&message.body);
            if plain != message.body.trim() {
                output.push_str(&format!("Plain: {plain}\n"));
            }
            output.push_str(&format!("*// {}, {timestamp}*\n\n", message.author_name));
        }

        if let (Some(suggestion), Some(status)) = (&thread.suggestion, thread.suggestion_status()) {
            let original = if suggestion.payload.original.is_empty() {
                "(whole line)"
            } else {
                suggestion.payload.original.as_str()
            };
            output.push_str(&format!(
                "Suggestion ({}): `{original}` -> `{}`\n\n",
                status.as_str(),
                suggestion.payload.replacement
            ));
        }

        output.push_str("---\n\n");
    }

    /// Current text of the thread's lines; an end before the start shows just the start line.
    fn anchored_text(&self, thread: &CommentThread) -> String {
        let blocks = self.document.leaf_blocks();
        let start = thread.anchor.start_line;
        let end = thread.anchor.end_line.max(start);
        blocks
            .iter()
            .enumerate()
            .filter(|(i, _)| (start..=end).contains(&(i + 1)))
            .map(|(_, block)| block.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn generate_filename(title: &str) -> String {
        let kebab_title: String = title
            .chars()
            .map(|c| {
                if c.is_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-");

        if kebab_title.is_empty() {
            "review.md".to_string()
        } else {
            format!("{kebab_title}_review.md")
        }
    }
}
