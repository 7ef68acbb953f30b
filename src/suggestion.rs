use crate::markdown::{Block, Document};
use crate::review::SuggestionPayload;
use log::debug;

/// Record of an applied suggestion, enough to put the block back.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedEdit {
    pub line: usize,
    pub payload: SuggestionPayload,
    pub previous: Block,
    pub applied_text: String,
}

/// Applies `payload` to the leaf block at `line`.
///
/// The first occurrence of `payload.original` is replaced inside the text run
/// that holds it, so surrounding styling survives; an empty `original`
/// replaces the whole text. Returns `None` (document untouched) when the line
/// does not exist or the text to replace is no longer there.
pub fn apply(document: &mut Document, line: usize, payload: &SuggestionPayload) -> Option<AppliedEdit> {
    let block = document.leaf_text_mut(line)?;
    let previous = block.clone();

    if payload.original.is_empty() {
        block.set_plain_text(payload.replacement.clone());
    } else if !block.replace_first(&payload.original, &payload.replacement) {
        debug!("Suggestion target {:?} not found on line {line}", payload.original);
        return None;
    }

    Some(AppliedEdit {
        line,
        payload: payload.clone(),
        previous,
        applied_text: block.plain_text(),
    })
}

/// Takes an [`AppliedEdit`] back out of the document.
///
/// If the line still reads exactly as the edit left it, the previous block is
/// restored verbatim. Otherwise, when later edits touched the line, the first
/// `replacement` is swapped back to `original`. Returns `false` if neither is
/// possible: the line is gone, the whole line was rewritten, or the
/// replacement text no longer appears.
pub fn undo(document: &mut Document, edit: &AppliedEdit) -> bool {
    let Some(block) = document.leaf_text_mut(edit.line) else {
        debug!("Cannot revert line {}: line no longer exists", edit.line);
        return false;
    };
    if block.plain_text() == edit.applied_text {
        *block = edit.previous.clone();
        return true;
    }
    if edit.payload.original.is_empty() {
        debug!("Cannot revert line {}: rewritten line changed since accept", edit.line);
        return false;
    }
    if block.replace_first(&edit.payload.replacement, &edit.payload.original) {
        debug!("Reverted line {} by inverse replacement", edit.line);
        return true;
    }
    debug!(
        "Cannot revert line {}: {:?} no longer present",
        edit.line, edit.payload.replacement
    );
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{Node, Style, Text, TextNode};

    fn styled_doc() -> Document {
        let mut content = Text::from("Cats ");
        content.push_text(TextNode::new("always".to_string(), Some(Style::Strong)));
        content.push_text(TextNode::from(" land upright."));
        Document {
            blocks: vec![
                Node::new(Block::Paragraph { content }),
                Node::new(
                    Block::Paragraph {
                        content: Text::from("Second."),
                    },
                ),
            ],
        }
    }

    fn payload(original: &str, replacement: &str) -> SuggestionPayload {
        SuggestionPayload {
            original: original.to_string(),
            replacement: replacement.to_string(),
        }
    }

    #[test]
    fn test_apply_and_undo_restores_styling() {
        let mut doc = styled_doc();
        let original = doc.clone();

        let edit = apply(&mut doc, 1, &payload("always", "usually")).unwrap();
        assert_eq!(doc.blocks[0].block.plain_text(), "Cats usually land upright.");

        assert!(undo(&mut doc, &edit));
        assert_eq!(doc, original);
    }

    #[test]
    fn test_empty_original_replaces_whole_block() {
        let mut doc = styled_doc();
        apply(&mut doc, 2, &payload("", "Rewritten.")).unwrap();
        assert_eq!(doc.blocks[1].block.plain_text(), "Rewritten.");
    }

    #[test]
    fn test_missing_target_leaves_document_alone() {
        let mut doc = styled_doc();
        let original = doc.clone();

        assert!(apply(&mut doc, 1, &payload("never", "x")).is_none());
        assert!(apply(&mut doc, 9, &payload("", "x")).is_none());
        assert_eq!(doc, original);
    }

    #[test]
    fn test_apply_keeps_neighbouring_runs() {
        let mut doc = styled_doc();
        apply(&mut doc, 1, &payload("land", "fall")).unwrap();

        let Block::Paragraph { content } = &doc.blocks[0].block else {
            panic!("expected paragraph");
        };
        assert_eq!(content.len(), 3);
        assert_eq!(doc.blocks[0].block.plain_text(), "Cats always fall upright.");
    }

    #[test]
    fn test_undo_after_overlapping_edit_swaps_replacement_back() {
        let mut doc = styled_doc();
        let first = apply(&mut doc, 1, &payload("always", "usually")).unwrap();
        apply(&mut doc, 1, &payload("Cats", "Dogs")).unwrap();

        assert!(undo(&mut doc, &first));
        assert_eq!(doc.blocks[0].block.plain_text(), "Dogs always land upright.");
    }

    #[test]
    fn test_undo_refuses_when_replacement_is_gone() {
        let mut doc = styled_doc();
        let edit = apply(&mut doc, 1, &payload("always", "usually")).unwrap();
        doc.leaf_text_mut(1).unwrap().set_plain_text("someone else typed".to_string());

        assert!(!undo(&mut doc, &edit));
        assert_eq!(doc.blocks[0].block.plain_text(), "someone else typed");
    }

    #[test]
    fn test_undo_of_whole_line_rewrite_needs_untouched_line() {
        let mut doc = styled_doc();
        let edit = apply(&mut doc, 2, &payload("", "Rewritten.")).unwrap();
        doc.leaf_text_mut(2).unwrap().set_plain_text("Rewritten again.".to_string());

        assert!(!undo(&mut doc, &edit));
    }
}
