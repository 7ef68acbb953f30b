use crate::line_index::{LineSpan, build_line_index};
use crate::markdown::Document;
use crate::placement::{Placement, PopoverKind, Rect, place};
use crate::review::{Annotation, Severity};
use crate::settings;
use crate::span_resolver::{ResolvedRange, resolve};
use crate::theme::{self, SeverityPresentation};
use log::debug;

/// An annotation that landed in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub annotation_id: String,
    pub range: ResolvedRange,
    pub severity: Severity,
    pub presentation: SeverityPresentation,
}

/// Everything the renderer needs for one review pass over one document
/// snapshot: highlight regions plus the annotations that could not be
/// anchored, which are still listed (sidebar) rather than dropped.
#[derive(Debug, Clone)]
pub struct ReviewOverlay {
    index: Vec<LineSpan>,
    highlights: Vec<Highlight>,
    unanchored: Vec<Annotation>,
}

impl ReviewOverlay {
    /// Indexes `document` once and resolves every annotation against it.
    /// Must be rebuilt whenever the document changes.
    pub fn build(document: &Document, annotations: &[Annotation]) -> Self {
        let index = build_line_index(document);
        let mut highlights = Vec::new();
        let mut unanchored = Vec::new();

        for annotation in annotations {
            match resolve(&index, annotation.start_line, annotation.end_line) {
                Some(range) => highlights.push(Highlight {
                    annotation_id: annotation.id.clone(),
                    range,
                    severity: annotation.severity,
                    presentation: theme::presentation(annotation.severity),
                }),
                None => {
                    debug!(
                        "Annotation {} (lines {}-{}) not anchored",
                        annotation.id, annotation.start_line, annotation.end_line
                    );
                    unanchored.push(annotation.clone());
                }
            }
        }

        Self {
            index,
            highlights,
            unanchored,
        }
    }

    pub fn line_index(&self) -> &[LineSpan] {
        &self.index
    }

    pub fn highlights(&self) -> &[Highlight] {
        &self.highlights
    }

    pub fn unanchored(&self) -> &[Annotation] {
        &self.unanchored
    }

    pub fn highlight(&self, annotation_id: &str) -> Option<&Highlight> {
        self.highlights
            .iter()
            .find(|h| h.annotation_id == annotation_id)
    }

    /// Highlights covering `position`, most severe first.
    pub fn highlights_at(&self, position: usize) -> Vec<&Highlight> {
        let mut hits: Vec<&Highlight> = self
            .highlights
            .iter()
            .filter(|h| h.range.contains(position))
            .collect();
        hits.sort_by_key(|h| h.severity.rank());
        hits
    }

    /// Popover anchor for a highlight whose on-screen box is `rect`, using the
    /// configured thresholds. `None` if the annotation is not highlighted.
    pub fn popover_for(&self, annotation_id: &str, rect: Rect, kind: PopoverKind) -> Option<Placement> {
        self.highlight(annotation_id)?;
        Some(place(rect, settings::popover_threshold(kind), settings::get_popover_offset()))
    }
}
