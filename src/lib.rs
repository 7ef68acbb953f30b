pub mod export;
pub mod line_index;
pub mod markdown;
pub mod mentions;
pub mod overlay;
pub mod parsing;
pub mod placement;
pub mod review;
pub mod reviewers;
pub mod settings;
pub mod span_resolver;
pub mod suggestion;
pub mod theme;
pub mod threads;

// Re-export the pieces hosts reach for first
pub use line_index::{LineSpan, build_line_index};
pub use overlay::{Highlight, ReviewOverlay};
pub use span_resolver::{ResolvedRange, resolve};
pub use threads::{CommentThread, SuggestionStatus, ThreadStore};
