use crate::line_index::LineSpan;
use log::debug;

/// Structural range a backend line pair resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: usize,
    pub end: usize,
}

impl ResolvedRange {
    pub fn contains(&self, position: usize) -> bool {
        self.start <= position && position <= self.end
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

impl From<&LineSpan> for ResolvedRange {
    fn from(span: &LineSpan) -> Self {
        Self {
            start: span.start,
            end: span.end,
        }
    }
}

/// Resolves a 1-based `(start_line, end_line)` pair against a line table.
///
/// Returns `None` only when `start_line` has no entry. A missing `end_line`,
/// or one that precedes `start_line`, degrades to the start line's own bounds
/// rather than dropping the highlight.
pub fn resolve(index: &[LineSpan], start_line: usize, end_line: usize) -> Option<ResolvedRange> {
    let Some(start) = lookup(index, start_line) else {
        debug!("Line {start_line} not in index of {} lines", index.len());
        return None;
    };

    if end_line < start_line {
        debug!("End line {end_line} precedes start line {start_line}, using start line bounds");
        return Some(ResolvedRange::from(start));
    }

    match lookup(index, end_line) {
        Some(end) => Some(ResolvedRange {
            start: start.start,
            end: end.end.max(start.start),
        }),
        None => {
            debug!("End line {end_line} not in index, using start line {start_line} bounds");
            Some(ResolvedRange::from(start))
        }
    }
}

fn lookup(index: &[LineSpan], line: usize) -> Option<&LineSpan> {
    // Lines are contiguous from 1, so the slot is the line number minus one;
    // fall back to a scan if a caller hands us a table that is not.
    line.checked_sub(1)
        .and_then(|slot| index.get(slot))
        .filter(|span| span.line == line)
        .or_else(|| index.iter().find(|span| span.line == line))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ten_line_index() -> Vec<LineSpan> {
        (1..=10)
            .map(|line| LineSpan::new(line, line * 10, line * 10 + 5))
            .collect()
    }

    #[test]
    fn test_resolves_multi_line_range() {
        let index = ten_line_index();
        assert_eq!(
            resolve(&index, 2, 4),
            Some(ResolvedRange { start: 20, end: 45 })
        );
    }

    #[test]
    fn test_single_line_range() {
        let index = ten_line_index();
        assert_eq!(
            resolve(&index, 3, 3),
            Some(ResolvedRange { start: 30, end: 35 })
        );
    }

    #[test]
    fn test_end_before_start_degrades_to_start_line() {
        let index = ten_line_index();
        assert_eq!(
            resolve(&index, 5, 3),
            Some(ResolvedRange { start: 50, end: 55 })
        );
    }

    #[test]
    fn test_missing_end_line_degrades_to_start_line() {
        let index = ten_line_index();
        assert_eq!(
            resolve(&index, 9, 42),
            Some(ResolvedRange { start: 90, end: 95 })
        );
    }

    #[test]
    fn test_missing_start_line_is_unresolved() {
        let index = ten_line_index();
        assert_eq!(resolve(&index, 999, 999), None);
        assert_eq!(resolve(&index, 0, 3), None);
        assert_eq!(resolve(&[], 1, 1), None);
    }

    #[test]
    fn test_lookup_tolerates_non_contiguous_tables() {
        let index = vec![LineSpan::new(2, 4, 6), LineSpan::new(7, 9, 12)];
        assert_eq!(
            resolve(&index, 7, 7),
            Some(ResolvedRange { start: 9, end: 12 })
        );
    }
}
