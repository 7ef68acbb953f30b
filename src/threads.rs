//! Comment threads and the suggestion lifecycle.
//!
//! ```text
//!  pending --accept--> accepted --revert--> pending
//!  pending --reject--> rejected
//!  (any open state) --resolve--> resolved
//! ```
//!
//! [`transition`] is the whole state machine as a pure function. Events that
//! do not apply to the current state return it unchanged; resolved threads
//! ignore everything. [`ThreadStore`] layers document edits and bookkeeping on
//! top of it.

use crate::markdown::Document;
use crate::review::{Annotation, Severity, SuggestionPayload};
use crate::reviewers::{Reviewer, Roster};
use crate::suggestion::{self, AppliedEdit};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionStatus {
    Pending,
    Accepted,
    Rejected,
}

impl SuggestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionStatus::Pending => "pending",
            SuggestionStatus::Accepted => "accepted",
            SuggestionStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    Open { suggestion: Option<SuggestionStatus> },
    /// Terminal. Keeps the suggestion status it was closed with.
    Resolved { suggestion: Option<SuggestionStatus> },
}

impl ThreadState {
    pub fn suggestion(&self) -> Option<SuggestionStatus> {
        match *self {
            ThreadState::Open { suggestion } | ThreadState::Resolved { suggestion } => suggestion,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ThreadState::Resolved { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadEvent {
    Accept,
    Reject,
    Revert,
    Resolve,
}

pub fn transition(state: ThreadState, event: ThreadEvent) -> ThreadState {
    use SuggestionStatus::*;
    use ThreadEvent::*;

    let ThreadState::Open { suggestion } = state else {
        return state;
    };

    match (suggestion, event) {
        (Some(Pending), Accept) => ThreadState::Open {
            suggestion: Some(Accepted),
        },
        (Some(Pending), Reject) => ThreadState::Open {
            suggestion: Some(Rejected),
        },
        (Some(Accepted), Revert) => ThreadState::Open {
            suggestion: Some(Pending),
        },
        (suggestion, Resolve) => ThreadState::Resolved { suggestion },
        _ => state,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAnchor {
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreadMessage {
    pub id: String,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub payload: SuggestionPayload,
    applied: Option<AppliedEdit>,
}

impl Suggestion {
    pub fn applied(&self) -> Option<&AppliedEdit> {
        self.applied.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentThread {
    pub id: String,
    pub annotation_id: String,
    pub review_pass: u32,
    pub judge_id: String,
    pub judge_name: String,
    pub severity: Severity,
    pub criterion: Option<String>,
    pub anchor: LineAnchor,
    pub messages: Vec<ThreadMessage>,
    pub suggestion: Option<Suggestion>,
    pub state: ThreadState,
}

impl CommentThread {
    fn from_annotation(annotation: &Annotation, review_pass: u32) -> Self {
        let id = format!("t{review_pass}-{}", annotation.id);
        let first = ThreadMessage {
            id: format!("{id}-1"),
            author_name: annotation.judge_name.clone(),
            body: annotation.message.clone(),
            created_at: Utc::now(),
        };
        let suggestion = annotation.suggestion.clone().map(|payload| Suggestion {
            payload,
            applied: None,
        });
        let state = ThreadState::Open {
            suggestion: suggestion.as_ref().map(|_| SuggestionStatus::Pending),
        };

        Self {
            id,
            annotation_id: annotation.id.clone(),
            review_pass,
            judge_id: annotation.judge_id.clone(),
            judge_name: annotation.judge_name.clone(),
            severity: annotation.severity,
            criterion: annotation.criterion.clone(),
            anchor: LineAnchor {
                start_line: annotation.start_line,
                end_line: annotation.end_line,
            },
            messages: vec![first],
            suggestion,
            state,
        }
    }

    pub fn suggestion_status(&self) -> Option<SuggestionStatus> {
        self.state.suggestion()
    }

    pub fn is_resolved(&self) -> bool {
        self.state.is_resolved()
    }
}

/// Session-scoped set of threads for the document under review.
#[derive(Debug, Default)]
pub struct ThreadStore {
    threads: Vec<CommentThread>,
    review_pass: u32,
}

impl ThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new review pass. Open threads from earlier passes are
    /// superseded and dropped; resolved ones stay as history. Suggestions
    /// already applied to the document stay applied.
    pub fn apply_review_pass(&mut self, annotations: &[Annotation]) {
        self.review_pass += 1;
        let pass = self.review_pass;

        let before = self.threads.len();
        self.threads.retain(CommentThread::is_resolved);
        let superseded = before - self.threads.len();

        let mut created = 0;
        for annotation in annotations {
            let thread = CommentThread::from_annotation(annotation, pass);
            if self.threads.iter().any(|t| t.id == thread.id) {
                warn!("Duplicate annotation id '{}' in review pass {pass}", annotation.id);
                continue;
            }
            self.threads.push(thread);
            created += 1;
        }

        info!("Review pass {pass}: {created} threads created, {superseded} superseded");
    }

    pub fn review_pass(&self) -> u32 {
        self.review_pass
    }

    pub fn get(&self, thread_id: &str) -> Option<&CommentThread> {
        self.threads.iter().find(|t| t.id == thread_id)
    }

    pub fn all(&self) -> &[CommentThread] {
        &self.threads
    }

    pub fn open_threads(&self) -> impl Iterator<Item = &CommentThread> {
        self.threads.iter().filter(|t| !t.is_resolved())
    }

    fn get_mut(&mut self, thread_id: &str) -> Option<&mut CommentThread> {
        self.threads.iter_mut().find(|t| t.id == thread_id)
    }

    /// Appends a reply. Returns `false` for unknown or resolved threads.
    pub fn reply(&mut self, thread_id: &str, author_name: &str, body: &str) -> bool {
        let Some(thread) = self.get_mut(thread_id) else {
            debug!("Reply to unknown thread {thread_id}");
            return false;
        };
        if thread.is_resolved() {
            debug!("Reply to resolved thread {thread_id} ignored");
            return false;
        }

        let id = format!("{}-{}", thread.id, thread.messages.len() + 1);
        thread.messages.push(ThreadMessage {
            id,
            author_name: author_name.to_string(),
            body: body.to_string(),
            created_at: Utc::now(),
        });
        true
    }

    /// Applies the thread's pending suggestion to `document`.
    ///
    /// No-op (returns `false`) unless the suggestion is pending and its edit
    /// can actually be applied.
    pub fn accept(&mut self, thread_id: &str, document: &mut Document) -> bool {
        let Some(thread) = self.get_mut(thread_id) else {
            return false;
        };
        let next = transition(thread.state, ThreadEvent::Accept);
        if next == thread.state {
            debug!("Accept ignored for thread {thread_id} in state {:?}", thread.state);
            return false;
        }
        let Some(proposal) = thread.suggestion.as_mut() else {
            return false;
        };

        match suggestion::apply(document, thread.anchor.start_line, &proposal.payload) {
            Some(edit) => {
                proposal.applied = Some(edit);
                thread.state = next;
                true
            }
            None => {
                warn!(
                    "Suggestion of thread {thread_id} could not be applied to line {}",
                    thread.anchor.start_line
                );
                false
            }
        }
    }

    pub fn reject(&mut self, thread_id: &str) -> bool {
        self.step(thread_id, ThreadEvent::Reject)
    }

    /// Undoes an accepted suggestion and returns it to pending.
    pub fn revert(&mut self, thread_id: &str, document: &mut Document) -> bool {
        let Some(thread) = self.get_mut(thread_id) else {
            return false;
        };
        let next = transition(thread.state, ThreadEvent::Revert);
        if next == thread.state {
            debug!("Revert ignored for thread {thread_id} in state {:?}", thread.state);
            return false;
        }
        let Some(proposal) = thread.suggestion.as_mut() else {
            return false;
        };
        let Some(edit) = proposal.applied.as_ref() else {
            return false;
        };

        if !suggestion::undo(document, edit) {
            warn!("Suggestion of thread {thread_id} could not be reverted");
            return false;
        }
        proposal.applied = None;
        thread.state = next;
        true
    }

    /// Closes the thread. An accepted suggestion stays in the document.
    pub fn resolve(&mut self, thread_id: &str) -> bool {
        self.step(thread_id, ThreadEvent::Resolve)
    }

    fn step(&mut self, thread_id: &str, event: ThreadEvent) -> bool {
        let Some(thread) = self.get_mut(thread_id) else {
            return false;
        };
        let next = transition(thread.state, event);
        if next == thread.state {
            debug!("{event:?} ignored for thread {thread_id} in state {:?}", thread.state);
            return false;
        }
        thread.state = next;
        true
    }

    /// Reviewers mentioned anywhere in a thread, in order of first mention.
    pub fn mentioned_reviewers<'r>(&self, thread_id: &str, roster: &'r Roster) -> Vec<&'r Reviewer> {
        let Some(thread) = self.get(thread_id) else {
            return Vec::new();
        };
        let mut resolved: Vec<&Reviewer> = Vec::new();
        for message in &thread.messages {
            for reviewer in roster.resolve_mentions(&message.body) {
                if !resolved.iter().any(|r| r.id == reviewer.id) {
                    resolved.push(reviewer);
                }
            }
        }
        resolved
    }
}
