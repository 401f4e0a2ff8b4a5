//! Frontier of pages still to visit
//!
//! A priority queue with de-duplication on normalized URLs. Pagination links
//! always come first, then listing pages found while following links, then
//! everything else. Within a priority, URLs come out in discovery order.

use crate::url::normalize_parsed;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use url::Url;

/// How a URL entered the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    /// The configured start URL
    Start,
    /// Reached through the "next page" link
    NextPage,
    /// Matched the listing pattern while following links
    Listing,
    /// Any other in-scope link
    Other,
}

impl PageKind {
    /// Lower values are visited first
    pub fn priority(self) -> u8 {
        match self {
            Self::Start | Self::NextPage => 0,
            Self::Listing => 1,
            Self::Other => 2,
        }
    }
}

/// A URL queued for fetching
#[derive(Debug, Clone)]
pub struct QueuedUrl {
    pub url: Url,
    pub kind: PageKind,
    sequence: u64,
}

// BinaryHeap is a max-heap: reverse both keys so the lowest priority value
// and then the earliest sequence pop first
impl Ord for QueuedUrl {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .kind
            .priority()
            .cmp(&self.kind.priority())
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for QueuedUrl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedUrl {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}

impl Eq for QueuedUrl {}

/// Queue of pages to visit, each URL accepted at most once per run
#[derive(Debug, Default)]
pub struct Frontier {
    queue: BinaryHeap<QueuedUrl>,
    seen: HashSet<String>,
    next_sequence: u64,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a URL unless it was queued or visited before
    ///
    /// # Returns
    ///
    /// `true` if the URL was added
    pub fn push(&mut self, url: Url, kind: PageKind) -> bool {
        if !self.mark_seen(&url) {
            return false;
        }

        self.queue.push(QueuedUrl {
            url,
            kind,
            sequence: self.next_sequence,
        });
        self.next_sequence += 1;
        true
    }

    /// Pops the highest priority URL
    pub fn pop(&mut self) -> Option<QueuedUrl> {
        self.queue.pop()
    }

    /// Records a URL as seen without queueing it (e.g. a redirect target)
    ///
    /// # Returns
    ///
    /// `true` if the URL had not been seen before
    pub fn mark_seen(&mut self, url: &Url) -> bool {
        self.seen.insert(dedup_key(url))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

fn dedup_key(url: &Url) -> String {
    normalize_parsed(url.clone())
        .map(String::from)
        .unwrap_or_else(|_| url.to_string())
}
