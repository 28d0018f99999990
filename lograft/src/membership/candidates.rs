use std::fmt;
use std::sync::Arc;

use crate::display_ext::DisplaySliceExt;
use crate::membership::Endpoint;

/// The rotating list of members a joining or leaving node sends its request to.
///
/// The list itself is an immutable snapshot: a rejection that carries the responder's view of the
/// cluster replaces the snapshot wholesale with [`Candidates::merge`]. Only the rotation cursor is
/// mutable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    list: Arc<[Endpoint]>,
    next: usize,
}

impl fmt::Display for Candidates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.list.display(), self.next)
    }
}

impl Candidates {
    /// Build a candidate list, dropping duplicates and `me`.
    pub fn new(endpoints: &[Endpoint], me: &Endpoint) -> Self {
        let mut list: Vec<Endpoint> = Vec::with_capacity(endpoints.len());
        for e in endpoints {
            if e != me && !list.contains(e) {
                list.push(e.clone());
            }
        }

        Self {
            list: list.into(),
            next: 0,
        }
    }

    pub fn as_slice(&self) -> &[Endpoint] {
        &self.list
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Return the next candidate and advance the cursor, wrapping around at the end.
    pub fn next_candidate(&mut self) -> Option<Endpoint> {
        if self.list.is_empty() {
            return None;
        }

        let i = self.next % self.list.len();
        self.next = (i + 1) % self.list.len();

        Some(self.list[i].clone())
    }

    /// Replace the list with the members `responder` knows about.
    ///
    /// Candidates the responder no longer knows are dropped and new ones are added. The cursor is
    /// placed right after the responder so that the next attempt targets someone else. A
    /// responder that knows no member at all provides no information and the current list is
    /// kept.
    pub fn merge(&self, responder: &Endpoint, members: &[Endpoint], me: &Endpoint) -> Self {
        let mut merged = Candidates::new(members, me);

        if merged.is_empty() {
            return self.clone();
        }

        merged.next = match merged.list.iter().position(|e| e == responder) {
            Some(i) => (i + 1) % merged.list.len(),
            None => 0,
        };

        merged
    }
}
