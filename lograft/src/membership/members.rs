use std::collections::BTreeMap;

use crate::membership::Endpoint;
use crate::membership::Member;

/// Single owner of all [`Member`] bookkeeping, keyed by endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Members {
    inner: BTreeMap<Endpoint, Member>,
}

impl Members {
    pub fn new(endpoints: &[Endpoint]) -> Self {
        let mut members = Self::default();
        members.sync(endpoints);
        members
    }

    pub fn get(&self, endpoint: &Endpoint) -> Option<&Member> {
        self.inner.get(endpoint)
    }

    pub fn get_mut(&mut self, endpoint: &Endpoint) -> Option<&mut Member> {
        self.inner.get_mut(endpoint)
    }

    pub fn contains(&self, endpoint: &Endpoint) -> bool {
        self.inner.contains_key(endpoint)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Member> + '_ {
        self.inner.values()
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> + '_ {
        self.inner.keys()
    }

    /// Make the set of members equal to `endpoints`.
    ///
    /// Existing members keep their bookkeeping; members not listed are dropped and new endpoints
    /// get a fresh [`Member`].
    pub fn sync(&mut self, endpoints: &[Endpoint]) {
        self.inner.retain(|endpoint, _| endpoints.contains(endpoint));

        for endpoint in endpoints {
            if !self.inner.contains_key(endpoint) {
                self.inner.insert(endpoint.clone(), Member::new(endpoint.clone()));
            }
        }
    }
}
