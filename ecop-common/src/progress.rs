//! Assignment progress: which assigned poems are still pending

use std::collections::HashSet;

use crate::annotations::AnnotationStore;
use crate::catalog::Catalog;
use crate::poem_id::PoemId;
use crate::Result;

/// What the annotator should see next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    Annotate(PoemId),
    AllDone,
}

/// Outcome of a direct request for one poem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoemAccess {
    /// Not in the user's assignment list
    Denied,
    /// Assigned, but already annotated
    AlreadyAnnotated,
    /// Assigned and pending
    Open,
}

/// Assigned poems split by completion, both in assignment order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    pub pending: Vec<PoemId>,
    pub completed: Vec<PoemId>,
}

impl Progress {
    pub fn compute(assigned: &[PoemId], annotated: &HashSet<PoemId>) -> Self {
        let (completed, pending): (Vec<PoemId>, Vec<PoemId>) = assigned
            .iter()
            .cloned()
            .partition(|poem| annotated.contains(poem));
        Self { pending, completed }
    }

    /// Load the user's assignment and annotations and compute progress
    pub async fn for_user(
        catalog: &Catalog,
        store: &AnnotationStore,
        username: &str,
    ) -> Result<Self> {
        let assigned = catalog.assigned_poems(username);
        if assigned.is_empty() {
            return Ok(Self::default());
        }
        let annotated = store.annotated_poems(username).await?;
        Ok(Self::compute(assigned, &annotated))
    }

    pub fn next_unannotated(&self) -> Option<&PoemId> {
        self.pending.first()
    }

    pub fn next_step(&self) -> NextStep {
        match self.next_unannotated() {
            Some(poem) => NextStep::Annotate(poem.clone()),
            None => NextStep::AllDone,
        }
    }

    pub fn access(&self, poem: &PoemId) -> PoemAccess {
        if self.pending.contains(poem) {
            PoemAccess::Open
        } else if self.completed.contains(poem) {
            PoemAccess::AlreadyAnnotated
        } else {
            PoemAccess::Denied
        }
    }

    pub fn total(&self) -> usize {
        self.pending.len() + self.completed.len()
    }
}

/// First assigned poem `username` has not annotated yet
///
/// Unknown users have no assignment and therefore nothing left to annotate.
pub async fn get_next_unannotated(
    catalog: &Catalog,
    store: &AnnotationStore,
    username: &str,
) -> Result<Option<PoemId>> {
    let progress = Progress::for_user(catalog, store, username).await?;
    Ok(progress.next_unannotated().cloned())
}
