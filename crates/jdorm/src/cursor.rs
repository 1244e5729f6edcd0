use crate::{registry::Registered, session::SessionShared, Entity, Instance};

use jdorm_core::{stmt::ValueRecord, Error, Result};
use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, Weak},
    vec,
};

/// Query results, turned into managed instances a batch at a time.
///
/// The cursor borrows its session's identity map while it hydrates; once the
/// session ends, advancing fails with a session-closed error.
pub struct Cursor<T> {
    session: Weak<SessionShared>,
    registered: Arc<Registered>,
    rows: vec::IntoIter<ValueRecord>,
    ready: VecDeque<Instance<T>>,
    batch: usize,
}

impl<T: Entity> Cursor<T> {
    pub(crate) fn new(
        session: Weak<SessionShared>,
        registered: Arc<Registered>,
        rows: Vec<ValueRecord>,
        batch: usize,
    ) -> Cursor<T> {
        Cursor {
            session,
            registered,
            rows: rows.into_iter(),
            ready: VecDeque::new(),
            batch: batch.max(1),
        }
    }

    pub async fn next(&mut self) -> Option<Result<Instance<T>>> {
        loop {
            if let Some(instance) = self.ready.pop_front() {
                return Some(Ok(instance));
            }

            if self.rows.len() == 0 {
                return None;
            }

            if let Err(err) = self.fill().await {
                self.rows = Vec::new().into_iter();
                return Some(Err(err));
            }
        }
    }

    pub async fn collect(mut self) -> Result<Vec<Instance<T>>> {
        let mut instances = Vec::with_capacity(self.remaining());
        while let Some(instance) = self.next().await {
            instances.push(instance?);
        }
        Ok(instances)
    }

    /// Upper bound on the instances still to come. Rows for instances deleted
    /// in the session are skipped, so fewer may be returned.
    pub fn remaining(&self) -> usize {
        self.ready.len() + self.rows.len()
    }

    async fn fill(&mut self) -> Result<()> {
        let session = self.session.upgrade().ok_or_else(Error::session_closed)?;
        let rows: Vec<_> = self.rows.by_ref().take(self.batch).collect();

        for instance in session.hydrate(&self.registered, rows).await? {
            self.ready.push_back(Instance::from_any(instance)?);
        }

        Ok(())
    }
}

impl<T: Entity> fmt::Debug for Cursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("entity", &T::NAME)
            .field("remaining", &self.remaining())
            .finish()
    }
}
