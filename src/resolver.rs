//! Concurrent expansion of a RedFish `Members` collection.
//!
//! Every entry of the collection is a link (`{"@odata.id": "/redfish/v1/..."}`).
//! The resolver fetches each linked resource on its own task, decodes it as
//! JSON and gathers successes and per-member failures separately. One failing
//! member never stops its siblings unless fail-fast is requested.

use std::{collections::BTreeSet, sync::Arc};

use serde::Deserialize;
use serde_json::Value;
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, info, warn};

use crate::{
    client::Fetch,
    endpoint::relative_path,
    error::{AggregatedError, MemberError},
};

#[derive(Debug, Clone, Copy)]
pub struct ResolverOptions {
    /// Upper bound on fetches in flight; values below 1 are treated as 1
    pub concurrency: usize,

    /// Abort outstanding fetches after the first failed member
    pub fail_fast: bool,
}

/// One entry of a `Members` array
#[derive(Debug, Deserialize)]
struct MemberReference {
    #[serde(rename = "@odata.id")]
    id: String,
}

impl MemberReference {
    // Only objects count; serde would happily read a struct out of an array.
    fn from_value(member: &Value) -> Option<Self> {
        if !member.is_object() {
            return None;
        }

        Self::deserialize(member).ok()
    }
}

/// Outcome of resolving a collection
///
/// `resources` holds every member that resolved, even when `errors` is set.
/// Both are in the order the members appeared in the collection.
#[derive(Debug)]
pub struct Resolution {
    pub resources: Vec<Value>,
    pub errors: Option<AggregatedError>,
}

pub struct MemberResolver<F> {
    fetcher: Arc<F>,
    options: ResolverOptions,
}

impl<F: Fetch + 'static> MemberResolver<F> {
    pub fn new(fetcher: F, options: ResolverOptions) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            options,
        }
    }

    /// Fetches and decodes every member of the collection
    ///
    /// Waits for all spawned fetches before returning. Malformed entries are
    /// reported without touching the network.
    pub async fn resolve(&self, members: &[Value]) -> Resolution {
        let mut resolved: Vec<(usize, Value)> = Vec::new();
        let mut failed: Vec<MemberError> = Vec::new();
        let mut references = Vec::new();

        for (index, member) in members.iter().enumerate() {
            match MemberReference::from_value(member) {
                Some(reference) => references.push((index, reference)),
                None => {
                    debug!(index, %member, "malformed member");
                    failed.push(MemberError::Malformed { index });
                }
            }
        }

        if self.options.fail_fast && !failed.is_empty() {
            return finish(resolved, failed);
        }

        let permits = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut workers = JoinSet::new();
        let mut pending = BTreeSet::new();

        for (index, reference) in references {
            let fetcher = Arc::clone(&self.fetcher);
            let permits = Arc::clone(&permits);
            pending.insert(index);

            workers.spawn(async move {
                // The semaphore is never closed, so acquiring cannot fail.
                let _permit = permits.acquire_owned().await.ok();
                let outcome = resolve_member(fetcher.as_ref(), index, reference.id).await;
                (index, outcome)
            });
        }

        let mut aborted = false;

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((index, Ok(resource))) => {
                    pending.remove(&index);
                    resolved.push((index, resource));
                }
                Ok((index, Err(error))) => {
                    pending.remove(&index);
                    info!(%error, "member failed");
                    failed.push(error);

                    if self.options.fail_fast && !aborted {
                        workers.abort_all();
                        aborted = true;
                    }
                }
                Err(err) if err.is_cancelled() => {}
                Err(err) => warn!(error = %err, "member worker panicked"),
            }
        }

        // Without an abort, anything still pending is a worker that panicked.
        if !aborted {
            failed.extend(pending.into_iter().map(|index| MemberError::Worker { index }));
        }

        finish(resolved, failed)
    }
}

async fn resolve_member<F: Fetch + ?Sized>(
    fetcher: &F,
    index: usize,
    id: String,
) -> Result<Value, MemberError> {
    let id = relative_path(&id).to_string();
    let fetched = fetcher.fetch(&id).await;
    let body = match fetched {
        Ok(body) => body,
        Err(source) => return Err(MemberError::Fetch { index, id, source }),
    };

    serde_json::from_slice(&body).map_err(|source| MemberError::Decode { index, id, source })
}

fn finish(mut resolved: Vec<(usize, Value)>, mut failed: Vec<MemberError>) -> Resolution {
    resolved.sort_by_key(|(index, _)| *index);
    failed.sort_by_key(MemberError::index);

    info!(
        resolved = resolved.len(),
        failed = failed.len(),
        "resolved members"
    );

    Resolution {
        resources: resolved.into_iter().map(|(_, resource)| resource).collect(),
        errors: AggregatedError::from_errors(failed),
    }
}
