use std::{ops::AddAssign, sync::Arc, time::Duration};

use futures::{future, stream, StreamExt};
use itertools::Itertools;
use log::{debug, info, warn};

use crate::{data::*, error::FetchError, fetch::Fetcher, store::RecordStore};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalReport {
    pub requested: usize,
    pub resolved: usize,
    pub failed: usize,
    pub timed_out: usize,
}

impl RetrievalReport {
    fn record<T>(&mut self, result: &Result<T, FetchError>) {
        self.requested += 1;
        match result {
            Ok(_) => self.resolved += 1,
            Err(FetchError::Timeout { .. }) => self.timed_out += 1,
            Err(_) => self.failed += 1,
        }
    }
}

impl AddAssign for RetrievalReport {
    fn add_assign(&mut self, other: Self) {
        self.requested += other.requested;
        self.resolved += other.resolved;
        self.failed += other.failed;
        self.timed_out += other.timed_out;
    }
}

/// Loads route masters and everything a conversion reads from them.
///
/// Each call returns once every reachable reference has resolved, failed or
/// timed out. Failures leave the reference unresolved.
pub struct Retriever {
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
    max_in_flight: usize,
}

impl Retriever {
    pub fn new(fetcher: Arc<dyn Fetcher>, timeout: Duration, max_in_flight: usize) -> Self {
        Self {
            fetcher,
            timeout,
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Route masters are appended to the store in the order of `ids`, each one
    /// as soon as it and every route master before it have been fetched.
    pub async fn load_all(&self, store: &RecordStore, ids: &[Id]) -> RetrievalReport {
        let mut report = RetrievalReport::default();

        let mut fetched = std::pin::pin!(stream::iter(ids)
            .map(|&id| async move { (id, self.relation(id).await) })
            .buffered(self.max_in_flight));

        let mut route_masters = Vec::new();
        while let Some((id, result)) = fetched.next().await {
            report.record(&result);
            match result {
                Ok(route_master) => {
                    let route_master = Arc::new(route_master);
                    store.push_route_master(Arc::clone(&route_master));
                    route_masters.push(route_master);
                }
                Err(err) => warn!("Could not load route master {}: {}", id, err),
            }
        }

        let reports = future::join_all(
            route_masters
                .iter()
                .map(|route_master| self.resolve_route_master(route_master)),
        )
        .await;
        for route_master_report in reports {
            report += route_master_report;
        }

        info!(
            "Retrieved {} of {} elements ({} failed, {} timed out)",
            report.resolved, report.requested, report.failed, report.timed_out
        );
        report
    }

    async fn resolve_route_master(&self, route_master: &Relation) -> RetrievalReport {
        let mut report = RetrievalReport::default();

        info!("Resolving routes of route master {}", route_master.id);
        report += self.resolve_members(route_master.routes()).await;

        let routes: Vec<&Relation> = route_master
            .routes()
            .filter_map(Member::relation)
            .collect();

        info!(
            "Resolving stops and ways of {} routes of route master {}",
            routes.len(),
            route_master.id
        );
        report += self
            .resolve_members(routes.iter().flat_map(|route| {
                route
                    .members
                    .iter()
                    .filter(|member| member.is_stop() || member.is_path())
            }))
            .await;

        let nds = routes
            .iter()
            .flat_map(|route| route.paths())
            .filter_map(Member::way)
            .flat_map(|way| way.nds.iter());
        report += self.resolve_nodes(nds).await;

        report
    }

    async fn resolve_members<'a>(
        &self,
        members: impl Iterator<Item = &'a Member>,
    ) -> RetrievalReport {
        let results: Vec<_> = stream::iter(members)
            .map(|member| async move {
                let result = self.fetch(member.kind, member.id).await;
                if let Ok(element) = &result {
                    if element.kind() != member.kind {
                        return Err(FetchError::UnexpectedType {
                            expected: member.kind.to_string(),
                            found: element.kind().to_string(),
                            id: member.id,
                        });
                    }
                }
                result.map(|element| {
                    member.data.resolve(Arc::new(element));
                })
            })
            .buffer_unordered(self.max_in_flight)
            .collect()
            .await;

        let mut report = RetrievalReport::default();
        for result in &results {
            report.record(result);
        }
        report
    }

    /// Points shared between ways are fetched once and resolved in every way.
    async fn resolve_nodes<'a>(&self, nds: impl Iterator<Item = &'a NodeRef>) -> RetrievalReport {
        let by_id = nds.map(|nd| (nd.id, nd)).into_group_map();

        let results: Vec<_> = stream::iter(by_id)
            .map(|(id, refs)| async move {
                let node = match self.fetch(ElementType::Node, id).await? {
                    Element::Node(node) => Arc::new(node),
                    other => {
                        return Err(FetchError::UnexpectedType {
                            expected: ElementType::Node.to_string(),
                            found: other.kind().to_string(),
                            id,
                        })
                    }
                };
                for nd in refs {
                    nd.data.resolve(Arc::clone(&node));
                }
                Ok::<(), FetchError>(())
            })
            .buffer_unordered(self.max_in_flight)
            .collect()
            .await;

        let mut report = RetrievalReport::default();
        for result in &results {
            report.record(result);
        }
        report
    }

    async fn relation(&self, id: Id) -> Result<Relation, FetchError> {
        match self.fetch(ElementType::Relation, id).await? {
            Element::Relation(relation) => Ok(relation),
            other => Err(FetchError::UnexpectedType {
                expected: ElementType::Relation.to_string(),
                found: other.kind().to_string(),
                id,
            }),
        }
    }

    async fn fetch(&self, kind: ElementType, id: Id) -> Result<Element, FetchError> {
        let result = match tokio::time::timeout(self.timeout, self.fetcher.fetch(kind, id)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                kind: kind.to_string(),
                id,
            }),
        };

        if let Err(err) = &result {
            debug!("Leaving {} {} unresolved: {}", kind, id, err);
        }
        result
    }
}
