use std::{
    fmt,
    sync::{Arc, RwLock},
};

use crate::data::*;

/// Fetched source data for one conversion session.
///
/// Route masters are appended as soon as they are fetched; their member slots
/// keep filling in afterwards, so a snapshot may contain partially resolved trees.
#[derive(Debug, Default)]
pub struct RecordStore {
    route_masters: RwLock<Vec<Arc<Relation>>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_route_master(&self, route_master: Arc<Relation>) {
        let mut route_masters = self
            .route_masters
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        route_masters.push(route_master);
    }

    pub fn route_masters(&self) -> Vec<Arc<Relation>> {
        self.route_masters
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.route_masters
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_empty()
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let mut diagnostics = Diagnostics::default();

        for route_master in self.route_masters() {
            for route_member in route_master.routes() {
                diagnostics.routes.count(route_member.data.is_resolved());
                let Some(route) = route_member.relation() else {
                    continue;
                };

                for stop in route.stops() {
                    diagnostics.stops.count(stop.data.is_resolved());
                }

                for path in route.paths() {
                    diagnostics.ways.count(path.data.is_resolved());
                    if let Some(way) = path.way() {
                        for nd in &way.nds {
                            diagnostics.points.count(nd.data.is_resolved());
                        }
                    }
                }
            }
        }

        diagnostics
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub resolved: usize,
    pub unresolved: usize,
}

impl Resolution {
    fn count(&mut self, resolved: bool) {
        if resolved {
            self.resolved += 1;
        } else {
            self.unresolved += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.resolved + self.unresolved
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resolved, self.total())
    }
}

/// How much of the reachable source data has been fetched.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostics {
    pub routes: Resolution,
    pub stops: Resolution,
    pub ways: Resolution,
    pub points: Resolution,
}

impl Diagnostics {
    pub fn is_complete(&self) -> bool {
        self.routes.unresolved == 0
            && self.stops.unresolved == 0
            && self.ways.unresolved == 0
            && self.points.unresolved == 0
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "routes {}, stops {}, ways {}, way points {}",
            self.routes, self.stops, self.ways, self.points
        )
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn node(id: Id, lat: f64, lon: f64, tags: &[(&str, &str)]) -> Arc<Element> {
        Arc::new(Element::Node(Node {
            id,
            lat,
            lon,
            tags: tags.iter().copied().collect(),
        }))
    }

    /// A way whose point references are resolved from `points`; `None` stays unresolved.
    pub fn way(id: Id, points: &[(Id, Option<(f64, f64)>)]) -> Arc<Element> {
        let nds = points
            .iter()
            .map(|&(node_id, coords)| {
                let nd = NodeRef::new(node_id);
                if let Some((lat, lon)) = coords {
                    nd.data.resolve(Arc::new(Node {
                        id: node_id,
                        lat,
                        lon,
                        tags: Tags::default(),
                    }));
                }
                nd
            })
            .collect();

        Arc::new(Element::Way(Way { id, nds }))
    }

    pub fn member(kind: ElementType, role: &str, element: Option<Arc<Element>>, id: Id) -> Member {
        let member = Member::new(kind, id, role);
        if let Some(element) = element {
            member.data.resolve(element);
        }
        member
    }

    pub fn relation(id: Id, tags: &[(&str, &str)], members: Vec<Member>) -> Relation {
        Relation {
            id,
            tags: tags.iter().copied().collect(),
            members,
        }
    }
}
