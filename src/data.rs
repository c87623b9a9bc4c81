use std::{
    fmt,
    sync::{Arc, OnceLock},
};

pub type Id = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Node,
    Way,
    Relation,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Node => "node",
            ElementType::Way => "way",
            ElementType::Relation => "relation",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "node" => Some(ElementType::Node),
            "way" => Some(ElementType::Way),
            "relation" => Some(ElementType::Relation),
            _ => None,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered key/value tags. Keys are unique; the first occurrence of a key wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tags(Vec<(String, String)>);

impl Tags {
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        if self.get(&key).is_none() {
            self.0.push((key, value.into()));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }

}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tags = Tags::default();
        for (k, v) in iter {
            tags.push(k, v);
        }
        tags
    }
}

/// A reference target that is filled in at most once, after its fetch completes.
/// Clones share the same cell.
#[derive(Debug)]
pub struct Slot<T>(Arc<OnceLock<Arc<T>>>);

impl<T> Slot<T> {
    pub fn empty() -> Self {
        Self(Arc::new(OnceLock::new()))
    }

    /// Returns `false` when the slot was already resolved.
    pub fn resolve(&self, value: Arc<T>) -> bool {
        self.0.set(value).is_ok()
    }

    pub fn get(&self) -> Option<&Arc<T>> {
        self.0.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.0.get().is_some()
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug)]
pub struct Node {
    pub id: Id,
    pub lat: f64,
    pub lon: f64,
    pub tags: Tags,
}

#[derive(Debug)]
pub struct NodeRef {
    pub id: Id,
    pub data: Slot<Node>,
}

impl NodeRef {
    pub fn new(id: Id) -> Self {
        Self {
            id,
            data: Slot::empty(),
        }
    }
}

#[derive(Debug)]
pub struct Way {
    pub id: Id,
    pub nds: Vec<NodeRef>,
}

impl Way {
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.nds.iter().filter_map(|nd| nd.data.get())
    }
}

#[derive(Debug)]
pub struct Member {
    pub kind: ElementType,
    pub id: Id,
    pub role: String,
    pub data: Slot<Element>,
}

impl Member {
    pub fn new(kind: ElementType, id: Id, role: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            role: role.into(),
            data: Slot::empty(),
        }
    }

    pub fn is_stop(&self) -> bool {
        self.role == "stop"
    }

    pub fn is_path(&self) -> bool {
        self.kind == ElementType::Way
    }

    pub fn node(&self) -> Option<&Node> {
        match self.data.get()?.as_ref() {
            Element::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn way(&self) -> Option<&Way> {
        match self.data.get()?.as_ref() {
            Element::Way(way) => Some(way),
            _ => None,
        }
    }

    pub fn relation(&self) -> Option<&Relation> {
        match self.data.get()?.as_ref() {
            Element::Relation(relation) => Some(relation),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Relation {
    pub id: Id,
    pub tags: Tags,
    pub members: Vec<Member>,
}

impl Relation {
    /// Members of a route master that point at routes.
    pub fn routes(&self) -> impl Iterator<Item = &Member> {
        self.members
            .iter()
            .filter(|member| member.kind == ElementType::Relation)
    }

    pub fn stops(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|member| member.is_stop())
    }

    pub fn paths(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|member| member.is_path())
    }
}

#[derive(Debug)]
pub enum Element {
    Node(Node),
    Way(Way),
    Relation(Relation),
}

impl Element {
    pub fn kind(&self) -> ElementType {
        match self {
            Element::Node(_) => ElementType::Node,
            Element::Way(_) => ElementType::Way,
            Element::Relation(_) => ElementType::Relation,
        }
    }
}
