use std::str::FromStr;

use futures::future::BoxFuture;
use log::{debug, warn};

use crate::{data::*, error::FetchError};

pub const OSM_API: &str = "https://www.openstreetmap.org/api/0.6";

/// Source of single OSM elements.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, kind: ElementType, id: Id) -> BoxFuture<'_, Result<Element, FetchError>>;
}

/// Fetches elements one at a time from the OSM editing API.
#[derive(Debug, Clone)]
pub struct OsmApi {
    client: reqwest::Client,
    base_url: String,
}

impl OsmApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    async fn get(&self, kind: ElementType, id: Id) -> Result<Element, FetchError> {
        let url = format!("{}/{}/{}", self.base_url, kind, id);
        debug!("Fetching {}", url);

        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                kind: kind.to_string(),
                id,
            });
        }

        let text = response.error_for_status()?.text().await?;
        parse_element(kind, &text)
    }
}

impl Fetcher for OsmApi {
    fn fetch(&self, kind: ElementType, id: Id) -> BoxFuture<'_, Result<Element, FetchError>> {
        Box::pin(self.get(kind, id))
    }
}

/// Reads the first `kind` element of an OSM XML document.
pub fn parse_element(kind: ElementType, xml: &str) -> Result<Element, FetchError> {
    let parse_error = |reason: String| FetchError::Parse {
        kind: kind.to_string(),
        reason,
    };

    let doc = roxmltree::Document::parse(xml).map_err(|err| parse_error(err.to_string()))?;
    let element = doc
        .descendants()
        .find(|node| node.has_tag_name(kind.as_str()))
        .ok_or_else(|| parse_error(format!("no <{kind}> element")))?;

    let id: Id = attribute(&element, "id").map_err(parse_error)?;
    let mut tags = Tags::default();
    let mut nds = Vec::new();
    let mut members = Vec::new();

    for child in element.children().filter(|child| child.is_element()) {
        match child.tag_name().name() {
            "tag" => tags.push(
                child.attribute("k").unwrap_or_default(),
                child.attribute("v").unwrap_or_default(),
            ),
            "nd" => nds.push(NodeRef::new(attribute(&child, "ref").map_err(parse_error)?)),
            "member" => {
                let member_type = child.attribute("type").unwrap_or_default();
                let Some(member_kind) = ElementType::parse(member_type) else {
                    warn!("Skipping member of unknown type {:?} in {} {}", member_type, kind, id);
                    continue;
                };
                members.push(Member::new(
                    member_kind,
                    attribute(&child, "ref").map_err(parse_error)?,
                    child.attribute("role").unwrap_or_default(),
                ));
            }
            _ => {}
        }
    }

    Ok(match kind {
        ElementType::Node => Element::Node(Node {
            id,
            lat: attribute(&element, "lat").map_err(parse_error)?,
            lon: attribute(&element, "lon").map_err(parse_error)?,
            tags,
        }),
        ElementType::Way => Element::Way(Way { id, nds }),
        ElementType::Relation => Element::Relation(Relation { id, tags, members }),
    })
}

fn attribute<T: FromStr>(node: &roxmltree::Node, name: &str) -> Result<T, String> {
    let value = node
        .attribute(name)
        .ok_or_else(|| format!("<{}> has no {} attribute", node.tag_name().name(), name))?;
    value
        .parse()
        .map_err(|_| format!("{name}={value:?} is not valid"))
}
