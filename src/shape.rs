use itertools::Itertools;

use crate::{data::*, gtfs::ShapePoint};

/// Builds the shape of one route from its ways, in member order.
///
/// Consecutive ways share their boundary point; a point already emitted is
/// dropped and keeps the sequence number of its first occurrence. Numbers are
/// handed out as points are emitted and never rewritten. Unresolved ways and
/// points are skipped.
pub fn build(route: &Relation) -> Vec<ShapePoint> {
    route
        .paths()
        .filter_map(Member::way)
        .flat_map(|way| way.nodes())
        .unique_by(|node| (node.lat.to_bits(), node.lon.to_bits()))
        .zip(1..)
        .map(|(node, sequence)| ShapePoint {
            shape_id: route.id,
            lat: node.lat,
            lon: node.lon,
            sequence,
        })
        .collect()
}
