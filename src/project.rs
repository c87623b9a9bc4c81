use std::collections::HashMap;

use log::{debug, info, warn};

use crate::{
    data::*,
    departures,
    error::ProcessingError,
    gtfs::{self, Feed},
    inputs::{CalendarSlot, UserInputs},
    shape,
    store::RecordStore,
};

/// Maps the `route_master` tag onto a route type; unknown modes fall back to `0`.
#[derive(Debug, Clone)]
pub struct RouteTypeTable {
    types: HashMap<String, u16>,
    fallback: u16,
}

impl Default for RouteTypeTable {
    fn default() -> Self {
        Self {
            types: HashMap::from([("subway".to_owned(), 1)]),
            fallback: 0,
        }
    }
}

impl RouteTypeTable {
    pub fn with(mut self, mode: impl Into<String>, route_type: u16) -> Self {
        self.types.insert(mode.into(), route_type);
        self
    }

    pub fn route_type(&self, mode: Option<&str>) -> u16 {
        mode.and_then(|mode| self.types.get(mode))
            .copied()
            .unwrap_or(self.fallback)
    }
}

#[derive(Debug, Default)]
pub struct Projection {
    pub feed: Feed,
    /// Calendar slots whose departure expression could not be expanded.
    pub rejected_departures: Vec<(String, ProcessingError)>,
}

#[derive(Debug, Default)]
pub struct Projector {
    pub route_types: RouteTypeTable,
}

impl Projector {
    pub fn new(route_types: RouteTypeTable) -> Self {
        Self { route_types }
    }

    /// Projects everything currently in the store into one feed.
    ///
    /// Missing tags become empty strings and unresolved references are left
    /// out; nothing in the source data makes the projection fail.
    pub fn project(&self, store: &RecordStore, inputs: &UserInputs) -> Projection {
        let mut projection = Projection::default();
        let mut operators: Vec<String> = Vec::new();
        let mut route_index = 0;

        for route_master in store.route_masters() {
            if let Some(operator) = route_master.tags.get("operator") {
                if !operators.iter().any(|known| known == operator) {
                    operators.push(operator.to_owned());
                }
            }

            projection.feed.routes.push(self.route(&route_master));

            for route_member in route_master.routes() {
                let service_prefix = route_member.id;
                self.calendars(
                    &mut projection,
                    service_prefix,
                    inputs.calendar_slots(route_index),
                );
                route_index += 1;

                let Some(route) = route_member.relation() else {
                    debug!(
                        "Route {} of route master {} is not resolved",
                        route_member.id, route_master.id
                    );
                    continue;
                };

                projection.feed.stops.extend(route.stops().filter_map(stop));
                projection.feed.shapes.extend(shape::build(route));

                for way in route.paths().filter_map(Member::way) {
                    let missing = way.nds.iter().filter(|nd| !nd.data.is_resolved()).count();
                    if missing > 0 {
                        debug!(
                            "Way {} of route {} is missing {} points",
                            way.id, route.id, missing
                        );
                    }
                }
            }
        }

        projection.feed.agencies = operators
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                let input = inputs.agency(index);
                gtfs::Agency {
                    name,
                    url: input.url,
                    timezone: input.timezone,
                }
            })
            .collect();

        info!(
            "Projected {} agencies, {} routes, {} stops, {} shape points, {} calendars ({})",
            projection.feed.agencies.len(),
            projection.feed.routes.len(),
            projection.feed.stops.len(),
            projection.feed.shapes.len(),
            projection.feed.calendars.len(),
            store.diagnostics()
        );

        projection
    }

    fn route(&self, route_master: &Relation) -> gtfs::Route {
        let tags = &route_master.tags;
        gtfs::Route {
            id: route_master.id,
            short_name: tags.get_or_empty("name").to_owned(),
            long_name: tags.get_or_empty("ref").to_owned(),
            route_type: self.route_types.route_type(tags.get("route_master")),
            color: tags.get_or_empty("colour").to_owned(),
        }
    }

    fn calendars(&self, projection: &mut Projection, route_id: Id, slots: &[CalendarSlot]) {
        for (slot_index, slot) in slots.iter().enumerate() {
            let service_id = format!("{route_id}_{slot_index}");

            match departures::expand(&slot.departures) {
                Ok(times) => projection
                    .feed
                    .departures
                    .extend(times.into_iter().map(|departure_time| gtfs::Departure {
                        service_id: service_id.clone(),
                        departure_time,
                    })),
                Err(err) => {
                    warn!("Skipping departures of {}: {}", service_id, err);
                    projection
                        .rejected_departures
                        .push((service_id.clone(), err));
                }
            }

            projection.feed.calendars.push(gtfs::Calendar {
                service_id,
                monday: slot.monday,
                tuesday: slot.tuesday,
                wednesday: slot.wednesday,
                thursday: slot.thursday,
                friday: slot.friday,
                saturday: slot.saturday,
                sunday: slot.sunday,
                start_date: slot.start_date().to_owned(),
                end_date: slot.end_date().to_owned(),
            });
        }
    }
}

fn stop(member: &Member) -> Option<gtfs::Stop> {
    let node = member.node()?;
    Some(gtfs::Stop {
        id: node.id,
        name: node.tags.get_or_empty("name").to_owned(),
        lat: node.lat,
        lon: node.lon,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::fixtures::*;

    fn route(id: Id, members: Vec<Member>) -> Member {
        member(
            ElementType::Relation,
            "",
            Some(Arc::new(Element::Relation(relation(
                id,
                &[("type", "route")],
                members,
            )))),
            id,
        )
    }

    fn store(route_masters: Vec<Relation>) -> RecordStore {
        let store = RecordStore::new();
        for route_master in route_masters {
            store.push_route_master(Arc::new(route_master));
        }
        store
    }

    #[test]
    fn shared_operator_yields_one_agency() {
        let store = store(vec![
            relation(1, &[("operator", "BVG"), ("name", "U1")], Vec::new()),
            relation(2, &[("operator", "S-Bahn")], Vec::new()),
            relation(3, &[("operator", "BVG"), ("name", "U2")], Vec::new()),
            relation(4, &[], Vec::new()),
        ]);
        let inputs = UserInputs::from_json(
            r#"{ "agencies": [{ "url": "https://bvg.de", "timezone": "Europe/Berlin" }] }"#,
        )
        .unwrap();

        let feed = Projector::default().project(&store, &inputs).feed;

        assert_eq!(
            feed.agencies,
            vec![
                gtfs::Agency {
                    name: "BVG".to_owned(),
                    url: "https://bvg.de".to_owned(),
                    timezone: "Europe/Berlin".to_owned(),
                },
                gtfs::Agency {
                    name: "S-Bahn".to_owned(),
                    url: String::new(),
                    timezone: String::new(),
                },
            ]
        );
        assert_eq!(feed.routes.len(), 4);
    }

    #[test]
    fn route_fields_come_from_route_master_tags() {
        let store = store(vec![
            relation(
                1,
                &[
                    ("name", "U6"),
                    ("ref", "U6 Alt-Tegel - Alt-Mariendorf"),
                    ("colour", "8C6DAB"),
                    ("route_master", "subway"),
                ],
                Vec::new(),
            ),
            relation(2, &[("route_master", "bus")], Vec::new()),
        ]);

        let routes = Projector::default()
            .project(&store, &UserInputs::default())
            .feed
            .routes;

        assert_eq!(
            routes,
            vec![
                gtfs::Route {
                    id: 1,
                    short_name: "U6".to_owned(),
                    long_name: "U6 Alt-Tegel - Alt-Mariendorf".to_owned(),
                    route_type: 1,
                    color: "8C6DAB".to_owned(),
                },
                gtfs::Route {
                    id: 2,
                    short_name: String::new(),
                    long_name: String::new(),
                    route_type: 0,
                    color: String::new(),
                },
            ]
        );
    }

    #[test]
    fn route_type_table_is_extensible() {
        let table = RouteTypeTable::default().with("bus", 3).with("tram", 0);
        assert_eq!(table.route_type(Some("subway")), 1);
        assert_eq!(table.route_type(Some("bus")), 3);
        assert_eq!(table.route_type(Some("ferry")), 0);
        assert_eq!(table.route_type(None), 0);

        let store = store(vec![relation(1, &[("route_master", "bus")], Vec::new())]);
        let routes = Projector::new(table)
            .project(&store, &UserInputs::default())
            .feed
            .routes;
        assert_eq!(routes[0].route_type, 3);
    }

    #[test]
    fn stops_and_shapes_follow_member_order() {
        let outbound = route(
            10,
            vec![
                member(
                    ElementType::Node,
                    "stop",
                    Some(node(100, 1.0, 1.0, &[("name", "Alpha")])),
                    100,
                ),
                member(ElementType::Node, "stop", None, 101),
                member(ElementType::Node, "stop", Some(node(102, 3.0, 3.0, &[])), 102),
                member(
                    ElementType::Way,
                    "",
                    Some(way(1000, &[(100, Some((1.0, 1.0))), (102, Some((3.0, 3.0)))])),
                    1000,
                ),
            ],
        );
        let inbound = route(
            11,
            vec![member(
                ElementType::Node,
                "stop",
                Some(node(100, 1.0, 1.0, &[("name", "Alpha")])),
                100,
            )],
        );
        let store = store(vec![relation(
            1,
            &[],
            vec![
                outbound,
                member(ElementType::Relation, "", None, 12),
                inbound,
            ],
        )]);

        let feed = Projector::default()
            .project(&store, &UserInputs::default())
            .feed;

        let stops: Vec<(Id, &str)> = feed
            .stops
            .iter()
            .map(|stop| (stop.id, stop.name.as_str()))
            .collect();
        assert_eq!(stops, vec![(100, "Alpha"), (102, ""), (100, "Alpha")]);

        let shapes: Vec<(Id, u32)> = feed
            .shapes
            .iter()
            .map(|point| (point.shape_id, point.sequence))
            .collect();
        assert_eq!(shapes, vec![(10, 1), (10, 2)]);
    }

    #[test]
    fn calendars_use_route_position_and_default_dates() {
        let store = store(vec![
            relation(1, &[], vec![route(10, Vec::new())]),
            relation(
                2,
                &[],
                vec![
                    member(ElementType::Relation, "", None, 20),
                    route(21, Vec::new()),
                ],
            ),
        ]);
        let inputs = UserInputs::from_json(
            r#"{ "calendars": [
                [],
                [{ "saturday": true, "sunday": true, "departures": "0800-0900/30" }],
                [{ "monday": true, "start_date": "20240101" },
                 { "friday": true, "departures": "25" }]
            ] }"#,
        )
        .unwrap();

        let projection = Projector::default().project(&store, &inputs);
        let calendars = &projection.feed.calendars;

        assert_eq!(
            calendars
                .iter()
                .map(|calendar| calendar.service_id.as_str())
                .collect::<Vec<_>>(),
            vec!["20_0", "21_0", "21_1"]
        );
        assert!(calendars[0].saturday && calendars[0].sunday && !calendars[0].monday);
        assert_eq!(calendars[0].start_date, "19000101");
        assert_eq!(calendars[0].end_date, "20991231");
        assert_eq!(calendars[1].start_date, "20240101");

        assert_eq!(
            projection.feed.departures,
            ["08:00:00", "08:30:00", "09:00:00"]
                .into_iter()
                .map(|time| gtfs::Departure {
                    service_id: "20_0".to_owned(),
                    departure_time: time.to_owned(),
                })
                .collect::<Vec<_>>()
        );
        assert_eq!(projection.rejected_departures.len(), 1);
        assert_eq!(projection.rejected_departures[0].0, "21_1");
    }

    #[test]
    fn empty_store_projects_empty_feed() {
        let projection = Projector::default().project(&RecordStore::new(), &UserInputs::default());
        assert!(projection.feed.agencies.is_empty());
        assert!(projection.feed.routes.is_empty());
        assert!(projection.feed.calendars.is_empty());
        assert!(projection.rejected_departures.is_empty());
    }
}
