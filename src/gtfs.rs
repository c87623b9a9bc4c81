use serde::{Serialize, Serializer};

use crate::data::Id;

pub const DEFAULT_START_DATE: &str = "19000101";
pub const DEFAULT_END_DATE: &str = "20991231";

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Agency {
    #[serde(rename = "agency_name")]
    pub name: String,
    #[serde(rename = "agency_url")]
    pub url: String,
    #[serde(rename = "agency_timezone")]
    pub timezone: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Route {
    #[serde(rename = "route_id")]
    pub id: Id,
    #[serde(rename = "route_short_name")]
    pub short_name: String,
    #[serde(rename = "route_long_name")]
    pub long_name: String,
    #[serde(rename = "route_type")]
    pub route_type: u16,
    #[serde(rename = "route_color")]
    pub color: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Stop {
    #[serde(rename = "stop_id")]
    pub id: Id,
    #[serde(rename = "stop_name")]
    pub name: String,
    #[serde(rename = "stop_lat")]
    pub lat: f64,
    #[serde(rename = "stop_lon")]
    pub lon: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ShapePoint {
    pub shape_id: Id,
    #[serde(rename = "shape_pt_lat")]
    pub lat: f64,
    #[serde(rename = "shape_pt_lon")]
    pub lon: f64,
    #[serde(rename = "shape_pt_sequence")]
    pub sequence: u32,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Calendar {
    pub service_id: String,
    #[serde(serialize_with = "serialize_bool")]
    pub monday: bool,
    #[serde(serialize_with = "serialize_bool")]
    pub tuesday: bool,
    #[serde(serialize_with = "serialize_bool")]
    pub wednesday: bool,
    #[serde(serialize_with = "serialize_bool")]
    pub thursday: bool,
    #[serde(serialize_with = "serialize_bool")]
    pub friday: bool,
    #[serde(serialize_with = "serialize_bool")]
    pub saturday: bool,
    #[serde(serialize_with = "serialize_bool")]
    pub sunday: bool,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Departure {
    pub service_id: String,
    pub departure_time: String,
}

/// Calendar flags are written as `1`/`0`.
fn serialize_bool<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u8(u8::from(*value))
}

#[derive(Debug, Default)]
pub struct Feed {
    pub agencies: Vec<Agency>,
    pub routes: Vec<Route>,
    pub stops: Vec<Stop>,
    pub shapes: Vec<ShapePoint>,
    pub calendars: Vec<Calendar>,
    pub departures: Vec<Departure>,
}
