use std::{fs, path::Path};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    error::InputError,
    gtfs::{DEFAULT_END_DATE, DEFAULT_START_DATE},
};

/// Values the source data does not carry, supplied by whoever runs the conversion.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct UserInputs {
    /// Indexed like the agencies of the projected feed.
    pub agencies: Vec<AgencyInput>,
    /// Indexed by route position across all route masters.
    pub calendars: Vec<Vec<CalendarSlot>>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct AgencyInput {
    pub url: String,
    pub timezone: String,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct CalendarSlot {
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
    pub start_date: String,
    pub end_date: String,
    pub departures: String,
}

impl UserInputs {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_json(&text)?)
    }

    pub fn from_json(text: &str) -> Result<Self, InputError> {
        let inputs: UserInputs = serde_json::from_str(text)?;
        inputs.validate()?;
        Ok(inputs)
    }

    fn validate(&self) -> Result<(), InputError> {
        for slot in self.calendars.iter().flatten() {
            for date in [&slot.start_date, &slot.end_date] {
                let date = date.trim();
                if !date.is_empty() && NaiveDate::parse_from_str(date, "%Y%m%d").is_err() {
                    return Err(InputError::InvalidDate(date.to_owned()));
                }
            }
        }
        Ok(())
    }

    pub fn agency(&self, index: usize) -> AgencyInput {
        self.agencies.get(index).cloned().unwrap_or_default()
    }

    pub fn calendar_slots(&self, route_index: usize) -> &[CalendarSlot] {
        self.calendars
            .get(route_index)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl CalendarSlot {
    pub fn start_date(&self) -> &str {
        or_default(&self.start_date, DEFAULT_START_DATE)
    }

    pub fn end_date(&self) -> &str {
        or_default(&self.end_date, DEFAULT_END_DATE)
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    match value.trim() {
        "" => default,
        value => value,
    }
}
