use std::{fs, path::Path};

use log::info;
use serde::Serialize;

use crate::gtfs::Feed;

/// Renders rows as delimited text with a header taken from the row's field names.
///
/// Values are written verbatim: a value containing the delimiter or a line
/// break is not quoted and will misalign its line. The result has no trailing
/// line terminator, and an empty table renders as an empty string.
pub fn serialize<T: Serialize>(rows: &[T]) -> Result<String, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for row in rows {
        wtr.serialize(row)?;
    }

    let bytes = wtr.into_inner().map_err(|err| err.into_error())?;
    let mut text = String::from_utf8(bytes).map_err(|err| {
        csv::Error::from(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })?;
    if text.ends_with('\n') {
        text.pop();
    }

    Ok(text)
}

fn write_table<T: Serialize>(dir: &Path, file_name: &str, rows: &[T]) -> anyhow::Result<()> {
    info!("Writing {} ({} rows)", file_name, rows.len());
    let text = serialize(rows)?;
    fs::write(dir.join(file_name), text)?;
    Ok(())
}

pub fn write_feed(dir: &Path, feed: &Feed) -> anyhow::Result<()> {
    fs::create_dir_all(dir)?;

    write_table(dir, "agency.txt", &feed.agencies)?;
    write_table(dir, "routes.txt", &feed.routes)?;
    write_table(dir, "stops.txt", &feed.stops)?;
    write_table(dir, "shapes.txt", &feed.shapes)?;
    write_table(dir, "calendar.txt", &feed.calendars)?;
    if !feed.departures.is_empty() {
        write_table(dir, "departures.txt", &feed.departures)?;
    }

    Ok(())
}
