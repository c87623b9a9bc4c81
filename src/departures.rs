//! Expansion of departure shorthand such as `"0600 14:00-18:00/30"` into explicit times.

use std::collections::BTreeSet;

use crate::error::ProcessingError;

pub type Time = u32;

const SECONDS_PER_DAY: Time = 24 * 3600;

/// Expands a whitespace separated list of departures and intervals.
///
/// Times past midnight inside an interval keep counting hours, so
/// `2330-0030/60` yields `23:30:00` and `24:30:00`.
pub fn expand(expr: &str) -> Result<BTreeSet<String>, ProcessingError> {
    let mut departures = BTreeSet::new();

    for token in expr.split_whitespace() {
        match token.split_once('-') {
            Some((begin, rest)) => {
                let (end, step) = rest.split_once('/').ok_or_else(|| {
                    ProcessingError::invalid_departure(token, "interval has no /STEP")
                })?;
                departures.extend(expand_interval(token, begin, end, step)?.map(render));
            }
            None => {
                departures.insert(render(parse_departure(token, token)?));
            }
        }
    }

    Ok(departures)
}

fn expand_interval(
    token: &str,
    begin: &str,
    end: &str,
    step: &str,
) -> Result<impl Iterator<Item = Time>, ProcessingError> {
    let begin = parse_departure(token, begin)?;
    let mut end = parse_departure(token, end)?;
    let step_minutes: Time = step
        .parse()
        .map_err(|_| ProcessingError::invalid_departure(token, "step is not a number of minutes"))?;

    if step_minutes == 0 {
        return Err(ProcessingError::invalid_departure(
            token,
            "step of 0 minutes never reaches the end",
        ));
    }

    // An end before the beginning lies on a following day.
    while end < begin {
        end += SECONDS_PER_DAY;
    }

    let step = step_minutes
        .checked_mul(60)
        .ok_or_else(|| ProcessingError::invalid_departure(token, "step is too large"))?;
    Ok((begin..=end).step_by(step as usize))
}

/// Parses `HHMM`, `HHMMSS` or their colon separated forms into seconds.
fn parse_departure(token: &str, value: &str) -> Result<Time, ProcessingError> {
    let digits: String = value.chars().filter(|&c| c != ':').collect();

    if digits.len() < 3 || digits.len() > 6 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ProcessingError::invalid_departure(
            token,
            format!("{value:?} is not HHMM or HHMMSS"),
        ));
    }

    let (hours, minutes, seconds) = if digits.len() <= 4 {
        let split = digits.len() - 2;
        (&digits[..split], &digits[split..], "0")
    } else {
        let split = digits.len() - 4;
        (
            &digits[..split],
            &digits[split..split + 2],
            &digits[split + 2..],
        )
    };

    let [hours, minutes, seconds] = [hours, minutes, seconds].map(|part| {
        part.parse::<Time>()
            .map_err(|_| ProcessingError::invalid_departure(token, "not a number"))
    });
    let (hours, minutes, seconds) = (hours?, minutes?, seconds?);

    if minutes >= 60 || seconds >= 60 {
        return Err(ProcessingError::invalid_departure(
            token,
            format!("{value:?} has minutes or seconds out of range"),
        ));
    }

    Ok(hours * 3600 + minutes * 60 + seconds)
}

fn render(time: Time) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        time / 3600,
        time % 3600 / 60,
        time % 60
    )
}
