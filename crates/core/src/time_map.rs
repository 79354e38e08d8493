//! Report-step boundaries of a simulation.
//!
//! Entry 0 is the simulation start; every `DATES` record and every `TSTEP`
//! value in the SCHEDULE section appends one more boundary.

use crate::deck::{Deck, DeckRecord, Section};
use crate::error::DeckError;
use serde::ser::{Serialize, SerializeSeq, Serializer};
use time::macros::{datetime, format_description};
use time::{Date, Duration, Month, PrimitiveDateTime, Time};

/// Start date used when the deck has no `START` keyword.
pub const DEFAULT_START: PrimitiveDateTime = datetime!(1983-01-01 0:00);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeMap {
    times: Vec<PrimitiveDateTime>,
}

impl Default for TimeMap {
    fn default() -> Self {
        TimeMap::new(DEFAULT_START)
    }
}

impl TimeMap {
    pub fn new(start: PrimitiveDateTime) -> Self {
        TimeMap { times: vec![start] }
    }

    /// Append a boundary; it must lie strictly after the last one.
    pub fn add_time(&mut self, time: PrimitiveDateTime) -> Result<(), DeckError> {
        let last = self.last();
        if time <= last {
            return Err(DeckError::time(format!(
                "report time {} is not after {}",
                format_time(time),
                format_time(last)
            )));
        }
        self.times.push(time);
        Ok(())
    }

    /// Append a boundary `days` after the last one.
    pub fn add_days(&mut self, days: f64) -> Result<(), DeckError> {
        if !days.is_finite() || days <= 0.0 {
            return Err(DeckError::time(format!(
                "time step must be positive, got {}",
                days
            )));
        }
        let next = Duration::checked_seconds_f64(days * 86_400.0)
            .and_then(|step| self.last().checked_add(step))
            .ok_or_else(|| DeckError::time(format!("time step of {} days overflows", days)))?;
        self.times.push(next);
        Ok(())
    }

    /// Number of boundaries, i.e. report steps plus one.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Never true: the start time is always present.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn num_steps(&self) -> usize {
        self.times.len() - 1
    }

    pub fn get(&self, step: usize) -> Result<PrimitiveDateTime, DeckError> {
        self.times
            .get(step)
            .copied()
            .ok_or(DeckError::IndexOutOfRange {
                index: step,
                len: self.times.len(),
            })
    }

    pub fn start(&self) -> PrimitiveDateTime {
        self.times[0]
    }

    pub fn last(&self) -> PrimitiveDateTime {
        self.times[self.times.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = PrimitiveDateTime> + '_ {
        self.times.iter().copied()
    }

    /// Days from the start to boundary `step`.
    pub fn elapsed_days(&self, step: usize) -> Result<f64, DeckError> {
        Ok((self.get(step)? - self.start()).as_seconds_f64() / 86_400.0)
    }

    /// Index of the boundary equal to `time`.
    pub fn find(&self, time: PrimitiveDateTime) -> Option<usize> {
        self.times.binary_search(&time).ok()
    }

    /// Build from `START`, `DATES` and `TSTEP` in deck order.
    pub fn from_deck(deck: &Deck) -> Result<TimeMap, DeckError> {
        let start = match deck.occurrences("START").next() {
            Some(kw) => date_from_record(kw.record(0)?)?,
            None => DEFAULT_START,
        };
        let mut map = TimeMap::new(start);

        for kw in deck.keywords().iter().filter(|k| k.section == Section::Schedule) {
            let located = |e: DeckError| match e {
                DeckError::Time { message } => {
                    DeckError::time(format!("{} ({} at {})", message, kw.name, kw.location))
                }
                other => other,
            };
            match kw.name.as_str() {
                "DATES" => {
                    for record in kw.iter() {
                        let time = date_from_record(record).map_err(located)?;
                        map.add_time(time).map_err(located)?;
                    }
                }
                "TSTEP" => {
                    for record in kw.iter() {
                        for days in record.get("step_list")?.get_all::<f64>()? {
                            map.add_days(days).map_err(located)?;
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(map)
    }
}

impl Serialize for TimeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.times.len()))?;
        for t in &self.times {
            seq.serialize_element(&format_time(*t))?;
        }
        seq.end()
    }
}

/// `YYYY-MM-DD HH:MM:SS`.
pub fn format_time(time: PrimitiveDateTime) -> String {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    time.format(fmt).unwrap_or_else(|_| time.to_string())
}

/// Three-letter month name, case-insensitive. `JLY` is accepted for July.
pub fn parse_month(name: &str) -> Option<Month> {
    let month = match name.trim().to_ascii_uppercase().as_str() {
        "JAN" => Month::January,
        "FEB" => Month::February,
        "MAR" => Month::March,
        "APR" => Month::April,
        "MAY" => Month::May,
        "JUN" => Month::June,
        "JUL" | "JLY" => Month::July,
        "AUG" => Month::August,
        "SEP" => Month::September,
        "OCT" => Month::October,
        "NOV" => Month::November,
        "DEC" => Month::December,
        _ => return None,
    };
    Some(month)
}

/// `HH[:MM[:SS[.fff]]]`.
pub fn parse_time_of_day(text: &str) -> Result<Time, DeckError> {
    let bad = || DeckError::time(format!("invalid time of day '{}'", text));
    let mut parts = text.trim().split(':');
    let hour: u8 = parts.next().and_then(|h| h.parse().ok()).ok_or_else(bad)?;
    let minute: u8 = match parts.next() {
        Some(m) => m.parse().map_err(|_| bad())?,
        None => 0,
    };
    let seconds: f64 = match parts.next() {
        Some(s) => s.parse().map_err(|_| bad())?,
        None => 0.0,
    };
    if parts.next().is_some() || !(0.0..60.0).contains(&seconds) {
        return Err(bad());
    }
    let whole = seconds.trunc();
    let millis = ((seconds - whole) * 1000.0).round().min(999.0) as u16;
    Time::from_hms_milli(hour, minute, whole as u8, millis).map_err(|_| bad())
}

/// Read a `DAY MONTH YEAR [TIME]` record.
pub fn date_from_record(record: &DeckRecord) -> Result<PrimitiveDateTime, DeckError> {
    let day = record.get("DAY")?.get_int(0)?;
    let month_name = record.get("MONTH")?.get_trimmed_string(0)?;
    let year = record.get("YEAR")?.get_int(0)?;

    let month = parse_month(&month_name)
        .ok_or_else(|| DeckError::time(format!("invalid month name '{}'", month_name)))?;
    let invalid = || DeckError::time(format!("invalid date {} {} {}", day, month_name, year));
    let day = u8::try_from(day).map_err(|_| invalid())?;
    let year = i32::try_from(year).map_err(|_| invalid())?;
    let date = Date::from_calendar_date(year, month, day).map_err(|_| invalid())?;

    let time = match record.get("TIME") {
        Ok(item) if item.has_value(0) => parse_time_of_day(&item.get_string(0)?)?,
        _ => Time::MIDNIGHT,
    };
    Ok(PrimitiveDateTime::new(date, time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::time;

    #[test]
    fn boundaries_must_increase() {
        let mut map = TimeMap::default();
        map.add_time(datetime!(1983-02-01 0:00)).unwrap();
        assert!(map.add_time(datetime!(1983-02-01 0:00)).is_err());
        assert!(map.add_time(datetime!(1983-01-15 0:00)).is_err());
        assert_eq!(map.len(), 2);
        assert_eq!(map.num_steps(), 1);
    }

    #[test]
    fn days_accumulate() {
        let mut map = TimeMap::new(datetime!(2020-01-01 0:00));
        map.add_days(10.0).unwrap();
        map.add_days(0.5).unwrap();
        assert_eq!(map.get(1).unwrap(), datetime!(2020-01-11 0:00));
        assert_eq!(map.last(), datetime!(2020-01-11 12:00));
        assert_eq!(map.elapsed_days(2).unwrap(), 10.5);
        assert!(map.add_days(0.0).is_err());
        assert!(map.add_days(-1.0).is_err());
        assert!(map.get(3).is_err());
    }

    #[test]
    fn months_accept_jly() {
        assert_eq!(parse_month("jly"), Some(Month::July));
        assert_eq!(parse_month("JUL"), Some(Month::July));
        assert_eq!(parse_month("Dec"), Some(Month::December));
        assert_eq!(parse_month("DECEMBER"), None);
    }

    #[test]
    fn times_of_day() {
        assert_eq!(parse_time_of_day("00:00:00.000").unwrap(), Time::MIDNIGHT);
        assert_eq!(parse_time_of_day("12:30").unwrap(), time!(12:30));
        assert_eq!(
            parse_time_of_day("06:15:30.5").unwrap(),
            time!(6:15:30.5)
        );
        assert!(parse_time_of_day("25:00:00").is_err());
        assert!(parse_time_of_day("ab").is_err());
    }

    #[test]
    fn serialized_as_formatted_dates() {
        let mut map = TimeMap::new(datetime!(2000-01-01 0:00));
        map.add_days(1.0).unwrap();
        assert_eq!(
            serde_json::to_value(&map).unwrap(),
            serde_json::json!(["2000-01-01 00:00:00", "2000-01-02 00:00:00"])
        );
        assert_eq!(map.find(datetime!(2000-01-02 0:00)), Some(1));
    }
}
