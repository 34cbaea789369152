//! Analytics Module
//!
//! Aggregations over the flight delay datasets, run through the query cache so
//! each (query, filter) pair is computed at most once per TTL.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::cache::CacheFacade;
use crate::data::{Row, Value};
use crate::error::{CacheError, Result};

/// Dataset names in the flight delay catalog.
pub const FLIGHTS: &str = "flights";
pub const AIRLINES: &str = "airlines";
pub const AIRPORTS: &str = "airports";

// == Query Kind ==
/// The aggregations the service knows how to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Mean departure delay per airline
    AvgDelayPerAirline,
    /// Number of departing flights per origin airport
    FlightsPerAirport,
}

impl QueryKind {
    /// Name used as the query type in cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::AvgDelayPerAirline => "avg_delay_per_airline",
            QueryKind::FlightsPerAirport => "total_flights_per_airport",
        }
    }
}

impl FromStr for QueryKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "avg_delay_per_airline" => Ok(QueryKind::AvgDelayPerAirline),
            "total_flights_per_airport" => Ok(QueryKind::FlightsPerAirport),
            other => Err(CacheError::InvalidRequest(format!(
                "unknown query type '{}'",
                other
            ))),
        }
    }
}

// == Month Filter ==
/// Restricts flights to one calendar month, or keeps them all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthFilter {
    All,
    Month(u32),
}

impl MonthFilter {
    /// Whether `flight` passes the filter.
    pub fn matches(&self, flight: &Row) -> bool {
        match self {
            MonthFilter::All => true,
            MonthFilter::Month(month) => {
                matches!(flight.get("MONTH"), Some(Value::Int(m)) if *m == i64::from(*month))
            }
        }
    }
}

impl FromStr for MonthFilter {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "all" {
            return Ok(MonthFilter::All);
        }
        match s.parse::<u32>() {
            Ok(month) if (1..=12).contains(&month) => Ok(MonthFilter::Month(month)),
            _ => Err(CacheError::InvalidRequest(format!(
                "query value must be 'all' or a month 1-12, got '{}'",
                s
            ))),
        }
    }
}

/// Canonical query value: `all` or the month number.
impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthFilter::All => f.write_str("all"),
            MonthFilter::Month(month) => write!(f, "{}", month),
        }
    }
}

// == Cached Query ==
/// Runs `kind` over the flights passing `filter`, through the query cache.
///
/// Datasets are only loaded when the result is not cached.
pub async fn run_query(
    facade: &CacheFacade,
    kind: QueryKind,
    filter: MonthFilter,
) -> Result<Vec<Row>> {
    let query_value = filter.to_string();
    facade
        .query_result(FLIGHTS, kind.as_str(), &query_value, move || async move {
            let flights = facade.dataset(FLIGHTS).await?;
            let selected = flights.iter().filter(|row| filter.matches(row));
            match kind {
                QueryKind::AvgDelayPerAirline => {
                    let airlines = facade.dataset(AIRLINES).await?;
                    Ok(avg_delay_per_airline(selected, &airlines))
                }
                QueryKind::FlightsPerAirport => {
                    let airports = facade.dataset(AIRPORTS).await?;
                    Ok(total_flights_per_airport(selected, &airports))
                }
            }
        })
        .await
}

// == Aggregations ==
/// Join key of a cell: text or integer codes, nothing for empty cells.
fn join_key(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::Text(text)) => Some(text.clone()),
        Some(Value::Int(int)) => Some(int.to_string()),
        _ => None,
    }
}

/// `code column -> name column` lookup for a reference table.
fn lookup_table(rows: &[Row], code: &str, name: &str) -> HashMap<String, String> {
    rows.iter()
        .filter_map(|row| {
            let key = join_key(row.get(code))?;
            let label = row.get(name).filter(|v| !v.is_null())?.to_string();
            Some((key, label))
        })
        .collect()
}

/// Mean `DEPARTURE_DELAY` per airline name, highest first.
///
/// Flights join airlines on `AIRLINE = IATA_CODE`; unmatched flights are
/// dropped. Airlines with no delay values get a null mean and sort last.
pub fn avg_delay_per_airline<'a>(
    flights: impl IntoIterator<Item = &'a Row>,
    airlines: &[Row],
) -> Vec<Row> {
    let names = lookup_table(airlines, "IATA_CODE", "AIRLINE");
    let mut groups: IndexMap<&str, (f64, usize)> = IndexMap::new();
    for flight in flights {
        let code = join_key(flight.get("AIRLINE"));
        let Some(name) = code.and_then(|code| names.get(&code)) else {
            continue;
        };
        let group = groups.entry(name.as_str()).or_insert((0.0, 0));
        if let Some(delay) = flight.get("DEPARTURE_DELAY").and_then(Value::as_f64) {
            group.0 += delay;
            group.1 += 1;
        }
    }

    let mut means: Vec<(&str, Option<f64>)> = groups
        .into_iter()
        .map(|(name, (sum, count))| (name, (count > 0).then(|| sum / count as f64)))
        .collect();
    means.sort_by(|a, b| match (a.1, b.1) {
        (Some(x), Some(y)) => y.total_cmp(&x).then_with(|| a.0.cmp(b.0)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.0.cmp(b.0),
    });

    means
        .into_iter()
        .map(|(name, mean)| {
            let mut row = Row::new();
            row.insert("AIRLINE".to_string(), Value::Text(name.to_string()));
            row.insert(
                "DEPARTURE_DELAY".to_string(),
                mean.map_or(Value::Null, Value::from),
            );
            row
        })
        .collect()
}

/// Count of flights with a `FLIGHT_NUMBER` per origin airport name, highest
/// first.
///
/// Flights join airports on `ORIGIN_AIRPORT = IATA_CODE`; unmatched flights
/// are dropped.
pub fn total_flights_per_airport<'a>(
    flights: impl IntoIterator<Item = &'a Row>,
    airports: &[Row],
) -> Vec<Row> {
    let names = lookup_table(airports, "IATA_CODE", "AIRPORT");
    let mut counts: IndexMap<&str, i64> = IndexMap::new();
    for flight in flights {
        let code = join_key(flight.get("ORIGIN_AIRPORT"));
        let Some(name) = code.and_then(|code| names.get(&code)) else {
            continue;
        };
        let count = counts.entry(name.as_str()).or_insert(0);
        if flight.get("FLIGHT_NUMBER").is_some_and(|v| !v.is_null()) {
            *count += 1;
        }
    }

    let mut totals: Vec<(&str, i64)> = counts.into_iter().collect();
    totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    totals
        .into_iter()
        .map(|(name, count)| {
            let mut row = Row::new();
            row.insert("AIRPORT".to_string(), Value::Text(name.to_string()));
            row.insert("FLIGHT_NUMBER".to_string(), Value::Int(count));
            row
        })
        .collect()
}
