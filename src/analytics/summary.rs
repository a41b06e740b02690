//! Pure aggregation of the raw visit log into summarized metrics.
//!
//! `summarize` is deterministic given the same event list and reference
//! time; "now" is injected rather than read from a live clock so the
//! calendar-day bucketing is testable. All calendar math uses UTC.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::analytics::device::DeviceClass;
use crate::models::{ShortLink, Visit};

/// Number of trailing calendar days (ending today, inclusive) in the
/// daily click series.
const DAILY_WINDOW: i64 = 7;

/// Number of countries reported in the distribution.
const TOP_COUNTRIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    /// Calendar date in ISO format (YYYY-MM-DD), UTC.
    pub date: String,
    pub clicks: i64,
}

/// Derived view over a link's raw visit log.
///
/// `clicks` is the link's counter, which is authoritative; `visits` is
/// the event count. The two can diverge when an event append fails after
/// a delivered redirect, so both are reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub original_url: String,
    pub short_code: String,
    pub clicks: i64,
    pub visits: i64,
    pub created_at: i64,
    pub unique_visitors: i64,
    pub devices: Vec<CategoryCount>,
    pub countries: Vec<CategoryCount>,
    pub daily: Vec<DailyCount>,
}

/// Summarize a link's visit history as of `now`.
pub fn summarize(link: &ShortLink, events: &[Visit], now: DateTime<Utc>) -> AnalyticsSummary {
    AnalyticsSummary {
        original_url: link.original_url.clone(),
        short_code: link.short_code.clone(),
        clicks: link.clicks,
        visits: events.len() as i64,
        created_at: link.created_at,
        unique_visitors: unique_visitors(events),
        devices: device_distribution(events),
        countries: country_distribution(events),
        daily: daily_series(events, now),
    }
}

fn unique_visitors(events: &[Visit]) -> i64 {
    events.iter().map(|e| e.ip.as_str()).collect::<HashSet<_>>().len() as i64
}

fn device_distribution(events: &[Visit]) -> Vec<CategoryCount> {
    let mut counts: HashMap<DeviceClass, i64> = HashMap::new();
    for event in events {
        *counts.entry(DeviceClass::from_label(&event.device)).or_insert(0) += 1;
    }

    // Fixed category order keeps the output deterministic.
    DeviceClass::ALL
        .iter()
        .map(|class| CategoryCount {
            name: class.as_str().to_string(),
            count: counts.get(class).copied().unwrap_or(0),
        })
        .collect()
}

fn country_distribution(events: &[Visit]) -> Vec<CategoryCount> {
    // Track first-encountered position so ties sort in input order.
    let mut counts: HashMap<&str, (usize, i64)> = HashMap::new();
    for (index, event) in events.iter().enumerate() {
        counts
            .entry(event.country.as_str())
            .and_modify(|(_, count)| *count += 1)
            .or_insert((index, 1));
    }

    let mut grouped: Vec<(&str, usize, i64)> = counts
        .into_iter()
        .map(|(name, (first_seen, count))| (name, first_seen, count))
        .collect();
    grouped.sort_by(|a, b| b.2.cmp(&a.2).then(a.1.cmp(&b.1)));
    grouped.truncate(TOP_COUNTRIES);

    grouped
        .into_iter()
        .map(|(name, _, count)| CategoryCount {
            name: name.to_string(),
            count,
        })
        .collect()
}

fn daily_series(events: &[Visit], now: DateTime<Utc>) -> Vec<DailyCount> {
    let today = now.date_naive();

    (0..DAILY_WINDOW)
        .map(|offset| {
            let day = today - Duration::days(DAILY_WINDOW - 1 - offset);
            let clicks = events
                .iter()
                .filter(|e| {
                    DateTime::<Utc>::from_timestamp(e.created_at, 0)
                        .map(|ts| ts.date_naive() == day)
                        .unwrap_or(false)
                })
                .count() as i64;

            DailyCount {
                date: day.format("%Y-%m-%d").to_string(),
                clicks,
            }
        })
        .collect()
}
