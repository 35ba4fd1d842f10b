//! Aggregated per-developer activity statistics

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use timelens_domain::{Activity, DeveloperDay, IntervalStream, Statistic};

/// One developer-day's evaluated statistic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeveloperDayStatistic {
    pub developer: String,
    pub date: NaiveDate,
    pub intervals: usize,
    pub statistic: Statistic,
}

/// Whole-run totals for one developer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeveloperSummary {
    pub developer: String,
    pub active_days: usize,
    pub totals: BTreeMap<Activity, Duration>,
    pub inactivity_periods: usize,
    pub long_inactivity_periods: usize,
}

/// The derived activity budget of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityReport {
    pub days: Vec<DeveloperDayStatistic>,
    pub developers: Vec<DeveloperSummary>,
}

/// Fold evaluated developer-day statistics into a serialisable report.
pub fn build_report(
    timelines: &BTreeMap<DeveloperDay, IntervalStream>,
    statistics: &BTreeMap<DeveloperDay, Statistic>,
) -> ActivityReport {
    let mut days = Vec::with_capacity(statistics.len());
    let mut summaries: BTreeMap<String, DeveloperSummary> = BTreeMap::new();

    for (day, statistic) in statistics {
        let intervals = timelines.get(day).map_or(0, IntervalStream::len);
        days.push(DeveloperDayStatistic {
            developer: day.developer.clone(),
            date: day.date,
            intervals,
            statistic: statistic.clone(),
        });

        let summary = summaries.entry(day.developer.clone()).or_insert_with(|| {
            DeveloperSummary { developer: day.developer.clone(), ..DeveloperSummary::default() }
        });
        summary.active_days += 1;
        summary.inactivity_periods += statistic.inactivity_periods;
        summary.long_inactivity_periods += statistic.long_inactivity_periods;
        for (&activity, &duration) in &statistic.durations {
            *summary.totals.entry(activity).or_default() += duration;
        }
    }

    ActivityReport { days, developers: summaries.into_values().collect() }
}
