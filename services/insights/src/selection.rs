//! Helpers the map and table views use on regional trend rows.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::county::CountyCodeLookup;
use crate::error::InsightsError;
use crate::rows::RegionalTrendLine;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegionalTrendAggregate {
    pub sni_covid19_vaccination: f64,
    pub sni_vaccination_intent: f64,
    pub sni_safety_side_effects: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrendValueType {
    Vaccination,
    Intent,
    Safety,
}

impl TrendValueType {
    pub const ALL: [TrendValueType; 3] = [
        TrendValueType::Vaccination,
        TrendValueType::Intent,
        TrendValueType::Safety,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TrendValueType::Vaccination => "vaccination",
            TrendValueType::Intent => "intent",
            TrendValueType::Safety => "safety",
        }
    }
}

impl fmt::Display for TrendValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TrendValueType {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vaccination" => Ok(TrendValueType::Vaccination),
            "intent" => Ok(TrendValueType::Intent),
            "safety" => Ok(TrendValueType::Safety),
            other => {
                tracing::warn!(trend = other, "unknown trend type");
                Err(InsightsError::UnknownTrendType(other.to_string()))
            }
        }
    }
}

pub fn sub_region_one_code(line: &RegionalTrendLine) -> &str {
    &line.sub_region_1_code
}

/// The row's sub-region-2 code, or the lookup's code for its display name.
pub fn sub_region_two_code<'a>(
    line: &'a RegionalTrendLine,
    lookup: &'a impl CountyCodeLookup,
) -> &'a str {
    if !line.sub_region_2_code.is_empty() {
        &line.sub_region_2_code
    } else {
        lookup.county_code(&line.sub_region_2).unwrap_or("")
    }
}

pub fn sub_region_three_code(line: &RegionalTrendLine) -> &str {
    &line.sub_region_3_code
}

/// Rows at sub-region-1 granularity (or country rows in the same file).
pub fn select_region_one_trends<'a>(
    lines: &'a [RegionalTrendLine],
    lookup: &impl CountyCodeLookup,
) -> Vec<&'a RegionalTrendLine> {
    lines
        .iter()
        .filter(|line| {
            sub_region_two_code(line, lookup).is_empty() && sub_region_three_code(line).is_empty()
        })
        .collect()
}

pub fn select_region_two_trends<'a>(
    lines: &'a [RegionalTrendLine],
    lookup: &impl CountyCodeLookup,
) -> Vec<&'a RegionalTrendLine> {
    lines
        .iter()
        .filter(|line| {
            !sub_region_two_code(line, lookup).is_empty() && sub_region_three_code(line).is_empty()
        })
        .collect()
}

/// Metrics of every row on `date`, keyed by `key_fn`. Later rows win on key clashes.
pub fn aggregate_region_data_for_date<'a, I, F>(
    lines: I,
    date: &str,
    key_fn: F,
) -> HashMap<String, RegionalTrendAggregate>
where
    I: IntoIterator<Item = &'a RegionalTrendLine>,
    F: Fn(&RegionalTrendLine) -> String,
{
    lines
        .into_iter()
        .filter(|line| line.date == date)
        .map(|line| {
            (
                key_fn(line),
                RegionalTrendAggregate {
                    sni_covid19_vaccination: line.sni_covid19_vaccination,
                    sni_vaccination_intent: line.sni_vaccination_intent,
                    sni_safety_side_effects: line.sni_safety_side_effects,
                },
            )
        })
        .collect()
}

/// Distinct dates present in the rows, ascending.
pub fn build_date_range_list<'a, I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a RegionalTrendLine>,
{
    lines
        .into_iter()
        .map(|line| line.date.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Display value of one metric: missing rows and NaN read as 0, otherwise truncated.
pub fn trend_value(kind: TrendValueType, line: Option<&RegionalTrendLine>) -> f64 {
    let Some(line) = line else {
        return 0.0;
    };
    let value = match kind {
        TrendValueType::Vaccination => line.sni_covid19_vaccination,
        TrendValueType::Intent => line.sni_vaccination_intent,
        TrendValueType::Safety => line.sni_safety_side_effects,
    };
    if value.is_nan() {
        0.0
    } else {
        value.trunc()
    }
}
