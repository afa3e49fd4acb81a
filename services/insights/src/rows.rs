//! Typed trend rows and numeric coercion of the raw, all-string CSV records.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{InsightsError, Result};

pub const GLOBAL_TRENDS_FILENAME: &str = "Global_l0_vaccination_search_insights.csv";

/// Coerce a raw metric cell.
///
/// An empty cell is missing data and becomes NaN, never zero. Anything else is
/// parsed as a float; text that is not a finite number also yields NaN.
pub fn coerce_number(raw: &str) -> f64 {
    if raw.is_empty() {
        return f64::NAN;
    }
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(f64::NAN)
}

pub(crate) fn csv_reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes())
}

/// The three search-interest metrics carried by every trend row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub sni_covid19_vaccination: f64,
    pub sni_vaccination_intent: f64,
    pub sni_safety_side_effects: f64,
}

/// A trend row before coercion. Columns absent from the file stay empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTrendRow {
    pub date: String,
    pub country_region: String,
    pub country_region_code: String,
    pub sub_region_1: String,
    pub sub_region_1_code: String,
    pub sub_region_2: String,
    pub sub_region_2_code: String,
    pub sub_region_3: String,
    pub sub_region_3_code: String,
    pub place_id: String,
    pub sni_covid19_vaccination: String,
    pub sni_vaccination_intent: String,
    pub sni_safety_side_effects: String,
}

impl RawTrendRow {
    fn metrics(&self) -> Metrics {
        Metrics {
            sni_covid19_vaccination: coerce_number(&self.sni_covid19_vaccination),
            sni_vaccination_intent: coerce_number(&self.sni_vaccination_intent),
            sni_safety_side_effects: coerce_number(&self.sni_safety_side_effects),
        }
    }
}

/// One (place, date) row of a per-country regional trends file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalTrendLine {
    pub date: String,
    pub country_region: String,
    pub country_region_code: String,
    pub sub_region_1: String,
    pub sub_region_1_code: String,
    pub sub_region_2: String,
    pub sub_region_2_code: String,
    pub sub_region_3: String,
    pub sub_region_3_code: String,
    pub place_id: String,
    pub sni_covid19_vaccination: f64,
    pub sni_vaccination_intent: f64,
    pub sni_safety_side_effects: f64,
}

impl From<RawTrendRow> for RegionalTrendLine {
    fn from(raw: RawTrendRow) -> Self {
        let metrics = raw.metrics();
        Self {
            date: raw.date,
            country_region: raw.country_region,
            country_region_code: raw.country_region_code,
            sub_region_1: raw.sub_region_1,
            sub_region_1_code: raw.sub_region_1_code,
            sub_region_2: raw.sub_region_2,
            sub_region_2_code: raw.sub_region_2_code,
            sub_region_3: raw.sub_region_3,
            sub_region_3_code: raw.sub_region_3_code,
            place_id: raw.place_id,
            sni_covid19_vaccination: metrics.sni_covid19_vaccination,
            sni_vaccination_intent: metrics.sni_vaccination_intent,
            sni_safety_side_effects: metrics.sni_safety_side_effects,
        }
    }
}

/// One (country, date) row of the global trends file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryTrendLine {
    pub date: String,
    pub country_region: String,
    pub country_region_code: String,
    pub place_id: String,
    pub sni_covid19_vaccination: f64,
    pub sni_vaccination_intent: f64,
    pub sni_safety_side_effects: f64,
}

impl From<RawTrendRow> for CountryTrendLine {
    fn from(raw: RawTrendRow) -> Self {
        let metrics = raw.metrics();
        Self {
            date: raw.date,
            country_region: raw.country_region,
            country_region_code: raw.country_region_code,
            place_id: raw.place_id,
            sni_covid19_vaccination: metrics.sni_covid19_vaccination,
            sni_vaccination_intent: metrics.sni_vaccination_intent,
            sni_safety_side_effects: metrics.sni_safety_side_effects,
        }
    }
}

fn read_raw_rows(content: &str, file: &str) -> Result<Vec<RawTrendRow>> {
    csv_reader(content)
        .deserialize::<RawTrendRow>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| InsightsError::csv(file, e))
}

/// Parse a per-country regional trends file.
pub fn parse_regional_trend_lines(content: &str, file: &str) -> Result<Vec<RegionalTrendLine>> {
    let raw = read_raw_rows(content, file)?;
    info!(rows = raw.len(), file, "loaded regional trend data");
    Ok(raw.into_iter().map(RegionalTrendLine::from).collect())
}

/// Parse the global trends file, dropping rows for excluded countries.
pub fn parse_global_trend_lines(
    content: &str,
    excluded_countries: &[String],
) -> Result<Vec<CountryTrendLine>> {
    let raw = read_raw_rows(content, GLOBAL_TRENDS_FILENAME)?;
    info!(rows = raw.len(), "loaded global trend data");
    Ok(raw
        .into_iter()
        .filter(|row| !excluded_countries.iter().any(|c| *c == row.country_region))
        .map(CountryTrendLine::from)
        .collect())
}
