//! Pivot flat per-date trend rows into per-place time-series.
//!
//! Rows are grouped by exact `place_id`, each group is stably sorted by its
//! `YYYY-MM-DD` date string (lexicographic order is chronological order), and
//! every group yields three parallel `(date, value)` sequences, one per metric.
//! Duplicate dates keep their input order. NaN metrics pass through untouched.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::rows::{CountryTrendLine, Metrics, RegionalTrendLine};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendValue {
    pub date: String,
    /// NaN means no data for that date, not zero interest.
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendSet {
    pub covid19_vaccination: Vec<TrendValue>,
    pub vaccination_intent: Vec<TrendValue>,
    pub safety_side_effects: Vec<TrendValue>,
}

/// Time-series bundle for one place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalTrends {
    pub place_id: String,
    pub trends: TrendSet,
}

pub type TrendMap = BTreeMap<String, RegionalTrends>;

/// A per-date row that can be pivoted.
pub trait TrendLine {
    fn place_id(&self) -> &str;
    fn date(&self) -> &str;
    fn metrics(&self) -> Metrics;
}

impl TrendLine for RegionalTrendLine {
    fn place_id(&self) -> &str {
        &self.place_id
    }

    fn date(&self) -> &str {
        &self.date
    }

    fn metrics(&self) -> Metrics {
        Metrics {
            sni_covid19_vaccination: self.sni_covid19_vaccination,
            sni_vaccination_intent: self.sni_vaccination_intent,
            sni_safety_side_effects: self.sni_safety_side_effects,
        }
    }
}

impl TrendLine for CountryTrendLine {
    fn place_id(&self) -> &str {
        &self.place_id
    }

    fn date(&self) -> &str {
        &self.date
    }

    fn metrics(&self) -> Metrics {
        Metrics {
            sni_covid19_vaccination: self.sni_covid19_vaccination,
            sni_vaccination_intent: self.sni_vaccination_intent,
            sni_safety_side_effects: self.sni_safety_side_effects,
        }
    }
}

/// Convert table rows into one trend bundle per place.
pub fn convert_table_to_trend_timeseries<L: TrendLine>(lines: &[L]) -> TrendMap {
    let mut groups: BTreeMap<&str, Vec<&L>> = BTreeMap::new();
    for line in lines {
        groups.entry(line.place_id()).or_default().push(line);
    }

    groups
        .into_iter()
        .map(|(place_id, mut leaves)| {
            // sort_by is stable: same-date rows keep their input order.
            leaves.sort_by(|l, r| l.date().cmp(r.date()));
            (place_id.to_string(), rollup(&leaves))
        })
        .collect()
}

fn rollup<L: TrendLine>(leaves: &[&L]) -> RegionalTrends {
    let mut trends = TrendSet {
        covid19_vaccination: Vec::with_capacity(leaves.len()),
        vaccination_intent: Vec::with_capacity(leaves.len()),
        safety_side_effects: Vec::with_capacity(leaves.len()),
    };

    for leaf in leaves {
        let metrics = leaf.metrics();
        let date = leaf.date();
        trends.covid19_vaccination.push(TrendValue {
            date: date.to_string(),
            value: metrics.sni_covid19_vaccination,
        });
        trends.vaccination_intent.push(TrendValue {
            date: date.to_string(),
            value: metrics.sni_vaccination_intent,
        });
        trends.safety_side_effects.push(TrendValue {
            date: date.to_string(),
            value: metrics.sni_safety_side_effects,
        });
    }

    RegionalTrends {
        place_id: leaves
            .first()
            .map(|leaf| leaf.place_id().to_string())
            .unwrap_or_default(),
        trends,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::coerce_number;

    fn line(place: &str, date: &str, vax: &str, intent: &str, safety: &str) -> CountryTrendLine {
        CountryTrendLine {
            date: date.to_string(),
            country_region: String::new(),
            country_region_code: String::new(),
            place_id: place.to_string(),
            sni_covid19_vaccination: coerce_number(vax),
            sni_vaccination_intent: coerce_number(intent),
            sni_safety_side_effects: coerce_number(safety),
        }
    }

    #[test]
    fn test_empty_input() {
        let trends = convert_table_to_trend_timeseries::<CountryTrendLine>(&[]);
        assert!(trends.is_empty());
    }

    #[test]
    fn test_end_to_end_scenario() {
        let rows = vec![
            line("A", "2021-02-01", "5", "", ""),
            line("A", "2021-01-01", "", "", ""),
            line("B", "2021-01-01", "3", "", ""),
        ];
        let trends = convert_table_to_trend_timeseries(&rows);
        assert_eq!(trends.len(), 2);

        let a = &trends["A"].trends.covid19_vaccination;
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].date, "2021-01-01");
        assert!(a[0].value.is_nan());
        assert_eq!(a[1].date, "2021-02-01");
        assert_eq!(a[1].value, 5.0);

        let b = &trends["B"].trends.covid19_vaccination;
        assert_eq!(b.len(), 1);
        assert_eq!(b[0].date, "2021-01-01");
        assert_eq!(b[0].value, 3.0);
        assert_eq!(trends["B"].place_id, "B");
    }

    #[test]
    fn test_preserves_places_and_counts() {
        let rows = vec![
            line("A", "2021-01-03", "1", "1", "1"),
            line("B", "2021-01-01", "1", "1", "1"),
            line("A", "2021-01-01", "1", "1", "1"),
            line("C", "2021-01-02", "1", "1", "1"),
            line("A", "2021-01-02", "1", "1", "1"),
        ];
        let trends = convert_table_to_trend_timeseries(&rows);
        let places: Vec<&str> = trends.keys().map(String::as_str).collect();
        assert_eq!(places, vec!["A", "B", "C"]);
        assert_eq!(trends["A"].trends.covid19_vaccination.len(), 3);
        assert_eq!(trends["A"].trends.vaccination_intent.len(), 3);
        assert_eq!(trends["A"].trends.safety_side_effects.len(), 3);
        assert_eq!(trends["B"].trends.covid19_vaccination.len(), 1);
    }

    #[test]
    fn test_sorted_by_date() {
        let rows = vec![
            line("A", "2021-03-01", "3", "30", "300"),
            line("A", "2021-01-01", "1", "10", "100"),
            line("A", "2021-02-01", "2", "20", "200"),
        ];
        let trends = convert_table_to_trend_timeseries(&rows);
        let set = &trends["A"].trends;
        for series in [
            &set.covid19_vaccination,
            &set.vaccination_intent,
            &set.safety_side_effects,
        ] {
            assert!(series.windows(2).all(|w| w[0].date <= w[1].date));
        }
        let intents: Vec<f64> = set.vaccination_intent.iter().map(|v| v.value).collect();
        assert_eq!(intents, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_duplicate_dates_keep_input_order() {
        let rows = vec![
            line("A", "2021-01-02", "9", "", ""),
            line("A", "2021-01-01", "1", "", ""),
            line("A", "2021-01-01", "2", "", ""),
            line("A", "2021-01-01", "3", "", ""),
        ];
        let trends = convert_table_to_trend_timeseries(&rows);
        let values: Vec<f64> = trends["A"]
            .trends
            .covid19_vaccination
            .iter()
            .map(|v| v.value)
            .collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 9.0]);
    }

    #[test]
    fn test_place_ids_are_not_normalized() {
        let rows = vec![line("a", "2021-01-01", "1", "", ""), line("A", "2021-01-01", "2", "", "")];
        let trends = convert_table_to_trend_timeseries(&rows);
        assert_eq!(trends.len(), 2);
    }

    #[test]
    fn test_regional_lines_pivot() {
        let rows = vec![RegionalTrendLine {
            date: "2021-01-01".to_string(),
            country_region: "United States".to_string(),
            country_region_code: "US".to_string(),
            sub_region_1: "New York".to_string(),
            sub_region_1_code: "US-NY".to_string(),
            sub_region_2: String::new(),
            sub_region_2_code: String::new(),
            sub_region_3: String::new(),
            sub_region_3_code: String::new(),
            place_id: "ny".to_string(),
            sni_covid19_vaccination: 1.0,
            sni_vaccination_intent: 2.0,
            sni_safety_side_effects: f64::NAN,
        }];
        let trends = convert_table_to_trend_timeseries(&rows);
        let set = &trends["ny"].trends;
        assert_eq!(set.vaccination_intent[0].value, 2.0);
        assert!(set.safety_side_effects[0].value.is_nan());
    }

    #[test]
    fn test_nan_serializes_as_null() {
        let rows = vec![line("A", "2021-01-01", "", "", "")];
        let trends = convert_table_to_trend_timeseries(&rows);
        let json = serde_json::to_value(&trends["A"]).unwrap();
        assert!(json["trends"]["covid19_vaccination"][0]["value"].is_null());
    }
}
