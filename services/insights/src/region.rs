//! Region catalog: classifies each region record into the
//! country → sub-region-1 → sub-region-2 → sub-region-3 hierarchy.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{InsightsError, Result};
use crate::rows::csv_reader;

pub const REGIONS_FILENAME: &str = "regions.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionType {
    #[serde(rename = "country_region")]
    CountryRegion,
    #[serde(rename = "sub_region_1")]
    SubRegionOne,
    #[serde(rename = "sub_region_2")]
    SubRegionTwo,
    #[serde(rename = "sub_region_3")]
    SubRegionThree,
}

impl RegionType {
    /// The hierarchy level directly above this one.
    pub fn parent(self) -> Option<RegionType> {
        match self {
            RegionType::CountryRegion => None,
            RegionType::SubRegionOne => Some(RegionType::CountryRegion),
            RegionType::SubRegionTwo => Some(RegionType::SubRegionOne),
            RegionType::SubRegionThree => Some(RegionType::SubRegionTwo),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RegionType::CountryRegion => "country_region",
            RegionType::SubRegionOne => "sub_region_1",
            RegionType::SubRegionTwo => "sub_region_2",
            RegionType::SubRegionThree => "sub_region_3",
        }
    }
}

/// One row of `regions.csv` as it arrives: every field a string.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawRegion {
    pub country_region: String,
    pub country_region_code: String,
    pub sub_region_1: String,
    pub sub_region_1_code: String,
    pub sub_region_2: String,
    pub sub_region_2_code: String,
    pub sub_region_3: String,
    pub sub_region_3_code: String,
    pub place_id: String,
}

impl RawRegion {
    fn name_at(&self, level: RegionType) -> &str {
        match level {
            RegionType::CountryRegion => &self.country_region,
            RegionType::SubRegionOne => &self.sub_region_1,
            RegionType::SubRegionTwo => &self.sub_region_2,
            RegionType::SubRegionThree => &self.sub_region_3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    pub country_region: String,
    pub country_region_code: String,
    pub sub_region_1: String,
    pub sub_region_1_code: String,
    pub sub_region_2: String,
    pub sub_region_2_code: String,
    pub sub_region_3: String,
    pub sub_region_3_code: String,
    pub place_id: String,
    /// `None` when the record carries no code at any level.
    pub region_type: Option<RegionType>,
    pub parent_region_type: Option<RegionType>,
}

pub type RegionCatalog = HashMap<String, Region>;

/// Compute `region_type` and `parent_region_type` for a raw record.
pub fn classify(raw: RawRegion) -> Region {
    let region_type = if !raw.sub_region_3_code.is_empty() {
        Some(RegionType::SubRegionThree)
    } else if !raw.sub_region_2_code.is_empty() {
        Some(RegionType::SubRegionTwo)
    } else if !raw.sub_region_1_code.is_empty() {
        Some(RegionType::SubRegionOne)
    } else if !raw.country_region_code.is_empty() {
        Some(RegionType::CountryRegion)
    } else {
        None
    };

    let mut parent_region_type = region_type.and_then(RegionType::parent);

    // Flat geographies (e.g. Washington DC) have no name at the nominal parent level.
    if let Some(parent) = parent_region_type {
        if raw.name_at(parent).is_empty() {
            if !raw.sub_region_1_code.is_empty() && region_type != Some(RegionType::SubRegionOne) {
                parent_region_type = Some(RegionType::SubRegionOne);
            } else if !raw.country_region_code.is_empty() {
                parent_region_type = Some(RegionType::CountryRegion);
            }
        }
    }

    Region {
        country_region: raw.country_region,
        country_region_code: raw.country_region_code,
        sub_region_1: raw.sub_region_1,
        sub_region_1_code: raw.sub_region_1_code,
        sub_region_2: raw.sub_region_2,
        sub_region_2_code: raw.sub_region_2_code,
        sub_region_3: raw.sub_region_3,
        sub_region_3_code: raw.sub_region_3_code,
        place_id: raw.place_id,
        region_type,
        parent_region_type,
    }
}

/// Parse `regions.csv` into a `place_id` keyed catalog.
pub fn parse_regions(content: &str) -> Result<RegionCatalog> {
    let mut reader = csv_reader(content);
    let mut catalog = RegionCatalog::new();
    let mut rows = 0usize;

    for result in reader.deserialize::<RawRegion>() {
        let raw = result.map_err(|e| InsightsError::csv(REGIONS_FILENAME, e))?;
        let region = classify(raw);
        catalog.insert(region.place_id.clone(), region);
        rows += 1;
    }

    info!(rows, regions = catalog.len(), "received region data");
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(codes: [&str; 4], names: [&str; 4]) -> RawRegion {
        RawRegion {
            country_region: names[0].to_string(),
            country_region_code: codes[0].to_string(),
            sub_region_1: names[1].to_string(),
            sub_region_1_code: codes[1].to_string(),
            sub_region_2: names[2].to_string(),
            sub_region_2_code: codes[2].to_string(),
            sub_region_3: names[3].to_string(),
            sub_region_3_code: codes[3].to_string(),
            place_id: "place".to_string(),
        }
    }

    #[test]
    fn test_country_only() {
        let region = classify(raw(["US", "", "", ""], ["United States", "", "", ""]));
        assert_eq!(region.region_type, Some(RegionType::CountryRegion));
        assert_eq!(region.parent_region_type, None);
    }

    #[test]
    fn test_sub_region_two() {
        let region = classify(raw(
            ["US", "US-NY", "36061", ""],
            ["United States", "New York", "New York County", ""],
        ));
        assert_eq!(region.region_type, Some(RegionType::SubRegionTwo));
        assert_eq!(region.parent_region_type, Some(RegionType::SubRegionOne));
    }

    #[test]
    fn test_sub_region_three() {
        let region = classify(raw(
            ["US", "US-NY", "36061", "10001"],
            ["United States", "New York", "New York County", "10001"],
        ));
        assert_eq!(region.region_type, Some(RegionType::SubRegionThree));
        assert_eq!(region.parent_region_type, Some(RegionType::SubRegionTwo));
    }

    #[test]
    fn test_sub_region_one_without_country_code() {
        // Parent level is country; its name is missing and no country code exists.
        let region = classify(raw(["", "US-DC", "", ""], ["", "District of Columbia", "", ""]));
        assert_eq!(region.region_type, Some(RegionType::SubRegionOne));
        assert_eq!(region.parent_region_type, Some(RegionType::CountryRegion));
    }

    #[test]
    fn test_sub_region_one_with_blank_country_name() {
        let region = classify(raw(["US", "US-DC", "", ""], ["", "District of Columbia", "", ""]));
        assert_eq!(region.region_type, Some(RegionType::SubRegionOne));
        assert_eq!(region.parent_region_type, Some(RegionType::CountryRegion));
    }

    #[test]
    fn test_sub_region_three_skips_missing_county() {
        // Zip code directly under a state with no county level.
        let region = classify(raw(
            ["US", "US-DC", "", "20001"],
            ["United States", "District of Columbia", "", "20001"],
        ));
        assert_eq!(region.region_type, Some(RegionType::SubRegionThree));
        assert_eq!(region.parent_region_type, Some(RegionType::SubRegionOne));
    }

    #[test]
    fn test_sub_region_two_missing_state_falls_back_to_country() {
        let region = classify(raw(
            ["GB", "", "E09000001", ""],
            ["United Kingdom", "", "City of London", ""],
        ));
        assert_eq!(region.region_type, Some(RegionType::SubRegionTwo));
        assert_eq!(region.parent_region_type, Some(RegionType::CountryRegion));
    }

    #[test]
    fn test_sub_region_two_missing_state_name_keeps_state_parent() {
        let region = classify(raw(
            ["US", "US-DC", "11001", ""],
            ["United States", "", "Washington", ""],
        ));
        assert_eq!(region.parent_region_type, Some(RegionType::SubRegionOne));
    }

    #[test]
    fn test_no_codes_is_unclassified() {
        let region = classify(raw(["", "", "", ""], ["Somewhere", "", "", ""]));
        assert_eq!(region.region_type, None);
        assert_eq!(region.parent_region_type, None);
    }

    #[test]
    fn test_parse_regions_keyed_by_place_id() {
        let csv = "country_region,country_region_code,sub_region_1,sub_region_1_code,sub_region_2,sub_region_2_code,sub_region_3,sub_region_3_code,place_id\n\
                   United States,US,,,,,,,ChIJCzYy5IS16lQRQrfeQ5K5Oxw\n\
                   United States,US,New York,US-NY,,,,,ChIJqaUj8fBLzEwRZ5UY3sHGz90\n";
        let catalog = parse_regions(csv).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog["ChIJqaUj8fBLzEwRZ5UY3sHGz90"].region_type,
            Some(RegionType::SubRegionOne)
        );
    }

    #[test]
    fn test_parse_regions_missing_columns_default_empty() {
        let csv = "country_region,country_region_code,place_id\nAustralia,AU,p1\n";
        let catalog = parse_regions(csv).unwrap();
        assert_eq!(catalog["p1"].sub_region_1, "");
        assert_eq!(catalog["p1"].region_type, Some(RegionType::CountryRegion));
    }

    #[test]
    fn test_region_type_serializes_as_column_name() {
        let json = serde_json::to_string(&RegionType::SubRegionTwo).unwrap();
        assert_eq!(json, "\"sub_region_2\"");
        assert_eq!(RegionType::SubRegionTwo.as_str(), "sub_region_2");
    }
}
