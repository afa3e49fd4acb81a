//! Top-queries aggregation: rows bucketed by (place, date, query type, category).

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::error::{InsightsError, Result};
use crate::rows::{coerce_number, csv_reader};

/// Field separator of the legacy string form of a [`QueryKey`].
pub const QUERY_KEY_DELIMITER: char = ',';

/// Bucket key for top queries.
///
/// Field order is `place_id, date, query_type, category`; `Ord` follows it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    pub place_id: String,
    pub date: String,
    pub query_type: String,
    pub category: String,
}

impl QueryKey {
    pub fn new(
        place_id: impl Into<String>,
        date: impl Into<String>,
        query_type: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            place_id: place_id.into(),
            date: date.into(),
            query_type: query_type.into(),
            category: category.into(),
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{d}{}{d}{}{d}{}",
            self.place_id,
            self.date,
            self.query_type,
            self.category,
            d = QUERY_KEY_DELIMITER
        )
    }
}

impl FromStr for QueryKey {
    type Err = InsightsError;

    /// Parse the comma-joined form. Only valid when no field contains a comma.
    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split(QUERY_KEY_DELIMITER).collect();
        match fields.as_slice() {
            [place_id, date, query_type, category] => {
                Ok(QueryKey::new(*place_id, *date, *query_type, *category))
            }
            _ => Err(InsightsError::InvalidQueryKey(s.to_string())),
        }
    }
}

pub fn create_serialised_query_key(
    place_id: &str,
    date: &str,
    query_type: &str,
    category: &str,
) -> String {
    QueryKey::new(place_id, date, query_type, category).to_string()
}

/// Date field (second position) of a serialized key.
pub fn extract_date_from_query_key(key: &str) -> Option<&str> {
    key.split(QUERY_KEY_DELIMITER).nth(1)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryRow {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub country_region: String,
    #[serde(default)]
    pub country_region_code: String,
    #[serde(default)]
    pub sub_region_1: String,
    #[serde(default)]
    pub sub_region_1_code: String,
    #[serde(default)]
    pub sub_region_2: String,
    #[serde(default)]
    pub sub_region_2_code: String,
    #[serde(default)]
    pub sub_region_3: String,
    #[serde(default)]
    pub sub_region_3_code: String,
    #[serde(default)]
    pub place_id: String,
    #[serde(default)]
    pub query_type: String,
    #[serde(default)]
    pub query: String,
    /// `None` when the cell is blank or not a whole number.
    #[serde(default, deserialize_with = "lenient_rank")]
    pub rank: Option<u32>,
    #[serde(default = "nan", deserialize_with = "coerced")]
    pub sni: f64,
    #[serde(default)]
    pub category: String,
}

fn nan() -> f64 {
    f64::NAN
}

fn coerced<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(coerce_number(&raw))
}

fn lenient_rank<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<u32>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().parse().ok())
}

impl QueryRow {
    pub fn key(&self) -> QueryKey {
        QueryKey::new(&self.place_id, &self.date, &self.query_type, &self.category)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    pub query: String,
    pub rank: Option<u32>,
}

impl From<&QueryRow> for Query {
    fn from(row: &QueryRow) -> Self {
        Self {
            query: row.query.clone(),
            rank: row.rank,
        }
    }
}

pub type QueryMap = HashMap<QueryKey, Vec<Query>>;

/// Queries of one file with the dates they cover.
#[derive(Debug, Clone, Default)]
pub struct QueryFile {
    pub queries: QueryMap,
    pub dates: BTreeSet<String>,
}

/// Bucket rows by key. Rows sharing a key append in row order.
pub fn build_query_map<'a>(rows: impl IntoIterator<Item = &'a QueryRow>) -> QueryFile {
    let mut file = QueryFile::default();
    for row in rows {
        file.dates.insert(row.date.clone());
        file.queries.entry(row.key()).or_default().push(Query::from(row));
    }
    file
}

pub fn parse_queries_file(content: &str, file: &str) -> Result<QueryFile> {
    let rows = csv_reader(content)
        .deserialize::<QueryRow>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| InsightsError::csv(file, e))?;
    info!(rows = rows.len(), file, "received top queries data");
    Ok(build_query_map(&rows))
}

/// Merge maps in order. A key present in a later map replaces the whole
/// bucket from an earlier map; buckets are never concatenated.
pub fn merge_query_maps(maps: impl IntoIterator<Item = QueryMap>) -> QueryMap {
    maps.into_iter().fold(QueryMap::new(), |mut combined, current| {
        combined.extend(current);
        combined
    })
}

/// Distinct dates of the given keys, ascending.
pub fn create_date_list<'a>(keys: impl IntoIterator<Item = &'a QueryKey>) -> Vec<String> {
    keys.into_iter()
        .map(|key| key.date.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// L0 (country) and L1 (sub-national) top-queries files for a country, in merge order.
pub fn top_queries_files(country_code: &str) -> [String; 2] {
    [
        format!("{country_code}_l0_vaccination_trending_searches.csv"),
        format!("{country_code}_l1_vaccination_trending_searches.csv"),
    ]
}
