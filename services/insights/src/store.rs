//! The session cache: every fetch path goes through a serialized, memoizing cell.
//!
//! Construct one [`InsightsStore`] at startup and pass it by reference. Cached
//! values live as long as the store.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{InsightsError, Result};
use crate::queries::{merge_query_maps, parse_queries_file, top_queries_files, QueryMap};
use crate::region::{parse_regions, RegionCatalog, REGIONS_FILENAME};
use crate::rows::{
    parse_global_trend_lines, parse_regional_trend_lines, CountryTrendLine, RegionalTrendLine,
    GLOBAL_TRENDS_FILENAME,
};
use crate::serialize::{Serialized, SerializedMap};
use crate::source::DataSource;
use crate::trends::{convert_table_to_trend_timeseries, TrendMap};

/// The selected country and the file holding its regional trends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryMetadata {
    pub country_code: String,
    pub data_file: String,
}

impl CountryMetadata {
    pub fn new(country_code: impl Into<String>, data_file: impl Into<String>) -> Self {
        Self {
            country_code: country_code.into(),
            data_file: data_file.into(),
        }
    }

    /// Metadata using the published `{CC}_vaccination_search_insights.csv` file name.
    pub fn for_country(country_code: &str) -> Self {
        Self::new(
            country_code,
            format!("{country_code}_vaccination_search_insights.csv"),
        )
    }
}

pub struct InsightsStore<S> {
    config: Config,
    source: S,
    regions: Serialized<RegionCatalog>,
    regional_lines: SerializedMap<String, Vec<RegionalTrendLine>>,
    regional_trends: SerializedMap<String, TrendMap>,
    global_lines: Serialized<Vec<CountryTrendLine>>,
    global_trends: Serialized<TrendMap>,
    top_queries: SerializedMap<String, QueryMap>,
    query_dates: Mutex<BTreeSet<String>>,
}

impl<S: DataSource> InsightsStore<S> {
    pub fn new(config: Config, source: S) -> Self {
        Self {
            config,
            source,
            regions: Serialized::new(),
            regional_lines: SerializedMap::new(),
            regional_trends: SerializedMap::new(),
            global_lines: Serialized::new(),
            global_trends: Serialized::new(),
            top_queries: SerializedMap::new(),
            query_dates: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// All regions keyed by `place_id`.
    pub async fn fetch_region_data(&self) -> Result<Arc<RegionCatalog>> {
        self.regions
            .get_or_try_init(|| async {
                let location = self.config.data_location(REGIONS_FILENAME);
                let body = self.source.fetch_text(&location).await?;
                parse_regions(&body)
            })
            .await
            .inspect_err(|e| warn!(error = %e, "region fetch failed"))
    }

    /// Regional trend rows of one country, cached per country code.
    pub async fn fetch_regional_trend_lines(
        &self,
        country: &CountryMetadata,
    ) -> Result<Arc<Vec<RegionalTrendLine>>> {
        self.regional_lines
            .get_or_try_init(country.country_code.clone(), || async {
                let location = self.config.data_location(&country.data_file);
                let body = self.source.fetch_text(&location).await?;
                parse_regional_trend_lines(&body, &country.data_file)
            })
            .await
            .inspect_err(|e| {
                warn!(country = %country.country_code, error = %e, "regional trends fetch failed")
            })
    }

    /// Regional trends pivoted per place, cached per country code.
    pub async fn fetch_regional_trends_data(
        &self,
        country: &CountryMetadata,
    ) -> Result<Arc<TrendMap>> {
        self.regional_trends
            .get_or_try_init(country.country_code.clone(), || async {
                let lines = self.fetch_regional_trend_lines(country).await?;
                let trends = convert_table_to_trend_timeseries(lines.as_slice());
                debug!(
                    country = %country.country_code,
                    places = trends.len(),
                    "pivoted regional trends"
                );
                Ok::<_, InsightsError>(trends)
            })
            .await
    }

    pub async fn fetch_global_trend_lines(&self) -> Result<Arc<Vec<CountryTrendLine>>> {
        self.global_lines
            .get_or_try_init(|| async {
                let location = self.config.data_location(GLOBAL_TRENDS_FILENAME);
                let body = self.source.fetch_text(&location).await?;
                parse_global_trend_lines(&body, &self.config.excluded_countries)
            })
            .await
            .inspect_err(|e| warn!(error = %e, "global trends fetch failed"))
    }

    pub async fn fetch_global_trends_data(&self) -> Result<Arc<TrendMap>> {
        self.global_trends
            .get_or_try_init(|| async {
                let lines = self.fetch_global_trend_lines().await?;
                let trends = convert_table_to_trend_timeseries(lines.as_slice());
                debug!(places = trends.len(), "pivoted global trends");
                Ok::<_, InsightsError>(trends)
            })
            .await
    }

    /// One top-queries file, bucketed by query key. Its dates join the running date set.
    pub async fn fetch_queries_file(&self, file: &str) -> Result<Arc<QueryMap>> {
        self.top_queries
            .get_or_try_init(file.to_string(), || async {
                let location = self.config.top_queries_location(file);
                let body = self.source.fetch_text(&location).await?;
                let parsed = parse_queries_file(&body, file)?;
                self.query_dates.lock().await.extend(parsed.dates);
                Ok::<_, InsightsError>(parsed.queries)
            })
            .await
            .inspect_err(|e| warn!(file, error = %e, "top queries fetch failed"))
    }

    /// L0 and L1 queries of a country merged into one map; L1 buckets replace L0 ones.
    pub async fn fetch_top_level_queries(&self, country_code: &str) -> Result<QueryMap> {
        let [l0_file, l1_file] = top_queries_files(country_code);
        let (l0, l1) = tokio::try_join!(
            self.fetch_queries_file(&l0_file),
            self.fetch_queries_file(&l1_file)
        )?;
        let merged = merge_query_maps([(*l0).clone(), (*l1).clone()]);
        info!(country = country_code, keys = merged.len(), "merged top queries");
        Ok(merged)
    }

    /// Every date seen in top-queries data so far, ascending.
    pub async fn top_queries_dates(&self) -> Vec<String> {
        self.query_dates.lock().await.iter().cloned().collect()
    }

    /// Geography boundary document for `geo_id`, returned uninterpreted.
    pub async fn fetch_zip_data(&self, geo_id: &str) -> Result<serde_json::Value> {
        self.source.fetch_json(&self.config.geo_location(geo_id)).await
    }
}
