//! Insights - data access and shaping for the vaccination search insights dashboard
//!
//! Responsibilities:
//! - Fetch region metadata and the regional, global and top-queries CSV files
//! - Coerce raw string cells into typed rows (missing metrics become NaN)
//! - Pivot flat per-date tables into per-place time-series for charting
//! - Bucket top queries by (place, date, query type, category)
//! - Cache every result for the lifetime of an [`InsightsStore`], with one
//!   in-flight request per file

pub mod config;
pub mod county;
pub mod error;
pub mod queries;
pub mod region;
pub mod rows;
pub mod selection;
pub mod serialize;
pub mod source;
pub mod store;
pub mod trends;

pub use config::Config;
pub use county::{CountyCodeLookup, CountyTable, NoCountyLookup};
pub use error::{InsightsError, Result};
pub use queries::{Query, QueryKey, QueryMap, QueryRow};
pub use region::{Region, RegionCatalog, RegionType};
pub use rows::{coerce_number, CountryTrendLine, RegionalTrendLine};
pub use selection::{RegionalTrendAggregate, TrendValueType};
pub use source::{DataSource, HttpSource};
pub use store::{CountryMetadata, InsightsStore};
pub use trends::{convert_table_to_trend_timeseries, RegionalTrends, TrendMap, TrendValue};
