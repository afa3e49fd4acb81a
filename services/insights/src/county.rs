//! Fallback county codes keyed by sub-region-2 display name.
//!
//! Some countries publish sub-region-2 rows without a code. The table that
//! fills the gap is a pre-built reference artifact loaded from outside.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::{InsightsError, Result};
use crate::rows::csv_reader;

pub trait CountyCodeLookup {
    fn county_code(&self, sub_region_2: &str) -> Option<&str>;
}

/// Lookup that never resolves anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCountyLookup;

impl CountyCodeLookup for NoCountyLookup {
    fn county_code(&self, _sub_region_2: &str) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct CountyTable {
    codes: HashMap<String, String>,
}

#[derive(Deserialize)]
struct CountyRow {
    name: String,
    code: String,
}

impl CountyTable {
    pub fn from_pairs<I, N, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<String>,
    {
        Self {
            codes: pairs
                .into_iter()
                .map(|(name, code)| (name.into(), code.into()))
                .collect(),
        }
    }

    /// Load a `name,code` CSV. Rows with an empty code are ignored.
    pub fn from_csv(content: &str, file: &str) -> Result<Self> {
        let mut codes = HashMap::new();
        for result in csv_reader(content).deserialize::<CountyRow>() {
            let row = result.map_err(|e| InsightsError::csv(file, e))?;
            if !row.code.is_empty() {
                codes.insert(row.name, row.code);
            }
        }
        Ok(Self { codes })
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl CountyCodeLookup for CountyTable {
    fn county_code(&self, sub_region_2: &str) -> Option<&str> {
        self.codes.get(sub_region_2).map(String::as_str)
    }
}
