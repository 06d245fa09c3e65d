//! District and borough rollups
//!
//! Base counts and enrollment are summed per group; combined categories and
//! every percentage are recomputed from the sums. Summing per-school
//! combined columns would double count.

use crate::models::{ratio, Category, DemographicCounts, SchoolRecord};
use schools_common::Error;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

/// Summed totals for one group of schools
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RollupTotals {
    pub school_count: usize,
    pub total_enrollment: i64,
    pub counts: DemographicCounts,
    /// Combined categories recomputed from the summed base counts
    pub combined_counts: BTreeMap<Category, i64>,
    /// Enrollment-weighted mean over schools reporting an index
    pub economic_need_index: Option<f64>,
    /// Category → summed count / summed enrollment; `None` for zero enrollment
    pub percentages: BTreeMap<Category, Option<f64>>,
}

impl RollupTotals {
    fn from_records<'a>(records: impl IntoIterator<Item = &'a SchoolRecord>) -> Self {
        let mut totals = RollupTotals::default();
        let mut eni_weighted = 0.0;
        let mut eni_enrollment = 0i64;

        for record in records {
            totals.school_count += 1;
            totals.total_enrollment += record.total_enrollment;
            totals.counts += record.counts;
            if let Some(eni) = record.economic_need_index {
                eni_weighted += eni * record.total_enrollment as f64;
                eni_enrollment += record.total_enrollment;
            }
        }

        totals.economic_need_index = (eni_enrollment > 0).then(|| eni_weighted / eni_enrollment as f64);
        totals.combined_counts = Category::COMBINED
            .into_iter()
            .map(|category| (category, totals.count(category)))
            .collect();
        totals.percentages = Category::all()
            .map(|category| (category, totals.percentage(category)))
            .collect();
        totals
    }

    /// Summed count; combined categories recomputed from summed base counts
    pub fn count(&self, category: Category) -> i64 {
        self.counts.count(category, self.total_enrollment)
    }

    pub fn percentage(&self, category: Category) -> Option<f64> {
        ratio(self.count(category), self.total_enrollment)
    }
}

/// One (district, year) rollup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictAggregate {
    pub district: u8,
    pub year: i32,
    #[serde(flatten)]
    pub totals: RollupTotals,
}

/// One (borough, year) rollup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoroughAggregate {
    pub borough: char,
    pub borough_name: String,
    pub year: i32,
    #[serde(flatten)]
    pub totals: RollupTotals,
}

/// Group records by (district, year)
///
/// Output order carries no meaning; use [`sort_districts`] for a specific
/// ordering.
pub fn aggregate(records: &[SchoolRecord]) -> Vec<DistrictAggregate> {
    let aggregates: Vec<DistrictAggregate> = group_by(records, |r| (r.district, r.year))
        .into_iter()
        .map(|((district, year), members)| DistrictAggregate {
            district,
            year,
            totals: RollupTotals::from_records(members),
        })
        .collect();

    debug!(schools = records.len(), districts = aggregates.len(), "Aggregated districts");
    aggregates
}

/// Group records by (borough, year)
pub fn aggregate_by_borough(records: &[SchoolRecord]) -> Vec<BoroughAggregate> {
    group_by(records, |r| (r.borough, r.year))
        .into_iter()
        .map(|((borough, year), members)| BoroughAggregate {
            borough,
            borough_name: members[0].borough_name.clone(),
            year,
            totals: RollupTotals::from_records(members),
        })
        .collect()
}

fn group_by<K: Ord>(records: &[SchoolRecord], key: impl Fn(&SchoolRecord) -> K) -> BTreeMap<K, Vec<&SchoolRecord>> {
    let mut groups: BTreeMap<K, Vec<&SchoolRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().push(record);
    }
    groups
}

/// Column a district table can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    District,
    Year,
    SchoolCount,
    TotalEnrollment,
    Count(Category),
    Percentage(Category),
}

impl FromStr for SortKey {
    type Err = Error;

    /// "district", "year", "school_count", "total_enrollment",
    /// "<category>" (percentage) or "<category>_count"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        match key.as_str() {
            "district" => return Ok(SortKey::District),
            "year" => return Ok(SortKey::Year),
            "school_count" => return Ok(SortKey::SchoolCount),
            "total_enrollment" => return Ok(SortKey::TotalEnrollment),
            _ => {}
        }
        if let Some(category) = key.strip_suffix("_count").and_then(Category::from_column) {
            return Ok(SortKey::Count(category));
        }
        Category::from_column(&key)
            .map(SortKey::Percentage)
            .ok_or_else(|| Error::InvalidInput(format!("unknown sort column '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Caller-supplied ordering for district tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistrictOrder {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl DistrictOrder {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    fn value(&self, aggregate: &DistrictAggregate) -> Option<f64> {
        let totals = &aggregate.totals;
        match self.key {
            SortKey::District => Some(aggregate.district as f64),
            SortKey::Year => Some(aggregate.year as f64),
            SortKey::SchoolCount => Some(totals.school_count as f64),
            SortKey::TotalEnrollment => Some(totals.total_enrollment as f64),
            SortKey::Count(category) => Some(totals.count(category) as f64),
            SortKey::Percentage(category) => totals.percentage(category),
        }
    }
}

/// Stable sort; rows with a missing sort value go last in either direction
pub fn sort_districts(aggregates: &mut [DistrictAggregate], order: &DistrictOrder) {
    aggregates.sort_by(|a, b| match (order.value(a), order.value(b)) {
        (Some(x), Some(y)) => match order.direction {
            SortDirection::Ascending => x.total_cmp(&y),
            SortDirection::Descending => y.total_cmp(&x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
