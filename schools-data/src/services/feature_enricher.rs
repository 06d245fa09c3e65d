//! Feature enrichment of raw source rows
//!
//! Turns raw demographic rows into [`SchoolRecord`]s (school code parsing,
//! borough lookup, academic year, grade bands, school type, percentage
//! coercion, canonical names) and raw test rows into [`TestResultRow`]s
//! (grade and category normalization, suppressed metric handling).

use crate::models::{
    DemographicCounts, DemographicPercentages, Grade, GradeBands, RawDemographicRow, RawTestRow,
    RawValue, SchoolRecord, SchoolType, TestCategory, TestMetrics, TestResultRow, GRADE_COLUMNS,
};
use crate::services::name_normalizer::NameNormalizer;
use schools_common::config::{CoercionConfig, GradeBandConfig};
use schools_common::{Error, PipelineConfig, Result};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Components of a school code ("01M015" → district 1, 'M', 15)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchoolCode {
    pub district: u8,
    pub borough: char,
    pub school_number: u32,
}

/// Split a school code by fixed offsets: [0..2] district, [2] borough,
/// [3..] school number
pub fn parse_school_code(dbn: &str) -> Result<SchoolCode> {
    let code = dbn.trim();
    let malformed = || Error::MalformedCode(dbn.to_string());

    if !code.is_ascii() || code.len() < 4 {
        return Err(malformed());
    }

    let district_digits = &code[..2];
    if !district_digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let district = district_digits.parse::<u8>().map_err(|_| malformed())?;
    let borough = code.as_bytes()[2] as char;
    if !borough.is_ascii_alphabetic() {
        return Err(malformed());
    }
    let suffix = &code[3..];
    if !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let school_number = suffix.parse::<u32>().map_err(|_| malformed())?;

    Ok(SchoolCode {
        district,
        borough: borough.to_ascii_uppercase(),
        school_number,
    })
}

/// Academic year from the leading four characters of a year label
/// ("2019-20" → 2019)
pub fn parse_year_label(label: &str) -> Result<i32> {
    let trimmed = label.trim();
    trimmed
        .get(..4)
        .filter(|prefix| prefix.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|prefix| prefix.parse::<i32>().ok())
        .ok_or_else(|| Error::parse("year", label, "expected a four-digit year prefix"))
}

/// Districts 1-32 plus the citywide special-education (75), alternative
/// (79) and charter (84) codes
pub fn is_known_district(district: u8) -> bool {
    matches!(district, 1..=32 | 75 | 79 | 84)
}

/// Feature enricher configured with the borough, category, grade-band and
/// coercion tables
#[derive(Debug, Clone)]
pub struct FeatureEnricher {
    boroughs: BTreeMap<char, String>,
    categories: BTreeMap<String, TestCategory>,
    grade_bands: GradeBandConfig,
    coercion: CoercionConfig,
    normalizer: NameNormalizer,
}

impl FeatureEnricher {
    /// Build an enricher, rejecting grade-band columns or category targets
    /// the source schema does not have
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;

        for (band, column) in [
            ("pre_k", &config.grade_bands.pre_k),
            ("elementary", &config.grade_bands.elementary),
            ("middle", &config.grade_bands.middle),
            ("high", &config.grade_bands.high),
        ] {
            if !GRADE_COLUMNS.contains(&column.as_str()) {
                return Err(Error::Config(format!(
                    "grade_bands.{} names unknown grade column '{}'",
                    band, column
                )));
            }
        }

        let boroughs = config
            .boroughs
            .iter()
            .filter_map(|(letter, name)| letter.chars().next().map(|c| (c.to_ascii_uppercase(), name.clone())))
            .collect();

        let categories = config
            .categories
            .iter()
            .map(|(label, key)| {
                key.parse::<TestCategory>()
                    .map(|category| (label.trim().to_lowercase(), category))
                    .map_err(|_| {
                        Error::Config(format!(
                            "category label '{}' maps to unknown canonical category '{}'",
                            label, key
                        ))
                    })
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self {
            boroughs,
            categories,
            grade_bands: config.grade_bands.clone(),
            coercion: config.coercion.clone(),
            normalizer: NameNormalizer::new(config),
        })
    }

    /// Enrich every demographic row; the first failing row aborts ingestion
    pub fn enrich_all(&self, rows: &[RawDemographicRow]) -> Result<Vec<SchoolRecord>> {
        let records = rows.iter().map(|row| self.enrich(row)).collect::<Result<Vec<_>>>()?;
        info!("Enriched {} school records", records.len());
        Ok(records)
    }

    /// Enrich one demographic row
    pub fn enrich(&self, row: &RawDemographicRow) -> Result<SchoolRecord> {
        let code = parse_school_code(&row.dbn)?;
        let borough_name = self
            .boroughs
            .get(&code.borough)
            .cloned()
            .ok_or(Error::UnknownBorough(code.borough))?;

        if !is_known_district(code.district) {
            warn!(dbn = %row.dbn, district = code.district, "District outside known coding scheme");
        }

        let year = parse_year_label(&row.year)?;

        let grade_bands = GradeBands {
            pre_k: self.serves(row, &self.grade_bands.pre_k),
            elementary: self.serves(row, &self.grade_bands.elementary),
            middle: self.serves(row, &self.grade_bands.middle),
            high: self.serves(row, &self.grade_bands.high),
        };

        let counts = DemographicCounts {
            female: row.female,
            male: row.male,
            asian: row.asian,
            black: row.black,
            hispanic: row.hispanic,
            multiracial: row.multiple_race_categories,
            white: row.white,
            students_with_disabilities: row.students_with_disabilities,
            english_language_learners: row.english_language_learners,
            poverty: row.poverty,
        };

        let mut pct = [0.0; 10];
        for (slot, (column, cell)) in pct.iter_mut().zip(row.percentage_cells()) {
            *slot = self.coerce_percentage(column, cell).map_err(|e| {
                debug!(dbn = %row.dbn, column, "Percentage coercion failed");
                e
            })?;
        }
        let percentages = DemographicPercentages {
            female: pct[0],
            male: pct[1],
            asian: pct[2],
            black: pct[3],
            hispanic: pct[4],
            multiracial: pct[5],
            white: pct[6],
            students_with_disabilities: pct[7],
            english_language_learners: pct[8],
            poverty: pct[9],
        };

        let economic_need_index = row.economic_need_index.as_ref().and_then(|cell| {
            match self.coerce_percentage("economic_need_index", cell) {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!(dbn = %row.dbn, error = %e, "Economic need index unavailable");
                    None
                }
            }
        });

        let mut record = SchoolRecord {
            dbn: row.dbn.trim().to_string(),
            school_name: row.school_name.clone(),
            year,
            district: code.district,
            borough: code.borough,
            borough_name,
            school_number: code.school_number,
            school_type: SchoolType::from_bands(&grade_bands),
            grade_bands,
            total_enrollment: row.total_enrollment,
            counts,
            percentages,
            economic_need_index,
            clean_name: String::new(),
            short_name: String::new(),
        };
        self.normalizer.apply(&mut record);

        Ok(record)
    }

    fn serves(&self, row: &RawDemographicRow, column: &str) -> bool {
        row.grade_enrollment(column).unwrap_or(0) > 0
    }

    /// Coerce a percentage cell to a fraction
    ///
    /// Numeric cells (or numeric text) are taken as-is; the suppression
    /// labels map to their sentinels; anything else must be "<number>%"
    /// and is divided by 100. Results outside [0, 1] are clamped with a
    /// warning.
    pub fn coerce_percentage(&self, column: &str, cell: &RawValue) -> Result<f64> {
        let value = match cell {
            RawValue::Number(n) => *n,
            RawValue::Text(text) => self.coerce_percentage_text(column, text)?,
        };

        if !value.is_finite() {
            return Err(Error::parse(column, cell.as_text(), "not a finite number"));
        }
        if !(0.0..=1.0).contains(&value) {
            warn!(column, value, "Percentage outside [0, 1], clamping");
            return Ok(value.clamp(0.0, 1.0));
        }
        Ok(value)
    }

    fn coerce_percentage_text(&self, column: &str, text: &str) -> Result<f64> {
        let trimmed = text.trim();

        if let Ok(value) = trimmed.parse::<f64>() {
            return Ok(value);
        }
        if trimmed.eq_ignore_ascii_case(&self.coercion.below_label) {
            return Ok(self.coercion.below_value);
        }
        if trimmed.eq_ignore_ascii_case(&self.coercion.above_label) {
            return Ok(self.coercion.above_value);
        }

        trimmed
            .strip_suffix('%')
            .and_then(|number| number.trim().parse::<f64>().ok())
            .map(|value| value / 100.0)
            .ok_or_else(|| Error::parse(column, text, "not a number, percentage, or suppression label"))
    }

    /// Normalize every raw test row
    pub fn normalize_test_rows(&self, rows: &[RawTestRow]) -> Result<Vec<TestResultRow>> {
        let normalized = rows
            .iter()
            .map(|row| self.normalize_test_row(row))
            .collect::<Result<Vec<_>>>()?;
        info!("Normalized {} test result rows", normalized.len());
        Ok(normalized)
    }

    /// Normalize one raw test row; the display name is dropped
    pub fn normalize_test_row(&self, row: &RawTestRow) -> Result<TestResultRow> {
        let year = parse_year_label(&row.year.as_text())?;
        let grade = Grade::parse_label(&row.grade.as_text())?;
        let category = self
            .categories
            .get(&row.category.trim().to_lowercase())
            .copied()
            .ok_or_else(|| Error::UnknownCategory(row.category.clone()))?;

        let mut values = [None; 12];
        for (slot, (column, cell)) in values.iter_mut().zip(row.metric_cells()) {
            *slot = coerce_metric(column, cell)?;
        }

        Ok(TestResultRow {
            dbn: row.dbn.trim().to_string(),
            year,
            grade,
            category,
            metrics: TestMetrics::from_values(values),
        })
    }
}

/// Metric cell → value; absent, empty and "s" (suppressed) cells are missing
fn coerce_metric(column: &str, cell: Option<&RawValue>) -> Result<Option<f64>> {
    match cell {
        None => Ok(None),
        Some(RawValue::Number(n)) => Ok(Some(*n)),
        Some(RawValue::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("s") {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map(Some)
                .map_err(|_| Error::parse(column, text.as_str(), "not a number or suppression marker"))
        }
    }
}
