//! Enriched school-level records

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;

/// Demographic category, base or combined
///
/// Combined categories are linear functions of the base counts and are never
/// stored independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Female,
    Male,
    Asian,
    Black,
    Hispanic,
    Multiracial,
    White,
    StudentsWithDisabilities,
    EnglishLanguageLearners,
    Poverty,
    /// total − white
    NonWhite,
    /// black + hispanic (may double count students reported in both)
    BlackHispanic,
    /// white + asian
    WhiteAsian,
    /// total − (white + asian)
    NonWhiteAsian,
}

impl Category {
    pub const BASE: [Category; 10] = [
        Category::Female,
        Category::Male,
        Category::Asian,
        Category::Black,
        Category::Hispanic,
        Category::Multiracial,
        Category::White,
        Category::StudentsWithDisabilities,
        Category::EnglishLanguageLearners,
        Category::Poverty,
    ];

    pub const COMBINED: [Category; 4] = [
        Category::NonWhite,
        Category::BlackHispanic,
        Category::WhiteAsian,
        Category::NonWhiteAsian,
    ];

    /// Base categories followed by combined categories
    pub fn all() -> impl Iterator<Item = Category> {
        Self::BASE.into_iter().chain(Self::COMBINED)
    }

    pub fn is_combined(self) -> bool {
        Self::COMBINED.contains(&self)
    }

    /// Source column name of the count
    pub fn column(self) -> &'static str {
        match self {
            Category::Female => "female",
            Category::Male => "male",
            Category::Asian => "asian",
            Category::Black => "black",
            Category::Hispanic => "hispanic",
            Category::Multiracial => "multiple_race_categories",
            Category::White => "white",
            Category::StudentsWithDisabilities => "students_with_disabilities",
            Category::EnglishLanguageLearners => "english_language_learners",
            Category::Poverty => "poverty",
            Category::NonWhite => "non_white",
            Category::BlackHispanic => "black_hispanic",
            Category::WhiteAsian => "white_asian",
            Category::NonWhiteAsian => "non_white_asian",
        }
    }

    /// Parse a column name ("black", "black_hispanic", ...)
    pub fn from_column(column: &str) -> Option<Category> {
        Self::all().find(|c| c.column() == column)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Base demographic counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemographicCounts {
    pub female: i64,
    pub male: i64,
    pub asian: i64,
    pub black: i64,
    pub hispanic: i64,
    pub multiracial: i64,
    pub white: i64,
    pub students_with_disabilities: i64,
    pub english_language_learners: i64,
    pub poverty: i64,
}

impl DemographicCounts {
    /// Count for a category; combined categories derive from `total_enrollment`
    pub fn count(&self, category: Category, total_enrollment: i64) -> i64 {
        match category {
            Category::Female => self.female,
            Category::Male => self.male,
            Category::Asian => self.asian,
            Category::Black => self.black,
            Category::Hispanic => self.hispanic,
            Category::Multiracial => self.multiracial,
            Category::White => self.white,
            Category::StudentsWithDisabilities => self.students_with_disabilities,
            Category::EnglishLanguageLearners => self.english_language_learners,
            Category::Poverty => self.poverty,
            Category::NonWhite => total_enrollment - self.white,
            Category::BlackHispanic => self.black + self.hispanic,
            Category::WhiteAsian => self.white + self.asian,
            Category::NonWhiteAsian => total_enrollment - (self.white + self.asian),
        }
    }
}

impl AddAssign for DemographicCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.female += rhs.female;
        self.male += rhs.male;
        self.asian += rhs.asian;
        self.black += rhs.black;
        self.hispanic += rhs.hispanic;
        self.multiracial += rhs.multiracial;
        self.white += rhs.white;
        self.students_with_disabilities += rhs.students_with_disabilities;
        self.english_language_learners += rhs.english_language_learners;
        self.poverty += rhs.poverty;
    }
}

/// Coerced percentage columns (`<category>_1` in the source), each in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DemographicPercentages {
    pub female: f64,
    pub male: f64,
    pub asian: f64,
    pub black: f64,
    pub hispanic: f64,
    pub multiracial: f64,
    pub white: f64,
    pub students_with_disabilities: f64,
    pub english_language_learners: f64,
    pub poverty: f64,
}

impl DemographicPercentages {
    /// Reported percentage for a base category
    pub fn get(&self, category: Category) -> Option<f64> {
        match category {
            Category::Female => Some(self.female),
            Category::Male => Some(self.male),
            Category::Asian => Some(self.asian),
            Category::Black => Some(self.black),
            Category::Hispanic => Some(self.hispanic),
            Category::Multiracial => Some(self.multiracial),
            Category::White => Some(self.white),
            Category::StudentsWithDisabilities => Some(self.students_with_disabilities),
            Category::EnglishLanguageLearners => Some(self.english_language_learners),
            Category::Poverty => Some(self.poverty),
            _ => None,
        }
    }
}

/// School type derived from grade bands (middle > elementary > high > none)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchoolType {
    PS,
    MS,
    HS,
    NA,
}

impl SchoolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchoolType::PS => "PS",
            SchoolType::MS => "MS",
            SchoolType::HS => "HS",
            SchoolType::NA => "NA",
        }
    }

    /// Classify by precedence: middle, then elementary, then high school
    pub fn from_bands(bands: &GradeBands) -> Self {
        if bands.middle {
            SchoolType::MS
        } else if bands.elementary {
            SchoolType::PS
        } else if bands.high {
            SchoolType::HS
        } else {
            SchoolType::NA
        }
    }
}

impl fmt::Display for SchoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which grade bands a school serves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeBands {
    pub pre_k: bool,
    pub elementary: bool,
    pub middle: bool,
    pub high: bool,
}

/// One school in one academic year, after feature enrichment
///
/// Serializes with two derived maps, `combined_counts` and
/// `combined_percentages`, next to the stored fields.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SchoolRecord {
    /// School code: 2-digit district, borough letter, numeric suffix
    pub dbn: String,
    pub school_name: String,
    /// Calendar year in which the school year begins
    pub year: i32,
    pub district: u8,
    pub borough: char,
    pub borough_name: String,
    pub school_number: u32,
    pub grade_bands: GradeBands,
    pub school_type: SchoolType,
    pub total_enrollment: i64,
    pub counts: DemographicCounts,
    pub percentages: DemographicPercentages,
    pub economic_need_index: Option<f64>,
    pub clean_name: String,
    pub short_name: String,
}

impl SchoolRecord {
    /// Count for any category, combined ones recomputed from base counts
    pub fn count(&self, category: Category) -> i64 {
        self.counts.count(category, self.total_enrollment)
    }

    /// Percentage of enrollment for a category
    ///
    /// Base categories return the coerced source percentage. Combined
    /// categories are derived from counts and are `None` for zero enrollment.
    pub fn percentage(&self, category: Category) -> Option<f64> {
        match self.percentages.get(category) {
            Some(pct) => Some(pct),
            None => ratio(self.count(category), self.total_enrollment),
        }
    }
}

impl Serialize for SchoolRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let combined_counts: BTreeMap<Category, i64> =
            Category::COMBINED.into_iter().map(|c| (c, self.count(c))).collect();
        let combined_percentages: BTreeMap<Category, Option<f64>> =
            Category::COMBINED.into_iter().map(|c| (c, self.percentage(c))).collect();

        let mut row = serializer.serialize_struct("SchoolRecord", 17)?;
        row.serialize_field("dbn", &self.dbn)?;
        row.serialize_field("school_name", &self.school_name)?;
        row.serialize_field("year", &self.year)?;
        row.serialize_field("district", &self.district)?;
        row.serialize_field("borough", &self.borough)?;
        row.serialize_field("borough_name", &self.borough_name)?;
        row.serialize_field("school_number", &self.school_number)?;
        row.serialize_field("grade_bands", &self.grade_bands)?;
        row.serialize_field("school_type", &self.school_type)?;
        row.serialize_field("total_enrollment", &self.total_enrollment)?;
        row.serialize_field("counts", &self.counts)?;
        row.serialize_field("percentages", &self.percentages)?;
        row.serialize_field("combined_counts", &combined_counts)?;
        row.serialize_field("combined_percentages", &combined_percentages)?;
        row.serialize_field("economic_need_index", &self.economic_need_index)?;
        row.serialize_field("clean_name", &self.clean_name)?;
        row.serialize_field("short_name", &self.short_name)?;
        row.end()
    }
}

/// `part / whole`, or `None` when `whole` is zero
pub fn ratio(part: i64, whole: i64) -> Option<f64> {
    if whole == 0 {
        None
    } else {
        Some(part as f64 / whole as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_school_type_precedence() {
        let all = GradeBands { pre_k: true, elementary: true, middle: true, high: true };
        assert_eq!(SchoolType::from_bands(&all), SchoolType::MS);

        let elem_high = GradeBands { elementary: true, high: true, ..Default::default() };
        assert_eq!(SchoolType::from_bands(&elem_high), SchoolType::PS);

        let high = GradeBands { high: true, ..Default::default() };
        assert_eq!(SchoolType::from_bands(&high), SchoolType::HS);

        let pre_k_only = GradeBands { pre_k: true, ..Default::default() };
        assert_eq!(SchoolType::from_bands(&pre_k_only), SchoolType::NA);
    }

    #[test]
    fn test_combined_counts_follow_base_counts() {
        let mut counts = DemographicCounts {
            asian: 10,
            black: 20,
            hispanic: 30,
            white: 40,
            ..Default::default()
        };
        assert_eq!(counts.count(Category::NonWhite, 100), 60);
        assert_eq!(counts.count(Category::BlackHispanic, 100), 50);
        assert_eq!(counts.count(Category::WhiteAsian, 100), 50);
        assert_eq!(counts.count(Category::NonWhiteAsian, 100), 50);

        counts.white = 30;
        assert_eq!(counts.count(Category::NonWhite, 100), 70);
        assert_eq!(counts.count(Category::WhiteAsian, 100), 40);
    }

    #[test]
    fn test_serialized_record_carries_combined_columns() {
        let record = SchoolRecord {
            dbn: "01M015".to_string(),
            school_name: "P.S. 015 Roberto Clemente".to_string(),
            year: 2019,
            district: 1,
            borough: 'M',
            borough_name: "Manhattan".to_string(),
            school_number: 15,
            grade_bands: GradeBands { elementary: true, ..Default::default() },
            school_type: SchoolType::PS,
            total_enrollment: 200,
            counts: DemographicCounts { asian: 20, black: 60, hispanic: 80, white: 30, ..Default::default() },
            percentages: DemographicPercentages::default(),
            economic_need_index: Some(0.8),
            clean_name: "roberto clemente".to_string(),
            short_name: "PS 15".to_string(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["combined_counts"]["black_hispanic"], 140);
        assert_eq!(value["combined_counts"]["non_white"], 170);
        assert_eq!(value["combined_counts"]["white_asian"], 50);
        assert_eq!(value["combined_counts"]["non_white_asian"], 150);
        assert_eq!(value["combined_percentages"]["black_hispanic"], 0.7);
        assert_eq!(value["counts"]["black"], 60);
        assert_eq!(value["short_name"], "PS 15");

        let back: SchoolRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_ratio_zero_denominator_is_missing() {
        assert_eq!(ratio(5, 0), None);
        assert_eq!(ratio(5, 10), Some(0.5));
    }

    #[test]
    fn test_category_column_round_trip() {
        for category in Category::all() {
            assert_eq!(Category::from_column(category.column()), Some(category));
        }
        assert_eq!(Category::from_column("martian"), None);
    }
}
