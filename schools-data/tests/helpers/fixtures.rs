//! Raw row fixtures
//!
//! Rows are built as JSON objects with the upstream column names, so the same
//! fixture feeds both the in-memory source and JSON files on disk.

#![allow(dead_code)]

use schools_data::models::{RawDemographicRow, RawTestRow};
use serde_json::{json, Value};

/// Minimal description of one school-year
#[derive(Debug, Clone)]
pub struct SchoolFixture {
    pub dbn: &'static str,
    pub name: &'static str,
    pub year: &'static str,
    /// (grade_1, grade_7, grade_10) enrollment
    pub grades: (i64, i64, i64),
    /// (asian, white, black, hispanic, multiracial)
    pub race: (i64, i64, i64, i64, i64),
}

impl SchoolFixture {
    pub fn total(&self) -> i64 {
        let (a, w, b, h, m) = self.race;
        a + w + b + h + m
    }
}

fn pct(count: i64, total: i64) -> Value {
    if total == 0 {
        json!(0.0)
    } else {
        json!(format!("{:.1}%", 100.0 * count as f64 / total as f64))
    }
}

/// Demographic row object for a fixture
pub fn demographic_json(school: &SchoolFixture) -> Value {
    let total = school.total();
    let (asian, white, black, hispanic, multiracial) = school.race;
    let (g1, g7, g10) = school.grades;
    let female = total / 2;
    let male = total - female;
    let poverty = total * 3 / 4;

    json!({
        "dbn": school.dbn,
        "school_name": school.name,
        "year": school.year,
        "total_enrollment": total,
        "grade_3k_pk_half_day_full": 0,
        "grade_k": 0,
        "grade_1": g1, "grade_2": 0, "grade_3": 0, "grade_4": 0, "grade_5": 0, "grade_6": 0,
        "grade_7": g7, "grade_8": 0, "grade_9": 0,
        "grade_10": g10, "grade_11": 0, "grade_12": 0,
        "female": female, "female_1": pct(female, total),
        "male": male, "male_1": pct(male, total),
        "asian": asian, "asian_1": pct(asian, total),
        "black": black, "black_1": pct(black, total),
        "hispanic": hispanic, "hispanic_1": pct(hispanic, total),
        "multiple_race_categories": multiracial,
        "multiple_race_categories_1": if multiracial * 20 < total { json!("Below 5%") } else { pct(multiracial, total) },
        "white": white, "white_1": pct(white, total),
        "students_with_disabilities": total / 5, "students_with_disabilities_1": pct(total / 5, total),
        "english_language_learners": total / 10, "english_language_learners_1": pct(total / 10, total),
        "poverty": poverty, "poverty_1": pct(poverty, total),
        "economic_need_index": "72.5%"
    })
}

pub fn demographic_row(school: &SchoolFixture) -> RawDemographicRow {
    serde_json::from_value(demographic_json(school)).unwrap()
}

/// Test row object with every column present; `tested = None` marks a
/// suppressed row
pub fn test_json(dbn: &str, year: i64, grade: &str, category: &str, tested: Option<i64>) -> Value {
    let cell = |v: Option<i64>| v.map(|n| json!(n)).unwrap_or_else(|| json!("s"));
    json!({
        "dbn": dbn,
        "school_name": "ignored",
        "year": year,
        "grade": grade,
        "category": category,
        "number_tested": cell(tested),
        "mean_scale_score": cell(tested.map(|_| 600)),
        "level1_n": cell(tested.map(|n| n / 4)),
        "level1_pct": cell(tested.map(|_| 25)),
        "level2_n": cell(tested.map(|n| n / 4)),
        "level2_pct": cell(tested.map(|_| 25)),
        "level3_n": cell(tested.map(|n| n / 4)),
        "level3_pct": cell(tested.map(|_| 25)),
        "level4_n": cell(tested.map(|n| n / 4)),
        "level4_pct": cell(tested.map(|_| 25)),
        "level3_4_n": cell(tested.map(|n| n / 2)),
        "level3_4_pct": cell(tested.map(|_| 50))
    })
}

pub fn test_row(dbn: &str, year: i64, grade: &str, category: &str, tested: Option<i64>) -> RawTestRow {
    serde_json::from_value(test_json(dbn, year, grade, category, tested)).unwrap()
}

/// Two districts, two years, one Brooklyn school
pub fn sample_district() -> Vec<SchoolFixture> {
    vec![
        SchoolFixture {
            dbn: "02M088",
            name: "M.S. 088 Peter Rouget",
            year: "2018-19",
            grades: (0, 120, 0),
            race: (30, 60, 90, 210, 10),
        },
        SchoolFixture {
            dbn: "02M088",
            name: "M.S. 088 Peter Rouget",
            year: "2019-20",
            grades: (0, 130, 0),
            race: (35, 55, 95, 205, 10),
        },
        SchoolFixture {
            dbn: "02M009",
            name: "P.S. 009 Sarah Anderson",
            year: "2019-20",
            grades: (80, 0, 0),
            race: (60, 250, 40, 60, 30),
        },
        SchoolFixture {
            dbn: "02M260",
            name: "The Clinton School",
            year: "2019-20",
            grades: (0, 100, 110),
            race: (50, 150, 50, 90, 20),
        },
        SchoolFixture {
            dbn: "02M475",
            name: "Midtown West School",
            year: "2019-20",
            grades: (0, 0, 140),
            race: (20, 100, 60, 100, 20),
        },
        SchoolFixture {
            dbn: "13K282",
            name: "Park Slope Collegiate",
            year: "2019-20",
            grades: (0, 0, 150),
            race: (20, 40, 200, 120, 10),
        },
    ]
}
