//! Score Engine: turns a validated form into the Final Development Index.
//!
//! `FDI = 0.35 * BI + 0.40 * TI + 0.25 * RI`, where the sub-indices come from
//! fixed lookup tables and two linear scales. Every lookup table here is a
//! compile-time constant.

use serde::{Deserialize, Serialize};

use crate::fdi::input::{
    AgeGroup, Gender, InputForm, InputRecord, Intensity, NutritionGoal, TrainingStyle,
    ValidationError,
};

pub const BIOLOGICAL_WEIGHT: f64 = 0.35;
pub const TRAINING_WEIGHT: f64 = 0.40;
pub const RECOVERY_WEIGHT: f64 = 0.25;

/// Monthly growth of the duration multiplier. Unbounded by design of the formula.
pub const DURATION_STEP: f64 = 0.15;
/// Maximum reduction applied by the stress scale (stress 10 -> 0.6).
pub const STRESS_PENALTY: f64 = 0.4;

/// Weekly session band code -> training stimulus.
pub const FREQUENCY_SCORES: [(i64, f64); 4] = [(1, 0.6), (2, 0.9), (4, 1.1), (6, 1.3)];

pub const fn age_factor(age: AgeGroup) -> f64 {
    match age {
        AgeGroup::Young => 1.15,
        AgeGroup::Adult => 1.00,
        AgeGroup::Midage => 0.88,
        AgeGroup::Older => 0.75,
    }
}

pub const fn gender_factor(gender: Gender) -> f64 {
    match gender {
        Gender::Man => 1.10,
        Gender::Woman | Gender::Other => 1.00,
    }
}

pub const fn style_composite(style: TrainingStyle) -> f64 {
    match style {
        TrainingStyle::Cardio => 0.85,
        TrainingStyle::Strength => 1.15,
        TrainingStyle::Hybrid => 1.00,
    }
}

pub const fn intensity_multiplier(intensity: Intensity) -> f64 {
    match intensity {
        Intensity::Light => 0.8,
        Intensity::Moderate => 1.0,
        Intensity::Intense => 1.2,
    }
}

pub const fn energy_balance(goal: NutritionGoal) -> f64 {
    match goal {
        NutritionGoal::Loss => 0.85,
        NutritionGoal::Maintenance => 1.00,
        NutritionGoal::Gain => 1.10,
    }
}

pub fn frequency_score(code: i64) -> Result<f64, DomainError> {
    FREQUENCY_SCORES
        .iter()
        .find(|(band, _)| *band == code)
        .map(|(_, score)| *score)
        .ok_or(DomainError {
            field: "frequency",
            value: code,
        })
}

pub fn duration_multiplier(timeframe_months: u32) -> f64 {
    1.0 + (f64::from(timeframe_months) - 1.0) * DURATION_STEP
}

pub fn sleep_multiplier(sleep_quality: u8) -> f64 {
    f64::from(sleep_quality) / 10.0
}

pub fn stress_multiplier(stress_level: u8) -> f64 {
    1.0 - ((f64::from(stress_level) - 1.0) / 9.0) * STRESS_PENALTY
}

/// A value that has no entry in one of the lookup tables.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("No {field} table entry for value {value}")]
pub struct DomainError {
    pub field: &'static str,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Sub-indices and composite, each rounded to three decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    #[serde(rename = "bi")]
    pub biological_index: f64,
    #[serde(rename = "ti")]
    pub training_index: f64,
    #[serde(rename = "ri")]
    pub recovery_index: f64,
    #[serde(rename = "fdi")]
    pub composite_score: f64,
}

/// Rounds half away from zero to three decimal places.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Validates the form first; no table is consulted for an invalid form.
pub fn compute_scores(form: &InputForm) -> Result<ScoreResult, ScoreError> {
    let record = form.validate()?;
    Ok(score_record(&record)?)
}

pub fn score_record(record: &InputRecord) -> Result<ScoreResult, DomainError> {
    let freq_score = frequency_score(record.frequency)?;

    let bi = age_factor(record.age_group) * gender_factor(record.gender);

    let ti = freq_score
        * intensity_multiplier(record.intensity)
        * style_composite(record.training_style)
        * duration_multiplier(record.timeframe_months);

    let ri = sleep_multiplier(record.sleep_quality)
        * stress_multiplier(record.stress_level)
        * energy_balance(record.nutrition_goal);

    let fdi = BIOLOGICAL_WEIGHT * bi + TRAINING_WEIGHT * ti + RECOVERY_WEIGHT * ri;

    Ok(ScoreResult {
        biological_index: round3(bi),
        training_index: round3(ti),
        recovery_index: round3(ri),
        composite_score: round3(fdi),
    })
}
