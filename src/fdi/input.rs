use serde::{Deserialize, Serialize};

pub const SLEEP_RANGE: (i64, i64) = (1, 10);
pub const STRESS_RANGE: (i64, i64) = (1, 10);
/// Weekly session band codes the form pre-buckets frequency into.
pub const FREQUENCY_BANDS: [i64; 4] = [1, 2, 4, 6];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeGroup {
    Young,
    Adult,
    Midage,
    Older,
}

impl AgeGroup {
    pub const fn label(self) -> &'static str {
        match self {
            AgeGroup::Young => "18-25",
            AgeGroup::Adult => "26-40",
            AgeGroup::Midage => "41-55",
            AgeGroup::Older => "56+",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Man,
    Woman,
    #[serde(alias = "divers")]
    Other,
}

impl Gender {
    pub const fn label(self) -> &'static str {
        match self {
            Gender::Man => "Male",
            Gender::Woman => "Female",
            Gender::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingStyle {
    Cardio,
    Strength,
    Hybrid,
}

impl TrainingStyle {
    pub const fn as_str(self) -> &'static str {
        match self {
            TrainingStyle::Cardio => "cardio",
            TrainingStyle::Strength => "strength",
            TrainingStyle::Hybrid => "hybrid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Light,
    Moderate,
    Intense,
}

impl Intensity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Intensity::Light => "light",
            Intensity::Moderate => "moderate",
            Intensity::Intense => "intense",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NutritionGoal {
    Loss,
    #[serde(alias = "maint")]
    Maintenance,
    Gain,
}

impl NutritionGoal {
    pub const fn as_str(self) -> &'static str {
        match self {
            NutritionGoal::Loss => "loss",
            NutritionGoal::Maintenance => "maintenance",
            NutritionGoal::Gain => "gain",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            NutritionGoal::Loss => "Fat loss (caloric deficit)",
            NutritionGoal::Maintenance => "Maintenance (maintenance calories)",
            NutritionGoal::Gain => "Muscle gain (caloric surplus)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Field {field} out of range: {value} (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        expected: &'static str,
    },
}

/// In-progress form state as submitted by the UI. Every field may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputForm {
    #[serde(default)]
    pub age: Option<AgeGroup>,
    #[serde(default)]
    pub gender: Option<Gender>,
    /// Weekly session band code, pre-bucketed by the form.
    #[serde(default)]
    pub frequency: Option<i64>,
    /// Target timeframe in months.
    #[serde(default)]
    pub timeframe: Option<i64>,
    #[serde(default)]
    pub style: Option<TrainingStyle>,
    #[serde(default)]
    pub intensity: Option<Intensity>,
    #[serde(default)]
    pub nutrition: Option<NutritionGoal>,
    #[serde(default)]
    pub sleep: Option<i64>,
    #[serde(default)]
    pub stress: Option<i64>,
    /// Base64 image, optionally with a `data:image/...;base64,` prefix.
    #[serde(default)]
    pub photo: Option<String>,
}

impl Default for InputForm {
    fn default() -> Self {
        Self {
            age: None,
            gender: None,
            frequency: None,
            timeframe: Some(1),
            style: None,
            intensity: None,
            nutrition: None,
            sleep: Some(5),
            stress: Some(5),
            photo: None,
        }
    }
}

/// A fully populated, domain-checked form.
///
/// `frequency` is carried as the raw band code; band membership is enforced by
/// the score tables, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRecord {
    pub age_group: AgeGroup,
    pub gender: Gender,
    pub frequency: i64,
    pub timeframe_months: u32,
    pub training_style: TrainingStyle,
    pub intensity: Intensity,
    pub nutrition_goal: NutritionGoal,
    pub sleep_quality: u8,
    pub stress_level: u8,
    pub photo: String,
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::MissingField(field))
}

fn in_range(
    value: i64,
    (min, max): (i64, i64),
    field: &'static str,
    expected: &'static str,
) -> Result<u8, ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            expected,
        });
    }
    u8::try_from(value).map_err(|_| ValidationError::OutOfRange {
        field,
        value,
        expected,
    })
}

impl InputForm {
    pub fn validate(&self) -> Result<InputRecord, ValidationError> {
        let age_group = required(self.age, "age")?;
        let gender = required(self.gender, "gender")?;
        let frequency = required(self.frequency, "frequency")?;
        let timeframe = required(self.timeframe, "timeframe")?;
        let training_style = required(self.style, "style")?;
        let intensity = required(self.intensity, "intensity")?;
        let nutrition_goal = required(self.nutrition, "nutrition")?;
        let sleep = required(self.sleep, "sleep")?;
        let stress = required(self.stress, "stress")?;
        let photo = self
            .photo
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ValidationError::MissingField("photo"))?;

        if !FREQUENCY_BANDS.contains(&frequency) {
            return Err(ValidationError::OutOfRange {
                field: "frequency",
                value: frequency,
                expected: "1, 2, 4 or 6",
            });
        }
        if timeframe < 1 {
            return Err(ValidationError::OutOfRange {
                field: "timeframe",
                value: timeframe,
                expected: ">= 1",
            });
        }
        let timeframe_months =
            u32::try_from(timeframe).map_err(|_| ValidationError::OutOfRange {
                field: "timeframe",
                value: timeframe,
                expected: "<= 4294967295",
            })?;
        let sleep_quality = in_range(sleep, SLEEP_RANGE, "sleep", "1-10")?;
        let stress_level = in_range(stress, STRESS_RANGE, "stress", "1-10")?;

        Ok(InputRecord {
            age_group,
            gender,
            frequency,
            timeframe_months,
            training_style,
            intensity,
            nutrition_goal,
            sleep_quality,
            stress_level,
            photo: photo.to_string(),
        })
    }

    #[allow(dead_code)]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
pub(crate) fn sample_form() -> InputForm {
    InputForm {
        age: Some(AgeGroup::Adult),
        gender: Some(Gender::Woman),
        frequency: Some(2),
        timeframe: Some(1),
        style: Some(TrainingStyle::Hybrid),
        intensity: Some(Intensity::Moderate),
        nutrition: Some(NutritionGoal::Maintenance),
        sleep: Some(5),
        stress: Some(5),
        photo: Some("aGVsbG8=".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_form_matches_initial_ui_state() {
        let form = InputForm::default();
        assert_eq!(form.timeframe, Some(1));
        assert_eq!(form.sleep, Some(5));
        assert_eq!(form.stress, Some(5));
        assert!(form.age.is_none());
        assert!(!form.is_valid());
    }

    #[test]
    fn reports_first_missing_field_in_form_order() {
        let form = InputForm::default();
        assert_eq!(form.validate(), Err(ValidationError::MissingField("age")));

        let mut form = sample_form();
        form.intensity = None;
        form.photo = None;
        assert_eq!(
            form.validate(),
            Err(ValidationError::MissingField("intensity"))
        );
    }

    #[test]
    fn blank_photo_counts_as_missing() {
        let mut form = sample_form();
        form.photo = Some("   ".to_string());
        assert_eq!(form.validate(), Err(ValidationError::MissingField("photo")));
    }

    #[test]
    fn rejects_out_of_domain_integers() {
        let mut form = sample_form();
        form.timeframe = Some(0);
        assert!(matches!(
            form.validate(),
            Err(ValidationError::OutOfRange {
                field: "timeframe",
                value: 0,
                ..
            })
        ));

        let mut form = sample_form();
        form.sleep = Some(11);
        assert!(matches!(
            form.validate(),
            Err(ValidationError::OutOfRange { field: "sleep", .. })
        ));

        let mut form = sample_form();
        form.stress = Some(0);
        assert!(matches!(
            form.validate(),
            Err(ValidationError::OutOfRange { field: "stress", .. })
        ));
    }

    #[test]
    fn rejects_unlisted_frequency_bands() {
        for code in [3, -7, 0, 5, 7] {
            let mut form = sample_form();
            form.frequency = Some(code);
            assert!(!form.is_valid());
            assert_eq!(
                form.validate(),
                Err(ValidationError::OutOfRange {
                    field: "frequency",
                    value: code,
                    expected: "1, 2, 4 or 6",
                })
            );
        }

        for code in FREQUENCY_BANDS {
            let mut form = sample_form();
            form.frequency = Some(code);
            assert_eq!(form.validate().unwrap().frequency, code);
        }
    }

    #[test]
    fn oversized_timeframe_reports_upper_bound() {
        let mut form = sample_form();
        form.timeframe = Some(i64::from(u32::MAX) + 1);
        assert!(matches!(
            form.validate(),
            Err(ValidationError::OutOfRange {
                field: "timeframe",
                expected: "<= 4294967295",
                ..
            })
        ));
    }

    #[test]
    fn accepts_legacy_wire_aliases() {
        let form: InputForm = serde_json::from_str(
            r#"{"age":"older","gender":"divers","frequency":4,"timeframe":6,
                "style":"strength","intensity":"intense","nutrition":"maint",
                "sleep":7,"stress":3,"photo":"abc"}"#,
        )
        .unwrap();
        let record = form.validate().unwrap();
        assert_eq!(record.gender, Gender::Other);
        assert_eq!(record.nutrition_goal, NutritionGoal::Maintenance);
        assert_eq!(record.timeframe_months, 6);
    }

    #[test]
    fn absent_json_fields_deserialize_as_none() {
        let form: InputForm = serde_json::from_str(r#"{"gender":"man"}"#).unwrap();
        assert_eq!(form.gender, Some(Gender::Man));
        assert_eq!(form.validate(), Err(ValidationError::MissingField("age")));
    }
}
