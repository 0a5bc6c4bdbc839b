//! Instruction Composer: renders the image-generation instruction for one
//! scored form. Total over valid input; every conditional block below is
//! picked by exactly one variant of a tier enum.

use std::fmt::Write as _;

use crate::fdi::input::{InputRecord, NutritionGoal, TrainingStyle};
use crate::fdi::score::ScoreResult;

pub const DOCUMENTED_FDI_MIN: f64 = 0.349;
pub const DOCUMENTED_FDI_MAX: f64 = 1.921;

const LOSS_ESTIMATE_CAP_PERCENT: u32 = 12;
const GAIN_ESTIMATE_CAP_KG: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealismTier {
    Minimal,
    Subtle,
    Moderate,
    Strong,
    Impressive,
}

impl RealismTier {
    pub fn from_fdi(fdi: f64) -> Self {
        if fdi < 0.6 {
            RealismTier::Minimal
        } else if fdi < 0.9 {
            RealismTier::Subtle
        } else if fdi < 1.2 {
            RealismTier::Moderate
        } else if fdi < 1.5 {
            RealismTier::Strong
        } else {
            RealismTier::Impressive
        }
    }

    pub const fn line(self) -> &'static str {
        match self {
            RealismTier::Minimal => "- Very minimal visible changes (FDI <0.6)",
            RealismTier::Subtle => "- Subtle but noticeable improvements (FDI 0.6-0.9)",
            RealismTier::Moderate => "- Moderate, realistic progress (FDI 0.9-1.2)",
            RealismTier::Strong => "- Strong, well-earned results (FDI 1.2-1.5)",
            RealismTier::Impressive => "- Impressive but still naturally achievable (FDI 1.5+)",
        }
    }
}

/// Direction of change shown in the "Current FDI Analysis" section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevelopmentOutlook {
    Leaner,
    SubtleTone,
    Noticeable,
    Significant,
}

impl DevelopmentOutlook {
    pub fn from_fdi(fdi: f64) -> Self {
        if fdi < 1.0 {
            DevelopmentOutlook::Leaner
        } else if fdi < 1.2 {
            DevelopmentOutlook::SubtleTone
        } else if fdi < 1.5 {
            DevelopmentOutlook::Noticeable
        } else {
            DevelopmentOutlook::Significant
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            DevelopmentOutlook::Leaner => {
                "body composition becomes leaner with less muscle mass than baseline"
            }
            DevelopmentOutlook::SubtleTone => {
                "subtle improvements in muscle tone and athletic appearance"
            }
            DevelopmentOutlook::Noticeable => {
                "noticeable muscle development and improved athletic definition"
            }
            DevelopmentOutlook::Significant => {
                "significant muscle development with pronounced athletic physique"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeframeTier {
    Early,
    Intermediate,
    Extended,
}

impl TimeframeTier {
    pub fn from_months(months: u32) -> Self {
        if months <= 3 {
            TimeframeTier::Early
        } else if months <= 6 {
            TimeframeTier::Intermediate
        } else {
            TimeframeTier::Extended
        }
    }

    pub const fn lines(self) -> &'static [&'static str] {
        match self {
            TimeframeTier::Early => &[
                "- Early-stage \"newbie gains\" if applicable",
                "- Initial muscle pumps and glycogen retention",
                "- Posture improvements and core engagement",
                "- DO NOT show dramatic size increases",
            ],
            TimeframeTier::Intermediate => &[
                "- Noticeable progress in primary muscle groups",
                "- Clear definition improvements",
                "- Visible strength adaptations",
                "- Still conservative changes (no Instagram transformations)",
            ],
            TimeframeTier::Extended => &[
                "- Significant natural progress",
                "- Well-developed muscle groups",
                "- Lean, athletic physique if in deficit",
                "- Maintain natural look (no steroid-like mass)",
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepTier {
    Optimal,
    Moderate,
    Poor,
}

impl SleepTier {
    pub fn from_quality(sleep_quality: u8) -> Self {
        if sleep_quality >= 7 {
            SleepTier::Optimal
        } else if sleep_quality >= 4 {
            SleepTier::Moderate
        } else {
            SleepTier::Poor
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            SleepTier::Optimal => "Optimal recovery - better results",
            SleepTier::Moderate => "Moderate recovery - average results",
            SleepTier::Poor => "Poor recovery - limited results",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StressTier {
    Low,
    Moderate,
    High,
}

impl StressTier {
    pub fn from_level(stress_level: u8) -> Self {
        if stress_level <= 4 {
            StressTier::Low
        } else if stress_level <= 7 {
            StressTier::Moderate
        } else {
            StressTier::High
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            StressTier::Low => "Low stress - optimal hormonal environment",
            StressTier::Moderate => "Moderate stress - slightly impaired recovery",
            StressTier::High => "High stress - significantly reduced progress",
        }
    }
}

pub fn fat_loss_estimate_percent(timeframe_months: u32) -> u32 {
    timeframe_months
        .saturating_mul(2)
        .min(LOSS_ESTIMATE_CAP_PERCENT)
}

pub fn lean_mass_estimate_kg(timeframe_months: u32) -> f64 {
    (f64::from(timeframe_months) * 0.5).min(GAIN_ESTIMATE_CAP_KG)
}

pub fn months_phrase(months: u32) -> String {
    if months == 1 {
        "1 month".to_string()
    } else {
        format!("{months} months")
    }
}

fn frequency_label(code: i64) -> &'static str {
    match code {
        1 => "<2",
        2 => "2-3",
        4 => "4-5",
        6 => ">6",
        _ => "an unlisted number of",
    }
}

fn body_composition_lines(goal: NutritionGoal, months: u32) -> Vec<String> {
    match goal {
        NutritionGoal::Loss => vec![
            format!(
                "- Gradual fat loss: Estimate {}% body fat reduction",
                fat_loss_estimate_percent(months)
            ),
            "- Preserve muscle mass (slight definition increase from fat loss)".to_string(),
            "- No dramatic muscle growth due to caloric deficit".to_string(),
        ],
        NutritionGoal::Maintenance => vec![
            "- Minor recomposition: Small fat loss + small muscle gain".to_string(),
            "- Improved muscle definition from better conditioning".to_string(),
            "- Maintain overall body weight".to_string(),
        ],
        NutritionGoal::Gain => vec![
            format!(
                "- Muscle hypertrophy: Estimate {}kg lean mass gain",
                lean_mass_estimate_kg(months)
            ),
            "- Some fat gain is natural (80/20 muscle/fat ratio in surplus)".to_string(),
            "- Fuller muscle bellies, especially in trained areas".to_string(),
        ],
    }
}

fn muscle_development_lines(style: TrainingStyle) -> &'static [&'static str] {
    match style {
        TrainingStyle::Strength => &[
            "- Focus on compound lift areas: chest, back, shoulders, legs",
            "- Dense, hard muscle appearance (low glycogen look)",
            "- Visible strength gains in posture and muscle thickness",
        ],
        TrainingStyle::Cardio => &[
            "- Lean, athletic physique with minimal bulk",
            "- Enhanced vascularity and muscle separation",
            "- Reduced subcutaneous fat, especially around core",
        ],
        TrainingStyle::Hybrid => &[
            "- Balanced development: size + definition",
            "- Moderate hypertrophy with good conditioning",
            "- Athletic, functional appearance",
        ],
    }
}

fn push_indented<S: AsRef<str>>(out: &mut String, lines: &[S]) {
    for line in lines {
        out.push_str("   ");
        out.push_str(line.as_ref());
        out.push('\n');
    }
}

pub fn compose_instruction(input: &InputRecord, scores: &ScoreResult) -> String {
    let fdi = scores.composite_score;
    let months = input.timeframe_months;
    let period = months_phrase(months);
    let style = input.training_style.as_str();
    let intensity = input.intensity.as_str();
    let nutrition = input.nutrition_goal.as_str();
    let sleep = input.sleep_quality;
    let stress = input.stress_level;

    let mut out = String::with_capacity(8 * 1024);

    out.push_str(
        "You are an expert in sports science and exercise medicine, as well as an expert in \
         professional full-body studio photography. Your task is to design an AI-assisted model \
         that visualizes a user's potential physical development based on their uploaded \
         full-body photo and selected personal parameters.\n\n\
         The model must balance scientific accuracy (training, nutrition, recovery, physiology) \
         with a realistic and engaging user experience. Since the results are presented in a B2C \
         setting, they should be realistic and achievable, avoiding exaggerated or extreme \
         transformations.\n\n",
    );

    let _ = write!(
        out,
        "CALCULATED FDI (Final Development Index): {fdi}\n\
         Range: {DOCUMENTED_FDI_MIN} (minimum) to {DOCUMENTED_FDI_MAX} (maximum)\n\n\
         FDI Interpretation:\n\
         - FDI < 1 → body composition becomes slightly leaner and less muscular (but still healthy, not anorexic)\n\
         - FDI > 1 → body composition shows more muscle development, improved definition, and a generally sportier look\n\
         - Border values show the most pronounced development\n\
         - Increment effect: changes between 1.0 and 1.1 are subtle, while changes between 1.5 and 1.6 are much more visible\n\n\
         Current FDI Analysis:\n\
         - FDI = {fdi} → {}\n\n",
        DevelopmentOutlook::from_fdi(fdi).description()
    );

    let _ = write!(
        out,
        "INSTRUCTION:\n\
         Generate a high-quality, centered full-body image of the user that reflects the change in \
         body composition according to their calculated FDI value of {fdi}.\n\n\
         - Use the uploaded photo as a base reference\n\
         - Apply transformations subtly and realistically, corresponding to the FDI value\n\
         - Maintain scientific plausibility and avoid exaggerated, unrealistic physiques\n\n\
         TASK: Generate a scientifically accurate fitness transformation photo showing realistic \
         results after {period} of consistent training.\n\n"
    );

    let _ = write!(
        out,
        "CLIENT PROFILE:\n\
         - Age: {}\n\
         - Gender: {}\n\
         - Training frequency: {} sessions per week\n\
         - Training style: {style}\n\
         - Workout intensity: {intensity}\n\
         - Nutrition strategy: {}\n\
         - Sleep quality: {sleep}/10\n\
         - Stress level: {stress}/10\n\n\
         CALCULATED FDI (Final Development Index): {fdi}\n\
         (Range: {DOCUMENTED_FDI_MIN} = minimal change, {DOCUMENTED_FDI_MAX} = maximal natural change for timeframe)\n\n\
         CRITICAL TRANSFORMATION REQUIREMENTS:\n\n",
        input.age_group.label(),
        input.gender.label(),
        frequency_label(input.frequency),
        input.nutrition_goal.label(),
    );

    let _ = writeln!(
        out,
        "1. SCIENTIFIC REALISM - Base ALL changes on FDI value {fdi}:"
    );
    push_indented(&mut out, &[RealismTier::from_fdi(fdi).line()]);
    out.push('\n');

    let _ = writeln!(out, "2. BODY COMPOSITION CHANGES ({nutrition} protocol):");
    push_indented(
        &mut out,
        body_composition_lines(input.nutrition_goal, months).as_slice(),
    );
    out.push('\n');

    let _ = writeln!(
        out,
        "3. MUSCLE DEVELOPMENT ({style} training, {intensity} intensity):"
    );
    push_indented(&mut out, muscle_development_lines(input.training_style));
    out.push('\n');

    let _ = writeln!(out, "4. TIMEFRAME-SPECIFIC EXPECTATIONS ({period}):");
    push_indented(&mut out, TimeframeTier::from_months(months).lines());
    out.push('\n');

    out.push_str("5. RECOVERY & LIFESTYLE FACTORS:\n");
    push_indented(
        &mut out,
        &[
            format!(
                "- Sleep quality ({sleep}/10): {}",
                SleepTier::from_quality(sleep).description()
            ),
            format!(
                "- Stress level ({stress}/10): {}",
                StressTier::from_level(stress).description()
            ),
        ],
    );
    out.push('\n');

    out.push_str("6. PHOTOGRAPHY & PRESENTATION REQUIREMENTS:\n");
    push_indented(
        &mut out,
        &[
            "- Setting: A modern, well-lit gym with visible fitness equipment".to_string(),
            "- Outfit: Black athletic shorts only (upper body exposed for clear comparison)"
                .to_string(),
            "- Pose: Standing naturally as if taking a progress photo".to_string(),
            "- Expression: If face is visible, show a determined look; if not, crop photo from neck up"
                .to_string(),
            "- Style: Realistic photography, not overly stylized or bodybuilder-like".to_string(),
            "- High-quality, centered full-body image".to_string(),
            format!(
                "- Ensure proportional, natural body adjustments that match the FDI value of {fdi}"
            ),
            "- Maintain exact same person identity and facial features".to_string(),
            "- Natural skin texture (no airbrushing or fake tan)".to_string(),
            "- Same lighting and angle as original photo".to_string(),
        ],
    );
    out.push('\n');

    let _ = write!(
        out,
        "CRITICAL REQUIREMENTS - AVOID THESE ERRORS:\n\
         ❌ DO NOT create exaggerated or unrealistic transformations\n\
         ❌ DO NOT ignore the FDI value of {fdi} - this is the PRIMARY guide for body composition changes\n\
         ❌ DO NOT add excessive muscle mass beyond what FDI {fdi} indicates\n\
         ❌ DO NOT create \"Instagram transformation\" or bodybuilder physiques\n\
         ❌ DO NOT change the person's face, bone structure, or identifying features\n\
         ❌ DO NOT use fake lighting, airbrushing, or unrealistic skin\n\
         ❌ DO NOT show changes that are biologically impossible for {period}\n\
         ❌ REMEMBER: Changes between FDI 1.0-1.1 are SUBTLE, changes between 1.5-1.6 are MORE VISIBLE\n\
         ❌ If FDI < 1.0, body should be LEANER with LESS muscle, not more muscular\n\n"
    );

    let _ = write!(
        out,
        "VERIFICATION CHECKLIST:\n\
         ✓ Transformation aligns PRECISELY with FDI value {fdi}\n\
         ✓ Changes are achievable in {period}\n\
         ✓ Body fat percentage change is realistic for {nutrition} protocol\n\
         ✓ Muscle gain matches training style ({style}) and intensity ({intensity})\n\
         ✓ Recovery factors (sleep {sleep}/10, stress {stress}/10) are reflected\n\
         ✓ Same person, same pose, modern gym environment\n\
         ✓ Black athletic shorts, determined expression\n\
         ✓ Professional sports medicine accuracy maintained\n\
         ✓ Realistic photography style, not overly stylized\n\n"
    );

    let _ = write!(
        out,
        "FINAL INSTRUCTION:\n\
         Generate a high-quality, centered full-body transformation image that shows body \
         composition changes corresponding EXACTLY to FDI = {fdi}.\n\
         - Use the uploaded photo as your base reference\n\
         - Apply subtle, realistic changes that match the FDI interpretation above\n\
         - Maintain scientific plausibility - this is for a B2C product, so results must be realistic and achievable\n\
         - The FDI value {fdi} is your PRIMARY guide - follow it precisely\n\n\
         Generate the transformation image now."
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fdi::input::{sample_form, InputRecord};
    use crate::fdi::score::score_record;

    const REALISM_LINES: [&str; 5] = [
        "Very minimal visible changes",
        "Subtle but noticeable improvements",
        "Moderate, realistic progress",
        "Strong, well-earned results",
        "Impressive but still naturally achievable",
    ];

    const TIMEFRAME_MARKERS: [&str; 3] = [
        "Early-stage \"newbie gains\"",
        "Noticeable progress in primary muscle groups",
        "Significant natural progress",
    ];

    fn record() -> InputRecord {
        sample_form().validate().unwrap()
    }

    fn with_fdi(fdi: f64) -> ScoreResult {
        ScoreResult {
            biological_index: 1.0,
            training_index: 1.0,
            recovery_index: 1.0,
            composite_score: fdi,
        }
    }

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn substitutes_reference_scores() {
        let input = record();
        let scores = score_record(&input).unwrap();
        let text = compose_instruction(&input, &scores);

        assert!(text.contains("FDI = 0.813"));
        assert!(text.contains("CALCULATED FDI (Final Development Index): 0.813"));
        assert!(text.contains(RealismTier::Subtle.line()));
        assert!(text.contains("- Minor recomposition: Small fat loss + small muscle gain"));
        assert!(!text.contains("body fat reduction"));
        assert!(!text.contains("lean mass gain"));
        assert!(text.contains("2. BODY COMPOSITION CHANGES (maintenance protocol):"));
        assert!(text.contains("- Age: 26-40"));
        assert!(text.contains("- Gender: Female"));
        assert!(text.contains("- Training frequency: 2-3 sessions per week"));
    }

    #[test]
    fn exactly_one_realism_and_outlook_line_across_fdi_sweep() {
        let input = record();
        for step in 0..=250 {
            let fdi = f64::from(step) / 100.0;
            let text = compose_instruction(&input, &with_fdi(fdi));
            let realism: usize = REALISM_LINES.iter().map(|line| count(&text, line)).sum();
            assert_eq!(realism, 1, "fdi {fdi}");

            let outlook = [
                DevelopmentOutlook::Leaner,
                DevelopmentOutlook::SubtleTone,
                DevelopmentOutlook::Noticeable,
                DevelopmentOutlook::Significant,
            ]
            .iter()
            .map(|variant| count(&text, variant.description()))
            .sum::<usize>();
            assert_eq!(outlook, 1, "fdi {fdi}");
        }
    }

    #[test]
    fn realism_tier_boundaries() {
        assert_eq!(RealismTier::from_fdi(0.599), RealismTier::Minimal);
        assert_eq!(RealismTier::from_fdi(0.6), RealismTier::Subtle);
        assert_eq!(RealismTier::from_fdi(0.9), RealismTier::Moderate);
        assert_eq!(RealismTier::from_fdi(1.2), RealismTier::Strong);
        assert_eq!(RealismTier::from_fdi(1.5), RealismTier::Impressive);
        assert_eq!(RealismTier::from_fdi(1.974), RealismTier::Impressive);
    }

    #[test]
    fn exactly_one_timeframe_block_per_month_count() {
        let mut input = record();
        for months in 1..=24 {
            input.timeframe_months = months;
            let text = compose_instruction(&input, &with_fdi(1.0));
            let hits: usize = TIMEFRAME_MARKERS.iter().map(|m| count(&text, m)).sum();
            assert_eq!(hits, 1, "months {months}");
        }
        assert_eq!(TimeframeTier::from_months(3), TimeframeTier::Early);
        assert_eq!(TimeframeTier::from_months(4), TimeframeTier::Intermediate);
        assert_eq!(TimeframeTier::from_months(6), TimeframeTier::Intermediate);
        assert_eq!(TimeframeTier::from_months(7), TimeframeTier::Extended);
    }

    #[test]
    fn loss_estimate_scales_with_timeframe_and_caps() {
        let mut input = record();
        input.nutrition_goal = NutritionGoal::Loss;
        input.timeframe_months = 3;
        let text = compose_instruction(&input, &with_fdi(0.7));
        assert!(text.contains("Estimate 6% body fat reduction"));

        input.timeframe_months = 9;
        let text = compose_instruction(&input, &with_fdi(0.7));
        assert!(text.contains("Estimate 12% body fat reduction"));
    }

    #[test]
    fn gain_estimate_renders_fractional_kilograms() {
        let mut input = record();
        input.nutrition_goal = NutritionGoal::Gain;
        input.timeframe_months = 3;
        let text = compose_instruction(&input, &with_fdi(1.3));
        assert!(text.contains("Estimate 1.5kg lean mass gain"));

        input.timeframe_months = 2;
        let text = compose_instruction(&input, &with_fdi(1.3));
        assert!(text.contains("Estimate 1kg lean mass gain"));

        input.timeframe_months = 20;
        let text = compose_instruction(&input, &with_fdi(1.3));
        assert!(text.contains("Estimate 6kg lean mass gain"));
    }

    #[test]
    fn muscle_block_follows_training_style() {
        let mut input = record();
        input.training_style = TrainingStyle::Strength;
        let text = compose_instruction(&input, &with_fdi(1.0));
        assert!(text.contains("Focus on compound lift areas"));
        assert!(!text.contains("Balanced development"));
        assert!(!text.contains("Lean, athletic physique with minimal bulk"));
    }

    #[test]
    fn recovery_descriptors_are_independent() {
        assert_eq!(SleepTier::from_quality(7), SleepTier::Optimal);
        assert_eq!(SleepTier::from_quality(4), SleepTier::Moderate);
        assert_eq!(SleepTier::from_quality(3), SleepTier::Poor);
        assert_eq!(StressTier::from_level(4), StressTier::Low);
        assert_eq!(StressTier::from_level(7), StressTier::Moderate);
        assert_eq!(StressTier::from_level(8), StressTier::High);

        let mut input = record();
        input.sleep_quality = 9;
        input.stress_level = 9;
        let text = compose_instruction(&input, &with_fdi(1.0));
        assert!(text.contains("- Sleep quality (9/10): Optimal recovery - better results"));
        assert!(text.contains("- Stress level (9/10): High stress - significantly reduced progress"));
    }

    #[test]
    fn pluralizes_timeframe() {
        assert_eq!(months_phrase(1), "1 month");
        assert_eq!(months_phrase(4), "4 months");

        let mut input = record();
        input.timeframe_months = 1;
        let text = compose_instruction(&input, &with_fdi(1.0));
        assert!(text.contains("results after 1 month of consistent training"));
        assert!(text.contains("biologically impossible for 1 month\n"));
    }

    #[test]
    fn composition_is_deterministic() {
        let input = record();
        let scores = score_record(&input).unwrap();
        assert_eq!(
            compose_instruction(&input, &scores),
            compose_instruction(&input, &scores)
        );
    }
}
