use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::fdi::{compose_instruction, compute_scores, score_record, InputForm, ScoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeArgs {
    pub input_path: PathBuf,
    pub scores_only: bool,
}

/// Scores and composes a form read from disk, without calling the generator.
pub fn render_preview(form: &InputForm, scores_only: bool) -> Result<String> {
    if scores_only {
        let scores = compute_scores(form)?;
        return Ok(serde_json::to_string_pretty(&scores)?);
    }

    let record = form.validate().map_err(ScoreError::from)?;
    let scores = score_record(&record).map_err(ScoreError::from)?;
    let scores_json = serde_json::to_string_pretty(&scores)?;
    let instruction = compose_instruction(&record, &scores);
    Ok(format!("{scores_json}\n\n{instruction}"))
}

pub fn run_compose(args: &ComposeArgs) -> Result<String> {
    let raw = fs::read_to_string(&args.input_path)
        .with_context(|| format!("Failed to read {}", args.input_path.display()))?;
    let form: InputForm = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", args.input_path.display()))?;
    info!(path = %args.input_path.display(), "Composing instruction preview");
    render_preview(&form, args.scores_only)
}
