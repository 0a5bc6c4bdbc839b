pub mod compose;
pub mod input;
pub mod score;

pub use compose::compose_instruction;
pub use input::InputForm;
pub use score::{compute_scores, score_record, ScoreError, ScoreResult};
