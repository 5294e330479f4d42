//! Primary assessment path: one schema-constrained call to the deep model.
//!
//! The quantitative scorer runs first and its output is embedded in the prompt as an anchor.
//! There is no fallback here. Any LLM or validation failure is returned to the caller.

mod prompt;
mod schema;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument};

use super::domain::{ChancesResult, Mode};
use super::llm::{CompletionClient, LlmError, ModelRoute};
use super::quantitative::calculate_quantitative;
use super::school::ExtendedSchoolData;
use super::snapshot::ProfileSnapshot;

#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("assessment response failed validation: {0}")]
    InvalidResponse(String),
}

pub struct HolisticAssessor {
    client: Arc<dyn CompletionClient>,
}

impl HolisticAssessor {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    #[instrument(
        skip_all,
        fields(profile_id = %snapshot.id, school_id = %school.stats.id, mode = mode.label())
    )]
    pub async fn assess(
        &self,
        snapshot: &ProfileSnapshot,
        school: &ExtendedSchoolData,
        mode: Mode,
    ) -> Result<ChancesResult, AssessmentError> {
        let baseline = calculate_quantitative(snapshot, &school.stats);
        let prompt = prompt::build_prompt(snapshot, school, mode, &baseline);

        let raw = self
            .client
            .complete_structured(
                ModelRoute::Deep,
                prompt::SYSTEM_PROMPT,
                &prompt,
                &schema::holistic_schema(),
            )
            .await?;

        let result = schema::validate(raw, mode, Utc::now())?;
        debug!(
            baseline = baseline.base_probability,
            probability = result.probability,
            tier = result.tier.label(),
            "holistic assessment complete"
        );
        Ok(result)
    }
}
