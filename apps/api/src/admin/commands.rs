//! Admin Commands: a closed set of administrative requests against the matcher.
//!
//! Each request kind is a variant; dispatch is an exhaustive `match`, so adding
//! a command means adding a variant and handling it here.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::matching::error::MatchError;
use crate::matching::reporter::MatchResult;
use crate::matching::service::{MatchService, Ranking, ScoreOptions};
use crate::matching::weights::MatchWeights;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AdminCommand {
    ScoreMatch {
        candidate_id: String,
        job_id: String,
        #[serde(default)]
        persist: bool,
    },
    RankJobsForCandidate {
        candidate_id: String,
        #[serde(default)]
        limit: Option<usize>,
    },
    RankCandidatesForJob {
        job_id: String,
        #[serde(default)]
        limit: Option<usize>,
    },
    MatchHistory {
        candidate_id: String,
        job_id: String,
    },
    InvalidateMatch {
        candidate_id: String,
        job_id: String,
    },
    ShowWeights,
}

impl AdminCommand {
    pub fn name(&self) -> &'static str {
        match self {
            AdminCommand::ScoreMatch { .. } => "score_match",
            AdminCommand::RankJobsForCandidate { .. } => "rank_jobs_for_candidate",
            AdminCommand::RankCandidatesForJob { .. } => "rank_candidates_for_job",
            AdminCommand::MatchHistory { .. } => "match_history",
            AdminCommand::InvalidateMatch { .. } => "invalidate_match",
            AdminCommand::ShowWeights => "show_weights",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdminOutcome {
    Match { result: MatchResult },
    Ranking { ranking: Ranking },
    History { results: Vec<MatchResult> },
    Invalidated { candidate_id: String, job_id: String },
    Weights { weights: MatchWeights },
}

/// Runs `command` against the service. `default_limit` applies to rankings without a limit.
pub async fn execute(
    service: &Arc<MatchService>,
    command: AdminCommand,
    default_limit: usize,
) -> Result<AdminOutcome, MatchError> {
    info!("Executing admin command {}", command.name());

    match command {
        AdminCommand::ScoreMatch {
            candidate_id,
            job_id,
            persist,
        } => {
            let options = ScoreOptions {
                persist,
                fresh: true,
            };
            let result = service.score(&candidate_id, &job_id, options).await?;
            Ok(AdminOutcome::Match { result })
        }
        AdminCommand::RankJobsForCandidate {
            candidate_id,
            limit,
        } => {
            let ranking = service
                .rank_jobs_for_candidate(&candidate_id, limit.unwrap_or(default_limit))
                .await?;
            Ok(AdminOutcome::Ranking { ranking })
        }
        AdminCommand::RankCandidatesForJob { job_id, limit } => {
            let ranking = service
                .rank_candidates_for_job(&job_id, limit.unwrap_or(default_limit))
                .await?;
            Ok(AdminOutcome::Ranking { ranking })
        }
        AdminCommand::MatchHistory {
            candidate_id,
            job_id,
        } => {
            let results = service.history(&candidate_id, &job_id).await?;
            Ok(AdminOutcome::History { results })
        }
        AdminCommand::InvalidateMatch {
            candidate_id,
            job_id,
        } => {
            service.invalidate(&candidate_id, &job_id).await;
            Ok(AdminOutcome::Invalidated {
                candidate_id,
                job_id,
            })
        }
        AdminCommand::ShowWeights => Ok(AdminOutcome::Weights {
            weights: service.weights().clone(),
        }),
    }
}
