// src/models/summary.rs

//! Run summary artifact.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Course;

/// Externally observable result of one aggregation run.
///
/// All counts are derived from `subjects` and must stay recomputable from
/// it; they are stored only for consumer convenience.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub total_subjects: usize,
    pub total_study_programs: usize,
    pub multi_program_subjects: usize,
    pub subjects_with_mixed_types: usize,
    pub subjects: Vec<Course>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunSummary {
    /// Build a successful summary with counts derived from the course list.
    pub fn from_courses(subjects: Vec<Course>) -> Self {
        let total_study_programs = subjects
            .iter()
            .flat_map(|c| c.study_programs.iter())
            .map(|sp| sp.program_name.as_str())
            .collect::<HashSet<_>>()
            .len();
        let multi_program_subjects = subjects
            .iter()
            .filter(|c| c.study_programs.len() > 1)
            .count();
        let subjects_with_mixed_types = subjects.iter().filter(|c| c.has_mixed_types()).count();

        Self {
            success: true,
            timestamp: Utc::now(),
            total_subjects: subjects.len(),
            total_study_programs,
            multi_program_subjects,
            subjects_with_mixed_types,
            subjects,
            error: None,
        }
    }

    /// Build a failure summary; whatever was aggregated before the failure
    /// is still included.
    pub fn from_error(subjects: Vec<Course>, error: impl ToString) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            ..Self::from_courses(subjects)
        }
    }
}
