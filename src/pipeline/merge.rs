// src/pipeline/merge.rs

//! Merge/dedup engine.
//!
//! Folds course rows discovered across many program pages (and both source
//! generations) into one map keyed by normalized course name. Course codes
//! differ across programs and generations, so the title text is the only
//! stable join key the sources offer. Known limitation: two genuinely
//! distinct courses that share an exact title merge into one record.

use std::collections::HashMap;

use crate::models::{Course, RawCourseRow, SourceGeneration, StudyProgram};
use crate::utils::normalize_ws;

/// Insertion-ordered course map keyed by normalized course name.
#[derive(Debug, Default)]
pub struct CourseMap {
    courses: Vec<Course>,
    index: HashMap<String, usize>,
}

impl CourseMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one raw row, seen under `program_name`, into the map.
    ///
    /// First sighting of a name inserts a new record; later sightings union
    /// the code into the existing record and append the program association
    /// unless the same normalized program is already present. Merging the
    /// same row twice is a no-op.
    pub fn merge(&mut self, row: RawCourseRow, program_name: &str) {
        let key = normalize_ws(&row.name);
        match self.index.get(&key) {
            None => {
                self.index.insert(key, self.courses.len());
                self.courses.push(Course::from_row(row, program_name));
            }
            Some(&at) => {
                let course = &mut self.courses[at];

                if !course.codes.contains(&row.code) {
                    course.codes.push(row.code);
                }
                // A current-layout link points at the structured detail page
                // the enrichment pass reads, so it displaces a legacy link;
                // otherwise the first-seen link stays.
                if row.link.is_some() {
                    let supersedes = course.link.is_none()
                        || (row.generation == SourceGeneration::Current
                            && course.link_generation != Some(SourceGeneration::Current));
                    if supersedes {
                        course.link = row.link;
                        course.link_generation = Some(row.generation);
                    }
                }
                if course.level.is_none() {
                    course.level = row.level;
                }

                let program = normalize_ws(program_name);
                let already_listed = course
                    .study_programs
                    .iter()
                    .any(|sp| sp.program_name == program);
                if !already_listed {
                    course.study_programs.push(StudyProgram {
                        program_name: program,
                        course_type: row.course_type,
                    });
                }
            }
        }
    }

    /// Mutable view over the merged records, in insertion order.
    pub fn courses_mut(&mut self) -> &mut [Course] {
        &mut self.courses
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Finalize the map into the output list.
    ///
    /// Runs the defensive second normalization sweep over all program names;
    /// idempotent because normalization is.
    pub fn finalize(mut self) -> Vec<Course> {
        for course in &mut self.courses {
            for sp in &mut course.study_programs {
                sp.program_name = normalize_ws(&sp.program_name);
            }
        }
        self.courses
    }
}
