// src/models/course.rs

//! Course catalog data structures.

use serde::{Deserialize, Serialize};

use crate::utils::normalize_ws;

/// Enrollment classification of a course within one study program.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CourseType {
    Mandatory,
    Elective,
}

/// Which site layout a row was parsed from.
///
/// Only current-layout detail pages carry the structured fields the
/// enrichment pass extracts, so link provenance decides which link a merged
/// record keeps and whether it is worth a detail fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceGeneration {
    Legacy,
    Current,
}

/// Association between a course and one study program.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudyProgram {
    /// Normalized study program name
    pub program_name: String,

    /// Mandatory or elective within this program
    #[serde(rename = "type")]
    pub course_type: CourseType,
}

/// A merged course record.
///
/// The normalized `name` is the identity of a record within one aggregation
/// run; a course listed under several programs (possibly with different
/// codes) keeps a single record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Course {
    /// Course codes, unique, first-seen order
    pub codes: Vec<String>,

    /// Normalized course title (whitespace collapsed, trimmed)
    pub name: String,

    /// Canonical detail page URL, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// Programs this course belongs to, unique per normalized program name
    pub study_programs: Vec<StudyProgram>,

    /// Semester number (current-format enrichment)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<u32>,

    /// Prerequisite text, or the canonical "none" literal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<String>,

    /// Course description (only kept past a minimum length)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Instructor names in listing order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professors: Option<Vec<String>>,

    /// Level tag parsed from the course code (current format)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Which layout `link` was resolved from; in-run state only
    #[serde(skip)]
    pub link_generation: Option<SourceGeneration>,
}

impl Course {
    /// Create a record from its first-seen raw row and program.
    pub fn from_row(row: RawCourseRow, program_name: &str) -> Self {
        let link_generation = row.link.as_ref().map(|_| row.generation);
        Self {
            codes: vec![row.code],
            name: normalize_ws(&row.name),
            link: row.link,
            study_programs: vec![StudyProgram {
                program_name: normalize_ws(program_name),
                course_type: row.course_type,
            }],
            semester: None,
            prerequisites: None,
            description: None,
            professors: None,
            level: row.level,
            link_generation,
        }
    }

    /// True if this course is both mandatory in some program and elective in
    /// another.
    pub fn has_mixed_types(&self) -> bool {
        let mandatory = self
            .study_programs
            .iter()
            .any(|sp| sp.course_type == CourseType::Mandatory);
        let elective = self
            .study_programs
            .iter()
            .any(|sp| sp.course_type == CourseType::Elective);
        mandatory && elective
    }
}

/// A course row as parsed from one program page, before merging.
///
/// Adapters only emit a row once at least one code is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCourseRow {
    pub code: String,
    pub name: String,
    pub link: Option<String>,
    pub course_type: CourseType,
    pub level: Option<String>,
    pub generation: SourceGeneration,
}

/// Enrichment fields extracted from a course detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseDetail {
    pub semester: Option<u32>,
    pub prerequisites: Option<String>,
    pub description: Option<String>,
    pub professors: Option<Vec<String>>,
}

impl CourseDetail {
    /// Copy extracted fields onto a course, leaving absent fields untouched.
    pub fn apply_to(self, course: &mut Course) {
        if self.semester.is_some() {
            course.semester = self.semester;
        }
        if self.prerequisites.is_some() {
            course.prerequisites = self.prerequisites;
        }
        if self.description.is_some() {
            course.description = self.description;
        }
        if self.professors.is_some() {
            course.professors = self.professors;
        }
    }
}

/// A study program page reference, produced by program enumeration.
///
/// Transient: not persisted beyond one aggregation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramRef {
    pub url: String,
    pub name: String,
}
