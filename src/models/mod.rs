// src/models/mod.rs

//! Domain models for the aggregator.

mod config;
mod course;
mod summary;

pub use config::{
    BatchingConfig, Config, CurrentConfig, DelayConfig, HttpConfig, LegacyConfig, OutputConfig,
    ProfessorConfig, SectionMarkers,
};
pub use course::{
    Course, CourseDetail, CourseType, ProgramRef, RawCourseRow, SourceGeneration, StudyProgram,
};
pub use summary::RunSummary;
