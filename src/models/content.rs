// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Saved teacher content (exercises, lesson plans, letters, songs, images).
//!
//! Each kind lives in its own Supabase table with its own columns. Rows are
//! normalized into [`SavedContent`] so the dashboard can list them together.

use crate::db::tables;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// Kind of saved content, as used in URLs and in API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    Exercise,
    LessonPlan,
    Correspondence,
    MusicLesson,
    Image,
}

impl ContentKind {
    pub const ALL: [ContentKind; 5] = [
        ContentKind::Exercise,
        ContentKind::LessonPlan,
        ContentKind::Correspondence,
        ContentKind::MusicLesson,
        ContentKind::Image,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Exercise => "exercise",
            ContentKind::LessonPlan => "lesson-plan",
            ContentKind::Correspondence => "correspondence",
            ContentKind::MusicLesson => "music-lesson",
            ContentKind::Image => "image",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            ContentKind::Exercise => tables::SAVED_EXERCISES,
            ContentKind::LessonPlan => tables::SAVED_LESSON_PLANS,
            ContentKind::Correspondence => tables::SAVED_CORRESPONDENCES,
            ContentKind::MusicLesson => tables::SAVED_MUSIC_LESSONS,
            ContentKind::Image => tables::IMAGE_GENERATION_USAGE,
        }
    }

    /// Columns mapped onto `SavedContent::title` and `SavedContent::content`.
    fn title_and_body_columns(&self) -> (&'static str, &'static str) {
        match self {
            ContentKind::Image => ("prompt", "image_url"),
            _ => ("title", "content"),
        }
    }

    /// Fields a save request must provide with a non-blank value.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            ContentKind::MusicLesson => &["title", "content", "lyrics"],
            ContentKind::Image => &["prompt"],
            _ => &["title", "content"],
        }
    }

    /// Columns a client may set when saving. Anything else is rejected.
    pub fn writable_columns(&self) -> &'static [&'static str] {
        match self {
            ContentKind::Exercise => &[
                "title",
                "content",
                "subject",
                "class_level",
                "exercise_type",
                "exercise_category",
                "difficulty_level",
                "learning_style",
                "specific_needs",
                "student_profile",
                "subject_matter",
                "source_lesson_plan_id",
                "source_type",
            ],
            ContentKind::LessonPlan => &[
                "title",
                "content",
                "subject",
                "subject_matter",
                "class_level",
                "total_sessions",
                "additional_instructions",
            ],
            ContentKind::Correspondence => &["title", "content", "recipient_type", "tone"],
            ContentKind::MusicLesson => &[
                "title",
                "content",
                "lyrics",
                "subject",
                "class_level",
                "music_genre",
            ],
            ContentKind::Image => &["prompt", "image_url"],
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown content kind '{}'", s)))
    }
}

/// A saved item of any kind, normalized for listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SavedContent {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    /// Remaining kind-specific columns (subject, class_level, ...)
    #[cfg_attr(feature = "binding-generation", ts(type = "Record<string, unknown>"))]
    pub metadata: Map<String, Value>,
}

/// Columns that never end up in `metadata`.
const STRUCTURAL_COLUMNS: &[&str] = &["id", "user_id", "created_at", "updated_at", "generated_at"];

impl SavedContent {
    /// Normalize a raw table row.
    pub fn from_row(kind: ContentKind, mut row: Map<String, Value>) -> Result<Self, AppError> {
        let id = row
            .get("id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| {
                AppError::backend(format!("{} row without a valid id", kind.table()))
            })?;

        // Images only carry `generated_at`.
        let created_at = take_string(&mut row, "created_at")
            .or_else(|| take_string(&mut row, "generated_at"))
            .unwrap_or_default();
        let updated_at = take_string(&mut row, "updated_at");

        let (title_col, body_col) = kind.title_and_body_columns();
        let title = take_string(&mut row, title_col).unwrap_or_default();
        let content = take_string(&mut row, body_col).unwrap_or_default();

        for column in STRUCTURAL_COLUMNS {
            row.remove(*column);
        }

        Ok(Self {
            id,
            kind,
            title,
            content,
            created_at,
            updated_at,
            metadata: row,
        })
    }
}

fn take_string(row: &mut Map<String, Value>, key: &str) -> Option<String> {
    match row.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

/// Body of a save request: a flat JSON object of column values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveContentRequest {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}
