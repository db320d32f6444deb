//! Note and note type models
//!
//! Notes belong to a user and optionally to an account. Each note points at
//! a `NoteType`, which is either one of the built-in system types or a type
//! defined by a user or account.
//!
//! Notes carry audit fields recording who created, last updated, archived
//! and deleted them. Deletion is soft: `deletedBy` is set and the record is
//! left for the owner of the storage to purge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::{validate_input, ModelError, ModelResult};

/// Note record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Opaque note ID
    pub id: String,

    pub title: String,

    pub content: String,

    /// Note type this note is filed under
    pub note_type_id: String,

    /// Owning user
    pub user_id: String,

    /// Owning account, for shared notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    pub is_public: bool,

    pub is_archived: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    // Audit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,
}

/// Input for creating a note
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNote {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[serde(default)]
    pub content: String,

    #[validate(length(min = 1))]
    pub note_type_id: String,

    #[serde(default)]
    pub account_id: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub tags: Option<Vec<String>>,

    #[serde(default)]
    pub is_public: bool,
}

/// Input for updating a note
///
/// All fields are optional. Only non-None fields will be updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNote {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    pub content: Option<String>,

    #[validate(length(min = 1))]
    pub note_type_id: Option<String>,

    /// New category (use Some(None) to clear)
    pub category: Option<Option<String>>,

    /// New tags (use Some(None) to clear)
    pub tags: Option<Option<Vec<String>>>,

    pub is_public: Option<bool>,
}

impl Note {
    /// Builds a note authored by `user_id`
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Validation` if the input fails validation
    pub fn new(user_id: impl Into<String>, data: CreateNote) -> ModelResult<Self> {
        validate_input(&data)?;

        let user_id = user_id.into();
        let now = Utc::now();

        Ok(Self {
            id: crate::new_id(),
            title: data.title,
            content: data.content,
            note_type_id: data.note_type_id,
            user_id: user_id.clone(),
            account_id: data.account_id,
            category: data.category,
            tags: data.tags.map(normalize_tags),
            is_public: data.is_public,
            is_archived: false,
            created_at: now,
            updated_at: now,
            created_by: Some(user_id),
            updated_by: None,
            archived_by: None,
            deleted_by: None,
        })
    }

    /// Whether the note has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_by.is_some()
    }

    /// Whether the note belongs to an account rather than a single user
    pub fn is_shared(&self) -> bool {
        self.account_id.is_some()
    }

    fn ensure_not_deleted(&self) -> ModelResult<()> {
        if self.is_deleted() {
            return Err(ModelError::InvalidTransition {
                entity: "note",
                from: "deleted".to_string(),
                to: "modified".to_string(),
            });
        }
        Ok(())
    }

    fn touch(&mut self, editor: &str) {
        self.updated_at = Utc::now();
        self.updated_by = Some(editor.to_string());
    }

    /// Applies an update on behalf of `editor`
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Validation` for invalid input, or
    /// `ModelError::InvalidTransition` if the note is deleted.
    pub fn apply_update(&mut self, editor: &str, data: UpdateNote) -> ModelResult<()> {
        validate_input(&data)?;
        self.ensure_not_deleted()?;

        if let Some(title) = data.title {
            self.title = title;
        }
        if let Some(content) = data.content {
            self.content = content;
        }
        if let Some(note_type_id) = data.note_type_id {
            self.note_type_id = note_type_id;
        }
        if let Some(category) = data.category {
            self.category = category;
        }
        if let Some(tags) = data.tags {
            self.tags = tags.map(normalize_tags);
        }
        if let Some(is_public) = data.is_public {
            self.is_public = is_public;
        }

        self.touch(editor);
        Ok(())
    }

    /// Archives the note
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidTransition` if already archived or deleted
    pub fn archive(&mut self, by: &str) -> ModelResult<()> {
        self.ensure_not_deleted()?;
        if self.is_archived {
            return Err(ModelError::InvalidTransition {
                entity: "note",
                from: "archived".to_string(),
                to: "archived".to_string(),
            });
        }

        self.is_archived = true;
        self.archived_by = Some(by.to_string());
        self.touch(by);
        tracing::debug!(note_id = %self.id, archived_by = by, "Note archived");
        Ok(())
    }

    /// Restores an archived note
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidTransition` if not archived or deleted
    pub fn unarchive(&mut self, by: &str) -> ModelResult<()> {
        self.ensure_not_deleted()?;
        if !self.is_archived {
            return Err(ModelError::InvalidTransition {
                entity: "note",
                from: "active".to_string(),
                to: "active".to_string(),
            });
        }

        self.is_archived = false;
        self.archived_by = None;
        self.touch(by);
        Ok(())
    }

    /// Soft-deletes the note
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidTransition` if already deleted
    pub fn mark_deleted(&mut self, by: &str) -> ModelResult<()> {
        self.ensure_not_deleted()?;

        self.deleted_by = Some(by.to_string());
        self.touch(by);
        tracing::debug!(note_id = %self.id, deleted_by = by, "Note deleted");
        Ok(())
    }
}

/// Trims, lowercases and de-duplicates tags, keeping first-seen order
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Note type (category descriptor)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NoteType {
    pub id: String,

    pub name: String,

    /// Hex color, `#rrggbb`
    pub color: String,

    /// Icon identifier
    pub icon: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Built-in type, not editable by users
    pub is_system: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a user- or account-defined note type
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteType {
    #[validate(length(min = 1, max = 64))]
    pub name: String,

    #[validate(custom(function = "validate_hex_color"))]
    pub color: String,

    #[validate(length(min = 1, max = 64))]
    pub icon: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub account_id: Option<String>,
}

/// Accepts `#rrggbb` colors
pub fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_hex_color"))
    }
}

impl NoteType {
    /// Builds a user-defined note type
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Validation` if the input fails validation
    pub fn new(user_id: impl Into<String>, data: CreateNoteType) -> ModelResult<Self> {
        validate_input(&data)?;

        Ok(Self {
            id: crate::new_id(),
            name: data.name,
            color: data.color.to_lowercase(),
            icon: data.icon,
            description: data.description,
            is_system: false,
            user_id: Some(user_id.into()),
            account_id: data.account_id,
            created_at: Utc::now(),
        })
    }

    /// Builds a built-in note type with a fixed ID
    pub fn system(id: &str, name: &str, color: &str, icon: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            icon: icon.to_string(),
            description: None,
            is_system: true,
            user_id: None,
            account_id: None,
            created_at: DateTime::<Utc>::default(),
        }
    }

    /// Defined by a user or account rather than built in
    pub fn is_user_defined(&self) -> bool {
        !self.is_system
    }

    /// Whether `user_id` may edit or delete this type
    pub fn is_editable_by(&self, user_id: &str) -> bool {
        self.is_user_defined() && self.user_id.as_deref() == Some(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_note() -> Note {
        Note::new(
            "user-1",
            CreateNote {
                title: "Groceries".to_string(),
                content: "- eggs".to_string(),
                note_type_id: "general".to_string(),
                tags: Some(vec![" Home ".to_string(), "home".to_string(), "food".to_string()]),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_new_note_sets_audit_fields() {
        let note = create_note();
        assert_eq!(note.created_by.as_deref(), Some("user-1"));
        assert!(note.updated_by.is_none());
        assert!(!note.is_archived);
        assert!(!note.is_shared());
        assert_eq!(note.tags, Some(vec!["home".to_string(), "food".to_string()]));
    }

    #[test]
    fn test_update_stamps_editor() {
        let mut note = create_note();
        note.apply_update(
            "user-2",
            UpdateNote {
                title: Some("Shopping".to_string()),
                category: Some(None),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(note.title, "Shopping");
        assert_eq!(note.updated_by.as_deref(), Some("user-2"));
        assert!(note.updated_at >= note.created_at);
    }

    #[test]
    fn test_archive_cycle() {
        let mut note = create_note();
        note.archive("user-1").unwrap();
        assert!(note.is_archived);
        assert_eq!(note.archived_by.as_deref(), Some("user-1"));
        assert!(note.archive("user-1").is_err());

        note.unarchive("user-1").unwrap();
        assert!(!note.is_archived);
        assert!(note.archived_by.is_none());
    }

    #[test]
    fn test_deleted_note_is_frozen() {
        let mut note = create_note();
        note.mark_deleted("user-1").unwrap();
        assert!(note.is_deleted());

        assert!(note.mark_deleted("user-1").is_err());
        assert!(note.archive("user-1").is_err());
        assert!(note
            .apply_update("user-1", UpdateNote::default())
            .is_err());
    }

    #[test]
    fn test_hex_color_validation() {
        assert!(validate_hex_color("#1a2B3c").is_ok());
        assert!(validate_hex_color("1a2b3c").is_err());
        assert!(validate_hex_color("#12345").is_err());
        assert!(validate_hex_color("#12345g").is_err());
    }

    #[test]
    fn test_user_defined_note_type() {
        let note_type = NoteType::new(
            "user-1",
            CreateNoteType {
                name: "Recipes".to_string(),
                color: "#FFAA00".to_string(),
                icon: "chef-hat".to_string(),
                description: None,
                account_id: None,
            },
        )
        .unwrap();

        assert!(note_type.is_user_defined());
        assert_eq!(note_type.color, "#ffaa00");
        assert!(note_type.is_editable_by("user-1"));
        assert!(!note_type.is_editable_by("user-2"));

        let system = NoteType::system("general", "General", "#888888", "note");
        assert!(!system.is_user_defined());
        assert!(!system.is_editable_by("user-1"));
    }

    #[test]
    fn test_audit_fields_optional_on_wire() {
        let json = r#"{
            "id": "n1",
            "title": "t",
            "content": "c",
            "noteTypeId": "general",
            "userId": "u1",
            "isPublic": false,
            "isArchived": false,
            "createdAt": "2025-01-03T12:00:00Z",
            "updatedAt": "2025-01-03T12:00:00Z"
        }"#;

        let note: Note = serde_json::from_str(json).unwrap();
        assert!(note.created_by.is_none());
        assert!(note.tags.is_none());
    }
}
