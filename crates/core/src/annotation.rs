//! Annotation and relation entity model
//!
//! Value objects with stable identity and update-by-copy semantics: the id
//! and creation date never change across an update, every other field is
//! replaced on a fresh instance. Nothing in this module mutates in place,
//! which keeps old and new ledger snapshots fully independent.

use crate::geometry::Bounds;
use crate::ontology::{OntoClass, OntoProperty};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an annotation
///
/// Generated once with UUID v4; stable across updates and across the
/// document-commit / task-delta boundary.
pub type AnnotationId = uuid::Uuid;

/// Unique identifier for a relation group
pub type RelationId = uuid::Uuid;

pub(crate) fn creation_date() -> NaiveDate {
    Utc::now().date_naive()
}

/// Weak reference to a token in a page's token array
///
/// Never owns the token; resolving it against a page that has been reloaded
/// with different tokens is the caller's problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenId {
    pub page_index: usize,
    pub token_index: usize,
}

/// A tagged bounding box over a PDF page
///
/// `tokens` is `None` for free-form annotations (raw pixel rectangle) and
/// `Some` for annotations snapped to an ordered set of page tokens. `text`
/// caches the display string derived from the snapped tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: AnnotationId,
    pub bounds: Bounds,
    /// 0-based page index
    pub page: usize,
    pub onto_class: OntoClass,
    pub tokens: Option<Vec<TokenId>>,
    pub text: Option<String>,
    /// Creation date; immutable across updates
    pub date: NaiveDate,
}

/// Field overrides for [`Annotation::update`]
///
/// `None` keeps the current value. There is deliberately no way to clear
/// `tokens` or `text` through a delta; a free-form annotation is built as
/// such from the start.
#[derive(Debug, Clone, Default)]
pub struct AnnotationDelta {
    pub bounds: Option<Bounds>,
    pub page: Option<usize>,
    pub onto_class: Option<OntoClass>,
    pub tokens: Option<Vec<TokenId>>,
    pub text: Option<String>,
}

impl Annotation {
    /// Create a new annotation with a generated id and today's date
    pub fn new(
        bounds: Bounds,
        page: usize,
        onto_class: OntoClass,
        tokens: Option<Vec<TokenId>>,
        text: Option<String>,
    ) -> Self {
        Self {
            id: AnnotationId::new_v4(),
            bounds,
            page,
            onto_class,
            tokens,
            text,
            date: creation_date(),
        }
    }

    /// Return a copy with the delta's fields replaced
    ///
    /// The id and creation date are preserved. Untouched fields are cloned,
    /// never shared, so neither instance can be altered through the other.
    pub fn update(&self, delta: &AnnotationDelta) -> Self {
        Self {
            id: self.id,
            bounds: delta.bounds.unwrap_or(self.bounds),
            page: delta.page.unwrap_or(self.page),
            onto_class: delta
                .onto_class
                .clone()
                .unwrap_or_else(|| self.onto_class.clone()),
            tokens: delta.tokens.clone().or_else(|| self.tokens.clone()),
            text: delta.text.clone().or_else(|| self.text.clone()),
            date: self.date,
        }
    }
}

impl fmt::Display for Annotation {
    /// The id is the stable render/collection key
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Field overrides for [`RelationGroup::update_onto_property`]
#[derive(Debug, Clone, Default)]
pub struct RelationDelta {
    pub onto_property: Option<OntoProperty>,
}

/// A typed relation between annotations
///
/// Source and target are id lists for forward compatibility with
/// multi-endpoint relations; the interactive protocol only ever populates
/// one id per side. A relation is meaningful only while both sides are
/// non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationGroup {
    pub id: RelationId,
    pub source_ids: Vec<AnnotationId>,
    pub target_ids: Vec<AnnotationId>,
    pub onto_property: OntoProperty,
    pub date: NaiveDate,
}

impl RelationGroup {
    /// Create a new relation with a generated id and today's date
    pub fn new(
        source_ids: Vec<AnnotationId>,
        target_ids: Vec<AnnotationId>,
        onto_property: OntoProperty,
    ) -> Self {
        Self {
            id: RelationId::new_v4(),
            source_ids,
            target_ids,
            onto_property,
            date: creation_date(),
        }
    }

    /// Return a copy with the relation type replaced
    pub fn update_onto_property(&self, delta: &RelationDelta) -> Self {
        Self {
            id: self.id,
            source_ids: self.source_ids.clone(),
            target_ids: self.target_ids.clone(),
            onto_property: delta
                .onto_property
                .clone()
                .unwrap_or_else(|| self.onto_property.clone()),
            date: self.date,
        }
    }

    /// Drop a deleted annotation from both endpoint lists
    ///
    /// Returns `None` when the relation should be voided: a side that had
    /// endpoints is now empty, or a side was already empty and still is
    /// (the relation never had two live endpoints). Otherwise returns a new
    /// group with the SAME id — regenerating the id here would break the
    /// correlation between a document-commit relation and its task-delta
    /// counterpart.
    pub fn update_for_annotation_deletion(&self, deleted: &Annotation) -> Option<Self> {
        let source_was_empty = self.source_ids.is_empty();
        let target_was_empty = self.target_ids.is_empty();

        let source_ids: Vec<AnnotationId> = self
            .source_ids
            .iter()
            .copied()
            .filter(|id| *id != deleted.id)
            .collect();
        let target_ids: Vec<AnnotationId> = self
            .target_ids
            .iter()
            .copied()
            .filter(|id| *id != deleted.id)
            .collect();

        let source_now_empty = source_ids.is_empty();
        let target_now_empty = target_ids.is_empty();

        // Only one side ever had endpoints and it ran out.
        if source_was_empty && target_now_empty {
            return None;
        }
        if target_was_empty && source_now_empty {
            return None;
        }
        // A previously populated side just lost its last endpoint.
        if !source_was_empty && source_now_empty {
            return None;
        }
        if !target_was_empty && target_now_empty {
            return None;
        }

        Some(Self {
            id: self.id,
            source_ids,
            target_ids,
            onto_property: self.onto_property.clone(),
            date: self.date,
        })
    }
}

/// Resolved endpoints of a relation, for display
///
/// Derived by scanning the document ledger; not persisted, recomputed on
/// demand. Either endpoint may be `None` if the referenced annotation is
/// gone.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationInfo {
    pub relation_id: RelationId,
    pub source: Option<Annotation>,
    pub target: Option<Annotation>,
    pub onto_property: OntoProperty,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn test_class(iri: &str) -> OntoClass {
        OntoClass {
            id: format!("class-{}", iri),
            text: iri.to_string(),
            base_iri: "http://example.org/onto".to_string(),
            iri: iri.to_string(),
            label: iri.to_string(),
            color: "#70DDBA".to_string(),
        }
    }

    pub fn test_property(domain: &[&str], range: &[&str]) -> OntoProperty {
        OntoProperty {
            id: "prop-1".to_string(),
            text: "connects".to_string(),
            base_iri: "http://example.org/onto".to_string(),
            iri: "http://example.org/onto#connects".to_string(),
            label: "connects".to_string(),
            domain: domain.iter().map(|s| s.to_string()).collect(),
            range: range.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn test_annotation(page: usize) -> Annotation {
        Annotation::new(
            Bounds::new(0.0, 0.0, 100.0, 20.0),
            page,
            test_class("A"),
            None,
            Some("some text".to_string()),
        )
    }
}
