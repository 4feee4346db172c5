//! Task delta ledger
//!
//! Records only the changes a single task made relative to the document
//! commit, one three-state record per touched entity. The full document
//! state never lives here; multiple tasks' deltas can be audited and merged
//! independently on the server side.
//!
//! Status transitions per record:
//! - entity born in this task: `Created`, updated in place, and simply
//!   removed again on delete (created-then-deleted cancels out)
//! - committed entity edited: `Modified` carrying the full post-edit value
//! - committed entity deleted: `Deleted`; a `Modified` record is replaced
//!   by the `Deleted` record so the server also retracts the earlier edit

use crate::annotation::{
    Annotation, AnnotationDelta, AnnotationId, RelationDelta, RelationGroup, RelationId, TokenId,
};
use crate::geometry::Bounds;
use crate::ontology::{OntoClass, OntoProperty};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What a delta record says happened to its entity during the task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Created,
    Modified,
    Deleted,
}

/// One annotation delta record
///
/// Structurally an [`Annotation`] plus its task status. The id always
/// matches the document-commit annotation it describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAnnotation {
    pub id: AnnotationId,
    pub bounds: Bounds,
    pub page: usize,
    pub onto_class: OntoClass,
    pub tokens: Option<Vec<TokenId>>,
    pub text: Option<String>,
    pub date: NaiveDate,
    pub status: TaskStatus,
}

impl TaskAnnotation {
    pub fn from_annotation(a: &Annotation, status: TaskStatus) -> Self {
        Self {
            id: a.id,
            bounds: a.bounds,
            page: a.page,
            onto_class: a.onto_class.clone(),
            tokens: a.tokens.clone(),
            text: a.text.clone(),
            date: a.date,
            status,
        }
    }

    /// Copy with delta fields replaced; id, date and status are preserved
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
            status: self.status,
        }
    }
}

/// One relation delta record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRelationGroup {
    pub id: RelationId,
    pub source_ids: Vec<AnnotationId>,
    pub target_ids: Vec<AnnotationId>,
    pub onto_property: OntoProperty,
    pub date: NaiveDate,
    pub status: TaskStatus,
}

impl TaskRelationGroup {
    pub fn from_relation(r: &RelationGroup, status: TaskStatus) -> Self {
        Self {
            id: r.id,
            source_ids: r.source_ids.clone(),
            target_ids: r.target_ids.clone(),
            onto_property: r.onto_property.clone(),
            date: r.date,
            status,
        }
    }

    /// Copy with the relation type replaced; id, date and status preserved
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
            status: self.status,
        }
    }
}

/// The changes one task made relative to the document commit
///
/// Immutable snapshot like the document ledger: every edit returns a new
/// instance. Every edit first asks whether a record for the entity's id
/// already exists in this task and branches on its status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDeltaAnnotations {
    pub annotations: Vec<TaskAnnotation>,
    pub relations: Vec<TaskRelationGroup>,
    #[serde(default, skip_serializing)]
    pub unsaved_changes: bool,
}

impl TaskDeltaAnnotations {
    pub fn new(annotations: Vec<TaskAnnotation>, relations: Vec<TaskRelationGroup>) -> Self {
        Self {
            annotations,
            relations,
            unsaved_changes: false,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// Clear the unsaved flag without touching content
    pub fn saved(&self) -> Self {
        Self {
            annotations: self.annotations.clone(),
            relations: self.relations.clone(),
            unsaved_changes: false,
        }
    }

    fn with(
        &self,
        annotations: Vec<TaskAnnotation>,
        relations: Vec<TaskRelationGroup>,
    ) -> Self {
        Self {
            annotations,
            relations,
            unsaved_changes: true,
        }
    }

    /// Record an annotation born in this task
    pub fn with_new_annotation(&self, a: &Annotation) -> Self {
        let mut annotations = self.annotations.clone();
        annotations.push(TaskAnnotation::from_annotation(a, TaskStatus::Created));
        self.with(annotations, self.relations.clone())
    }

    /// Record a relation born in this task
    pub fn with_new_relation(&self, r: &RelationGroup) -> Self {
        let mut relations = self.relations.clone();
        relations.push(TaskRelationGroup::from_relation(r, TaskStatus::Created));
        self.with(self.annotations.clone(), relations)
    }

    /// Record a modification of `a`
    ///
    /// If a record for the id already exists it is updated in place
    /// (keeping its status); otherwise a `Modified` record carrying the
    /// full post-edit value is appended.
    pub fn update_annotation(&self, a: &Annotation, delta: &AnnotationDelta) -> Self {
        if self.annotations.iter().any(|ann| ann.id == a.id) {
            let annotations = self
                .annotations
                .iter()
                .map(|ann| {
                    if ann.id == a.id {
                        ann.update(delta)
                    } else {
                        ann.clone()
                    }
                })
                .collect();
            return self.with(annotations, self.relations.clone());
        }

        let mut annotations = self.annotations.clone();
        annotations.push(TaskAnnotation::from_annotation(
            &a.update(delta),
            TaskStatus::Modified,
        ));
        self.with(annotations, self.relations.clone())
    }

    /// Record a modification of `r`, mirroring [`Self::update_annotation`]
    pub fn update_relation(&self, r: &RelationGroup, delta: &RelationDelta) -> Self {
        if self.relations.iter().any(|rel| rel.id == r.id) {
            let relations = self
                .relations
                .iter()
                .map(|rel| {
                    if rel.id == r.id {
                        rel.update_onto_property(delta)
                    } else {
                        rel.clone()
                    }
                })
                .collect();
            return self.with(self.annotations.clone(), relations);
        }

        let mut relations = self.relations.clone();
        relations.push(TaskRelationGroup::from_relation(
            &r.update_onto_property(delta),
            TaskStatus::Modified,
        ));
        self.with(self.annotations.clone(), relations)
    }

    /// Record the deletion of `a`
    pub fn delete_annotation(&self, a: &Annotation) -> Self {
        let existing = self.annotations.iter().find(|ann| ann.id == a.id);

        match existing {
            // Committed annotation, first touch in this task: note the
            // deletion explicitly.
            None => {
                let mut annotations = self.annotations.clone();
                annotations.push(TaskAnnotation::from_annotation(a, TaskStatus::Deleted));
                self.with(annotations, self.relations.clone())
            }
            // The earlier local modification must be retracted too, so the
            // Modified record is replaced by a Deleted one with the same id.
            Some(record) if record.status == TaskStatus::Modified => {
                let mut annotations: Vec<TaskAnnotation> = self
                    .annotations
                    .iter()
                    .filter(|ann| ann.id != a.id)
                    .cloned()
                    .collect();
                annotations.push(TaskAnnotation::from_annotation(a, TaskStatus::Deleted));
                self.with(annotations, self.relations.clone())
            }
            // Born in this task: the record simply disappears.
            Some(_) => {
                let annotations = self
                    .annotations
                    .iter()
                    .filter(|ann| ann.id != a.id)
                    .cloned()
                    .collect();
                self.with(annotations, self.relations.clone())
            }
        }
    }

    /// Record the deletion of `r`
    pub fn delete_relation(&self, r: &RelationGroup) -> Self {
        self.with(
            self.annotations.clone(),
            Self::delete_relation_record(&self.relations, r),
        )
    }

    /// Batch variant of [`Self::delete_relation`]
    ///
    /// Used to synchronize relation voiding triggered indirectly by an
    /// annotation deletion; the delta layer cannot re-derive the cascade
    /// because it does not hold the full relation set.
    pub fn delete_relations(&self, deleted: &[RelationGroup]) -> Self {
        let mut relations = self.relations.clone();
        for r in deleted {
            relations = Self::delete_relation_record(&relations, r);
        }
        self.with(self.annotations.clone(), relations)
    }

    fn delete_relation_record(
        relations: &[TaskRelationGroup],
        r: &RelationGroup,
    ) -> Vec<TaskRelationGroup> {
        let existing = relations.iter().find(|rel| rel.id == r.id);

        match existing {
            None => {
                let mut next = relations.to_vec();
                next.push(TaskRelationGroup::from_relation(r, TaskStatus::Deleted));
                next
            }
            Some(record) if record.status == TaskStatus::Modified => {
                let mut next: Vec<TaskRelationGroup> = relations
                    .iter()
                    .filter(|rel| rel.id != r.id)
                    .cloned()
                    .collect();
                next.push(TaskRelationGroup::from_relation(r, TaskStatus::Deleted));
                next
            }
            Some(_) => relations
                .iter()
                .filter(|rel| rel.id != r.id)
                .cloned()
                .collect(),
        }
    }
}

impl Default for TaskDeltaAnnotations {
    fn default() -> Self {
        Self::empty()
    }
}
