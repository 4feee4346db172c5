//! Merge orchestrator over the document and task ledgers
//!
//! Every edit is applied to both ledgers in one step so they can never
//! drift apart. Callers hold a `PdfAnnotations` and swap whole snapshots;
//! read paths delegate to the document ledger, which is the source of
//! truth for current state.

use crate::annotation::{
    Annotation, AnnotationDelta, RelationDelta, RelationGroup, RelationId, RelationInfo,
};
use crate::doc_annotations::DocAnnotations;
use crate::task_delta::TaskDeltaAnnotations;
use serde::{Deserialize, Serialize};

/// Paired document-commit and task-delta state for one document/task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfAnnotations {
    pub doc: DocAnnotations,
    pub task: TaskDeltaAnnotations,
}

impl PdfAnnotations {
    pub fn new(doc: DocAnnotations, task: TaskDeltaAnnotations) -> Self {
        Self { doc, task }
    }

    pub fn empty() -> Self {
        Self::new(DocAnnotations::empty(), TaskDeltaAnnotations::empty())
    }

    /// Whether either ledger still holds unflushed edits
    pub fn unsaved_changes(&self) -> bool {
        self.doc.unsaved_changes || self.task.unsaved_changes
    }

    /// Clear both unsaved flags after a successful flush
    pub fn saved(&self) -> Self {
        Self::new(self.doc.saved(), self.task.saved())
    }

    pub fn with_new_annotation(&self, a: Annotation) -> Self {
        Self::new(
            self.doc.with_new_annotation(a.clone()),
            self.task.with_new_annotation(&a),
        )
    }

    pub fn with_new_relation(&self, r: RelationGroup) -> Self {
        Self::new(
            self.doc.with_new_relation(r.clone()),
            self.task.with_new_relation(&r),
        )
    }

    pub fn update_annotation(&self, a: &Annotation, delta: &AnnotationDelta) -> Self {
        Self::new(
            self.doc.update_annotation(a, delta),
            self.task.update_annotation(a, delta),
        )
    }

    pub fn update_relation(&self, r: &RelationGroup, delta: &RelationDelta) -> Self {
        Self::new(
            self.doc.update_relation(r, delta),
            self.task.update_relation(r, delta),
        )
    }

    /// Delete an annotation, cascading relation voiding into both ledgers
    ///
    /// Cascade victims are computed against the pre-delete document state,
    /// before the document ledger drops them. The task delta cannot derive
    /// them on its own because it does not hold the full relation set.
    pub fn delete_annotation(&self, a: &Annotation) -> Self {
        let cascading = self.doc.anticipate_deleted_relations(a);
        Self::new(
            self.doc.delete_annotation(a),
            self.task.delete_annotation(a).delete_relations(&cascading),
        )
    }

    pub fn delete_relation(&self, r: &RelationGroup) -> Self {
        Self::new(
            self.doc.delete_relation(r),
            self.task.delete_relation(r),
        )
    }

    /// Pop the most recently added annotation from the document ledger
    ///
    /// Mirrors the cascade into the task delta like a regular deletion.
    pub fn undo_annotation(&self) -> Self {
        let Some(last) = self.doc.annotations.last().cloned() else {
            return self.clone();
        };
        self.delete_annotation(&last)
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.doc.annotations
    }

    pub fn relations(&self) -> &[RelationGroup] {
        &self.doc.relations
    }

    pub fn relation_info(&self, r: &RelationGroup) -> RelationInfo {
        self.doc.relation_info(r)
    }

    pub fn relation_from_id(&self, id: RelationId) -> Option<&RelationGroup> {
        self.doc.relation_from_id(id)
    }
}

impl Default for PdfAnnotations {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::test_support::{test_annotation, test_class, test_property};
    use crate::task_delta::TaskStatus;

    #[test]
    fn test_edits_land_in_both_ledgers() {
        let a = test_annotation(0);
        let state = PdfAnnotations::empty().with_new_annotation(a.clone());

        assert_eq!(state.doc.annotations.len(), 1);
        assert_eq!(state.task.annotations.len(), 1);
        assert_eq!(state.task.annotations[0].status, TaskStatus::Created);
        assert!(state.unsaved_changes());
    }

    #[test]
    fn test_saved_clears_both_flags() {
        let state = PdfAnnotations::empty()
            .with_new_annotation(test_annotation(0))
            .saved();
        assert!(!state.unsaved_changes());
        assert_eq!(state.doc.annotations.len(), 1);
    }

    #[test]
    fn test_delete_cascades_relation_voiding_into_task_delta() {
        let src = test_annotation(0);
        let dst = test_annotation(0);
        let r = RelationGroup::new(vec![src.id], vec![dst.id], test_property(&[], &[]));

        // Relation pre-exists the task (loaded from the document commit).
        let doc = DocAnnotations::new(
            vec![src.clone(), dst.clone()],
            vec![r.clone()],
        );
        let state = PdfAnnotations::new(doc, TaskDeltaAnnotations::empty());

        let after = state.delete_annotation(&src);

        assert!(after.doc.relations.is_empty());
        // Task delta saw both the annotation deletion and the cascade.
        assert_eq!(after.task.annotations.len(), 1);
        assert_eq!(after.task.annotations[0].status, TaskStatus::Deleted);
        assert_eq!(after.task.relations.len(), 1);
        assert_eq!(after.task.relations[0].id, r.id);
        assert_eq!(after.task.relations[0].status, TaskStatus::Deleted);
    }

    #[test]
    fn test_created_then_deleted_leaves_empty_task_delta() {
        let a = test_annotation(0);
        let state = PdfAnnotations::empty()
            .with_new_annotation(a.clone())
            .delete_annotation(&a);

        assert!(state.doc.annotations.is_empty());
        assert!(state.task.annotations.is_empty());
    }

    #[test]
    fn test_cascade_cancels_relation_created_in_task() {
        let src = test_annotation(0);
        let dst = test_annotation(0);
        let r = RelationGroup::new(vec![src.id], vec![dst.id], test_property(&[], &[]));

        let state = PdfAnnotations::empty()
            .with_new_annotation(src.clone())
            .with_new_annotation(dst.clone())
            .with_new_relation(r)
            .delete_annotation(&src);

        assert!(state.doc.relations.is_empty());
        // Created-in-task relation cancels out instead of leaving a
        // Deleted record.
        assert!(state.task.relations.is_empty());
    }

    #[test]
    fn test_update_annotation_reaches_both_ledgers() {
        let committed = test_annotation(0);
        let doc = DocAnnotations::new(vec![committed.clone()], vec![]);
        let state = PdfAnnotations::new(doc, TaskDeltaAnnotations::empty());

        let delta = AnnotationDelta {
            onto_class: Some(test_class("B")),
            ..Default::default()
        };
        let after = state.update_annotation(&committed, &delta);

        assert_eq!(after.doc.annotations[0].onto_class.iri, "B");
        assert_eq!(after.task.annotations.len(), 1);
        assert_eq!(after.task.annotations[0].status, TaskStatus::Modified);
        assert_eq!(after.task.annotations[0].onto_class.iri, "B");
    }

    #[test]
    fn test_undo_behaves_like_deleting_the_last_annotation() {
        let a = test_annotation(0);
        let b = test_annotation(0);
        let state = PdfAnnotations::empty()
            .with_new_annotation(a.clone())
            .with_new_annotation(b.clone());

        let after = state.undo_annotation();
        assert_eq!(after.doc.annotations.len(), 1);
        assert_eq!(after.doc.annotations[0].id, a.id);
        assert_eq!(after.task.annotations.len(), 1);
        assert_eq!(after.task.annotations[0].id, a.id);
    }

    #[test]
    fn test_undo_on_empty_state_is_a_no_op() {
        let state = PdfAnnotations::empty();
        assert_eq!(state.undo_annotation(), state);
    }

    #[test]
    fn test_delete_relation_reaches_both_ledgers() {
        let r = RelationGroup::new(vec![], vec![], test_property(&[], &[]));
        let doc = DocAnnotations::new(vec![], vec![r.clone()]);
        let state = PdfAnnotations::new(doc, TaskDeltaAnnotations::empty());

        let after = state.delete_relation(&r);
        assert!(after.doc.relations.is_empty());
        assert_eq!(after.task.relations.len(), 1);
        assert_eq!(after.task.relations[0].status, TaskStatus::Deleted);
    }
}
