//! Document commit ledger
//!
//! The set of annotations and relations already persisted for a document.
//! Every edit operation returns a new ledger snapshot; collections are
//! copied, never shared, so swapping snapshots by reference is always safe.

use crate::annotation::{
    Annotation, AnnotationDelta, RelationDelta, RelationGroup, RelationId, RelationInfo,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Committed annotation/relation state for a document
///
/// Source of truth for what is committed; the task delta ledger only ever
/// records changes relative to this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocAnnotations {
    pub annotations: Vec<Annotation>,
    pub relations: Vec<RelationGroup>,
    #[serde(default, skip_serializing)]
    pub unsaved_changes: bool,
}

impl DocAnnotations {
    pub fn new(annotations: Vec<Annotation>, relations: Vec<RelationGroup>) -> Self {
        Self {
            annotations,
            relations,
            unsaved_changes: false,
        }
    }

    /// The zero value, used before any data has loaded
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

    pub fn with_new_annotation(&self, a: Annotation) -> Self {
        let mut annotations = self.annotations.clone();
        annotations.push(a);
        Self {
            annotations,
            relations: self.relations.clone(),
            unsaved_changes: true,
        }
    }

    pub fn with_new_relation(&self, r: RelationGroup) -> Self {
        let mut relations = self.relations.clone();
        relations.push(r);
        Self {
            annotations: self.annotations.clone(),
            relations,
            unsaved_changes: true,
        }
    }

    /// Replace the annotation with a matching id, leaving others untouched
    pub fn update_annotation(&self, a: &Annotation, delta: &AnnotationDelta) -> Self {
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
        Self {
            annotations,
            relations: self.relations.clone(),
            unsaved_changes: true,
        }
    }

    /// Replace the relation with a matching id, leaving others untouched
    pub fn update_relation(&self, r: &RelationGroup, delta: &RelationDelta) -> Self {
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
        Self {
            annotations: self.annotations.clone(),
            relations,
            unsaved_changes: true,
        }
    }

    /// Remove an annotation and void the relations it leaves dangling
    ///
    /// Relations that lose their last endpoint on either side are dropped
    /// from the result set.
    pub fn delete_annotation(&self, a: &Annotation) -> Self {
        let annotations = self
            .annotations
            .iter()
            .filter(|ann| ann.id != a.id)
            .cloned()
            .collect();

        let mut voided: Vec<RelationId> = Vec::new();
        let relations = self
            .relations
            .iter()
            .filter_map(|r| {
                let survivor = r.update_for_annotation_deletion(a);
                if survivor.is_none() {
                    voided.push(r.id);
                }
                survivor
            })
            .collect();

        if !voided.is_empty() {
            debug!(annotation = %a.id, relations = ?voided, "cascade-deleted relations");
        }

        Self {
            annotations,
            relations,
            unsaved_changes: true,
        }
    }

    /// Remove a relation by id only
    pub fn delete_relation(&self, r: &RelationGroup) -> Self {
        let relations = self
            .relations
            .iter()
            .filter(|rel| rel.id != r.id)
            .cloned()
            .collect();
        Self {
            annotations: self.annotations.clone(),
            relations,
            unsaved_changes: true,
        }
    }

    /// Remove the last annotation in insertion order and re-run relation
    /// voiding
    ///
    /// Best-effort undo, not a history stack: it only pops the most recent
    /// addition and does not restore relations edited independently since.
    pub fn undo_annotation(&self) -> Self {
        let Some(popped) = self.annotations.last() else {
            return self.clone();
        };

        let annotations = self.annotations[..self.annotations.len() - 1].to_vec();
        let relations = self
            .relations
            .iter()
            .filter_map(|r| r.update_for_annotation_deletion(popped))
            .collect();

        Self {
            annotations,
            relations,
            unsaved_changes: true,
        }
    }

    /// Preview which relations `delete_annotation(a)` would drop
    ///
    /// Read-only; lets the task delta layer learn about cascade deletions
    /// from the pre-delete state instead of re-deriving them.
    pub fn anticipate_deleted_relations(&self, a: &Annotation) -> Vec<RelationGroup> {
        self.relations
            .iter()
            .filter(|r| r.update_for_annotation_deletion(a).is_none())
            .cloned()
            .collect()
    }

    /// Resolve a relation's endpoints for display
    ///
    /// Only the first id of each side is resolved; the protocol never
    /// creates relations with more than one endpoint per side.
    pub fn relation_info(&self, r: &RelationGroup) -> RelationInfo {
        let find = |id: Option<&uuid::Uuid>| {
            id.and_then(|id| self.annotations.iter().find(|a| a.id == *id))
                .cloned()
        };
        RelationInfo {
            relation_id: r.id,
            source: find(r.source_ids.first()),
            target: find(r.target_ids.first()),
            onto_property: r.onto_property.clone(),
        }
    }

    /// Look up a relation by id; miss is not an error
    pub fn relation_from_id(&self, id: RelationId) -> Option<&RelationGroup> {
        self.relations.iter().find(|r| r.id == id)
    }
}

impl Default for DocAnnotations {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::test_support::{test_annotation, test_class, test_property};

    fn doc_with_relation() -> (DocAnnotations, Annotation, Annotation, RelationGroup) {
        let src = test_annotation(0);
        let dst = test_annotation(0);
        let r = RelationGroup::new(vec![src.id], vec![dst.id], test_property(&[], &[]));
        let doc = DocAnnotations::empty()
            .with_new_annotation(src.clone())
            .with_new_annotation(dst.clone())
            .with_new_relation(r.clone());
        (doc, src, dst, r)
    }

    #[test]
    fn test_append_sets_unsaved_flag() {
        let doc = DocAnnotations::empty();
        assert!(!doc.unsaved_changes);

        let doc = doc.with_new_annotation(test_annotation(0));
        assert!(doc.unsaved_changes);
        assert_eq!(doc.annotations.len(), 1);

        let cleared = doc.saved();
        assert!(!cleared.unsaved_changes);
        assert_eq!(cleared.annotations, doc.annotations);
    }

    #[test]
    fn test_update_annotation_replaces_only_matching_id() {
        let a = test_annotation(0);
        let b = test_annotation(0);
        let doc = DocAnnotations::empty()
            .with_new_annotation(a.clone())
            .with_new_annotation(b.clone());

        let updated = doc.update_annotation(
            &a,
            &AnnotationDelta {
                onto_class: Some(test_class("B")),
                ..Default::default()
            },
        );

        assert_eq!(updated.annotations[0].onto_class.iri, "B");
        assert_eq!(updated.annotations[1].onto_class.iri, "A");
        // The previous snapshot is untouched.
        assert_eq!(doc.annotations[0].onto_class.iri, "A");
    }

    #[test]
    fn test_delete_annotation_cascades_to_relations() {
        let (doc, src, dst, _) = doc_with_relation();

        let after = doc.delete_annotation(&src);
        assert_eq!(after.annotations.len(), 1);
        assert_eq!(after.annotations[0].id, dst.id);
        assert!(after.relations.is_empty());
    }

    #[test]
    fn test_delete_annotation_keeps_unrelated_relations() {
        let (doc, _, _, r) = doc_with_relation();
        let unrelated = test_annotation(1);
        let doc = doc.with_new_annotation(unrelated.clone());

        let after = doc.delete_annotation(&unrelated);
        assert_eq!(after.relations.len(), 1);
        assert_eq!(after.relations[0].id, r.id);
    }

    #[test]
    fn test_anticipate_matches_actual_cascade() {
        let (doc, src, _, r) = doc_with_relation();

        let anticipated = doc.anticipate_deleted_relations(&src);
        assert_eq!(anticipated.len(), 1);
        assert_eq!(anticipated[0].id, r.id);

        let after = doc.delete_annotation(&src);
        assert!(after.relations.is_empty());
        // Preview did not mutate anything.
        assert_eq!(doc.relations.len(), 1);
    }

    #[test]
    fn test_delete_relation_removes_by_id_only() {
        let (doc, _, _, r) = doc_with_relation();
        let after = doc.delete_relation(&r);
        assert!(after.relations.is_empty());
        assert_eq!(after.annotations.len(), 2);
    }

    #[test]
    fn test_undo_pops_last_annotation_and_voids_relations() {
        let (doc, src, dst, _) = doc_with_relation();

        // dst was inserted last, so undo pops it and voids the relation.
        let after = doc.undo_annotation();
        assert_eq!(after.annotations.len(), 1);
        assert_eq!(after.annotations[0].id, src.id);
        assert!(after.annotations.iter().all(|a| a.id != dst.id));
        assert!(after.relations.is_empty());
        assert_eq!(doc.annotations.len(), 2);
    }

    #[test]
    fn test_undo_on_empty_ledger_is_a_no_op() {
        let doc = DocAnnotations::empty();
        let after = doc.undo_annotation();
        assert_eq!(after, doc);
    }

    #[test]
    fn test_relation_info_resolves_endpoints() {
        let (doc, src, dst, r) = doc_with_relation();
        let info = doc.relation_info(&r);
        assert_eq!(info.relation_id, r.id);
        assert_eq!(info.source.unwrap().id, src.id);
        assert_eq!(info.target.unwrap().id, dst.id);
    }

    #[test]
    fn test_relation_info_with_missing_endpoint() {
        let (doc, src, _, r) = doc_with_relation();
        // Relation still references src, but the annotation list no longer
        // holds it (simulates stale data from a concurrent edit).
        let doc = DocAnnotations::new(
            doc.annotations
                .iter()
                .filter(|a| a.id != src.id)
                .cloned()
                .collect(),
            doc.relations.clone(),
        );
        let info = doc.relation_info(&r);
        assert!(info.source.is_none());
        assert!(info.target.is_some());
    }

    #[test]
    fn test_relation_from_id_miss_is_none() {
        let (doc, _, _, r) = doc_with_relation();
        assert!(doc.relation_from_id(r.id).is_some());
        assert!(doc.relation_from_id(uuid::Uuid::new_v4()).is_none());
    }
}
