//! Interactive annotation controller
//!
//! Owned by the view layer; every pointer and keyboard interaction funnels
//! through here. The controller holds the current ledger snapshot and all
//! interaction state (active class, relation slots, the in-flight drag),
//! applies edits through the merge orchestrator, and arms the debounced
//! save scheduler on every change. It never blocks on persistence; the host
//! calls [`AnnotationController::poll_save`] from its tick loop.

use crate::notice::Notice;
use pdf_annotator_core::{
    flush_annotations, Annotation, AnnotationDelta, AnnotationGateway, AnnotationId, Bounds,
    DocAnnotations, OntoClass, OntoProperty, PageInfo, PdfAnnotations, RelationDelta,
    RelationGroup, RelationId, RelationInfo, SaveScheduler, SaveTarget, TaskDeltaAnnotations,
    TokenId,
};
use std::time::Instant;
use tracing::warn;

/// A selection drag in progress on one page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub page_index: usize,
    /// Anchored at the press point; the free corner follows the pointer and
    /// may invert the rectangle until the drag finishes.
    pub bounds: Bounds,
}

/// What became of a relation creation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationOutcome {
    Created(RelationId),
    /// The pair violates the property's domain/range; the view should ask
    /// for confirmation and call
    /// [`AnnotationController::create_relation_unchecked`] on yes.
    NeedsConfirmation,
    Rejected,
}

/// Interaction state machine for one open document/task
pub struct AnnotationController {
    state: PdfAnnotations,

    onto_classes: Vec<OntoClass>,
    onto_properties: Vec<OntoProperty>,
    active_class: Option<OntoClass>,
    active_property: Option<OntoProperty>,

    free_form: bool,
    relation_mode: bool,
    hide_labels: bool,
    label_dialog_open: bool,

    /// Relation endpoint slots; first selection fills the source, second
    /// the target.
    src: Option<AnnotationId>,
    dst: Option<AnnotationId>,

    drag: Option<DragState>,

    /// False for tasks the current annotator may view but not submit;
    /// edits stay local and are never flushed.
    can_annotate: bool,
    target: SaveTarget,
    scheduler: SaveScheduler,

    notices: Vec<Notice>,
}

impl AnnotationController {
    pub fn new(
        target: SaveTarget,
        onto_classes: Vec<OntoClass>,
        onto_properties: Vec<OntoProperty>,
        can_annotate: bool,
    ) -> Self {
        let active_class = onto_classes.first().cloned();
        let active_property = onto_properties.first().cloned();
        Self {
            state: PdfAnnotations::empty(),
            onto_classes,
            onto_properties,
            active_class,
            active_property,
            free_form: false,
            relation_mode: false,
            hide_labels: false,
            label_dialog_open: false,
            src: None,
            dst: None,
            drag: None,
            can_annotate,
            target,
            scheduler: SaveScheduler::default(),
            notices: Vec::new(),
        }
    }

    /// Install freshly loaded ledgers; loaded state is clean
    pub fn load(&mut self, doc: DocAnnotations, task: TaskDeltaAnnotations) {
        self.state = PdfAnnotations::new(doc, task);
        self.scheduler.cancel();
        self.src = None;
        self.dst = None;
        self.drag = None;
    }

    fn mark_edited(&mut self) {
        self.scheduler.note_edit(Instant::now());
    }

    // --- drag lifecycle -------------------------------------------------

    /// Start a selection drag at the press point
    ///
    /// Ignored while the label dialog is open so dialog interaction never
    /// spills into the canvas.
    pub fn begin_drag(&mut self, page_index: usize, x: f32, y: f32) {
        if self.label_dialog_open {
            return;
        }
        self.drag = Some(DragState {
            page_index,
            bounds: Bounds::anchored_at(x, y),
        });
    }

    /// Move the free corner of the in-flight drag
    pub fn update_drag(&mut self, x: f32, y: f32) {
        if let Some(drag) = &mut self.drag {
            drag.bounds.right = x;
            drag.bounds.bottom = y;
        }
    }

    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }

    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    /// Tokens the in-flight drag currently covers, for live highlighting
    pub fn preview_tokens(&self, page: &PageInfo) -> Vec<TokenId> {
        match &self.drag {
            Some(drag) if drag.page_index == page.page.index && !self.free_form => {
                page.tokens_for_selection(&drag.bounds.normalized())
            }
            _ => Vec::new(),
        }
    }

    /// Finish the drag and commit the resulting annotation
    ///
    /// The drag is consumed either way. Nothing is committed when the drag
    /// belongs to another page, when no class is active, or when the
    /// selection has zero area.
    pub fn finish_drag(&mut self, page: &PageInfo) -> Option<AnnotationId> {
        let drag = self.drag.take()?;
        if drag.page_index != page.page.index {
            return None;
        }
        let Some(active_class) = self.active_class.clone() else {
            self.notices.push(Notice::ClassRequired);
            return None;
        };

        let annotation = page.annotation_for_bounds(drag.bounds, &active_class, self.free_form)?;
        let id = annotation.id;
        self.state = self.state.with_new_annotation(annotation);
        self.mark_edited();
        Some(id)
    }

    // --- relation building ----------------------------------------------

    /// Toggle an annotation in or out of the relation endpoint slots
    ///
    /// Outside relation mode this only queues a notice. Deselecting clears
    /// the matching slot without resequencing the other one.
    pub fn toggle_selection(&mut self, id: AnnotationId) {
        if !self.relation_mode {
            self.notices.push(Notice::RelationModeRequired);
            return;
        }
        if self.src == Some(id) {
            self.src = None;
        } else if self.dst == Some(id) {
            self.dst = None;
        } else if self.src.is_none() {
            self.src = Some(id);
        } else if self.dst.is_none() {
            self.dst = Some(id);
        } else {
            self.notices.push(Notice::SelectionFull);
        }
    }

    pub fn selection(&self) -> (Option<AnnotationId>, Option<AnnotationId>) {
        (self.src, self.dst)
    }

    /// Try to connect the two selected annotations with the active property
    ///
    /// Domain/range compatibility is advisory: an incompatible pair returns
    /// [`RelationOutcome::NeedsConfirmation`] with no state change, never a
    /// hard rejection.
    pub fn create_relation(&mut self) -> RelationOutcome {
        let (Some(src_id), Some(dst_id)) = (self.src, self.dst) else {
            self.notices.push(Notice::RelationNeedsTwo);
            return RelationOutcome::Rejected;
        };
        let Some(property) = self.active_property.clone() else {
            self.notices.push(Notice::PropertyRequired);
            return RelationOutcome::Rejected;
        };

        let annotations = self.state.annotations();
        let src = annotations.iter().find(|a| a.id == src_id);
        let dst = annotations.iter().find(|a| a.id == dst_id);
        let (Some(src), Some(dst)) = (src, dst) else {
            // Stale slot; the annotation is gone.
            return RelationOutcome::Rejected;
        };

        if !property.is_compatible(&src.onto_class, &dst.onto_class) {
            return RelationOutcome::NeedsConfirmation;
        }
        self.commit_relation(src_id, dst_id, property)
    }

    /// Connect the selected pair regardless of domain/range
    ///
    /// Called after the user confirmed an incompatible pairing.
    pub fn create_relation_unchecked(&mut self) -> RelationOutcome {
        let (Some(src_id), Some(dst_id)) = (self.src, self.dst) else {
            self.notices.push(Notice::RelationNeedsTwo);
            return RelationOutcome::Rejected;
        };
        let Some(property) = self.active_property.clone() else {
            self.notices.push(Notice::PropertyRequired);
            return RelationOutcome::Rejected;
        };
        self.commit_relation(src_id, dst_id, property)
    }

    fn commit_relation(
        &mut self,
        src_id: AnnotationId,
        dst_id: AnnotationId,
        property: OntoProperty,
    ) -> RelationOutcome {
        let relation = RelationGroup::new(vec![src_id], vec![dst_id], property);
        let id = relation.id;
        self.state = self.state.with_new_relation(relation);
        self.src = None;
        self.dst = None;
        self.mark_edited();
        RelationOutcome::Created(id)
    }

    // --- label and property editing -------------------------------------

    /// Re-tag an annotation; unknown ids are a no-op
    pub fn set_annotation_class(&mut self, id: AnnotationId, class: OntoClass) {
        let Some(annotation) = self.state.annotations().iter().find(|a| a.id == id).cloned()
        else {
            return;
        };
        let delta = AnnotationDelta {
            onto_class: Some(class),
            ..Default::default()
        };
        self.state = self.state.update_annotation(&annotation, &delta);
        self.mark_edited();
    }

    /// Class bound to a numeric hotkey; 1 is the first class
    pub fn class_for_digit(&self, digit: u8) -> Option<&OntoClass> {
        if !(1..=9).contains(&digit) {
            return None;
        }
        self.onto_classes.get(usize::from(digit) - 1)
    }

    /// Switch the active class via its numeric hotkey
    pub fn apply_class_hotkey(&mut self, digit: u8) {
        if let Some(class) = self.class_for_digit(digit).cloned() {
            self.active_class = Some(class);
        }
    }

    /// Re-type a relation; unknown ids are a no-op
    pub fn set_relation_property(&mut self, id: RelationId, property: OntoProperty) {
        let Some(relation) = self.state.relation_from_id(id).cloned() else {
            return;
        };
        let delta = RelationDelta {
            onto_property: Some(property),
        };
        self.state = self.state.update_relation(&relation, &delta);
        self.mark_edited();
    }

    // --- deletion and undo ----------------------------------------------

    /// Delete an annotation, clearing any relation slot that referenced it
    pub fn delete_annotation(&mut self, id: AnnotationId) {
        let Some(annotation) = self.state.annotations().iter().find(|a| a.id == id).cloned()
        else {
            return;
        };
        if self.src == Some(id) {
            self.src = None;
        }
        if self.dst == Some(id) {
            self.dst = None;
        }
        self.state = self.state.delete_annotation(&annotation);
        self.mark_edited();
    }

    pub fn delete_relation(&mut self, id: RelationId) {
        let Some(relation) = self.state.relation_from_id(id).cloned() else {
            return;
        };
        self.state = self.state.delete_relation(&relation);
        self.mark_edited();
    }

    /// Remove the most recently added annotation
    pub fn undo(&mut self) {
        if self.state.annotations().is_empty() {
            return;
        }
        if let Some(last) = self.state.annotations().last() {
            let last_id = last.id;
            if self.src == Some(last_id) {
                self.src = None;
            }
            if self.dst == Some(last_id) {
                self.dst = None;
            }
        }
        self.state = self.state.undo_annotation();
        self.mark_edited();
    }

    // --- mode toggles ---------------------------------------------------

    pub fn set_active_class(&mut self, class: OntoClass) {
        self.active_class = Some(class);
    }

    pub fn active_class(&self) -> Option<&OntoClass> {
        self.active_class.as_ref()
    }

    pub fn set_active_property(&mut self, property: OntoProperty) {
        self.active_property = Some(property);
    }

    pub fn active_property(&self) -> Option<&OntoProperty> {
        self.active_property.as_ref()
    }

    pub fn set_free_form(&mut self, free_form: bool) {
        self.free_form = free_form;
    }

    pub fn free_form(&self) -> bool {
        self.free_form
    }

    pub fn toggle_relation_mode(&mut self) {
        self.relation_mode = !self.relation_mode;
        if !self.relation_mode {
            self.src = None;
            self.dst = None;
        }
    }

    pub fn relation_mode(&self) -> bool {
        self.relation_mode
    }

    pub fn toggle_hide_labels(&mut self) {
        self.hide_labels = !self.hide_labels;
    }

    pub fn hide_labels(&self) -> bool {
        self.hide_labels
    }

    pub fn set_label_dialog_open(&mut self, open: bool) {
        self.label_dialog_open = open;
        if open {
            self.drag = None;
        }
    }

    pub fn can_annotate(&self) -> bool {
        self.can_annotate
    }

    // --- persistence ----------------------------------------------------

    /// Drive the debounced save; call from the host tick loop
    ///
    /// Saves only when the quiet period elapsed, there are unflushed edits,
    /// and the task is writable. The ledgers serialized here are the current
    /// ones, not a snapshot captured when the timer was armed. A failure is
    /// surfaced once and local state stays as-is; the next edit re-arms the
    /// timer, there is no automatic retry.
    pub fn poll_save(&mut self, now: Instant, gateway: &mut dyn AnnotationGateway) {
        if !self.scheduler.take_due(now) {
            return;
        }
        if !self.state.unsaved_changes() || !self.can_annotate {
            return;
        }
        match flush_annotations(gateway, &self.target, &self.state) {
            Ok(()) => self.state = self.state.saved(),
            Err(err) => {
                warn!(doc = %self.target.doc_id, error = %err, "annotation save failed");
                self.notices.push(Notice::SaveFailed(err.to_string()));
            }
        }
    }

    /// Best-effort flush for teardown; ignores the pending deadline
    pub fn flush(&mut self, gateway: &mut dyn AnnotationGateway) {
        self.scheduler.cancel();
        if !self.state.unsaved_changes() || !self.can_annotate {
            return;
        }
        match flush_annotations(gateway, &self.target, &self.state) {
            Ok(()) => self.state = self.state.saved(),
            Err(err) => {
                warn!(doc = %self.target.doc_id, error = %err, "final annotation flush failed");
            }
        }
    }

    pub fn has_pending_save(&self) -> bool {
        self.scheduler.is_armed()
    }

    /// Drain the queued user-facing events
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // --- read access ----------------------------------------------------

    pub fn state(&self) -> &PdfAnnotations {
        &self.state
    }

    pub fn annotations(&self) -> &[Annotation] {
        self.state.annotations()
    }

    pub fn relations(&self) -> &[RelationGroup] {
        self.state.relations()
    }

    pub fn relation_info(&self, relation: &RelationGroup) -> RelationInfo {
        self.state.relation_info(relation)
    }

    pub fn onto_classes(&self) -> &[OntoClass] {
        &self.onto_classes
    }

    pub fn onto_properties(&self) -> &[OntoProperty] {
        &self.onto_properties
    }
}
