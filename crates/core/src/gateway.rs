//! Persistence gateway
//!
//! Boundary between the in-memory ledgers and whatever stores them. The
//! trait is synchronous from the caller's point of view; implementations
//! own their transport. Payload types fix the wire shape independently of
//! the ledger types so the ledgers can grow fields without breaking the
//! stored format.

use crate::annotation::{Annotation, RelationGroup};
use crate::doc_annotations::DocAnnotations;
use crate::pdf_annotations::PdfAnnotations;
use crate::task_delta::{TaskAnnotation, TaskDeltaAnnotations, TaskRelationGroup};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a save or load failed
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("annotation store unreachable: {0}")]
    Unreachable(String),

    #[error("annotation store rejected the payload: {0}")]
    Rejected(String),

    #[error("failed to encode annotation payload")]
    Encoding(#[from] serde_json::Error),
}

/// Wire shape of the document commit ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocAnnotationsPayload {
    pub annotations: Vec<Annotation>,
    pub relations: Vec<RelationGroup>,
}

impl DocAnnotationsPayload {
    pub fn from_ledger(doc: &DocAnnotations) -> Self {
        Self {
            annotations: doc.annotations.clone(),
            relations: doc.relations.clone(),
        }
    }

    /// Rebuild a ledger from stored data; loaded state is always clean
    pub fn into_ledger(self) -> DocAnnotations {
        DocAnnotations::new(self.annotations, self.relations)
    }
}

/// Wire shape of the task delta ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDeltaPayload {
    pub annotations: Vec<TaskAnnotation>,
    pub relations: Vec<TaskRelationGroup>,
}

impl TaskDeltaPayload {
    pub fn from_ledger(task: &TaskDeltaAnnotations) -> Self {
        Self {
            annotations: task.annotations.clone(),
            relations: task.relations.clone(),
        }
    }

    pub fn into_ledger(self) -> TaskDeltaAnnotations {
        TaskDeltaAnnotations::new(self.annotations, self.relations)
    }
}

/// Which document and task a flush belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTarget {
    /// Content hash identifying the document
    pub doc_id: String,
    pub task_id: String,
}

/// Storage backend for a document's annotations and a task's delta
///
/// Both payloads are saved per flush; the backend is free to skip writes
/// for unchanged content.
pub trait AnnotationGateway {
    fn save_document(
        &mut self,
        doc_id: &str,
        payload: &DocAnnotationsPayload,
    ) -> Result<(), GatewayError>;

    fn save_task(
        &mut self,
        task_id: &str,
        payload: &TaskDeltaPayload,
    ) -> Result<(), GatewayError>;
}

/// Flush both ledgers through the gateway
///
/// The document commit is written first; if it fails the task delta is not
/// attempted, so the store never holds a delta ahead of its commit.
pub fn flush_annotations(
    gateway: &mut dyn AnnotationGateway,
    target: &SaveTarget,
    state: &PdfAnnotations,
) -> Result<(), GatewayError> {
    gateway.save_document(&target.doc_id, &DocAnnotationsPayload::from_ledger(&state.doc))?;
    gateway.save_task(&target.task_id, &TaskDeltaPayload::from_ledger(&state.task))?;
    Ok(())
}
