//! PDF Annotator Core Library
//!
//! Annotation data model for the PDF annotator: ontology tags, page
//! geometry, the document-commit and task-delta ledgers, and the
//! persistence boundary that flushes them.

pub mod annotation;
pub mod doc_annotations;
pub mod gateway;
pub mod geometry;
pub mod ontology;
pub mod page;
pub mod pdf_annotations;
pub mod save;
pub mod task_delta;

pub use annotation::{
    Annotation, AnnotationDelta, AnnotationId, RelationDelta, RelationGroup, RelationId,
    RelationInfo, TokenId,
};
pub use doc_annotations::DocAnnotations;
pub use gateway::{
    flush_annotations, AnnotationGateway, DocAnnotationsPayload, GatewayError, SaveTarget,
    TaskDeltaPayload,
};
pub use geometry::Bounds;
pub use ontology::{compatible_properties, OntoClass, OntoProperty};
pub use page::{Page, PageInfo, PageTokens, Token};
pub use pdf_annotations::PdfAnnotations;
pub use save::{SaveScheduler, DEFAULT_QUIET_PERIOD};
pub use task_delta::{TaskAnnotation, TaskDeltaAnnotations, TaskRelationGroup, TaskStatus};
