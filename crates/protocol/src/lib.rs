//! PDF Annotator Protocol Library
//!
//! Interactive selection and relation-building protocol: the controller
//! that turns pointer and keyboard input into ledger edits and debounced
//! saves.

pub mod controller;
pub mod notice;

pub use controller::{AnnotationController, DragState, RelationOutcome};
pub use notice::Notice;
