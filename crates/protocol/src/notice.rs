//! User-facing events emitted by the controller
//!
//! The controller never talks to the view layer directly; it queues
//! notices and the view drains them after each interaction. Every notice
//! is advisory and carries no state the view must act on.

/// Something the user should be told about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// An annotation was clicked for relation building outside relation mode
    RelationModeRequired,

    /// A drag finished with no active class to tag the annotation with
    ClassRequired,

    /// Relation creation needs a source and a target selected
    RelationNeedsTwo,

    /// Relation creation needs an active relation property
    PropertyRequired,

    /// Both relation slots are taken; deselect one first
    SelectionFull,

    /// A background save failed; local edits are kept
    SaveFailed(String),
}
