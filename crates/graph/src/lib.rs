//! Campaign event graph — translates the designer's canvas document into an
//! executable event forest, detecting orphaned nodes and producing an
//! explicit changeset against the stored graph.

pub mod diff;
pub mod reconcile;
pub mod types;

pub use diff::{diff_events, Changed, Diff};
pub use reconcile::{reconcile, ReconcileContext, Reconciliation};
