//! Bounded undo/redo over single-shape operations.
//!
//! Operations store the delta needed to invert themselves, never a snapshot
//! of prior state. Undoing a move subtracts the recorded delta from whatever
//! position the shape has now, so a shape that was also changed by some other
//! path (scene load, direct field edits) does not return to its pre-move pose.

mod op;
mod stack;

pub use op::Operation;
pub use stack::{HistoryConfig, UndoRedoStack, DEFAULT_HISTORY_CAPACITY};
