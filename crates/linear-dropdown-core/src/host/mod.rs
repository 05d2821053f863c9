//! Contract between a lookup trigger and the automation host invoking it.

mod context;
mod cursor;
mod error;
mod trigger;

pub use context::{InputData, Meta, RequestContext};
pub use cursor::{CursorError, CursorStore, FileCursorStore, MemoryCursorStore};
pub use error::TriggerError;
pub use trigger::{TriggerDefinition, TriggerDisplay};
