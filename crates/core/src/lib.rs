pub mod config;
pub mod domain;
pub mod errors;

pub use domain::action::{Action, ActionTag, SearchResult};
pub use domain::catalog::{format_ether, CatalogEntry, CatalogSnapshot, Category, EntryId};
pub use domain::conversation::{ConversationMessage, Role};
pub use domain::turn::{TokenUsage, TurnResult};
pub use errors::{InterfaceError, TurnError};
