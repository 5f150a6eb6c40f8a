//! History view over the session store

pub mod sidebar;
pub mod view;

pub use sidebar::{Sidebar, SidebarState};
pub use view::{HistoryView, SelectOutcome};
