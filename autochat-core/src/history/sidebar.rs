//! Sidebar visibility

/// Whether the history sidebar is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SidebarState {
    #[default]
    Collapsed,
    Expanded,
}

/// Two-state sidebar, collapsed at start
#[derive(Debug, Clone, Copy, Default)]
pub struct Sidebar {
    state: SidebarState,
}

impl Sidebar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the state and return the new one
    pub fn toggle(&mut self) -> SidebarState {
        self.state = match self.state {
            SidebarState::Collapsed => SidebarState::Expanded,
            SidebarState::Expanded => SidebarState::Collapsed,
        };
        self.state
    }

    pub fn state(&self) -> SidebarState {
        self.state
    }

    pub fn is_expanded(&self) -> bool {
        self.state == SidebarState::Expanded
    }
}
