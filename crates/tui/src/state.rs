#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Browsing the feed.
    Normal,
    /// Keys edit the selected card's draft.
    Editing,
    /// Typing the path of a photo to attach.
    AttachPath,
    /// Waiting for a yes/no answer to the delete confirmation.
    ConfirmDelete,
}

pub struct AppState {
    pub input_mode: InputMode,
    pub selected: usize,
    pub card_count: usize,
    pub path_buffer: String,
    /// Modal message; any key dismisses it.
    pub alert: Option<String>,
    pub status: Option<String>,
    pub viewer: Option<String>,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(card_count: usize, viewer: Option<String>) -> Self {
        Self {
            input_mode: InputMode::Normal,
            selected: 0,
            card_count,
            path_buffer: String::new(),
            alert: None,
            status: None,
            viewer,
            should_quit: false,
        }
    }

    pub fn select_next(&mut self) {
        if self.card_count > 0 && self.selected < self.card_count - 1 {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Keep the selection in range after cards were removed.
    pub fn set_card_count(&mut self, card_count: usize) {
        self.card_count = card_count;
        if self.selected >= card_count {
            self.selected = card_count.saturating_sub(1);
        }
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }
}
