use std::cell::RefCell;

use chirp_core::Prompt;

/// Prompt backed by the terminal's modal dialogs.
///
/// A confirmation has already been answered in the modal by the time the card
/// asks, so it replays that answer. Alerts are queued for the next frame.
#[derive(Debug, Default)]
pub struct ModalPrompt {
    answer: bool,
    alerts: RefCell<Vec<String>>,
}

impl ModalPrompt {
    pub fn answered(answer: bool) -> Self {
        Self {
            answer,
            alerts: RefCell::new(Vec::new()),
        }
    }

    pub fn take_alert(&self) -> Option<String> {
        let alerts = self.alerts.take();
        if alerts.is_empty() {
            None
        } else {
            Some(alerts.join("\n"))
        }
    }
}

impl Prompt for ModalPrompt {
    fn confirm(&self, message: &str) -> bool {
        tracing::debug!(message, answer = self.answer, "confirmation replayed");
        self.answer
    }

    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }
}
