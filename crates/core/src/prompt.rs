/// Blocking user interactions a card may need while handling an action.
///
/// `confirm` gates destructive actions; `alert` is the one user-facing error
/// channel (photo size rejection). Hosts decide how these are presented.
pub trait Prompt {
    fn confirm(&self, message: &str) -> bool;

    fn alert(&self, message: &str);
}
