/// Summary information produced when a composer session exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppExitInfo {
    /// How many messages were handed to the send callback.
    pub messages_sent: usize,
    /// Why the session ended.
    pub exit_reason: ExitReason,
}

/// Reason why the composer session terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// The user pressed the quit shortcut (Ctrl+C twice, or Ctrl+D on an empty draft).
    UserRequested,
    /// The terminal input stream ended.
    InputClosed,
}
