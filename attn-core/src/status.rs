use serde::{Deserialize, Serialize};

/// Lifecycle of one test administration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
    Stopped,
}

impl SessionStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, SessionStatus::Running)
    }

    /// A fresh `start()` is honoured from any state but `Running`.
    pub fn can_start(&self) -> bool {
        !self.is_running()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, SessionStatus::Stopped)
    }
}
