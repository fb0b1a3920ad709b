use chrono::Duration;

/// The configuration of a session synchronizer
#[derive(Debug, Clone)]
pub struct Config {
    /// How long a like on a request blocks another like on the same request
    pub vote_window_in_hours: i64,
    /// How long a per-request like error stays visible
    pub like_error_display_in_millis: i64,
    /// The longest chat message accepted before submission, in characters
    pub max_message_length: usize,
}

impl Config {
    /// The vote window as a duration
    pub fn vote_window(&self) -> Duration {
        Duration::hours(self.vote_window_in_hours)
    }

    /// The like error display window as a duration
    pub fn like_error_display(&self) -> Duration {
        Duration::milliseconds(self.like_error_display_in_millis)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // A like blocks the same request for a day
            vote_window_in_hours: 24,
            // Long enough to read, short enough to not pile up
            like_error_display_in_millis: 3000,
            max_message_length: 300,
        }
    }
}
