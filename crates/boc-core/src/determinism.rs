use chrono::{DateTime, Duration, Utc};

/// A clock that can be frozen and advanced manually for deterministic time.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    frozen_time: Option<DateTime<Utc>>,
}

impl Clock {
    pub fn new() -> Self {
        Self { frozen_time: None }
    }

    /// A clock already frozen at `time`.
    pub fn frozen_at(time: DateTime<Utc>) -> Self {
        Self {
            frozen_time: Some(time),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.frozen_time.unwrap_or_else(Utc::now)
    }

    pub fn freeze(&mut self, time: DateTime<Utc>) {
        self.frozen_time = Some(time);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen_time.is_some()
    }

    pub fn advance(&mut self, duration: Duration) {
        if let Some(time) = &mut self.frozen_time {
            *time += duration;
        }
    }
}
