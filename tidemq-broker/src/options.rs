use std::time::Duration;

pub const DEFAULT_MAX_IDLE: usize = 20;
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_ACTIVE: usize = 100;

/// Connection settings for remote store adapters.
///
/// `max_active` of zero means unlimited concurrent requests. When the limit is
/// reached, `wait` decides between queueing for a free slot and failing fast
/// with [`StoreError::PoolExhausted`](crate::StoreError::PoolExhausted).
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub max_idle: usize,
    pub idle_timeout: Duration,
    pub max_active: usize,
    pub wait: bool,
    pub password: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            max_idle: DEFAULT_MAX_IDLE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_active: DEFAULT_MAX_ACTIVE,
            wait: false,
            password: None,
        }
    }
}

impl ClientOptions {
    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn with_max_active(mut self, max_active: usize) -> Self {
        self.max_active = max_active;
        self
    }

    pub fn with_wait_mode(mut self) -> Self {
        self.wait = true;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Replace unusable values with their defaults.
    pub fn repaired(mut self) -> Self {
        if self.idle_timeout.is_zero() {
            self.idle_timeout = DEFAULT_IDLE_TIMEOUT;
        }
        if self.password.as_deref().is_some_and(str::is_empty) {
            self.password = None;
        }
        self
    }
}
