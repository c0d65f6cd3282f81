use std::fmt;

/// Boxed error used at capability seams (handlers, dead-letter sinks, binaries).
pub type SendableError = Box<dyn std::error::Error + Send + Sync>;

/// Error tagged with a dotted code such as `worker.store.invalid_endpoint`.
#[derive(Debug)]
pub struct RuntimeError {
    code: String,
    message: String,
}

impl RuntimeError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn boxed(code: impl Into<String>, message: impl Into<String>) -> SendableError {
        Box::new(Self::new(code, message))
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for RuntimeError {}
