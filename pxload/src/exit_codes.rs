#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// Invalid flags, prompts or configuration (bad concurrency, duration, URL or proxy).
    /// No request has been issued.
    InvalidInput = 30,

    /// Internal/runtime error (TLS setup, task failures, output errors).
    RuntimeError = 40,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
