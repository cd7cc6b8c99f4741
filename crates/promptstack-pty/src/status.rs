//! Child exit status.

use std::fmt;

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The process exited normally with the given code.
    Exited(i32),

    /// The process was terminated by a signal.
    Signaled(i32),
}

impl ExitStatus {
    /// Check if the process exited with code 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }

    /// The exit code, if the process exited normally.
    #[must_use]
    pub const fn code(&self) -> Option<i32> {
        match self {
            Self::Exited(code) => Some(*code),
            Self::Signaled(_) => None,
        }
    }

    /// The terminating signal, if any.
    #[must_use]
    pub const fn signal(&self) -> Option<i32> {
        match self {
            Self::Signaled(sig) => Some(*sig),
            Self::Exited(_) => None,
        }
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::Signaled(signal);
            }
        }
        Self::Exited(status.code().unwrap_or(-1))
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exited with code {code}"),
            Self::Signaled(sig) => write!(f, "terminated by signal {sig}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exited_codes() {
        assert!(ExitStatus::Exited(0).success());
        assert_eq!(ExitStatus::Exited(3).code(), Some(3));
        assert!(!ExitStatus::Exited(3).success());
    }

    #[test]
    fn signaled_has_no_code() {
        let status = ExitStatus::Signaled(9);
        assert!(!status.success());
        assert_eq!(status.code(), None);
        assert_eq!(status.signal(), Some(9));
        assert_eq!(status.to_string(), "terminated by signal 9");
    }
}
