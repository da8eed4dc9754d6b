//! Exit codes for the archsmith CLI
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | Internal error |
//! | 2 | Invalid arguments or configuration |
//! | 3 | Input rejected (document or requirement) |
//! | 4 | No usable generation context |
//! | 10 | Model call timed out |
//! | 70 | Model service failure |
//!
//! Use [`ArchsmithError::to_exit_code()`](crate::ArchsmithError::to_exit_code) to map errors.

/// Process exit code returned by the `archsmith` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - operation completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments or configuration values
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Input rejected - a document or requirement failed validation
    pub const INPUT_REJECTED: ExitCode = ExitCode(3);

    /// Context unavailable - no requirements, or requirements exceed the budget
    pub const CONTEXT_UNAVAILABLE: ExitCode = ExitCode(4);

    /// Generation timeout - a model call exceeded its timeout
    pub const GENERATION_TIMEOUT: ExitCode = ExitCode(10);

    /// LLM failure - the model service rejected or failed the call
    pub const LLM_FAILURE: ExitCode = ExitCode(70);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        // Exit statuses are truncated to a byte by every supported platform.
        std::process::ExitCode::from((code.0 & 0xff) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let codes = [
            ExitCode::SUCCESS,
            ExitCode::INTERNAL,
            ExitCode::CLI_ARGS,
            ExitCode::INPUT_REJECTED,
            ExitCode::CONTEXT_UNAVAILABLE,
            ExitCode::GENERATION_TIMEOUT,
            ExitCode::LLM_FAILURE,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(i32::from(ExitCode::LLM_FAILURE), 70);
    }
}
