//! One Run: push the program to the interpreter, pull back its result.

use log::debug;

use crate::gateway::{GatewayError, RemoteExecution};

/// Separator the interpreter uses between result elements.
pub const RESULT_DELIMITER: char = ',';

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Reply exactly as the interpreter returned it.
    pub raw: String,
    /// Display form, one element per line.
    pub output: String,
}

impl ExecutionResult {
    pub fn from_raw(raw: String) -> Self {
        let output = format_result(&raw);
        Self { raw, output }
    }
}

/// Every delimiter becomes a line break. Literal commas inside an element are
/// indistinguishable from separators and are split too.
pub fn format_result(raw: &str) -> String {
    raw.replace(RESULT_DELIMITER, "\n")
}

/// Program text as the interpreter expects it: always newline-terminated,
/// since its lexer scans comments up to the next line break.
pub fn program_text(buffer: &str) -> String {
    let mut program = buffer.to_string();
    if !program.ends_with('\n') {
        program.push('\n');
    }
    program
}

pub async fn execute<R: RemoteExecution>(
    remote: &mut R,
    program: &str,
) -> Result<ExecutionResult, GatewayError> {
    remote.submit(program).await?;
    let raw = remote.fetch_result().await?;
    debug!("run returned {} bytes", raw.len());
    Ok(ExecutionResult::from_raw(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_result_splits_on_commas() {
        assert_eq!(format_result("1,2,3"), "1\n2\n3");
    }

    #[test]
    fn test_format_result_without_commas_unchanged() {
        assert_eq!(format_result("42"), "42");
        assert_eq!(format_result(""), "");
    }

    #[test]
    fn test_program_text_is_newline_terminated() {
        assert_eq!(program_text("VAR a = 1 # set a"), "VAR a = 1 # set a\n");
        assert_eq!(program_text("PRINT(1)\n"), "PRINT(1)\n");
        assert_eq!(program_text(""), "\n");
    }

    #[test]
    fn test_format_result_is_lossy_for_literal_commas() {
        // "a,b" as a single element cannot be told apart from two elements.
        assert_eq!(format_result("\"a,b\",c"), "\"a\nb\"\nc");
        assert_eq!(format_result(",,"), "\n\n");
    }
}
