use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ToolError {
    #[error("{}: {}", .1.display(), .0)]
    #[diagnostic(code(build_helpers::file))]
    FileError(std::io::Error, PathBuf),

    #[error("{1}: {0}")]
    #[diagnostic(code(build_helpers::process))]
    ProcessError(std::io::Error, String),

    #[error("{tool} not found. Put on path or define {env} env variable")]
    #[diagnostic(code(build_helpers::tool_not_found))]
    ToolNotFound { tool: String, env: &'static str },

    #[error("{0}")]
    #[diagnostic(code(build_helpers::usage))]
    Usage(String),

    #[error("invalid forwarding descriptor: {0}")]
    #[diagnostic(code(build_helpers::descriptor))]
    Descriptor(serde_json::Error),

    #[error("{}: {}", .1.display(), .0)]
    #[diagnostic(code(build_helpers::json))]
    Json(serde_json::Error, PathBuf),

    #[error("git failed for {}: {}", .1.display(), .0)]
    #[diagnostic(code(build_helpers::git))]
    GitError(String, PathBuf),

    #[error("{tool} failed with exit code {code}")]
    #[diagnostic(code(build_helpers::tool_failed))]
    ToolFailed { tool: String, code: i32 },
}

pub type ToolResult<T> = Result<T, ToolError>;

#[macro_export]
macro_rules! usage {
    ($($arg:tt)*) => {
        return Err($crate::ToolError::Usage(format!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_display_names_the_path() {
        let err = ToolError::FileError(
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            PathBuf::from("build/compile_commands.json"),
        );
        assert_eq!(err.to_string(), "build/compile_commands.json: gone");

        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ToolError::Json(json, PathBuf::from("CMakePresets.json"));
        assert!(err.to_string().starts_with("CMakePresets.json: EOF"));

        let err = ToolError::GitError("bad revision".into(), PathBuf::from("/src"));
        assert_eq!(err.to_string(), "git failed for /src: bad revision");

        let err = ToolError::ToolFailed {
            tool: "conan".into(),
            code: 2,
        };
        assert_eq!(err.to_string(), "conan failed with exit code 2");
    }
}
