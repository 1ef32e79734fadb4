//! Approximate compile database lookup.
//!
//! Only the lines mentioning the source's file name are kept. Parsing the
//! whole JSON document for every translation unit is too slow on large
//! databases, and an occasional false positive only widens the cache key.

use std::path::Path;

use crate::{ToolResult, file};

/// Returns the lines of `database` mentioning the file name of `source`,
/// line endings included, in original order.
pub fn filter(database: &Path, source: &Path) -> ToolResult<String> {
    let text = file::read_to_string(database)?;
    let name = source
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    Ok(filter_lines(&text, &name))
}

pub fn filter_lines(text: &str, name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    text.split_inclusive('\n')
        .filter(|line| line.contains(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::test;

    use super::*;

    const DATABASE: &str = r#"[
{"directory": "/b", "command": "c++ -c a.cpp", "file": "a.cpp"},
{"directory": "/b", "command": "c++ -c b.cpp", "file": "b.cpp"},
{"directory": "/b", "command": "c++ -c sub/a.cpp", "file": "sub/a.cpp"}
]
"#;

    #[test]
    fn test_keeps_matching_lines_in_order() {
        assert_eq!(
            filter_lines(DATABASE, "a.cpp"),
            concat!(
                "{\"directory\": \"/b\", \"command\": \"c++ -c a.cpp\", \"file\": \"a.cpp\"},\n",
                "{\"directory\": \"/b\", \"command\": \"c++ -c sub/a.cpp\", \"file\": \"sub/a.cpp\"}\n",
            )
        );
    }

    #[test]
    fn test_absent_name_yields_nothing() {
        assert_eq!(filter_lines(DATABASE, "c.cpp"), "");
        assert_eq!(filter_lines(DATABASE, ""), "");
    }

    #[test]
    fn test_filter_uses_file_name_only() {
        let tmpdir = test::tempdir();
        let db = tmpdir.path().join("compile_commands.json");
        std::fs::write(&db, DATABASE).unwrap();
        let subset = filter(&db, Path::new("/somewhere/else/b.cpp")).unwrap();
        assert_eq!(
            subset,
            "{\"directory\": \"/b\", \"command\": \"c++ -c b.cpp\", \"file\": \"b.cpp\"},\n"
        );
    }
}
