use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ToolError, ToolResult};

/// The clang-tidy invocation carried from dispatch into replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardingDescriptor {
    #[serde(rename = "src")]
    pub source: PathBuf,
    /// Stamp file ccache expects as the object output.
    #[serde(rename = "obj")]
    pub object: PathBuf,
    #[serde(rename = "db", default, skip_serializing_if = "Option::is_none")]
    pub compile_db: Option<PathBuf>,
    #[serde(rename = "args")]
    pub tool_args: Vec<String>,
}

/// Versioned wire form; the tag keeps foreign values of the channel
/// variable from being taken for ours.
#[derive(Serialize, Deserialize)]
#[serde(tag = "format")]
enum Envelope {
    #[serde(rename = "cache-tidy/v1")]
    V1(ForwardingDescriptor),
}

impl ForwardingDescriptor {
    pub fn encode(&self) -> ToolResult<String> {
        serde_json::to_string(&Envelope::V1(self.clone())).map_err(ToolError::Descriptor)
    }

    pub fn decode(raw: &str) -> ToolResult<Self> {
        match serde_json::from_str(raw).map_err(ToolError::Descriptor)? {
            Envelope::V1(descriptor) => Ok(descriptor),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn descriptor(args: &[&str]) -> ForwardingDescriptor {
        ForwardingDescriptor {
            source: PathBuf::from("src/with space/main.cpp"),
            object: PathBuf::from("build/main.cache-tidy"),
            compile_db: Some(PathBuf::from("build/compile_commands.json")),
            tool_args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_wire_format() {
        let encoded = descriptor(&["-p", "build"]).encode().unwrap();
        insta::assert_snapshot!(encoded, @r#"{"format":"cache-tidy/v1","src":"src/with space/main.cpp","obj":"build/main.cache-tidy","db":"build/compile_commands.json","args":["-p","build"]}"#);
    }

    #[test]
    fn test_special_characters_survive() {
        let original = descriptor(&[
            "--checks=-*,bugprone-*",
            "-extra-arg=-DNAME=\"quoted value\"",
            "it's",
            "back\\slash",
            "tab\there",
            "line\nbreak",
            "",
            "ünïcödé",
        ]);
        let decoded = ForwardingDescriptor::decode(&original.encode().unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_without_compile_db() {
        let original = ForwardingDescriptor {
            compile_db: None,
            ..descriptor(&[])
        };
        let encoded = original.encode().unwrap();
        assert!(!encoded.contains("\"db\""));
        assert_eq!(ForwardingDescriptor::decode(&encoded).unwrap(), original);
    }

    #[test]
    fn test_foreign_values_are_rejected() {
        for raw in [
            "",
            "1",
            r#"{"src":"a.cpp","obj":"a.o","args":[]}"#,
            r#"{"format":"cache-tidy/v0","src":"a.cpp","obj":"a.o","args":[]}"#,
        ] {
            let err = ForwardingDescriptor::decode(raw).unwrap_err();
            assert!(matches!(err, ToolError::Descriptor(_)), "{raw}");
        }
    }
}
