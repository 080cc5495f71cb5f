//! Version 2 dex file parser.

use super::{Document, DEFAULT_SHELL, DEFAULT_SHELL_ARGS, SUPPORTED_VERSION};
use crate::error::{DexError, DexResult};

/// Decode a version 2 dex file and fill in document defaults.
pub fn parse_config(content: &str) -> DexResult<Document> {
    let mut document: Document = serde_yaml::from_str(content)?;

    if document.version != SUPPORTED_VERSION {
        return Err(DexError::UnsupportedVersion(document.version));
    }

    if document.shell.is_empty() {
        document.shell = DEFAULT_SHELL.to_string();
    }
    if document.shell_args.is_empty() {
        document.shell_args = DEFAULT_SHELL_ARGS.iter().map(ToString::to_string).collect();
    }

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::v2::Block;

    #[test]
    fn test_parse_applies_defaults() {
        let yaml = r"---
version: 2
blocks:
  - name: hello
    desc: this is a command description";

        let document = parse_config(yaml).unwrap();

        assert_eq!(document.version, 2);
        assert_eq!(document.shell, "/bin/bash");
        assert_eq!(document.shell_args, vec!["-c"]);
        assert_eq!(
            document.blocks,
            vec![Block {
                name: "hello".to_string(),
                desc: "this is a command description".to_string(),
                ..Block::default()
            }]
        );
    }

    #[test]
    fn test_parse_keeps_document_shell() {
        let yaml = r"
version: 2
shell: /bin/zsh
blocks: []
";

        let document = parse_config(yaml).unwrap();
        assert_eq!(document.shell, "/bin/zsh");
        assert_eq!(document.shell_args, vec!["-c"]);
    }

    #[test]
    fn test_wrong_version_fails() {
        for yaml in ["version: 1\nblocks: []\n", "version: 3\n", "blocks: []\n"] {
            let err = parse_config(yaml).unwrap_err();
            assert!(matches!(err, DexError::UnsupportedVersion(_)), "{yaml}: {err}");
        }
    }

    #[test]
    fn test_malformed_yaml_fails() {
        let err = parse_config("version: 2\nblocks: {").unwrap_err();
        assert!(matches!(err, DexError::Parse(_)));
    }
}
