//! Wire-format data model for the external parser's syntax trees.
//!
//! The parser prints one JSON object per run. A node is either a lexer token
//! (`symbol` + `value`), a rule (`symbol` + `branches`), a bare string the
//! parser emits for self-referential entries, or something malformed. The
//! shape is decided exactly once, at decode time; everything downstream
//! matches on the enum.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One node of the parser's AST.
///
/// Deserialized with untagged dispatch: a `value` field makes a token, a
/// `branches` field makes a rule. `Malformed` absorbs anything else so that
/// decoding a syntactically valid JSON document never fails; bad shapes are
/// rendered as invalid nodes, not dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SyntaxNode {
    Token {
        symbol: String,
        value: String,
    },
    Rule {
        symbol: String,
        branches: IndexMap<String, Branch>,
    },
    /// Placeholder the parser writes where a rule refers back to itself.
    SelfRef(String),
    Malformed(serde_json::Value),
}

/// One grammar alternative a rule node actually satisfied.
///
/// `reqs` is a human-readable label of what the branch required. `entries`
/// holds one inner sequence per requirement slot; a slot with more than one
/// sub-node is a repeated/list requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub reqs: String,
    pub entries: Vec<Vec<SyntaxNode>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_token() {
        let node: SyntaxNode = serde_json::from_str(r#"{"symbol":"NUMBER","value":"42"}"#).unwrap();
        assert_eq!(
            node,
            SyntaxNode::Token {
                symbol: "NUMBER".into(),
                value: "42".into()
            }
        );
    }

    #[test]
    fn test_decode_rule_preserves_branch_order() {
        let json = r#"{
            "symbol": "expr",
            "branches": {
                "9": {"reqs": "a", "entries": []},
                "2": {"reqs": "b", "entries": []},
                "5": {"reqs": "c", "entries": []}
            }
        }"#;
        let node: SyntaxNode = serde_json::from_str(json).unwrap();
        let SyntaxNode::Rule { branches, .. } = node else {
            panic!("expected rule node");
        };
        let keys: Vec<&str> = branches.keys().map(String::as_str).collect();
        assert_eq!(keys, ["9", "2", "5"]);
    }

    #[test]
    fn test_decode_self_reference() {
        let node: SyntaxNode = serde_json::from_str(r#""expr""#).unwrap();
        assert_eq!(node, SyntaxNode::SelfRef("expr".into()));
    }

    #[test]
    fn test_decode_malformed_shape() {
        let node: SyntaxNode = serde_json::from_str(r#"{"symbol":"x"}"#).unwrap();
        assert!(matches!(node, SyntaxNode::Malformed(_)));

        let node: SyntaxNode = serde_json::from_str("[1, 2]").unwrap();
        assert!(matches!(node, SyntaxNode::Malformed(_)));
    }

    #[test]
    fn test_decode_nested_entries() {
        let json = r#"{
            "symbol": "list",
            "branches": {
                "1": {
                    "reqs": "item+",
                    "entries": [[{"symbol":"ID","value":"a"}, "list"]]
                }
            }
        }"#;
        let node: SyntaxNode = serde_json::from_str(json).unwrap();
        let SyntaxNode::Rule { branches, .. } = node else {
            panic!("expected rule node");
        };
        let entries = &branches["1"].entries;
        assert_eq!(entries[0].len(), 2);
        assert_eq!(entries[0][1], SyntaxNode::SelfRef("list".into()));
    }
}
