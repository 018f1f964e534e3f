//! Syntax-tree to display-tree transformation.
//!
//! Maps the parser's AST into the render-ready tree the viewer draws. Rule
//! nodes with a single branch inline their children directly; rules with two
//! or more branches get one synthetic child per branch so ambiguous parses
//! stay visually separated. Tags carry the requirement label and the 1-based
//! slot position so hover tooltips can show exactly which requirement
//! produced each child.

use serde::Serialize;

use crate::syntax::{Branch, SyntaxNode};

/// Display role of a node, used by the viewer stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Terminal token value.
    Value,
    /// Synthetic node for one alternative of an ambiguous rule.
    Branch,
    /// Rule node whose children are alternative branches.
    Branching,
    /// Failed rule, self-reference, or malformed input.
    Invalid,
    /// Reserved for other synthetic markers.
    Special,
}

/// Render-ready tree node. Built fresh on every transform pass; owns all of
/// its data, nothing is shared with the source AST.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayNode {
    pub label: String,
    pub tag: String,
    /// `None` means default styling (an ordinary rule node).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DisplayNode>,
}

impl DisplayNode {
    fn leaf(label: impl Into<String>, tag: impl Into<String>, kind: Option<NodeKind>) -> Self {
        DisplayNode {
            label: label.into(),
            tag: tag.into(),
            kind,
            children: Vec::new(),
        }
    }
}

/// Transform one syntax node into a display node.
///
/// Total over all enum variants and never panics; malformed input becomes an
/// `invalid` leaf. A caller-supplied `tag` always wins over any default the
/// node itself would choose, so a parent can label a child with positional
/// context.
pub fn transform(node: &SyntaxNode, tag: Option<&str>) -> DisplayNode {
    match node {
        SyntaxNode::Token { symbol, value } => DisplayNode::leaf(
            quoted_literal(value),
            tag.unwrap_or(symbol),
            Some(NodeKind::Value),
        ),
        SyntaxNode::Rule { symbol, branches } => match branches.len() {
            // A rule that satisfied no branch failed to parse.
            0 => DisplayNode::leaf(symbol, tag.unwrap_or(""), Some(NodeKind::Invalid)),
            1 => {
                let (key, branch) = branches.iter().next().unwrap();
                DisplayNode {
                    label: symbol.clone(),
                    tag: format!("{}\t\u{3008}{key}\u{3009}", tag.unwrap_or(&branch.reqs)),
                    kind: None,
                    children: flatten_entries(branch),
                }
            }
            _ => DisplayNode {
                label: symbol.clone(),
                tag: tag.unwrap_or("").to_string(),
                kind: Some(NodeKind::Branching),
                children: branches
                    .iter()
                    .map(|(key, branch)| DisplayNode {
                        label: key.clone(),
                        tag: branch.reqs.clone(),
                        kind: Some(NodeKind::Branch),
                        children: flatten_entries(branch),
                    })
                    .collect(),
            },
        },
        SyntaxNode::SelfRef(_) => DisplayNode::leaf("self", "", Some(NodeKind::Invalid)),
        SyntaxNode::Malformed(_) => DisplayNode::leaf("?", "", Some(NodeKind::Invalid)),
    }
}

/// Flatten a branch's requirement slots into display children.
///
/// Slot positions are 1-based; a slot holding more than one sub-node tags
/// each with a compound `slot.sub` position marker.
fn flatten_entries(branch: &Branch) -> Vec<DisplayNode> {
    let mut children = Vec::new();

    for (slot, entry) in branch.entries.iter().enumerate() {
        let base = (slot + 1).to_string();

        for (sub, node) in entry.iter().enumerate() {
            let position = if entry.len() > 1 {
                format!("{base}.{}", sub + 1)
            } else {
                base.clone()
            };
            let tag = format!("\u{3008}{position}\u{3009}\t{}", branch.reqs);
            children.push(transform(node, Some(&tag)));
        }
    }

    children
}

/// Token labels are shown with JSON string escaping but without the wrapping
/// quotes, so a literal newline renders as `\n`.
fn quoted_literal(value: &str) -> String {
    match serde_json::to_string(value) {
        Ok(quoted) => quoted[1..quoted.len() - 1].to_string(),
        Err(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxNode;

    fn rule(json: &str) -> SyntaxNode {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_token_node() {
        let node = rule(r#"{"symbol":"NUMBER","value":"42"}"#);
        let display = transform(&node, None);
        assert_eq!(display.label, "42");
        assert_eq!(display.tag, "NUMBER");
        assert_eq!(display.kind, Some(NodeKind::Value));
        assert!(display.children.is_empty());
    }

    #[test]
    fn test_token_label_escapes_control_characters() {
        let node = rule(r#"{"symbol":"STRING","value":"a\nb"}"#);
        let display = transform(&node, None);
        assert_eq!(display.label, "a\\nb");
    }

    #[test]
    fn test_caller_tag_wins() {
        let node = rule(r#"{"symbol":"NUMBER","value":"42"}"#);
        let display = transform(&node, Some("\u{3008}1\u{3009}\tnumber"));
        assert_eq!(display.tag, "\u{3008}1\u{3009}\tnumber");
    }

    #[test]
    fn test_rule_without_branches_is_invalid() {
        let node = rule(r#"{"symbol":"expr","branches":{}}"#);
        let display = transform(&node, None);
        assert_eq!(display.label, "expr");
        assert_eq!(display.tag, "");
        assert_eq!(display.kind, Some(NodeKind::Invalid));
        assert!(display.children.is_empty());
    }

    #[test]
    fn test_single_branch_inlines_children() {
        let node = rule(
            r#"{
                "symbol": "pair",
                "branches": {
                    "3": {
                        "reqs": "key value",
                        "entries": [
                            [{"symbol":"ID","value":"k"}],
                            [{"symbol":"ID","value":"v"}]
                        ]
                    }
                }
            }"#,
        );
        let display = transform(&node, None);
        assert_eq!(display.label, "pair");
        assert_eq!(display.tag, "key value\t\u{3008}3\u{3009}");
        assert_eq!(display.kind, None);
        // Children come straight from the branch, no wrapper node.
        assert_eq!(display.children.len(), 2);
        assert_eq!(display.children[0].tag, "\u{3008}1\u{3009}\tkey value");
        assert_eq!(display.children[1].tag, "\u{3008}2\u{3009}\tkey value");
    }

    #[test]
    fn test_multiple_branches_get_wrappers_in_key_order() {
        let node = rule(
            r#"{
                "symbol": "expr",
                "branches": {
                    "7": {"reqs": "sum", "entries": [[{"symbol":"N","value":"1"}]]},
                    "2": {"reqs": "product", "entries": [[{"symbol":"N","value":"2"}]]}
                }
            }"#,
        );
        let display = transform(&node, None);
        assert_eq!(display.kind, Some(NodeKind::Branching));
        assert_eq!(display.children.len(), 2);

        let first = &display.children[0];
        assert_eq!(first.label, "7");
        assert_eq!(first.tag, "sum");
        assert_eq!(first.kind, Some(NodeKind::Branch));
        assert_eq!(first.children.len(), 1);

        let second = &display.children[1];
        assert_eq!(second.label, "2");
        assert_eq!(second.tag, "product");
    }

    #[test]
    fn test_repeated_slot_uses_compound_positions() {
        let node = rule(
            r#"{
                "symbol": "list",
                "branches": {
                    "1": {
                        "reqs": "item+",
                        "entries": [[
                            {"symbol":"ID","value":"a"},
                            {"symbol":"ID","value":"b"}
                        ]]
                    }
                }
            }"#,
        );
        let display = transform(&node, None);
        assert_eq!(display.children.len(), 2);
        assert_eq!(display.children[0].tag, "\u{3008}1.1\u{3009}\titem+");
        assert_eq!(display.children[1].tag, "\u{3008}1.2\u{3009}\titem+");
    }

    #[test]
    fn test_self_reference_and_malformed_render_invalid() {
        let display = transform(&SyntaxNode::SelfRef("expr".into()), None);
        assert_eq!(display.label, "self");
        assert_eq!(display.kind, Some(NodeKind::Invalid));

        let display = transform(&rule("[1,2]"), None);
        assert_eq!(display.label, "?");
        assert_eq!(display.kind, Some(NodeKind::Invalid));
    }

    #[test]
    fn test_transform_is_pure() {
        let node = rule(
            r#"{
                "symbol": "expr",
                "branches": {
                    "1": {"reqs": "n", "entries": [[{"symbol":"N","value":"1"}, "expr"]]},
                    "2": {"reqs": "m", "entries": []}
                }
            }"#,
        );
        assert_eq!(transform(&node, None), transform(&node, None));
    }
}
