//! Raw parse trees produced by grammar engines
//!
//! A tree is opaque to everything except the statement builder. Standard
//! grammars hand over a `sqlparser` statement; keyword grammars hand over a
//! named rule with labelled children.

use sqlparser::ast;

/// Rule names emitted by the keyword grammars
pub mod rules {
    pub const LOAD_XML: &str = "loadXml";
    pub const DENY: &str = "deny";
    pub const SHOW_STORAGE_UNITS: &str = "showStorageUnits";
    pub const UNREGISTER_STORAGE_UNIT: &str = "unregisterStorageUnit";
    pub const CREATE_READWRITE_SPLITTING_RULE: &str = "createReadwriteSplittingRule";
    pub const READWRITE_SPLITTING_RULE_DEFINITION: &str = "readwriteSplittingRuleDefinition";
    pub const DROP_READWRITE_SPLITTING_RULE: &str = "dropReadwriteSplittingRule";
    pub const SHOW_READWRITE_SPLITTING_RULES: &str = "showReadwriteSplittingRules";
}

/// Result of a successful grammar engine run
#[derive(Debug, Clone, PartialEq)]
pub struct ParseTree {
    root: ParseNode,

    /// Accepted only as a catch-all; other grammars get the first chance
    provisional: bool,
}

impl ParseTree {
    pub fn new(root: ParseNode) -> Self {
        Self {
            root,
            provisional: false,
        }
    }

    /// A tree to use only when no other grammar accepts the text
    pub fn provisional(root: ParseNode) -> Self {
        Self {
            root,
            provisional: true,
        }
    }

    pub fn is_provisional(&self) -> bool {
        self.provisional
    }

    pub fn root(&self) -> &ParseNode {
        &self.root
    }

    pub fn into_root(self) -> ParseNode {
        self.root
    }

    /// Check if the root is the error marker
    pub fn is_error(&self) -> bool {
        matches!(self.root, ParseNode::Error(_))
    }
}

/// Root node of a parse tree
#[derive(Debug, Clone, PartialEq)]
pub enum ParseNode {
    /// Statement produced by a `sqlparser` dialect
    Standard(StandardNode),

    /// Rule produced by a keyword grammar
    Rule(RuleNode),

    /// A grammar recovered into an invalid node instead of failing
    Error(ErrorNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandardNode {
    pub statement: Box<ast::Statement>,

    /// Trailing `OPTION (...)` hints removed before parsing
    pub query_hints: Vec<String>,
}

impl StandardNode {
    pub fn new(statement: ast::Statement) -> Self {
        Self {
            statement: Box::new(statement),
            query_hints: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNode {
    /// Text the grammar could not make sense of
    pub text: String,
}

/// Value of a labelled child
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeValue {
    Keyword(String),

    /// Possibly qualified name, one entry per dot-separated part
    Identifier(Vec<String>),

    /// String literal with quotes removed
    Literal(String),

    Number(String),

    Rule(RuleNode),
}

impl NodeValue {
    pub fn as_identifier(&self) -> Option<&[String]> {
        match self {
            Self::Identifier(parts) => Some(parts.as_slice()),
            _ => None,
        }
    }

    /// Text of a keyword, literal, number, or unqualified identifier
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Keyword(text) | Self::Literal(text) | Self::Number(text) => Some(text.as_str()),
            Self::Identifier(parts) if parts.len() == 1 => Some(parts[0].as_str()),
            _ => None,
        }
    }

    pub fn as_rule(&self) -> Option<&RuleNode> {
        match self {
            Self::Rule(node) => Some(node),
            _ => None,
        }
    }
}

/// A grammar rule match with labelled children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleNode {
    rule: String,
    children: Vec<(String, NodeValue)>,
}

impl RuleNode {
    pub fn new(rule: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            children: Vec::new(),
        }
    }

    /// Append a child (labels may repeat for lists)
    pub fn push(&mut self, label: impl Into<String>, value: NodeValue) {
        self.children.push((label.into(), value));
    }

    pub fn with_child(mut self, label: impl Into<String>, value: NodeValue) -> Self {
        self.push(label, value);
        self
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// First child with the label
    pub fn child(&self, label: &str) -> Option<&NodeValue> {
        self.children
            .iter()
            .find(|(each, _)| each == label)
            .map(|(_, value)| value)
    }

    /// All children with the label, in order
    pub fn children<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a NodeValue> + 'a {
        self.children
            .iter()
            .filter(move |(each, _)| each == label)
            .map(|(_, value)| value)
    }

    pub fn has(&self, label: &str) -> bool {
        self.child(label).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_node_children_by_label() {
        let node = RuleNode::new(rules::DROP_READWRITE_SPLITTING_RULE)
            .with_child("name", NodeValue::Identifier(vec!["a".to_string()]))
            .with_child("ifExists", NodeValue::Keyword("IF EXISTS".to_string()))
            .with_child("name", NodeValue::Identifier(vec!["b".to_string()]));

        let names: Vec<&str> = node.children("name").filter_map(NodeValue::as_text).collect();

        assert_eq!(node.rule(), "dropReadwriteSplittingRule");
        assert_eq!(names, vec!["a", "b"]);
        assert!(node.has("ifExists"));
        assert!(!node.has("database"));
    }

    #[test]
    fn qualified_identifier_has_no_text() {
        let value = NodeValue::Identifier(vec!["dbo".to_string(), "t".to_string()]);

        assert_eq!(value.as_text(), None);
        assert_eq!(value.as_identifier().map(|parts| parts.len()), Some(2));
    }

    #[test]
    fn error_root_detected() {
        let tree = ParseTree::new(ParseNode::Error(ErrorNode {
            text: "garbage".to_string(),
        }));
        assert!(tree.is_error());
        assert!(!tree.is_provisional());
    }

    #[test]
    fn provisional_tree_keeps_its_root() {
        let tree = ParseTree::provisional(ParseNode::Error(ErrorNode {
            text: "garbage".to_string(),
        }));

        assert!(tree.is_provisional());
        assert!(tree.is_error());
    }
}
