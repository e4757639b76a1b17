//! Abstract syntax tree produced by the parser.
//!
//! Nodes are immutable. A leaf pairs a rule name with the token it matched;
//! a tree pairs a rule name with its ordered children. Three read-only
//! projections are provided:
//!
//! - [`Ast::simplify`]: nested `(name, text | children)` values for equality
//!   checks.
//! - [`Ast::pretty`]: a multi-line rendering.
//! - [`Ast::normalize`]: flat post-order records for diffing and
//!   serialization.

use serde::Serialize;
use smol_str::SmolStr;

use crate::lexer::Token;

/// Name of the placeholder leaf emitted for an unmatched `[...]` group.
pub const EMPTY_NAME: &str = "__empty__";

/// A leaf node: a rule name and the token it matched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AstLeaf {
    name: SmolStr,
    token: Token,
}

impl AstLeaf {
    /// Returns the rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the matched token.
    #[must_use]
    pub fn token(&self) -> &Token {
        &self.token
    }
}

/// An interior node: a rule name and its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AstTree {
    name: SmolStr,
    children: Vec<Ast>,
}

impl AstTree {
    /// Returns the rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the children in source order.
    #[must_use]
    pub fn children(&self) -> &[Ast] {
        &self.children
    }
}

/// A node of the syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ast {
    /// A matched token.
    Leaf(AstLeaf),
    /// A matched rule with children.
    Tree(AstTree),
}

impl Ast {
    /// Creates a leaf.
    #[must_use]
    pub fn leaf(name: impl Into<SmolStr>, token: Token) -> Self {
        Self::Leaf(AstLeaf {
            name: name.into(),
            token,
        })
    }

    /// Creates a tree.
    #[must_use]
    pub fn tree(name: impl Into<SmolStr>, children: Vec<Ast>) -> Self {
        Self::Tree(AstTree {
            name: name.into(),
            children,
        })
    }

    /// The placeholder leaf for an omitted optional element.
    #[must_use]
    pub fn empty() -> Self {
        Self::leaf(EMPTY_NAME, Token::empty())
    }

    /// Returns the rule name of the node.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Leaf(leaf) => &leaf.name,
            Self::Tree(tree) => &tree.name,
        }
    }

    /// Returns the children of a tree; leaves have none.
    #[must_use]
    pub fn children(&self) -> &[Ast] {
        match self {
            Self::Leaf(_) => &[],
            Self::Tree(tree) => &tree.children,
        }
    }

    pub(crate) fn into_children(self) -> Vec<Ast> {
        match self {
            Self::Leaf(_) => Vec::new(),
            Self::Tree(tree) => tree.children,
        }
    }

    pub(crate) fn renamed(self, name: &str) -> Self {
        match self {
            Self::Leaf(leaf) => Self::leaf(name, leaf.token),
            Self::Tree(tree) => Self::tree(name, tree.children),
        }
    }

    /// Returns the token of a leaf.
    #[must_use]
    pub fn token(&self) -> Option<&Token> {
        match self {
            Self::Leaf(leaf) => Some(&leaf.token),
            Self::Tree(_) => None,
        }
    }

    /// Returns true for the placeholder leaf.
    #[must_use]
    pub fn is_empty_leaf(&self) -> bool {
        matches!(self, Self::Leaf(leaf) if leaf.name == EMPTY_NAME)
    }

    /// Returns the leaves in source order, placeholders included.
    #[must_use]
    pub fn leaves(&self) -> Vec<&AstLeaf> {
        fn walk<'a>(node: &'a Ast, out: &mut Vec<&'a AstLeaf>) {
            match node {
                Ast::Leaf(leaf) => out.push(leaf),
                Ast::Tree(tree) => tree.children.iter().for_each(|child| walk(child, out)),
            }
        }

        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }

    /// Projects the tree onto plain nested values.
    #[must_use]
    pub fn simplify(&self) -> Simplified {
        match self {
            Self::Leaf(leaf) => Simplified::Leaf(leaf.name.clone(), leaf.token.text.clone()),
            Self::Tree(tree) => Simplified::Tree(
                tree.name.clone(),
                tree.children.iter().map(Ast::simplify).collect(),
            ),
        }
    }

    /// Renders the tree over multiple lines, nesting children by `indent`.
    #[must_use]
    pub fn pretty(&self, indent: &str) -> String {
        match self {
            Self::Leaf(leaf) => format!("('{}', {:?})", leaf.name, leaf.token.text.as_str()),
            Self::Tree(tree) if tree.children.is_empty() => format!("('{}', [])", tree.name),
            Self::Tree(tree) => {
                let separator = format!("\n{indent}");
                let children = tree
                    .children
                    .iter()
                    .map(|child| child.pretty(indent).replace('\n', &separator))
                    .collect::<Vec<_>>()
                    .join(&format!(",{separator}"));
                format!("('{}', [{separator}{children}\n])", tree.name)
            }
        }
    }

    /// Flattens the tree into post-order records. Ids are assigned in visit
    /// order, so children always precede their parent.
    #[must_use]
    pub fn normalize(&self) -> Vec<Normal> {
        let mut out = Vec::new();
        self.normalize_into(&mut out);
        out
    }

    fn normalize_into(&self, out: &mut Vec<Normal>) -> usize {
        let (literal, children) = match self {
            Self::Leaf(leaf) => (leaf.token.text.clone(), Vec::new()),
            Self::Tree(tree) => (
                SmolStr::default(),
                tree.children
                    .iter()
                    .map(|child| child.normalize_into(out))
                    .collect(),
            ),
        };

        let id = out.len();
        out.push(Normal {
            id,
            name: SmolStr::new(self.name()),
            literal,
            children,
        });
        id
    }
}

/// Plain nested form of a tree, for comparisons.
///
/// Serializes as `["name", "text"]` and `["name", [...]]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Simplified {
    /// Rule name and token text.
    Leaf(SmolStr, SmolStr),
    /// Rule name and children.
    Tree(SmolStr, Vec<Simplified>),
}

impl Simplified {
    /// Creates a leaf value.
    #[must_use]
    pub fn leaf(name: &str, text: &str) -> Self {
        Self::Leaf(name.into(), text.into())
    }

    /// Creates a tree value.
    #[must_use]
    pub fn tree(name: &str, children: Vec<Simplified>) -> Self {
        Self::Tree(name.into(), children)
    }
}

/// One record of [`Ast::normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Normal {
    /// Post-order id.
    pub id: usize,
    /// Rule name.
    pub name: SmolStr,
    /// Token text for leaves, empty for trees.
    pub literal: SmolStr,
    /// Ids of the children.
    pub children: Vec<usize>,
}
