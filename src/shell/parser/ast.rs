use std::os::unix::io::RawFd;

/// How a word was quoted on the command line. Expansion skips
/// single-quoted words entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    None,
    Single,
    Double,
}

/// One argv word, carrying its quoting so later stages can tell
/// `$HOME` from `'$HOME'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub quote: Quote,
}

impl Word {
    pub fn new(text: impl Into<String>, quote: Quote) -> Self {
        Self {
            text: text.into(),
            quote,
        }
    }

    pub fn bare(text: impl Into<String>) -> Self {
        Self::new(text, Quote::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Command,
    /// A command whose name token was double-quoted; executes like `Command`
    /// but is kept distinct so the quoting stage can tell them apart.
    QuotedCommand,
    Pipe,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirKind {
    Input,   // <
    Output,  // >
    Append,  // >>
    Heredoc, // <<
}

/// One redirection operator attached to a command node.
///
/// For file redirections `target` is the filename. For heredocs it is the
/// delimiter word; `fd` holds the materialized backing descriptor once the
/// heredoc body has been captured, and -1 before that (or after consumption).
#[derive(Debug)]
pub struct Redirection {
    pub kind: RedirKind,
    pub target: String,
    pub fd: RawFd,
}

impl Redirection {
    pub fn new(kind: RedirKind, target: String) -> Self {
        Self {
            kind,
            target,
            fd: -1,
        }
    }
}

/// A node in the parsed command tree.
///
/// Leaves (`Command`/`QuotedCommand`) carry a non-empty `argv` and no
/// children; internal nodes (`Pipe`/`And`/`Or`) carry exactly two children
/// and an empty `argv`. The tree owns its children exclusively.
#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub argv: Vec<Word>,
    pub redirections: Vec<Redirection>,
    pub left: Option<Box<Node>>,
    pub right: Option<Box<Node>>,
}

impl Node {
    pub fn leaf(kind: NodeKind, argv: Vec<Word>, redirections: Vec<Redirection>) -> Self {
        Self {
            kind,
            argv,
            redirections,
            left: None,
            right: None,
        }
    }

    pub fn internal(kind: NodeKind, left: Node, right: Node) -> Self {
        Self {
            kind,
            argv: Vec::new(),
            redirections: Vec::new(),
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Command | NodeKind::QuotedCommand)
    }
}
