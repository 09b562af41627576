use std::fmt;

pub const PIPE: &str = "|";
pub const SEQUENCE: &str = ";";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    // "ls | grep target"
    Pipe,
    // "make ; make install"
    Sequence,
    // Last command of the token list
    End,
}

impl Operator {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            PIPE => Some(Operator::Pipe),
            SEQUENCE => Some(Operator::Sequence),
            _ => None,
        }
    }

    pub fn is_pipe(self) -> bool {
        self == Operator::Pipe
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Operator::Pipe => "pipe",
            Operator::Sequence => "seq",
            Operator::End => "end",
        };
        f.write_str(label)
    }
}

/// One command of a pipeline, borrowed from the token list.
/// `tokens[0]` is the program (or builtin) name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command<'a> {
    tokens: &'a [String],
}

impl<'a> Command<'a> {
    pub fn new(tokens: &'a [String]) -> Self {
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn program(&self) -> Option<&'a str> {
        self.tokens.first().map(String::as_str)
    }

    pub fn args(&self) -> &'a [String] {
        self.tokens.get(1..).unwrap_or(&[])
    }

    pub fn tokens(&self) -> &'a [String] {
        self.tokens
    }

    pub fn is_builtin_cd(&self) -> bool {
        self.program() == Some("cd")
    }
}

impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(" "))
    }
}
