use crate::engine::ast::{Command, Operator};

/// A command together with the operator that terminated it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub command: Command<'a>,
    pub operator: Operator,
    /// Cursor of the first token after the operator.
    pub next: usize,
}

/// Consumes tokens from `position` up to the next operator (or the end of the list).
///
/// A cursor sitting on an operator yields an empty command; callers skip those.
pub fn next_command(tokens: &[String], position: usize) -> Segment<'_> {
    let start = position.min(tokens.len());
    let rest = &tokens[start..];

    let len = rest
        .iter()
        .position(|t| Operator::from_token(t).is_some())
        .unwrap_or(rest.len());

    let (operator, consumed) = match rest.get(len) {
        Some(token) => (Operator::from_token(token).unwrap_or(Operator::End), len + 1),
        None => (Operator::End, len),
    };

    Segment {
        command: Command::new(&rest[..len]),
        operator,
        next: start + consumed,
    }
}

/// Iterates every segment of the token list, empty ones included.
pub fn segments(tokens: &[String]) -> Segments<'_> {
    Segments { tokens, position: 0 }
}

pub struct Segments<'a> {
    tokens: &'a [String],
    position: usize,
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.tokens.len() {
            return None;
        }
        let segment = next_command(self.tokens, self.position);
        self.position = segment.next;
        Some(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_single_command_runs_to_end() {
        let tokens = toks("/bin/echo hello world");
        let seg = next_command(&tokens, 0);
        assert_eq!(seg.command.tokens(), &tokens[..]);
        assert_eq!(seg.operator, Operator::End);
        assert_eq!(seg.next, 3);
    }

    #[test]
    fn test_stops_at_pipe_and_skips_it() {
        let tokens = toks("/bin/echo a | /bin/cat");
        let seg = next_command(&tokens, 0);
        assert_eq!(seg.command.program(), Some("/bin/echo"));
        assert_eq!(seg.command.args(), &["a".to_string()]);
        assert_eq!(seg.operator, Operator::Pipe);
        assert_eq!(seg.next, 3);

        let seg = next_command(&tokens, seg.next);
        assert_eq!(seg.command.program(), Some("/bin/cat"));
        assert_eq!(seg.operator, Operator::End);
        assert_eq!(seg.next, tokens.len());
    }

    #[test]
    fn test_cursor_on_operator_yields_empty_command() {
        let tokens = toks("; /bin/true");
        let seg = next_command(&tokens, 0);
        assert!(seg.command.is_empty());
        assert_eq!(seg.operator, Operator::Sequence);
        assert_eq!(seg.next, 1);
    }

    #[test]
    fn test_trailing_operator() {
        let tokens = toks("/bin/ls |");
        let all: Vec<_> = segments(&tokens).collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].operator, Operator::Pipe);
    }

    #[test]
    fn test_segments_covers_doubled_operators() {
        let tokens = toks("a ; ; b | c");
        let ops: Vec<_> = segments(&tokens)
            .map(|s| (s.command.to_string(), s.operator))
            .collect();
        assert_eq!(
            ops,
            vec![
                ("a".to_string(), Operator::Sequence),
                (String::new(), Operator::Sequence),
                ("b".to_string(), Operator::Pipe),
                ("c".to_string(), Operator::End),
            ]
        );
    }

    #[test]
    fn test_cursor_past_end() {
        let tokens = toks("a");
        let seg = next_command(&tokens, 5);
        assert!(seg.command.is_empty());
        assert_eq!(seg.operator, Operator::End);
        assert_eq!(seg.next, 1);
    }
}
