use colored::*;
use crate::engine::ast::Operator;
use crate::engine::segmenter::segments;

/// One line per stage: index, command line, and the operator that follows.
pub fn describe(tokens: &[String]) -> Vec<String> {
    segments(tokens)
        .filter(|s| !s.command.is_empty())
        .enumerate()
        .map(|(i, s)| {
            let kind = if s.command.is_builtin_cd() { " (builtin)" } else { "" };
            format!("{}: {}{} [{}]", i + 1, s.command, kind, s.operator)
        })
        .collect()
}

pub fn handle_plan(pipelines: &[Vec<String>]) {
    for tokens in pipelines {
        println!("{} [DRY-RUN] {}", "::".yellow(), tokens.join(" ").bold());
        for (line, segment) in describe(tokens).iter().zip(segments(tokens).filter(|s| !s.command.is_empty())) {
            let line = match segment.operator {
                Operator::Pipe => line.cyan(),
                Operator::Sequence => line.blue(),
                Operator::End => line.normal(),
            };
            println!("   {}", line);
        }
    }
}
