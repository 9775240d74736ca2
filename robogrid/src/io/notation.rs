//! Text notation for programs, used by the CLI as its authoring surface.
//!
//! ```text
//! forward, loop*2 { forward right }, jump
//! ```
//!
//! Commands: `forward|f`, `back|b`, `left|l` (turn), `right|r` (turn),
//! `wait|w`, `jump|j`, `stop|s`. Loops are `loop` or `repeat`, optionally
//! followed by `*N`, then a braced body. Separators are whitespace or commas.

use std::sync::LazyLock;

use anyhow::{Result, anyhow, bail};
use regex::Regex;

use crate::core::program::{NodeId, Op, Program};
use crate::core::types::InstructionKind;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<word>[A-Za-z_]+)(?:\*(?P<count>\d+))?|(?P<open>\{)|(?P<close>\})|(?P<sep>[\s,]+)")
        .expect("token regex should be valid")
});

fn command(word: &str) -> Option<InstructionKind> {
    let kind = match word.to_ascii_lowercase().as_str() {
        "forward" | "f" => InstructionKind::Forward,
        "back" | "b" => InstructionKind::Back,
        "left" | "l" | "turn_left" => InstructionKind::TurnLeft,
        "right" | "r" | "turn_right" => InstructionKind::TurnRight,
        "wait" | "w" => InstructionKind::Wait,
        "jump" | "j" => InstructionKind::Jump,
        "stop" | "s" => InstructionKind::Stop,
        "loop" | "repeat" => InstructionKind::Loop,
        _ => return None,
    };
    Some(kind)
}

/// Parse `text` into a fresh [`Program`].
///
/// Loops written without `*N` get `default_repeat_count`. Any count >= 1 is
/// accepted; see [`parse_program_checked`] to restrict the choices.
pub fn parse_program(text: &str, default_repeat_count: u32) -> Result<Program> {
    parse_program_checked(text, default_repeat_count, |_| true)
}

/// Like [`parse_program`], but rejects loops whose repeat count (explicit or
/// defaulted) fails `is_loop_choice`.
pub fn parse_program_checked(
    text: &str,
    default_repeat_count: u32,
    is_loop_choice: impl Fn(u32) -> bool,
) -> Result<Program> {
    let mut program = Program::new();
    // Open loops, innermost last.
    let mut open: Vec<NodeId> = Vec::new();
    // Loop waiting for its `{`, with the offset it was declared at.
    let mut pending_body: Option<(NodeId, usize)> = None;
    let mut offset = 0;

    while offset < text.len() {
        let caps = TOKEN_RE
            .captures_at(text, offset)
            .filter(|caps| caps.get(0).is_some_and(|m| m.start() == offset))
            .ok_or_else(|| {
                let rest: String = text[offset..].chars().take(12).collect();
                anyhow!("unexpected input at offset {}: '{}'", offset, rest)
            })?;
        let whole = caps.get(0).map_or(offset, |m| m.end());
        let at = offset;
        offset = whole;

        if caps.name("sep").is_some() {
            continue;
        }
        if caps.name("open").is_some() {
            let Some((id, _)) = pending_body.take() else {
                bail!("unexpected '{{' at offset {}", at);
            };
            open.push(id);
            continue;
        }
        if let Some((_, declared)) = pending_body {
            bail!("loop at offset {} must be followed by '{{'", declared);
        }
        if caps.name("close").is_some() {
            if open.pop().is_none() {
                bail!("unmatched '}}' at offset {}", at);
            }
            continue;
        }

        let Some(word) = caps.name("word") else {
            continue;
        };
        let kind = command(word.as_str())
            .ok_or_else(|| anyhow!("unknown command '{}' at offset {}", word.as_str(), at))?;
        let count = caps
            .name("count")
            .map(|m| {
                m.as_str()
                    .parse::<u32>()
                    .map_err(|err| anyhow!("bad repeat count at offset {}: {}", at, err))
            })
            .transpose()?;
        let parent = open.last().copied();

        match (kind, count) {
            (InstructionKind::Loop, count) => {
                let repeat = count.unwrap_or(default_repeat_count);
                if repeat == 0 {
                    bail!("repeat count must be >= 1 at offset {}", at);
                }
                if !is_loop_choice(repeat) {
                    bail!("repeat count {} at offset {} is not an offered choice", repeat, at);
                }
                let id = program
                    .append_loop(repeat, parent)
                    .ok_or_else(|| anyhow!("loop parent vanished at offset {}", at))?;
                pending_body = Some((id, at));
            }
            (_, Some(_)) => bail!("only loops take a repeat count (offset {})", at),
            (kind, None) => {
                program
                    .append(kind, parent)
                    .ok_or_else(|| anyhow!("loop parent vanished at offset {}", at))?;
            }
        }
    }

    if let Some((_, declared)) = pending_body {
        bail!("loop at offset {} has no body", declared);
    }
    if !open.is_empty() {
        bail!("{} unclosed loop(s)", open.len());
    }
    Ok(program)
}

/// Render `program` back into canonical notation.
pub fn render_program(program: &Program) -> String {
    let mut parts = Vec::new();
    render_sequence(program, program.roots(), &mut parts);
    parts.join(" ")
}

fn render_sequence(program: &Program, ids: &[NodeId], out: &mut Vec<String>) {
    for id in ids {
        let Some(node) = program.get(*id) else {
            continue;
        };
        match &node.op {
            Op::Loop {
                repeat_count,
                children,
            } => {
                out.push(format!("loop*{} {{", repeat_count));
                render_sequence(program, children, out);
                out.push("}".to_string());
            }
            op => out.push(word_for(op.kind()).to_string()),
        }
    }
}

fn word_for(kind: InstructionKind) -> &'static str {
    match kind {
        InstructionKind::TurnLeft => "left",
        InstructionKind::TurnRight => "right",
        other => other.as_str(),
    }
}
