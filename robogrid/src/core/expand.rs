//! Flattening of an instruction tree into a linear execution sequence.

use serde::Serialize;

use crate::core::program::{NodeId, Op, Program};
use crate::core::types::InstructionKind;

/// One step of an expanded program.
///
/// A loop contributes a marker unit (highlight only, no world effect)
/// followed by its unrolled body. The unit copies what it needs out of the
/// tree, so later edits to the [`Program`] do not reach a running expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExecutionUnit {
    /// Authored node this unit came from, used for highlighting.
    pub id: NodeId,
    pub kind: InstructionKind,
    pub loop_marker: bool,
}

/// Fully unroll `program`.
///
/// Pure and deterministic. Size is unbounded; prefer [`expand_bounded`] for
/// learner input.
pub fn expand(program: &Program) -> Vec<ExecutionUnit> {
    let mut units = Vec::new();
    expand_into(program, program.roots(), &mut units);
    units
}

/// Like [`expand`], but refuses to materialize more than `limit` units.
pub fn expand_bounded(program: &Program, limit: usize) -> Result<Vec<ExecutionUnit>, String> {
    let len = expanded_len(program);
    if len > limit as u64 {
        return Err(format!(
            "program expands to {} units, limit is {}",
            len, limit
        ));
    }
    Ok(expand(program))
}

/// Number of units [`expand`] would produce, saturating at `u64::MAX`.
pub fn expanded_len(program: &Program) -> u64 {
    sequence_len(program, program.roots())
}

fn sequence_len(program: &Program, ids: &[NodeId]) -> u64 {
    ids.iter()
        .filter_map(|id| program.get(*id))
        .fold(0u64, |total, node| {
            let len = match &node.op {
                Op::Loop {
                    repeat_count,
                    children,
                } => 1u64.saturating_add(
                    sequence_len(program, children).saturating_mul(u64::from(*repeat_count)),
                ),
                _ => 1,
            };
            total.saturating_add(len)
        })
}

fn expand_into(program: &Program, ids: &[NodeId], out: &mut Vec<ExecutionUnit>) {
    for id in ids {
        let Some(node) = program.get(*id) else {
            continue;
        };
        match &node.op {
            Op::Loop {
                repeat_count,
                children,
            } => {
                out.push(ExecutionUnit {
                    id: node.id,
                    kind: InstructionKind::Loop,
                    loop_marker: true,
                });
                for _ in 0..*repeat_count {
                    expand_into(program, children, out);
                }
            }
            op => out.push(ExecutionUnit {
                id: node.id,
                kind: op.kind(),
                loop_marker: false,
            }),
        }
    }
}
