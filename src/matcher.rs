//! Reference matchers over the syntax tree, used to check the derivative
//! engine. Both are exponential in the worst case; keep inputs small.

use crate::ast::{AnchorKind, RegexNode};
use crate::solver::ByteSet;

fn is_word(input: &[u8], pos: usize) -> bool {
    input.get(pos).is_some_and(|&b| ByteSet::word().contains(b))
}

fn anchor_holds(kind: AnchorKind, input: &[u8], pos: usize) -> bool {
    let len = input.len();
    match kind {
        AnchorKind::Start => pos == 0,
        AnchorKind::End => pos == len,
        AnchorKind::LineStart => pos == 0 || input[pos - 1] == b'\n',
        AnchorKind::LineEnd => pos == len || input[pos] == b'\n',
        AnchorKind::EndZ => pos == len || (pos + 1 == len && input[pos] == b'\n'),
        AnchorKind::WordBoundary | AnchorKind::NonWordBoundary => {
            let before = pos > 0 && is_word(input, pos - 1);
            let boundary = before != is_word(input, pos);
            boundary == (kind == AnchorKind::WordBoundary)
        }
    }
}

fn one_byte(input: &[u8], pos: usize, accepts: impl Fn(u8) -> bool) -> Vec<usize> {
    match input.get(pos) {
        Some(&b) if accepts(b) => vec![pos + 1],
        _ => vec![],
    }
}

fn step(node: &RegexNode, input: &[u8], positions: &[usize]) -> Vec<usize> {
    let mut next: Vec<usize> = positions
        .iter()
        .flat_map(|&p| match_node(node, input, p))
        .collect();
    next.sort_unstable();
    next.dedup();
    next
}

/// Return all possible end positions after matching `node` at `pos`.
pub fn match_node(node: &RegexNode, input: &[u8], pos: usize) -> Vec<usize> {
    match node {
        RegexNode::Literal(c) => one_byte(input, pos, |b| b == *c),
        RegexNode::Dot => one_byte(input, pos, |b| b != b'\n'),
        RegexNode::Class(set) => one_byte(input, pos, |b| set.contains(b)),
        RegexNode::Anchor(kind) => {
            if anchor_holds(*kind, input, pos) {
                vec![pos]
            } else {
                vec![]
            }
        }
        RegexNode::Group { node, .. } => match_node(node, input, pos),
        RegexNode::Seq(nodes) => {
            let mut positions = vec![pos];
            for n in nodes {
                positions = step(n, input, &positions);
                if positions.is_empty() {
                    break;
                }
            }
            positions
        }
        RegexNode::Alt(branches) => {
            let mut all_positions: Vec<usize> = branches
                .iter()
                .flat_map(|br| match_node(br, input, pos))
                .collect();
            all_positions.sort_unstable();
            all_positions.dedup();
            all_positions
        }
        RegexNode::Repeat {
            node: inner,
            min,
            max,
            ..
        } => {
            let mut frontier = vec![pos];
            for _ in 0..*min {
                frontier = step(inner, input, &frontier);
                if frontier.is_empty() {
                    return frontier;
                }
            }
            // A position reached again later has no more iterations left
            // than when first seen, so only new positions keep going.
            let mut results = frontier.clone();
            let mut count = *min;
            while !frontier.is_empty() && max.map_or(true, |m| count < m) {
                frontier = step(inner, input, &frontier);
                frontier.retain(|p| !results.contains(p));
                results.extend(&frontier);
                count += 1;
            }
            results.sort_unstable();
            results
        }
    }
}

/// True if `node` matches the whole of `input`.
pub fn full_match(node: &RegexNode, input: &[u8]) -> bool {
    match_node(node, input, 0).contains(&input.len())
}

/// End of the match a backtracking engine reports for `node` anchored at
/// `pos`: alternatives in order, greedy loops trying one more iteration
/// first, lazy loops one fewer. An iteration past the minimum that consumes
/// nothing is rejected.
pub fn backtrack_end(node: &RegexNode, input: &[u8], pos: usize) -> Option<usize> {
    let mut end = None;
    first_end(node, input, pos, &mut |p| {
        end = Some(p);
        true
    });
    end
}

type Cont<'k> = &'k mut dyn FnMut(usize) -> bool;

fn first_end(node: &RegexNode, input: &[u8], pos: usize, k: Cont<'_>) -> bool {
    match node {
        RegexNode::Literal(_) | RegexNode::Dot | RegexNode::Class(_) | RegexNode::Anchor(_) => {
            match_node(node, input, pos).into_iter().any(k)
        }
        RegexNode::Group { node, .. } => first_end(node, input, pos, k),
        RegexNode::Seq(nodes) => seq(nodes, input, pos, k),
        RegexNode::Alt(branches) => branches.iter().any(|br| first_end(br, input, pos, &mut *k)),
        RegexNode::Repeat {
            node: inner,
            min,
            max,
            lazy,
        } => repeat(inner, *min, *max, *lazy, 0, input, pos, k),
    }
}

fn seq(nodes: &[RegexNode], input: &[u8], pos: usize, k: Cont<'_>) -> bool {
    match nodes.split_first() {
        None => k(pos),
        Some((first, rest)) => first_end(first, input, pos, &mut |p| seq(rest, input, p, &mut *k)),
    }
}

#[allow(clippy::too_many_arguments)]
fn repeat(
    inner: &RegexNode,
    min: u32,
    max: Option<u32>,
    lazy: bool,
    count: u32,
    input: &[u8],
    pos: usize,
    k: Cont<'_>,
) -> bool {
    if count < min {
        return first_end(inner, input, pos, &mut |p| {
            repeat(inner, min, max, lazy, count + 1, input, p, &mut *k)
        });
    }
    let can_grow = max.map_or(true, |m| count < m);
    let more = |k: Cont<'_>| {
        can_grow
            && first_end(inner, input, pos, &mut |p| {
                p != pos && repeat(inner, min, max, lazy, count + 1, input, p, &mut *k)
            })
    };
    if lazy {
        k(pos) || more(&mut *k)
    } else {
        more(&mut *k) || k(pos)
    }
}
