//! Property tests comparing the derivative engine with the reference
//! matchers over small random patterns and inputs.

use proptest::prelude::*;
use symbolic_regex::ast::{AnchorKind, RegexNode};
use symbolic_regex::matcher::{backtrack_end, full_match, match_node};
use symbolic_regex::scan::Scanner;
use symbolic_regex::{Builder, ByteSet, ByteSetSolver, CharKind, Context, NodeId};

fn leaf() -> BoxedStrategy<RegexNode> {
    prop_oneof![
        3 => Just(RegexNode::Literal(b'a')),
        3 => Just(RegexNode::Literal(b'b')),
        1 => Just(RegexNode::Class(ByteSet::from_bytes(b"ab"))),
        1 => Just(RegexNode::Dot),
    ]
    .boxed()
}

fn repeat(node: RegexNode, min: u32, extra: Option<u32>, lazy: bool) -> RegexNode {
    RegexNode::Repeat {
        node: Box::new(node),
        min,
        max: extra.map(|e| min + e),
        lazy,
    }
}

/// A sequence that starts with a leaf, so it never matches empty.
fn consuming(inner: BoxedStrategy<RegexNode>) -> BoxedStrategy<RegexNode> {
    (leaf(), prop::collection::vec(inner, 0..3))
        .prop_map(|(first, rest)| {
            let mut nodes = vec![first];
            nodes.extend(rest);
            RegexNode::Seq(nodes)
        })
        .boxed()
}

/// Anchor free patterns over `a` and `b`. Without `nullable_bodies` every
/// loop body consumes input, which keeps backtracking order unambiguous.
fn pattern(alternation: bool, nullable_bodies: bool) -> BoxedStrategy<RegexNode> {
    leaf()
        .prop_recursive(3, 16, 3, move |inner| {
            let body = if nullable_bodies {
                inner.clone()
            } else {
                consuming(inner.clone())
            };
            let mut choices = vec![
                (
                    2,
                    prop::collection::vec(inner.clone(), 0..4)
                        .prop_map(RegexNode::Seq)
                        .boxed(),
                ),
                (
                    2,
                    (body, 0u32..3, prop::option::of(0u32..3), any::<bool>())
                        .prop_map(|(node, min, extra, lazy)| repeat(node, min, extra, lazy))
                        .boxed(),
                ),
                (
                    1,
                    (inner.clone(), any::<bool>())
                        .prop_map(|(node, capture)| RegexNode::Group {
                            id: capture.then_some(1),
                            node: Box::new(node),
                        })
                        .boxed(),
                ),
            ];
            if alternation {
                choices.push((
                    2,
                    prop::collection::vec(inner, 2..4)
                        .prop_map(RegexNode::Alt)
                        .boxed(),
                ));
            }
            prop::strategy::Union::new_weighted(choices)
        })
        .boxed()
}

fn anchor() -> impl Strategy<Value = RegexNode> {
    prop::sample::select(vec![
        AnchorKind::Start,
        AnchorKind::End,
        AnchorKind::LineStart,
        AnchorKind::LineEnd,
        AnchorKind::EndZ,
        AnchorKind::WordBoundary,
        AnchorKind::NonWordBoundary,
    ])
    .prop_map(RegexNode::Anchor)
}

/// A loop whose body starts or ends with an anchor, so the body's
/// nullability depends on the context of each iteration.
fn anchored_loop() -> BoxedStrategy<RegexNode> {
    (
        anchor(),
        pattern(true, true),
        any::<bool>(),
        0u32..3,
        prop::option::of(0u32..3),
        any::<bool>(),
    )
        .prop_map(|(anchor, inner, anchor_first, min, extra, lazy)| {
            let body = if anchor_first {
                vec![anchor, inner]
            } else {
                vec![inner, anchor]
            };
            repeat(RegexNode::Seq(body), min, extra, lazy)
        })
        .boxed()
}

/// Patterns with anchors at the top level and inside loop bodies.
fn anchored_pattern() -> BoxedStrategy<RegexNode> {
    let part = prop_oneof![
        3 => pattern(true, true),
        1 => anchor(),
        1 => (anchor(), pattern(true, true)).prop_map(|(a, p)| RegexNode::Alt(vec![a, p])),
        1 => anchored_loop(),
    ];
    prop::collection::vec(part, 1..4)
        .prop_map(RegexNode::Seq)
        .boxed()
}

fn inputs(alphabet: &'static str) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(
        prop::string::string_regex(alphabet)
            .expect("valid input regex")
            .prop_map(String::into_bytes),
        1..6,
    )
}

fn build(ast: &RegexNode) -> (Builder<ByteSetSolver>, NodeId) {
    let mut builder = Builder::new(ByteSetSolver);
    let root = builder.translate(ast);
    (builder, root)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn acceptance_agrees_with_reference(ast in anchored_pattern(), words in inputs("[ab \n]{0,6}")) {
        let (mut b, root) = build(&ast);
        let mut scanner = Scanner::new(&mut b, root);
        for word in &words {
            prop_assert_eq!(scanner.accepts(word).unwrap(), full_match(&ast, word), "input {:?}", word);
        }
    }

    #[test]
    fn search_agrees_with_reference(ast in anchored_pattern(), words in inputs("[ab \n]{0,6}")) {
        let (mut b, root) = build(&ast);
        let mut scanner = Scanner::new(&mut b, root);
        for word in &words {
            let expected = (0..=word.len()).any(|start| !match_node(&ast, word, start).is_empty());
            prop_assert_eq!(scanner.is_match(word).unwrap(), expected, "input {:?}", word);
        }
    }

    #[test]
    fn match_end_agrees_with_backtracking(ast in pattern(true, false), words in inputs("[ab]{0,6}")) {
        let (mut b, root) = build(&ast);
        let mut scanner = Scanner::new(&mut b, root);
        for word in &words {
            prop_assert_eq!(
                scanner.first_match_end(word).unwrap(),
                backtrack_end(&ast, word, 0),
                "input {:?}", word
            );
        }
    }

    #[test]
    fn nullability_is_consistent(ast in anchored_pattern()) {
        let (b, root) = build(&ast);
        let edges = Context::new(CharKind::BeginningEnd, CharKind::BeginningEnd);
        prop_assert_eq!(b.is_nullable_for(root, edges), full_match(&ast, b""));
        let info = b.info(root);
        for context in Context::all() {
            let nullable = b.is_nullable_for(root, context);
            if info.is_nullable() {
                prop_assert!(nullable);
            }
            if nullable {
                prop_assert!(info.can_be_nullable());
            }
            if b.is_high_priority_nullable_for(root, context) {
                prop_assert!(nullable);
            }
        }
    }

    #[test]
    fn subsumption_is_sound(
        larger in pattern(true, true),
        smaller in pattern(true, true),
        prefix in pattern(false, true),
        words in inputs("[ab]{0,6}"),
    ) {
        // the second pair is built so that subsumption is likely to hold
        let widened = RegexNode::Seq(vec![repeat(prefix, 0, Some(1), false), larger.clone()]);
        let pairs = [(&larger, &smaller), (&widened, &larger)];
        let mut b = Builder::new(ByteSetSolver);
        for (sup, sub) in pairs {
            let a = b.translate(sup);
            let c = b.translate(sub);
            if b.subsumes(a, c) {
                for word in &words {
                    if full_match(sub, word) {
                        prop_assert!(full_match(sup, word), "input {:?}", word);
                    }
                }
            }
        }
    }

    #[test]
    fn reversal_round_trips(ast in pattern(false, true)) {
        let (mut b, root) = build(&ast);
        let reversed = b.reverse(root).unwrap();
        prop_assert_eq!(b.reverse(reversed).unwrap(), root);
    }

    #[test]
    fn reversal_reverses_the_language(ast in pattern(true, true), words in inputs("[ab]{0,6}")) {
        let (mut b, root) = build(&ast);
        let reversed = b.reverse(root).unwrap();
        let mut scanner = Scanner::new(&mut b, reversed);
        for word in &words {
            let backwards: Vec<u8> = word.iter().rev().copied().collect();
            prop_assert_eq!(scanner.accepts(&backwards).unwrap(), full_match(&ast, word));
        }
    }
}
