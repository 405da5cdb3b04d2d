//! Match priority, captures and structural queries on concrete patterns.

use rstest::rstest;
use symbolic_regex::matcher::backtrack_end;
use symbolic_regex::parser::Parser;
use symbolic_regex::scan::{context_at, Scanner};
use symbolic_regex::{
    compile, Builder, ByteSet, ByteSetSolver, CharKind, Context, DerivativeEffect,
    DerivativeEffectKind, NodeId, Result,
};

type Spans = Vec<Option<(usize, usize)>>;

fn builder() -> Builder<ByteSetSolver> {
    Builder::new(ByteSetSolver)
}

#[derive(Clone)]
struct Registers(Vec<(Option<usize>, Option<usize>)>);

impl Registers {
    fn apply(&mut self, effect: DerivativeEffect, pos: usize) {
        let slot = &mut self.0[effect.capture_number as usize];
        match effect.kind {
            DerivativeEffectKind::CaptureStart => slot.0 = Some(pos),
            DerivativeEffectKind::CaptureEnd => slot.1 = Some(pos),
        }
    }

    fn spans(&self, end: usize) -> Spans {
        let mut spans: Spans = self.0.iter().map(|&(s, e)| s.zip(e)).collect();
        spans[0] = Some((0, end));
        spans
    }
}

/// Groups of the match at position 0, simulating one thread per prioritized
/// alternative. Threads ranked below the first accepting one are dropped.
fn first_match_groups(
    b: &mut Builder<ByteSetSolver>,
    root: NodeId,
    groups: usize,
    input: &[u8],
) -> Result<Option<Spans>> {
    let mut threads = vec![(root, Registers(vec![(None, None); groups + 1]))];
    let mut best = None;
    for pos in 0..=input.len() {
        let context = context_at(input, pos);
        if let Some(i) = threads
            .iter()
            .position(|(state, _)| b.is_nullable_for(*state, context))
        {
            threads.truncate(i + 1);
            let mut regs = threads[i].1.clone();
            b.apply_effects(threads[i].0, context, |effect| regs.apply(effect, pos))?;
            best = Some(regs.spans(pos));
        }
        if pos == input.len() {
            break;
        }
        let symbol = ByteSet::byte(input[pos]);
        let mut next: Vec<(NodeId, Registers)> = Vec::new();
        for (state, regs) in threads {
            for (target, effects) in b.nfa_derivative_with_effects(state, symbol, context)? {
                if b.is_nothing(target) || next.iter().any(|(seen, _)| *seen == target) {
                    continue;
                }
                let mut regs = regs.clone();
                for effect in effects {
                    regs.apply(effect, pos);
                }
                next.push((target, regs));
            }
        }
        if next.is_empty() {
            break;
        }
        threads = next;
    }
    Ok(best)
}

#[rstest]
#[case("a?a", "aa", Some(2))]
#[case("a??a", "aa", Some(1))]
#[case("a*", "aaab", Some(3))]
#[case("a*?b", "aaab", Some(4))]
#[case("a|ab", "ab", Some(1))]
#[case("ab|a", "ab", Some(2))]
#[case("(a|ab)(c|bcd)", "abcd", Some(4))]
#[case("(a|ab)(c|bcd)d*", "abcdd", Some(5))]
#[case("a{2,3}", "aaaa", Some(3))]
#[case("a{2,3}?", "aaaa", Some(2))]
#[case("(ab)+?b", "ababb", Some(5))]
#[case("b|ab", "ab", Some(2))]
#[case("x", "ab", None)]
#[case("a\\b", "ab", None)]
#[case("a$", "a\n", Some(1))]
fn match_end_follows_backtracking_priority(
    #[case] pattern: &str,
    #[case] input: &str,
    #[case] expected: Option<usize>,
) {
    let mut b = builder();
    let root = compile(&mut b, pattern).unwrap();
    let got = Scanner::new(&mut b, root)
        .first_match_end(input.as_bytes())
        .unwrap();
    assert_eq!(got, expected, "{pattern} on {input:?}");
    let ast = Parser::new(pattern).parse().unwrap();
    assert_eq!(backtrack_end(&ast, input.as_bytes(), 0), expected);
}

#[rstest]
#[case("(a)(b)?", "ab", vec![Some((0, 2)), Some((0, 1)), Some((1, 2))])]
#[case("(a)(b)?", "a", vec![Some((0, 1)), Some((0, 1)), None])]
#[case("(a)(b)??", "ab", vec![Some((0, 1)), Some((0, 1)), None])]
#[case("(a*)(a)", "aaa", vec![Some((0, 3)), Some((0, 2)), Some((2, 3))])]
#[case("(a*?)(a)", "aaa", vec![Some((0, 1)), Some((0, 0)), Some((0, 1))])]
#[case("(a|ab)(c|bcd)", "abcd", vec![Some((0, 4)), Some((0, 1)), Some((1, 4))])]
#[case("(a)|(b)", "b", vec![Some((0, 1)), None, Some((0, 1))])]
#[case("(?:(a)|b)+", "ab", vec![Some((0, 2)), Some((0, 1))])]
fn effects_follow_the_committed_path(
    #[case] pattern: &str,
    #[case] input: &str,
    #[case] expected: Spans,
) {
    let mut b = builder();
    let root = compile(&mut b, pattern).unwrap();
    let groups = expected.len() - 1;
    let got = first_match_groups(&mut b, root, groups, input.as_bytes()).unwrap();
    assert_eq!(got, Some(expected), "{pattern} on {input:?}");
}

#[test]
fn failed_matches_have_no_groups() {
    let mut b = builder();
    let root = compile(&mut b, "(a)").unwrap();
    assert_eq!(first_match_groups(&mut b, root, 1, b"b").unwrap(), None);
}

#[rstest]
#[case("abc", Some(3))]
#[case("a(b|c)d", Some(3))]
#[case("(ab|cd){3}", Some(6))]
#[case("\\bx$", Some(1))]
#[case("a|bc", None)]
#[case("a*", None)]
#[case("a{2,3}", None)]
fn fixed_lengths(#[case] pattern: &str, #[case] expected: Option<u32>) {
    let mut b = builder();
    let root = compile(&mut b, pattern).unwrap();
    assert_eq!(b.get_fixed_length(root), expected, "{pattern}");
}

#[rstest]
#[case("^a", "a", true)]
#[case("^a", "ba", false)]
#[case("(?m)^a", "b\na", true)]
#[case("a$", "ba\n", true)]
#[case("a\\z", "ba\n", false)]
#[case("(?m)a$", "a\nb", true)]
#[case("\\bcat\\b", "a cat!", true)]
#[case("\\bcat\\b", "concat", false)]
#[case("\\Bcat", "concat", true)]
#[case("[0-9]{3}-[0-9]{4}", "call 555-1234", true)]
#[case("colou?r", "color", true)]
#[case("x(?:\\b)*y", "xy", true)]
#[case("x(?:\\b){1,2}y", "xy", false)]
#[case("(?:a\\b ?){2}", "a a", true)]
#[case("(?:a\\b ?){2}", "aa", false)]
#[case("(?m)(?:^a\n)+b", "a\na\nb", true)]
#[case("(\\w+) \\1x", "", false)]
fn search(#[case] pattern: &str, #[case] input: &str, #[case] expected: bool) {
    match symbolic_regex::is_match(input.as_bytes(), pattern) {
        Ok(got) => assert_eq!(got, expected, "{pattern} on {input:?}"),
        Err(err) => {
            assert!(!expected, "{pattern} failed: {err}");
            assert!(matches!(err, symbolic_regex::Error::Unsupported(_)));
        }
    }
}

#[test]
fn reversed_patterns_scan_backwards() {
    let mut b = builder();
    let root = compile(&mut b, "^ab+c$").unwrap();
    let reversed = b.reverse(root).unwrap();
    assert_eq!(b.pretty(reversed), "\\acb+a\\z");
    let mut scanner = Scanner::new(&mut b, reversed);
    assert!(scanner.accepts(b"cbba").unwrap());
    assert!(!scanner.accepts(b"abbc").unwrap());
}

#[test]
fn anchors_are_pruned_once_the_previous_kind_is_known() {
    let mut b = builder();
    let root = compile(&mut b, "\\Aa|\\bb").unwrap();
    let at_start = b
        .prune_anchors(root, CharKind::BeginningEnd, true, false)
        .unwrap();
    assert_eq!(at_start, root);
    let after_space = b.prune_anchors(root, CharKind::General, true, false).unwrap();
    assert_eq!(b.pretty(after_space), "\\bb");
    let after_letter = b
        .prune_anchors(root, CharKind::WordLetter, true, false)
        .unwrap();
    assert!(b.is_nothing(after_letter));
}

#[test]
fn contexts_classify_the_final_newline() {
    let input = b"a\n";
    assert_eq!(
        context_at(input, 1),
        Context::new(CharKind::WordLetter, CharKind::NewlineS)
    );
}
