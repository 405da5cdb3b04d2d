//! Structural summary flags computed bottom up for every node.

bitflags::bitflags! {
    /// Packed flags describing a node's nullability, anchors, laziness and effects.
    ///
    /// The flags are a pure function of a node's kind and its children. The
    /// combinators below are the only way to build them for compound nodes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RegexInfo: u8 {
        /// Accepts the empty string in every context.
        const IS_ALWAYS_NULLABLE = 1;
        /// Begins with a line anchor (`^`, `$`, `\Z` or its reverse).
        const STARTS_WITH_LINE_ANCHOR = 2;
        /// The node is a lazy loop (or an all-lazy disjunction).
        const IS_LAZY_LOOP = 4;
        /// Accepts the empty string in at least one context.
        const CAN_BE_NULLABLE = 8;
        /// Contains an anchor somewhere.
        const CONTAINS_SOME_ANCHOR = 16;
        /// Some anchor may be reached at position zero.
        const STARTS_WITH_SOME_ANCHOR = 32;
        /// A backtracking engine would accept the empty match before consuming input.
        const IS_HIGH_PRIORITY_NULLABLE = 64;
        /// Contains an effect node.
        const CONTAINS_EFFECT = 128;
    }
}

impl RegexInfo {
    /// Normalizes implied bits: always-nullable implies can-be-nullable and
    /// any starts-with-anchor bit implies contains-anchor.
    pub fn normalized(self) -> Self {
        let mut info = self;
        if info.contains(Self::IS_ALWAYS_NULLABLE) {
            info |= Self::CAN_BE_NULLABLE;
        }
        if info.contains(Self::STARTS_WITH_LINE_ANCHOR) {
            info |= Self::STARTS_WITH_SOME_ANCHOR;
        }
        if info.contains(Self::STARTS_WITH_SOME_ANCHOR) {
            info |= Self::CONTAINS_SOME_ANCHOR;
        }
        info
    }

    pub fn is_nullable(self) -> bool {
        self.contains(Self::IS_ALWAYS_NULLABLE)
    }

    pub fn can_be_nullable(self) -> bool {
        self.contains(Self::CAN_BE_NULLABLE)
    }

    pub fn starts_with_line_anchor(self) -> bool {
        self.contains(Self::STARTS_WITH_LINE_ANCHOR)
    }

    pub fn starts_with_some_anchor(self) -> bool {
        self.contains(Self::STARTS_WITH_SOME_ANCHOR)
    }

    pub fn contains_some_anchor(self) -> bool {
        self.contains(Self::CONTAINS_SOME_ANCHOR)
    }

    pub fn is_lazy_loop(self) -> bool {
        self.contains(Self::IS_LAZY_LOOP)
    }

    pub fn is_high_priority_nullable(self) -> bool {
        self.contains(Self::IS_HIGH_PRIORITY_NULLABLE)
    }

    pub fn contains_effect(self) -> bool {
        self.contains(Self::CONTAINS_EFFECT)
    }

    /// Concatenation: nullability is conjunctive, anchors from the right side
    /// only count when the left side can be skipped.
    pub fn concat(left: Self, right: Self) -> Self {
        let mut info = Self::empty();
        info.set(
            Self::IS_ALWAYS_NULLABLE,
            left.is_nullable() && right.is_nullable(),
        );
        info.set(
            Self::CAN_BE_NULLABLE,
            left.can_be_nullable() && right.can_be_nullable(),
        );
        info.set(
            Self::STARTS_WITH_LINE_ANCHOR,
            left.starts_with_line_anchor()
                || (left.can_be_nullable() && right.starts_with_line_anchor()),
        );
        info.set(
            Self::STARTS_WITH_SOME_ANCHOR,
            left.starts_with_some_anchor()
                || (left.can_be_nullable() && right.starts_with_some_anchor()),
        );
        info.set(
            Self::CONTAINS_SOME_ANCHOR,
            left.contains_some_anchor() || right.contains_some_anchor(),
        );
        info.set(
            Self::IS_HIGH_PRIORITY_NULLABLE,
            left.is_high_priority_nullable() && right.is_high_priority_nullable(),
        );
        info.set(
            Self::CONTAINS_EFFECT,
            left.contains_effect() || right.contains_effect(),
        );
        info.normalized()
    }

    /// Ordered alternation: disjunctive, except that high priority
    /// nullability comes from the preferred (left) side alone.
    pub fn alternate(left: Self, right: Self) -> Self {
        let union = (left | right) - Self::IS_LAZY_LOOP - Self::IS_HIGH_PRIORITY_NULLABLE;
        let mut info = union;
        info.set(
            Self::IS_HIGH_PRIORITY_NULLABLE,
            left.is_high_priority_nullable(),
        );
        info.normalized()
    }

    /// Unordered disjunction. Laziness is conjunctive: the union is lazy only
    /// when every member is.
    pub fn or<I: IntoIterator<Item = Self>>(infos: I) -> Self {
        let mut lazy = Self::IS_LAZY_LOOP;
        let mut info = Self::empty();
        for member in infos {
            lazy &= member;
            info |= member;
        }
        ((info - Self::IS_LAZY_LOOP) | lazy).normalized()
    }

    /// Unordered conjunction. Nullability and laziness are conjunctive.
    pub fn and<I: IntoIterator<Item = Self>>(infos: I) -> Self {
        let nullable_bits = Self::IS_ALWAYS_NULLABLE | Self::CAN_BE_NULLABLE;
        let mut lazy = Self::IS_LAZY_LOOP;
        let mut nullable = nullable_bits;
        let mut info = Self::empty();
        for member in infos {
            lazy &= member;
            nullable &= member;
            info |= member;
        }
        let info = (info - Self::IS_LAZY_LOOP - nullable_bits) | lazy | nullable;
        // a conjunction can only be always nullable if it can be nullable at all
        if info.can_be_nullable() {
            info
        } else {
            info - Self::IS_ALWAYS_NULLABLE
        }
    }

    /// Loops inherit the body's anchors. A zero lower bound makes the loop
    /// nullable, and high priority nullable when lazy.
    pub fn looped(body: Self, lower: u32, lazy: bool) -> Self {
        let mut info = body;
        if lower == 0 {
            info |= Self::IS_ALWAYS_NULLABLE | Self::CAN_BE_NULLABLE;
            if lazy {
                info |= Self::IS_HIGH_PRIORITY_NULLABLE;
            }
        }
        info.set(Self::IS_LAZY_LOOP, lazy);
        info
    }

    /// Negation over-approximates nullability since context dependent
    /// nullability cannot be flipped statically.
    pub fn not(info: Self) -> Self {
        let mut negated = Self::empty();
        negated.set(Self::IS_ALWAYS_NULLABLE, !info.can_be_nullable());
        negated.set(Self::CAN_BE_NULLABLE, !info.is_nullable());
        negated.set(
            Self::STARTS_WITH_LINE_ANCHOR,
            info.starts_with_line_anchor(),
        );
        negated.set(Self::CONTAINS_SOME_ANCHOR, info.contains_some_anchor());
        negated.set(Self::IS_LAZY_LOOP, info.is_lazy_loop());
        negated.normalized()
    }

    pub fn effect(info: Self) -> Self {
        info | Self::CONTAINS_EFFECT
    }
}
