//! Thompson NFA regex matcher over a dense, alphabet-indexed transition
//! table.
//!
//! Based on Ken Thompson's classical construction as popularised by Russ
//! Cox's article <https://swtch.com/~rsc/regexp/regexp1.html>, with the
//! parser front end done by Dijkstra's shunting yard instead of a
//! recursive-descent grammar.
//!
//! # Architecture
//!
//! The pipeline is:
//!
//! ```text
//! pattern bytes ──tokenize──> tokens ──insert_concat──> tokens
//!     ──shunting_yard──> postfix Program
//!     ──fragment stack──> raw transitions
//!     ──finalize──> dense table + precomputed epsilon closures
//! ```
//!
//! Concatenation is implicit in the surface syntax but explicit (`.`) in
//! the token stream, so the shunting yard only ever sees binary and
//! postfix-unary operators with ordinary precedences.  The postfix
//! [`Program`] is evaluated with a stack of [`Fragment`]s, each a
//! two-endpoint partial NFA.  Every constructor allocates fresh boundary
//! states and never adds an edge into an argument fragment's entry or
//! out of its exit, which keeps the algebra compositional.
//!
//! ## State sets
//!
//! States are capped at [`MAX_STATES`] (64) so that a whole set of
//! states packs into one `u64` word (`StateSet`).  The finalizer turns
//! the raw transition log into a `states x symbols` table of state sets
//! and precomputes every state's epsilon closure; a simulation step is
//! then a handful of word ORs per active state.
//!
//! ## Matching semantics
//!
//! Acceptance is anchored at both ends: the entire input must be
//! consumed and the final state set must intersect the accept set.
//! There is no implicit `.*` wrapping and no leftmost-longest notion.
//!
//! ## Degradation policy
//!
//! [`Regex::new`] never fails.  A pattern with unbalanced parentheses, a
//! postfix sequence that does not reduce to a single fragment, or a
//! construction that overflows [`MAX_STATES`] degrades to the empty
//! program, which accepts exactly the empty input.  The intermediate
//! stages ([`Compiler::compile`]) report these conditions as typed
//! [`Error`]s for callers that want to observe them.

use std::fmt;
use std::io::Write;
use std::ops::{BitOr, BitOrAssign, Index};

use indexmap::IndexSet;
use log::debug;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// An error produced while lowering a pattern to an NFA.
///
/// The public [`Regex::new`] surface swallows these per the degradation
/// policy; they are observable through [`Compiler::compile`].
#[derive(Debug)]
pub enum Error {
    /// A `(` without a matching `)`, or the other way around.
    UnbalancedParens,
    /// The postfix program underflowed the fragment stack or left more
    /// than one fragment on it.
    MalformedProgram,
    /// Thompson's construction needed more states than [`MAX_STATES`].
    TooManyStates(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnbalancedParens => {
                write!(f, "unbalanced parentheses in pattern")
            }
            Self::MalformedProgram => {
                write!(f, "postfix program does not reduce to a single fragment")
            }
            Self::TooManyStates(count) => {
                write!(
                    f,
                    "pattern needs {} states but only {} are available",
                    count, MAX_STATES
                )
            }
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// The escape byte: the following pattern byte is taken verbatim.
const ESCAPE: u8 = b'\\';

/// Classification of a single pattern byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TokenKind {
    /// A literal byte, including operator bytes that were escaped.
    Operand,
    /// `*`, zero or more repetitions.
    KleeneStar,
    /// `+`, one or more repetitions.
    PositiveClosure,
    /// `?`, zero or one occurrence.
    Optional,
    /// `.`, explicit concatenation.
    Concat,
    /// `|`, alternation.
    Alternation,
    LParen,
    RParen,
}

impl TokenKind {
    /// Shunting-yard binding strength.  Operands and parentheses never
    /// enter the comparison.
    fn precedence(self) -> u8 {
        match self {
            TokenKind::KleeneStar | TokenKind::PositiveClosure | TokenKind::Optional => 3,
            TokenKind::Concat => 2,
            TokenKind::Alternation => 1,
            _ => 0,
        }
    }

    /// Whether a token of this kind can end a subexpression (the left
    /// side of an implicit concatenation).
    fn closes(self) -> bool {
        matches!(
            self,
            TokenKind::Operand
                | TokenKind::RParen
                | TokenKind::KleeneStar
                | TokenKind::PositiveClosure
                | TokenKind::Optional
        )
    }

    /// Whether a token of this kind can start a subexpression (the right
    /// side of an implicit concatenation).
    fn opens(self) -> bool {
        matches!(self, TokenKind::Operand | TokenKind::LParen)
    }
}

/// A single pattern token: the raw byte plus its classification.
///
/// Operators keep their canonical byte so the postfix form can be
/// rendered back out; an escaped byte is always an `Operand` no matter
/// what it would classify as on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Token {
    value: u8,
    kind: TokenKind,
}

impl Token {
    fn new(value: u8, kind: TokenKind) -> Self {
        Self { value, kind }
    }

    /// Classify one unescaped pattern byte.
    fn classify(byte: u8) -> Self {
        let kind = match byte {
            b'*' => TokenKind::KleeneStar,
            b'+' => TokenKind::PositiveClosure,
            b'?' => TokenKind::Optional,
            b'.' => TokenKind::Concat,
            b'|' => TokenKind::Alternation,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            _ => TokenKind::Operand,
        };
        Self::new(byte, kind)
    }
}

/// Lower pattern bytes to tokens, honouring the escape byte.
///
/// `\` followed by any byte yields a single `Operand` carrying that byte
/// verbatim.  A trailing `\` with nothing after it is kept as a literal
/// backslash operand.
fn tokenize(pattern: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut bytes = pattern.iter().copied();
    while let Some(byte) = bytes.next() {
        if byte == ESCAPE {
            match bytes.next() {
                Some(escaped) => tokens.push(Token::new(escaped, TokenKind::Operand)),
                None => tokens.push(Token::new(ESCAPE, TokenKind::Operand)),
            }
        } else {
            tokens.push(Token::classify(byte));
        }
    }
    tokens
}

/// Insert explicit concatenation operators between adjacent tokens where
/// the left one can end a subexpression and the right one can start one:
/// `a*b` becomes `a*.b`, while `a|b` is left untouched.
fn insert_concat(tokens: &[Token]) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len() * 2);
    for (i, &token) in tokens.iter().enumerate() {
        out.push(token);
        if let Some(&next) = tokens.get(i + 1) {
            if token.kind.closes() && next.kind.opens() {
                out.push(Token::new(b'.', TokenKind::Concat));
            }
        }
    }
    out
}

/// Dijkstra's shunting yard: infix tokens to postfix, parentheses
/// erased.
///
/// Every operator pops while the stack top is a non-paren operator of
/// greater or equal precedence.  The unary postfix operators share one
/// precedence bucket; nothing binds tighter, so they emit immediately
/// except when stacked on each other (`a**`), where the inner one pops
/// first and the result is an equivalent language.
fn shunting_yard(tokens: &[Token]) -> Result<Vec<Token>, Error> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Token> = Vec::new();

    for &token in tokens {
        match token.kind {
            TokenKind::Operand => output.push(token),

            TokenKind::KleeneStar
            | TokenKind::PositiveClosure
            | TokenKind::Optional
            | TokenKind::Concat
            | TokenKind::Alternation => {
                while let Some(&top) = stack.last() {
                    if top.kind == TokenKind::LParen
                        || top.kind.precedence() < token.kind.precedence()
                    {
                        break;
                    }
                    output.push(top);
                    stack.pop();
                }
                stack.push(token);
            }

            TokenKind::LParen => stack.push(token),

            TokenKind::RParen => loop {
                match stack.pop() {
                    Some(top) if top.kind == TokenKind::LParen => break,
                    Some(top) => output.push(top),
                    None => return Err(Error::UnbalancedParens),
                }
            },
        }
    }

    while let Some(top) = stack.pop() {
        if top.kind == TokenKind::LParen {
            return Err(Error::UnbalancedParens);
        }
        output.push(top);
    }

    Ok(output)
}

// ---------------------------------------------------------------------------
// Postfix program
// ---------------------------------------------------------------------------

/// A pattern lowered to postfix form: the unit of compilation and the
/// diagnostic render surface.
///
/// Contains only operand and non-paren operator tokens.  Evaluating the
/// sequence with the fragment algebra leaves exactly one fragment on the
/// stack; a sequence violating that is caught by [`Compiler::compile`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    items: Vec<Token>,
}

impl Program {
    /// Run the parser pipeline: tokenize, make concatenation explicit,
    /// convert to postfix.
    ///
    /// A pattern with unbalanced parentheses degrades to the empty
    /// program, which accepts only the empty input.
    pub fn parse(pattern: &[u8]) -> Program {
        let tokens = tokenize(pattern);
        let tokens = insert_concat(&tokens);
        match shunting_yard(&tokens) {
            Ok(items) => Program { items },
            Err(err) => {
                debug!(
                    "pattern {:?} degraded to the empty program: {}",
                    String::from_utf8_lossy(pattern),
                    err
                );
                Program::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Byte-exact postfix rendering: each token's value byte in order.
    pub fn postfix(&self) -> Vec<u8> {
        self.items.iter().map(|item| item.value).collect()
    }
}

/// Lossy text rendering of the postfix form, for diagnostics.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.postfix()))
    }
}

// ---------------------------------------------------------------------------
// State ids and bit-set state sets
// ---------------------------------------------------------------------------

/// Hard cap on NFA states, chosen so a state set fits one 64-bit word.
pub const MAX_STATES: usize = 64;

/// Index of a single NFA state, in `[0, MAX_STATES)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct StateId(u32);

impl StateId {
    #[inline]
    fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A set of NFA states packed into one `u64`; bit `i` is state `i`.
///
/// This is the currency of the whole back end: transition-table cells,
/// epsilon closures, the accept set and the simulator's active frontier
/// are all `StateSet`s, so set union is a single word OR.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
struct StateSet(u64);

impl StateSet {
    const EMPTY: Self = Self(0);

    fn single(state: StateId) -> Self {
        Self(1 << state.0)
    }

    #[inline]
    fn contains(self, state: StateId) -> bool {
        self.0 & (1 << state.0) != 0
    }

    #[inline]
    fn insert(&mut self, state: StateId) {
        self.0 |= 1 << state.0;
    }

    #[inline]
    fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether the two sets share at least one state.
    #[inline]
    fn intersects(self, other: StateSet) -> bool {
        self.0 & other.0 != 0
    }

    /// Remove and return the lowest-numbered member, or `None` when
    /// empty.  Drives the worklist loop in closure computation.
    fn pop(&mut self) -> Option<StateId> {
        if self.0 == 0 {
            return None;
        }
        let state = StateId(self.0.trailing_zeros());
        self.0 &= self.0 - 1;
        Some(state)
    }

    /// Iterate the member states in increasing order.
    fn iter(self) -> StateSetIter {
        StateSetIter(self)
    }
}

impl BitOr for StateSet {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for StateSet {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// `{0, 3, 5}`-style rendering instead of a raw bit pattern.
impl fmt::Debug for StateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|s| s.0)).finish()
    }
}

struct StateSetIter(StateSet);

impl Iterator for StateSetIter {
    type Item = StateId;

    fn next(&mut self) -> Option<StateId> {
        self.0.pop()
    }
}

/// `closures[state]`: typed access to per-state set arrays.
impl Index<StateId> for [StateSet] {
    type Output = StateSet;

    #[inline]
    fn index(&self, idx: StateId) -> &StateSet {
        &self[idx.idx()]
    }
}

// ---------------------------------------------------------------------------
// Alphabet
// ---------------------------------------------------------------------------

/// The byte reserved for spontaneous (epsilon) transitions.
const EPSILON: u8 = 0;

/// Column index into the transition table; column 0 is always epsilon.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ColIdx(usize);

impl ColIdx {
    const EPSILON: Self = Self(0);

    #[inline]
    fn idx(self) -> usize {
        self.0
    }
}

/// Insertion-ordered registry of the bytes a pattern actually uses.
///
/// One [`IndexSet`] provides both directions of the mapping: iteration
/// order is column order, and `get_index_of` is the byte-to-column
/// lookup.  The epsilon byte occupies column 0 from construction, so
/// inserting it again (or re-inserting any present byte) is a no-op.
#[derive(Clone, Debug)]
struct Alphabet {
    symbols: IndexSet<u8>,
}

impl Alphabet {
    fn new() -> Self {
        let mut symbols = IndexSet::new();
        symbols.insert(EPSILON);
        Self { symbols }
    }

    /// Register a byte, allocating the next column if it is new.
    fn add_symbol(&mut self, byte: u8) {
        self.symbols.insert(byte);
    }

    /// Column for a byte, or `None` if the byte never occurs in the
    /// pattern.
    #[inline]
    fn col(&self, byte: u8) -> Option<ColIdx> {
        self.symbols.get_index_of(&byte).map(ColIdx)
    }

    /// Byte stored at a column (epsilon at column 0).
    fn symbol(&self, col: ColIdx) -> Option<u8> {
        self.symbols.get_index(col.0).copied()
    }

    /// Number of columns, epsilon included.
    fn len(&self) -> usize {
        self.symbols.len()
    }
}

// ---------------------------------------------------------------------------
// State arena and the fragment algebra
// ---------------------------------------------------------------------------

/// A raw transition as recorded during construction: `from` consumes
/// `byte` (or epsilon) to reach `to`.  Duplicates are allowed; the
/// finalizer ORs them into the same table cell.
#[derive(Clone, Copy, Debug)]
struct Transition {
    from: StateId,
    byte: u8,
    to: StateId,
}

/// A partial NFA with exactly one entry and one accept state.
///
/// Invariant: no constructor ever adds a transition into an argument
/// fragment's `start` or out of its `end`; new epsilon edges always
/// touch freshly allocated boundary states.
#[derive(Clone, Copy, Debug)]
struct Fragment {
    start: StateId,
    end: StateId,
}

/// Allocates state ids and accumulates the append-only transition log
/// (plus the alphabet) while fragments are wired together.
///
/// Ids are contiguous from zero.  Allocation itself never fails; the
/// [`MAX_STATES`] cap is enforced once, before finalization.
#[derive(Debug)]
struct StateArena {
    next_id: u32,
    transitions: Vec<Transition>,
    alphabet: Alphabet,
}

impl StateArena {
    fn new() -> Self {
        Self {
            next_id: 0,
            transitions: Vec::new(),
            alphabet: Alphabet::new(),
        }
    }

    fn state(&mut self) -> StateId {
        let id = StateId(self.next_id);
        self.next_id += 1;
        id
    }

    fn len(&self) -> usize {
        self.next_id as usize
    }

    /// Record `from --byte--> to` and register the byte in the alphabet.
    fn transition(&mut self, from: StateId, byte: u8, to: StateId) {
        self.transitions.push(Transition { from, byte, to });
        self.alphabet.add_symbol(byte);
    }

    /// `start --byte--> end`.
    fn literal(&mut self, byte: u8) -> Fragment {
        let start = self.state();
        let end = self.state();
        self.transition(start, byte, end);
        Fragment { start, end }
    }

    /// `a` then `b`: one epsilon edge from `a.end` to `b.start`.
    fn concat(&mut self, a: Fragment, b: Fragment) -> Fragment {
        self.transition(a.end, EPSILON, b.start);
        Fragment {
            start: a.start,
            end: b.end,
        }
    }

    /// `a | b`: a fresh entry fans out to both branches and a fresh exit
    /// collects both ends.
    fn alternate(&mut self, a: Fragment, b: Fragment) -> Fragment {
        let start = self.state();
        let end = self.state();
        self.transition(start, EPSILON, a.start);
        self.transition(start, EPSILON, b.start);
        self.transition(a.end, EPSILON, end);
        self.transition(b.end, EPSILON, end);
        Fragment { start, end }
    }

    /// `a+`: loop back from `a.end` to `a.start`, at least one pass.
    fn one_or_more(&mut self, a: Fragment) -> Fragment {
        let start = self.state();
        let end = self.state();
        self.transition(start, EPSILON, a.start);
        self.transition(a.end, EPSILON, a.start);
        self.transition(a.end, EPSILON, end);
        Fragment { start, end }
    }

    /// `a*`: the positive closure plus an epsilon bypass for the empty
    /// match.
    fn zero_or_more(&mut self, a: Fragment) -> Fragment {
        let frag = self.one_or_more(a);
        self.transition(frag.start, EPSILON, frag.end);
        frag
    }

    /// `a?`: an epsilon bypass, no loop.
    fn zero_or_one(&mut self, a: Fragment) -> Fragment {
        let start = self.state();
        let end = self.state();
        self.transition(start, EPSILON, a.start);
        self.transition(start, EPSILON, end);
        self.transition(a.end, EPSILON, end);
        Fragment { start, end }
    }
}

// ---------------------------------------------------------------------------
// Postfix compiler
// ---------------------------------------------------------------------------

/// Evaluates a postfix [`Program`] with a fragment stack and finalizes
/// the result into a dense [`Nfa`].
///
/// Reusable across compilations; internal buffers are cleared by
/// [`compile`](Self::compile).
#[derive(Debug, Default)]
pub struct Compiler {
    stack: Vec<Fragment>,
}

impl Compiler {
    /// Compile a postfix program into a ready-to-match [`Nfa`].
    ///
    /// The zero-token program compiles to the empty automaton, which
    /// accepts exactly the empty input.  A program that underflows the
    /// fragment stack or leaves more than one fragment is rejected with
    /// [`Error::MalformedProgram`]; a construction that needs more than
    /// [`MAX_STATES`] states with [`Error::TooManyStates`].
    pub fn compile(&mut self, program: &Program) -> Result<Nfa, Error> {
        self.stack.clear();
        let mut arena = StateArena::new();

        for &item in &program.items {
            let frag = match item.kind {
                TokenKind::Operand => arena.literal(item.value),
                TokenKind::Concat => {
                    let b = self.stack.pop().ok_or(Error::MalformedProgram)?;
                    let a = self.stack.pop().ok_or(Error::MalformedProgram)?;
                    arena.concat(a, b)
                }
                TokenKind::Alternation => {
                    let b = self.stack.pop().ok_or(Error::MalformedProgram)?;
                    let a = self.stack.pop().ok_or(Error::MalformedProgram)?;
                    arena.alternate(a, b)
                }
                TokenKind::KleeneStar => {
                    let a = self.stack.pop().ok_or(Error::MalformedProgram)?;
                    arena.zero_or_more(a)
                }
                TokenKind::PositiveClosure => {
                    let a = self.stack.pop().ok_or(Error::MalformedProgram)?;
                    arena.one_or_more(a)
                }
                TokenKind::Optional => {
                    let a = self.stack.pop().ok_or(Error::MalformedProgram)?;
                    arena.zero_or_one(a)
                }
                // The shunting yard never emits parentheses.
                TokenKind::LParen | TokenKind::RParen => {
                    return Err(Error::MalformedProgram);
                }
            };
            self.stack.push(frag);
        }

        let Some(last) = self.stack.pop() else {
            return Ok(Nfa::empty());
        };
        if !self.stack.is_empty() {
            return Err(Error::MalformedProgram);
        }
        if arena.len() > MAX_STATES {
            return Err(Error::TooManyStates(arena.len()));
        }

        debug!(
            "compiled {} postfix tokens into {} states over {} symbols",
            program.len(),
            arena.len(),
            arena.alphabet.len()
        );

        Ok(Nfa::finalize(last, arena))
    }
}

// ---------------------------------------------------------------------------
// Compiled automaton
// ---------------------------------------------------------------------------

/// A compiled automaton: dense `state x symbol` transition table plus
/// per-state epsilon closures, ready for subset simulation.
///
/// Immutable after construction and safe to share across concurrent
/// readers; matching performs no allocation.
#[derive(Clone, Debug)]
pub struct Nfa {
    start: StateId,
    /// Exactly one bit set after compilation: the final fragment's end.
    accept: StateSet,
    alphabet: Alphabet,
    /// Row-major `states x alphabet.len()` table of successor sets.
    table: Box<[StateSet]>,
    /// `closures[s]`: states reachable from `s` by epsilon edges alone,
    /// `s` included.
    closures: Box<[StateSet]>,
    states: usize,
}

impl Nfa {
    /// The automaton of the zero-token program: a single state that is
    /// both entry and accept, with no consuming transitions.
    fn empty() -> Self {
        let origin = StateId(0);
        Self {
            start: origin,
            accept: StateSet::single(origin),
            alphabet: Alphabet::new(),
            table: vec![StateSet::EMPTY].into_boxed_slice(),
            closures: vec![StateSet::single(origin)].into_boxed_slice(),
            states: 1,
        }
    }

    /// Pack the raw transition log into the dense table and precompute
    /// every state's epsilon closure.
    fn finalize(fragment: Fragment, arena: StateArena) -> Self {
        let states = arena.len();
        let cols = arena.alphabet.len();
        let mut table = vec![StateSet::EMPTY; states * cols].into_boxed_slice();

        for t in &arena.transitions {
            // Every recorded byte was interned by `transition`.
            let col = arena.alphabet.col(t.byte).unwrap();
            table[t.from.idx() * cols + col.idx()].insert(t.to);
        }

        let closures = (0..states)
            .map(|s| Self::epsilon_closure(&table, cols, StateId(s as u32)))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Nfa {
            start: fragment.start,
            accept: StateSet::single(fragment.end),
            alphabet: arena.alphabet,
            table,
            closures,
            states,
        }
    }

    /// Fixed-point expansion of epsilon reachability from `origin`,
    /// `origin` included.
    fn epsilon_closure(table: &[StateSet], cols: usize, origin: StateId) -> StateSet {
        let mut closure = StateSet::EMPTY;
        let mut pending = StateSet::single(origin);
        while let Some(state) = pending.pop() {
            if closure.contains(state) {
                continue;
            }
            closure.insert(state);
            pending |= table[state.idx() * cols + ColIdx::EPSILON.idx()];
        }
        closure
    }

    /// Successor set of `state` on column `col`.
    #[inline]
    fn transitions(&self, state: StateId, col: ColIdx) -> StateSet {
        self.table[state.idx() * self.alphabet.len() + col.idx()]
    }

    /// Number of states in the automaton.
    pub fn state_count(&self) -> usize {
        self.states
    }

    /// Subset simulation, anchored at both ends: the whole input must be
    /// consumed and the final frontier must intersect the accept set.
    pub fn is_match(&self, input: &[u8]) -> bool {
        let mut current = self.closures[self.start];

        for &byte in input {
            // A byte the pattern never mentions cannot be consumed by
            // any state.
            let Some(col) = self.alphabet.col(byte) else {
                return false;
            };

            let mut next = StateSet::EMPTY;
            for state in current.iter() {
                next |= self.transitions(state, col);
            }

            let mut expanded = StateSet::EMPTY;
            for state in next.iter() {
                expanded |= self.closures[state];
            }

            current = expanded;
            if current.is_empty() {
                return false;
            }
        }

        current.intersects(self.accept)
    }

    /// Emit a Graphviz DOT representation of the automaton.
    pub fn to_dot(&self, mut buffer: impl Write) {
        writeln!(buffer, "digraph graphname {{").unwrap();
        writeln!(buffer, "\trankdir=LR;").unwrap();
        writeln!(buffer, "\t{} [shape=box];", self.start).unwrap();
        for state in self.accept.iter() {
            writeln!(buffer, "\t{} [peripheries=2];", state).unwrap();
        }
        for s in 0..self.states {
            let from = StateId(s as u32);
            for c in 0..self.alphabet.len() {
                let col = ColIdx(c);
                for to in self.transitions(from, col).iter() {
                    let label = match self.alphabet.symbol(col) {
                        Some(EPSILON) | None => "eps".to_string(),
                        Some(byte) => (byte as char).escape_default().to_string(),
                    };
                    writeln!(buffer, "\t{} -> {} [label=\"{}\"];", from, to, label).unwrap();
                }
            }
        }
        writeln!(buffer, "}}").unwrap();
    }

    /// Total memory footprint (in bytes) of the compiled automaton,
    /// inline struct plus heap allocations.
    pub fn memory_size(&self) -> usize {
        let inline = std::mem::size_of::<Self>();
        let table_alloc = self.table.len() * std::mem::size_of::<StateSet>();
        let closures_alloc = self.closures.len() * std::mem::size_of::<StateSet>();
        let alphabet_alloc = self.alphabet.len() * std::mem::size_of::<u8>();
        inline + table_alloc + closures_alloc + alphabet_alloc
    }
}

// ---------------------------------------------------------------------------
// Public regex handle
// ---------------------------------------------------------------------------

/// A pattern compiled down to its postfix program and automaton.
///
/// Construction never fails: a malformed or oversized pattern degrades
/// to the empty program, which accepts only the empty input.
#[derive(Debug)]
pub struct Regex {
    program: Program,
    nfa: Nfa,
}

impl Regex {
    pub fn new(pattern: &[u8]) -> Regex {
        let program = Program::parse(pattern);
        let mut compiler = Compiler::default();
        match compiler.compile(&program) {
            Ok(nfa) => Regex { program, nfa },
            Err(err) => {
                debug!(
                    "pattern {:?} degraded to the empty program: {}",
                    String::from_utf8_lossy(pattern),
                    err
                );
                Regex {
                    program: Program::default(),
                    nfa: Nfa::empty(),
                }
            }
        }
    }

    /// Anchored match over the whole input.
    pub fn is_match(&self, input: &[u8]) -> bool {
        self.nfa.is_match(input)
    }

    /// The postfix program this pattern compiled to.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// The compiled automaton.
    pub fn nfa(&self) -> &Nfa {
        &self.nfa
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
