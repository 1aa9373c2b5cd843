use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::ptr;

use log::{debug, trace};
use typed_arena::Arena;

/// A node owned by a [`RegexStorage`], or one of the two static units.
pub type Re<'a> = &'a Regex<'a>;

/// Cache keys compare nodes by address, never by structure.
type Identity<'a> = *const Regex<'a>;

static EMPTY: Regex<'static> = Regex {
    nullable: false,
    contents: RegexContents::Empty,
};

static EPSILON: Regex<'static> = Regex {
    nullable: true,
    contents: RegexContents::Epsilon,
};

/// Owns every compound node built for one family of regexes, along with the
/// interning caches that let identical constructor calls share one node.
///
/// Nodes never move or die while the storage is alive, so a node's address is
/// a stable identity for the caches.
pub struct RegexStorage<'a> {
    arena: Arena<Regex<'a>>,
    or_cache: RefCell<HashMap<(Identity<'a>, Identity<'a>), Re<'a>>>,
    concat_cache: RefCell<HashMap<(Identity<'a>, Identity<'a>), Re<'a>>>,
    star_cache: RefCell<HashMap<Identity<'a>, Re<'a>>>,
}

#[derive(Debug)]
pub struct Regex<'a> {
    nullable: bool,
    contents: RegexContents<'a>,
}

#[derive(Debug, Clone, Copy)]
pub enum RegexContents<'a> {
    Empty,
    Epsilon,
    Literal(u8),
    Or(Re<'a>, Re<'a>),
    Concat(Re<'a>, Re<'a>),
    Star(Re<'a>),
}

impl<'a> Regex<'a> {
    /// Does this regex accept the empty string?
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Is this the regex that accepts nothing at all?
    pub fn is_empty(&self) -> bool {
        matches!(self.contents, RegexContents::Empty)
    }

    pub fn contents(&self) -> RegexContents<'a> {
        self.contents
    }
}

impl<'a> RegexStorage<'a> {
    pub fn new() -> RegexStorage<'a> {
        RegexStorage {
            arena: Arena::new(),
            or_cache: RefCell::new(HashMap::new()),
            concat_cache: RefCell::new(HashMap::new()),
            star_cache: RefCell::new(HashMap::new()),
        }
    }

    /// Number of nodes allocated so far. The two units are not counted.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Does the _entire_ input match the regex?
    pub fn matches(&'a self, input: impl AsRef<[u8]>, regex: Re<'a>) -> bool {
        let input = input.as_ref();
        let mut regex = regex;
        for (i, &c) in input.iter().enumerate() {
            regex = self.derive(c, regex);
            trace!(
                "derived by {:?}: {} nodes allocated",
                c as char,
                self.node_count()
            );
            if regex.is_empty() {
                debug!("dead after {} of {} bytes", i + 1, input.len());
                return false;
            }
        }
        debug!(
            "consumed {} bytes, {} nodes allocated, nullable: {}",
            input.len(),
            self.node_count(),
            regex.nullable
        );
        regex.nullable
    }

    /// The Brzozowski derivative of `regex` by `c`: the regex accepting every
    /// `w` such that `regex` accepts `c` followed by `w`.
    pub fn derive(&'a self, c: u8, regex: Re<'a>) -> Re<'a> {
        use RegexContents::*;

        match regex.contents {
            Empty | Epsilon => self.empty(),
            Literal(c2) if c == c2 => self.epsilon(),
            Literal(_) => self.empty(),
            Or(x, y) => self.or(self.derive(c, x), self.derive(c, y)),
            Concat(x, y) if x.nullable => {
                self.or(self.concat(self.derive(c, x), y), self.derive(c, y))
            }
            Concat(x, y) => self.concat(self.derive(c, x), y),
            Star(x) => self.concat(self.derive(c, x), self.star(x)),
        }
    }

    pub fn empty(&self) -> Re<'a> {
        &EMPTY
    }

    pub fn epsilon(&self) -> Re<'a> {
        &EPSILON
    }

    /// Literals are not interned: every call allocates a fresh node.
    pub fn literal(&'a self, c: u8) -> Re<'a> {
        self.alloc(false, RegexContents::Literal(c))
    }

    pub fn or(&'a self, x: Re<'a>, y: Re<'a>) -> Re<'a> {
        use RegexContents::*;

        match (x.contents, y.contents) {
            (Empty, _) => y,
            (_, Empty) => x,
            _ if ptr::eq(x, y) => x,
            _ => intern(&self.or_cache, (identity(x), identity(y)), || {
                self.alloc(x.nullable || y.nullable, Or(x, y))
            }),
        }
    }

    pub fn concat(&'a self, x: Re<'a>, y: Re<'a>) -> Re<'a> {
        use RegexContents::*;

        match (x.contents, y.contents) {
            (Empty, _) | (_, Empty) => self.empty(),
            (Epsilon, _) => y,
            (_, Epsilon) => x,
            _ => intern(&self.concat_cache, (identity(x), identity(y)), || {
                self.alloc(x.nullable && y.nullable, Concat(x, y))
            }),
        }
    }

    pub fn star(&'a self, x: Re<'a>) -> Re<'a> {
        use RegexContents::*;

        match x.contents {
            Empty | Epsilon => self.epsilon(),
            Star(_) => x,
            _ => intern(&self.star_cache, identity(x), || self.alloc(true, Star(x))),
        }
    }

    /// Like [`or`](Self::or), but an absent operand yields the other one.
    pub fn or_opt(&'a self, x: Option<Re<'a>>, y: Option<Re<'a>>) -> Option<Re<'a>> {
        match (x, y) {
            (None, y) => y,
            (x, None) => x,
            (Some(x), Some(y)) => Some(self.or(x, y)),
        }
    }

    /// Like [`concat`](Self::concat), but an absent operand is a no-op rather
    /// than the empty language.
    pub fn concat_opt(&'a self, x: Option<Re<'a>>, y: Option<Re<'a>>) -> Option<Re<'a>> {
        match (x, y) {
            (None, y) => y,
            (x, None) => x,
            (Some(x), Some(y)) => Some(self.concat(x, y)),
        }
    }

    /// Like [`star`](Self::star); the star of nothing is epsilon.
    pub fn star_opt(&'a self, x: Option<Re<'a>>) -> Re<'a> {
        match x {
            None => self.epsilon(),
            Some(x) => self.star(x),
        }
    }

    fn alloc(&'a self, nullable: bool, contents: RegexContents<'a>) -> Re<'a> {
        self.arena.alloc(Regex { nullable, contents })
    }
}

impl<'a> Default for RegexStorage<'a> {
    fn default() -> Self {
        Self::new()
    }
}

fn identity<'a>(regex: Re<'a>) -> Identity<'a> {
    regex
}

fn intern<'a, K: Hash + Eq>(
    cache: &RefCell<HashMap<K, Re<'a>>>,
    key: K,
    build: impl FnOnce() -> Re<'a>,
) -> Re<'a> {
    *cache.borrow_mut().entry(key).or_insert_with(build)
}

impl fmt::Display for Regex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use RegexContents::*;

        match self.contents {
            Empty => write!(f, "∅"),
            Epsilon => write!(f, "ε"),
            Literal(c) => match c {
                b'|' | b'*' | b'+' | b'?' | b'(' | b')' | b'\\' => write!(f, "\\{}", c as char),
                _ => write!(f, "{}", c.escape_ascii()),
            },
            Or(x, y) => write!(f, "{}|{}", x, y),
            Concat(x, y) => {
                write_operand(f, x, matches!(x.contents, Or(..)))?;
                write_operand(f, y, matches!(y.contents, Or(..)))
            }
            Star(x) => {
                write_operand(f, x, !matches!(x.contents, Literal(_)))?;
                write!(f, "*")
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, regex: &Regex<'_>, grouped: bool) -> fmt::Result {
    if grouped {
        write!(f, "({})", regex)
    } else {
        write!(f, "{}", regex)
    }
}
