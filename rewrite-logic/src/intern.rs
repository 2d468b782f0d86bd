//! Interning maps the outside world's values (identifier names,
//! labels) to opaque solver-level keys, and mints the logical
//! variables and rule binders a query talks about.
//!
//! Each `Interner` is private to one query: the same name always
//! yields the same key within an interner, but keys and tags from two
//! interners are unrelated.  Tags only ever grow, so a variable or
//! binder is never reused within a query.
use lasso::{Key, Rodeo, Spur};
use std::cmp::Ordering;
use std::fmt;

/// A logical placeholder for a graph node.  Variables are compared by
/// tag only; what node a variable denotes is up to the oracle's
/// choice of interpretation.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Variable(u32);

impl Variable {
    #[inline]
    pub(crate) fn tag(self) -> u32 {
        self.0
    }
}

/// The tag of a rule bound by an existential quantifier.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RuleBinder(u32);

impl fmt::Display for RuleBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?r{}", self.0)
    }
}

macro_rules! interned_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub struct $name(Spur);

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.into_usize().cmp(&other.0.into_usize())
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }
    };
}

interned_key!(
    /// An opaque graph node token.
    Identifier
);

interned_key!(
    /// An opaque node label.
    Label
);

pub struct Interner {
    symbols: Rodeo,
    next_variable: u32,
    next_rule: u32,
}

impl Interner {
    #[must_use]
    pub fn new() -> Self {
        Self {
            symbols: Rodeo::default(),
            next_variable: 0,
            next_rule: 0,
        }
    }

    /// Returns a variable whose tag no earlier call returned.
    pub fn fresh_variable(&mut self) -> Variable {
        let ret = Variable(self.next_variable);
        self.next_variable += 1;
        ret
    }

    /// Returns `count` fresh variables.
    pub fn fresh_variables(&mut self, count: usize) -> Vec<Variable> {
        (0..count).map(|_| self.fresh_variable()).collect()
    }

    /// Returns a rule binder whose tag no earlier call returned.
    pub fn fresh_rule(&mut self) -> RuleBinder {
        let ret = RuleBinder(self.next_rule);
        self.next_rule += 1;
        ret
    }

    pub fn identifier(&mut self, name: &str) -> Identifier {
        Identifier(self.symbols.get_or_intern(name))
    }

    pub fn label(&mut self, label: &str) -> Label {
        Label(self.symbols.get_or_intern(label))
    }

    #[must_use]
    pub fn identifier_name(&self, id: Identifier) -> &str {
        self.symbols.resolve(&id.0)
    }

    #[must_use]
    pub fn label_name(&self, label: Label) -> &str {
        self.symbols.resolve(&label.0)
    }

    /// Every variable minted so far, in minting order.
    pub(crate) fn variables(&self) -> impl Iterator<Item = Variable> {
        (0..self.next_variable).map(Variable)
    }

    /// Number of variables minted so far.
    #[must_use]
    pub fn num_variables(&self) -> usize {
        self.next_variable as usize
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[test]
fn test_fresh_variables() {
    let mut interner = Interner::new();

    let x = interner.fresh_variable();
    let y = interner.fresh_variable();
    assert_ne!(x, y);
    assert!(x.tag() < y.tag());

    let more = interner.fresh_variables(3);
    assert!(more.iter().all(|v| v.tag() > y.tag()));
    assert_eq!(interner.num_variables(), 5);
}

#[test]
fn test_fresh_rules() {
    let mut interner = Interner::new();

    let r = interner.fresh_rule();
    let s = interner.fresh_rule();
    assert_ne!(r, s);
    assert_eq!(r.to_string(), "?r0");
    assert_eq!(s.to_string(), "?r1");
}

#[test]
fn test_interning_is_deterministic() {
    let mut interner = Interner::new();

    let a = interner.identifier("a");
    let b = interner.identifier("b");
    assert_eq!(a, interner.identifier("a"));
    assert_ne!(a, b);
    assert_eq!(interner.identifier_name(b), "b");

    let kinase = interner.label("kinase");
    assert_eq!(kinase, interner.label("kinase"));
    assert_eq!(interner.label_name(kinase), "kinase");
}

#[test]
fn test_interners_are_independent() {
    // Tags restart from zero in a new interner: nothing leaks across
    // queries.
    let mut first = Interner::new();
    let mut second = Interner::new();

    first.fresh_variables(4);
    assert_eq!(second.fresh_variable().tag(), 0);
    assert_eq!(first.fresh_variable().tag(), 4);
}
