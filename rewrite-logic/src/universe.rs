//! The universe is the concrete graph/action model a query is checked
//! against: a set of labeled identifiers and a list of rewriting
//! rules, each with a pregraph, a postgraph, and the action that takes
//! one to the other.
//!
//! Everything here is closed-world.  A relation holds exactly for the
//! listed facts, and the interpretation can only pick declared
//! identifiers.  Names are plain strings; the oracle interns them when
//! it grounds a formula.
use crate::Error;
use std::collections::{BTreeMap, BTreeSet};

/// Index of a rule in its `Universe`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RuleId(pub usize);

/// Which graph of a rule a relation reads.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Side {
    Pre,
    Post,
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum EffectKind {
    Parent,
    Link,
    Unlink,
}

/// One recorded edit, e.g., `link_action(a, b)`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Effect {
    pub kind: EffectKind,
    pub source: String,
    pub target: String,
}

impl Effect {
    pub fn parent(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(EffectKind::Parent, source, target)
    }

    pub fn link(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(EffectKind::Link, source, target)
    }

    pub fn unlink(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(EffectKind::Unlink, source, target)
    }

    fn new(kind: EffectKind, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
            target: target.into(),
        }
    }
}

/// A graph state: which identifiers it has, and the parent and link
/// edges between them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Graph {
    pub nodes: BTreeSet<String>,
    pub parents: BTreeSet<(String, String)>,
    pub links: BTreeSet<(String, String)>,
}

impl Graph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_node(mut self, name: impl Into<String>) -> Self {
        self.nodes.insert(name.into());
        self
    }

    /// `parent` has child `child`.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>, child: impl Into<String>) -> Self {
        self.parents.insert((parent.into(), child.into()));
        self
    }

    #[must_use]
    pub fn with_link(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.links.insert((source.into(), target.into()));
        self
    }

    fn names(&self) -> impl Iterator<Item = &String> {
        self.nodes.iter().chain(
            self.parents
                .iter()
                .chain(self.links.iter())
                .flat_map(|(x, y)| vec![x, y]),
        )
    }
}

/// The effect set of a rule's action.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Action {
    pub effects: BTreeSet<Effect>,
}

impl Action {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.insert(effect);
        self
    }

    fn names(&self) -> impl Iterator<Item = &String> {
        self.effects
            .iter()
            .flat_map(|effect| vec![&effect.source, &effect.target])
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RewriteRule {
    pub pregraph: Graph,
    pub postgraph: Graph,
    pub action: Action,
}

impl RewriteRule {
    #[must_use]
    pub fn new(pregraph: Graph, postgraph: Graph, action: Action) -> Self {
        Self {
            pregraph,
            postgraph,
            action,
        }
    }

    #[must_use]
    pub fn graph(&self, side: Side) -> &Graph {
        match side {
            Side::Pre => &self.pregraph,
            Side::Post => &self.postgraph,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Universe {
    // name -> label.
    identifiers: BTreeMap<String, String>,
    rules: Vec<RewriteRule>,
    ambient: Option<RuleId>,
}

impl Universe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares identifier `name` with label `label`.  Redeclaring
    /// with the same label is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `name` already carries a different label.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        label: impl Into<String>,
    ) -> Result<&mut Self, Error> {
        let (name, label) = (name.into(), label.into());

        match self.identifiers.get(&name) {
            Some(existing) if *existing != label => {
                return Err(Error::LabelConflict {
                    existing: existing.clone(),
                    requested: label,
                    name,
                })
            }
            Some(_) => {}
            None => {
                self.identifiers.insert(name, label);
            }
        }

        Ok(self)
    }

    /// Adds `rule` to the universe.  The first rule added becomes the
    /// ambient rule, unless `set_ambient` picked one already.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the rule mentions an undeclared identifier.
    pub fn add_rule(&mut self, rule: RewriteRule) -> Result<RuleId, Error> {
        let unknown = rule
            .pregraph
            .names()
            .chain(rule.postgraph.names())
            .chain(rule.action.names())
            .find(|name| !self.identifiers.contains_key(*name))
            .cloned();
        if let Some(unknown) = unknown {
            return Err(Error::UnknownIdentifier(unknown));
        }

        let id = RuleId(self.rules.len());
        self.rules.push(rule);
        if self.ambient.is_none() {
            self.ambient = Some(id);
        }

        Ok(id)
    }

    /// Picks the rule that leaves observe outside any rule scope.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `id` is not a rule of this universe.
    pub fn set_ambient(&mut self, id: RuleId) -> Result<(), Error> {
        if id.0 >= self.rules.len() {
            return Err(Error::UnknownRule(id.0));
        }

        self.ambient = Some(id);
        Ok(())
    }

    #[must_use]
    pub fn ambient(&self) -> Option<RuleId> {
        self.ambient
    }

    #[must_use]
    pub fn rule(&self, id: RuleId) -> Option<&RewriteRule> {
        self.rules.get(id.0)
    }

    pub fn rule_ids(&self) -> impl Iterator<Item = RuleId> {
        (0..self.rules.len()).map(RuleId)
    }

    #[must_use]
    pub fn num_rules(&self) -> usize {
        self.rules.len()
    }

    /// Iterates over `(name, label)` pairs, sorted by name.
    pub fn identifiers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.identifiers
            .iter()
            .map(|(name, label)| (name.as_str(), label.as_str()))
    }

    #[must_use]
    pub fn label_of(&self, name: &str) -> Option<&str> {
        self.identifiers.get(name).map(String::as_str)
    }
}

#[test]
fn test_declare_conflict() {
    let mut universe = Universe::new();

    universe.declare("mek", "kinase").expect("ok");
    universe.declare("mek", "kinase").expect("same label is fine");
    assert_eq!(
        universe.declare("mek", "phosphatase").map(|_| ()),
        Err(Error::LabelConflict {
            name: "mek".into(),
            existing: "kinase".into(),
            requested: "phosphatase".into(),
        })
    );
    assert_eq!(universe.label_of("mek"), Some("kinase"));
}

#[test]
fn test_add_rule_validates_names() {
    let mut universe = Universe::new();
    universe.declare("a", "agent").expect("ok");

    let bad = RewriteRule::new(
        Graph::new().with_node("a"),
        Graph::new().with_node("a"),
        Action::new().with_effect(Effect::link("a", "ghost")),
    );
    assert_eq!(
        universe.add_rule(bad),
        Err(Error::UnknownIdentifier("ghost".into()))
    );
    assert_eq!(universe.num_rules(), 0);
    assert_eq!(universe.ambient(), None);
}

#[test]
fn test_ambient_defaults_to_first_rule() {
    let mut universe = Universe::new();
    universe.declare("a", "agent").expect("ok");

    let first = universe
        .add_rule(RewriteRule::new(
            Graph::new().with_node("a"),
            Graph::new(),
            Action::new(),
        ))
        .expect("ok");
    let second = universe.add_rule(RewriteRule::default()).expect("ok");

    assert_eq!(universe.ambient(), Some(first));
    universe.set_ambient(second).expect("ok");
    assert_eq!(universe.ambient(), Some(second));
    assert_eq!(universe.set_ambient(RuleId(7)), Err(Error::UnknownRule(7)));
    assert_eq!(universe.rule_ids().collect::<Vec<_>>(), [first, second]);
}

#[test]
fn test_graph_side() {
    let rule = RewriteRule::new(
        Graph::new().with_node("a").with_parent("a", "b"),
        Graph::new().with_link("a", "b"),
        Action::new(),
    );

    assert!(rule.graph(Side::Pre).parents.contains(&("a".into(), "b".into())));
    assert!(rule.graph(Side::Post).links.contains(&("a".into(), "b".into())));
    assert!(rule.graph(Side::Post).nodes.is_empty());
}
