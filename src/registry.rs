//! Model pattern → rule set registry.
//!
//! Resolution order for a canonical identifier `provider/model`:
//!
//! 1. An exact pattern equal to the identifier, regardless of when it was registered.
//! 2. The most recently registered regex pattern that matches.
//! 3. A permissive empty rule set labelled with the input provider (logged as a warning).
//!
//! Register broad patterns before narrower ones: among regexes, the later
//! registration wins.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use regex::Regex;
use tracing::{debug, warn};

use crate::error::RegistryError;
use crate::model::ModelId;
use crate::providers;
use crate::rules::{ResolvedConstraints, RuleSet};

/// Key matched against the canonical identifier.
///
/// Regex patterns are keyed by identity: registering a clone of an existing
/// pattern replaces its entry, while a newly compiled regex with the same
/// source adds a new one.
#[derive(Debug, Clone)]
pub enum ModelPattern {
    Exact(String),
    Regex(Arc<Regex>),
}

impl ModelPattern {
    /// Exact pattern for a full `provider/model` string.
    pub fn exact(identifier: impl Into<String>) -> Self {
        ModelPattern::Exact(identifier.into())
    }

    /// Compile a regex pattern.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidPattern` if the regex does not compile.
    pub fn regex(source: &str) -> Result<Self, RegistryError> {
        Regex::new(source)
            .map(|re| ModelPattern::Regex(Arc::new(re)))
            .map_err(|source_err| RegistryError::InvalidPattern {
                pattern: source.to_string(),
                source: source_err,
            })
    }

    /// Whether this pattern selects `identifier`.
    pub fn matches(&self, identifier: &str) -> bool {
        match self {
            ModelPattern::Exact(s) => s == identifier,
            ModelPattern::Regex(re) => re.is_match(identifier),
        }
    }

    fn same_key(&self, other: &ModelPattern) -> bool {
        match (self, other) {
            (ModelPattern::Exact(a), ModelPattern::Exact(b)) => a == b,
            (ModelPattern::Regex(a), ModelPattern::Regex(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for ModelPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelPattern::Exact(s) => f.write_str(s),
            ModelPattern::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// What a pattern is bound to: a rule set, or the name of a built-in provider.
#[derive(Debug, Clone)]
pub enum RuleSource {
    Rules(Arc<RuleSet>),
    Alias(String),
}

impl From<RuleSet> for RuleSource {
    fn from(rules: RuleSet) -> Self {
        RuleSource::Rules(Arc::new(rules))
    }
}

impl From<Arc<RuleSet>> for RuleSource {
    fn from(rules: Arc<RuleSet>) -> Self {
        RuleSource::Rules(rules)
    }
}

impl From<&str> for RuleSource {
    fn from(alias: &str) -> Self {
        RuleSource::Alias(alias.to_string())
    }
}

/// Insertion-ordered store of pattern bindings.
#[derive(Debug, Clone, Default)]
pub struct ConstraintRegistry {
    entries: Vec<(ModelPattern, Arc<RuleSet>)>,
    /// Exact pattern → index into `entries`.
    exact: HashMap<String, usize>,
}

impl ConstraintRegistry {
    /// An empty registry: every model resolves to the permissive default.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with `^{name}/` bound to each built-in provider and alias.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let names = providers::PROVIDERS
            .iter()
            .copied()
            .chain(providers::ALIASES.iter().map(|(alias, _)| *alias));
        for name in names {
            // Every listed name has a rule set and escapes to a valid regex
            let rules = providers::builtin(name);
            let pattern = ModelPattern::regex(&format!("^{}/", regex::escape(name)));
            match (rules, pattern) {
                (Some(rules), Ok(pattern)) => registry.insert(pattern, rules),
                _ => debug_assert!(false, "built-in provider {name} could not be registered"),
            }
        }
        registry
    }

    /// Bind `pattern` to a rule set or built-in provider alias.
    ///
    /// Re-registering the same pattern replaces its rule set in place.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UnknownProvider` if an alias names no built-in provider.
    pub fn register(
        &mut self,
        pattern: ModelPattern,
        source: impl Into<RuleSource>,
    ) -> Result<(), RegistryError> {
        let rules = match source.into() {
            RuleSource::Rules(rules) => rules,
            RuleSource::Alias(name) => {
                providers::builtin(&name).ok_or_else(|| RegistryError::UnknownProvider {
                    name,
                    valid: providers::names().iter().map(|n| n.to_string()).collect(),
                })?
            }
        };
        self.insert(pattern, rules);
        Ok(())
    }

    fn insert(&mut self, pattern: ModelPattern, rules: Arc<RuleSet>) {
        debug!(%pattern, provider = %rules.provider, "registering rule set");
        if let Some(slot) = self.entries.iter_mut().find(|(p, _)| p.same_key(&pattern)) {
            slot.1 = rules;
            return;
        }
        if let ModelPattern::Exact(key) = &pattern {
            self.exact.insert(key.clone(), self.entries.len());
        }
        self.entries.push((pattern, rules));
    }

    /// Resolve a parsed model identifier to its rule set.
    ///
    /// Never fails: unmatched models get an empty rule set and a warning.
    pub fn resolve(&self, model: &ModelId) -> ResolvedConstraints {
        let canonical = model.canonical();

        if let Some(&index) = self.exact.get(&canonical) {
            let rules = &self.entries[index].1;
            debug!(model = %canonical, provider = %rules.provider, "exact match");
            return ResolvedConstraints::new(rules.provider.clone(), &model.model_id, rules.clone());
        }

        let matched = self.entries.iter().rev().find_map(|(pattern, rules)| match pattern {
            ModelPattern::Regex(re) if re.is_match(&canonical) => Some((pattern, rules)),
            _ => None,
        });
        if let Some((pattern, rules)) = matched {
            debug!(model = %canonical, %pattern, provider = %rules.provider, "pattern match");
            return ResolvedConstraints::new(rules.provider.clone(), &model.model_id, rules.clone());
        }

        warn!(
            provider = %model.provider,
            model = %model.model_id,
            "no constraints registered for model; schema will not be checked"
        );
        ResolvedConstraints::new(
            &model.provider,
            &model.model_id,
            Arc::new(RuleSet::new(&model.provider)),
        )
    }

    /// All bindings in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&ModelPattern, &Arc<RuleSet>)> {
        self.entries.iter().map(|(pattern, rules)| (pattern, rules))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Process-wide registry, seeded with the built-in providers.
///
/// Register at startup, before resolution begins.
pub fn global() -> &'static RwLock<ConstraintRegistry> {
    static GLOBAL: OnceLock<RwLock<ConstraintRegistry>> = OnceLock::new();
    GLOBAL.get_or_init(|| RwLock::new(ConstraintRegistry::with_builtins()))
}

/// Register on the process-wide registry.
///
/// # Errors
///
/// Returns `RegistryError::UnknownProvider` for an unrecognized alias.
pub fn register(
    pattern: ModelPattern,
    source: impl Into<RuleSource>,
) -> Result<(), RegistryError> {
    global()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(pattern, source)
}

/// Resolve against the process-wide registry.
pub fn resolve(model: &ModelId) -> ResolvedConstraints {
    global()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .resolve(model)
}
