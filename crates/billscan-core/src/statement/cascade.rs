//! Generic ordered rule cascade.

use regex::{Captures, Regex};
use tracing::{debug, trace};

use super::{ExtractionMatch, StatementText};
use crate::models::config::ExtractionConfig;

/// Which view of the statement text a rule matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Newlines flattened to spaces.
    Joined,
    /// Text as extracted, newlines intact.
    Raw,
}

/// Turns the first match of a pattern into a value.
pub type CaptureFn<T> = fn(&Captures<'_>, &ExtractionConfig) -> Option<T>;

/// Turns every match of a pattern, in source order, into a value.
pub type EveryFn<T> = fn(&[Captures<'_>], &ExtractionConfig) -> Option<T>;

/// Turns the first matches of two independent patterns into a value.
pub type PairFn<T> = fn(&Captures<'_>, &Captures<'_>, &ExtractionConfig) -> Option<T>;

/// How a rule inspects the text.
pub enum Matcher<T: 'static> {
    /// First match of one pattern.
    First(&'static Regex, CaptureFn<T>),
    /// All non-overlapping matches of one pattern.
    Every(&'static Regex, EveryFn<T>),
    /// First match of each of two patterns; both must match.
    Pair(&'static Regex, &'static Regex, PairFn<T>),
}

/// A named extraction rule.
pub struct Rule<T: 'static> {
    pub name: &'static str,
    pub scope: Scope,
    pub matcher: Matcher<T>,
    /// A pattern match ends the cascade even when no value comes of it.
    pub final_on_match: bool,
    /// Values this accepts are only used when no later rule yields one.
    pub defer: Option<fn(&T) -> bool>,
}

impl<T> Rule<T> {
    /// Rule on the first match of `pattern`.
    pub fn first(name: &'static str, pattern: &'static Regex, extract: CaptureFn<T>) -> Self {
        Self {
            name,
            scope: Scope::Joined,
            matcher: Matcher::First(pattern, extract),
            final_on_match: false,
            defer: None,
        }
    }

    /// Rule on every match of `pattern`.
    pub fn every(name: &'static str, pattern: &'static Regex, extract: EveryFn<T>) -> Self {
        Self {
            name,
            scope: Scope::Joined,
            matcher: Matcher::Every(pattern, extract),
            final_on_match: false,
            defer: None,
        }
    }

    /// Rule on two labels that may sit anywhere in the text.
    pub fn pair(
        name: &'static str,
        first: &'static Regex,
        second: &'static Regex,
        extract: PairFn<T>,
    ) -> Self {
        Self {
            name,
            scope: Scope::Joined,
            matcher: Matcher::Pair(first, second, extract),
            final_on_match: false,
            defer: None,
        }
    }

    /// Match against the text as extracted instead of the joined view.
    pub fn on_raw_text(mut self) -> Self {
        self.scope = Scope::Raw;
        self
    }

    /// Stop the cascade here once the pattern matches, whether or not its
    /// value parses.
    pub fn final_on_match(mut self) -> Self {
        self.final_on_match = true;
        self
    }

    /// Hold back values matching `weak` while later rules get a chance.
    pub fn defer_when(mut self, weak: fn(&T) -> bool) -> Self {
        self.defer = Some(weak);
        self
    }

    /// True when the rule's pattern (both patterns, for a pair) occurs.
    pub fn is_match(&self, text: &StatementText<'_>) -> bool {
        let haystack = text.view(self.scope);

        match &self.matcher {
            Matcher::First(pattern, _) | Matcher::Every(pattern, _) => pattern.is_match(haystack),
            Matcher::Pair(first, second, _) => first.is_match(haystack) && second.is_match(haystack),
        }
    }

    /// Evaluate the rule. A pattern that matches but whose value fails to
    /// parse or falls outside its bounds counts as no match.
    pub fn apply(&self, text: &StatementText<'_>, limits: &ExtractionConfig) -> Option<T> {
        let haystack = text.view(self.scope);

        match &self.matcher {
            Matcher::First(pattern, extract) => {
                let caps = pattern.captures(haystack)?;
                extract(&caps, limits)
            }
            Matcher::Every(pattern, extract) => {
                let all: Vec<Captures<'_>> = pattern.captures_iter(haystack).collect();
                if all.is_empty() {
                    return None;
                }
                extract(&all, limits)
            }
            Matcher::Pair(first, second, extract) => {
                let a = first.captures(haystack)?;
                let b = second.captures(haystack)?;
                extract(&a, &b, limits)
            }
        }
    }
}

/// Ordered rules for one field; the first rule yielding a value wins.
pub struct Cascade<T: 'static> {
    field: &'static str,
    rules: Vec<Rule<T>>,
}

impl<T> Cascade<T> {
    pub fn new(field: &'static str, rules: Vec<Rule<T>>) -> Self {
        Self { field, rules }
    }

    /// A cascade with no rules; never yields a value.
    pub fn empty(field: &'static str) -> Self {
        Self::new(field, Vec::new())
    }

    /// Evaluate rules in priority order.
    pub fn run(
        &self,
        text: &StatementText<'_>,
        limits: &ExtractionConfig,
    ) -> Option<ExtractionMatch<T>> {
        let mut held: Option<ExtractionMatch<T>> = None;

        for rule in &self.rules {
            if let Some(value) = rule.apply(text, limits) {
                if rule.defer.is_some_and(|weak| weak(&value)) {
                    trace!("{}: holding value from rule '{}'", self.field, rule.name);
                    held.get_or_insert(ExtractionMatch::new(value, rule.name));
                    continue;
                }
                debug!("{}: matched rule '{}'", self.field, rule.name);
                return Some(ExtractionMatch::new(value, rule.name));
            }
            if rule.final_on_match && rule.is_match(text) {
                debug!("{}: rule '{}' matched without a value, stopping", self.field, rule.name);
                return held;
            }
            trace!("{}: rule '{}' did not match", self.field, rule.name);
        }

        match &held {
            Some(found) => debug!("{}: falling back to rule '{}'", self.field, found.rule),
            None => debug!("{}: no rule matched", self.field),
        }
        held
    }

    /// Rule names in priority order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
