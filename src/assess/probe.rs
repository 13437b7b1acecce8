//! Declarative text probes used by the check table.
//!
//! A [`Probe`] is a small predicate over a file's text. Probes are plain
//! `'static` data so check descriptors can be written as a table.

use super::syntax;
use regex::Regex;
use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;

/// File content plus a lazily built code-only view
#[derive(Debug)]
pub struct SourceText {
    raw: String,
    code: OnceCell<String>,
}

impl SourceText {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            code: OnceCell::new(),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Text with comments and string contents blanked
    pub fn code(&self) -> &str {
        self.code.get_or_init(|| syntax::code_only(&self.raw))
    }

    pub fn line_count(&self) -> usize {
        self.raw.lines().count()
    }
}

/// Predicate over source text
#[derive(Debug, Clone, Copy)]
pub enum Probe {
    /// Literal substring of the raw text
    Contains(&'static str),
    /// Regex over the raw text
    Matches(&'static str),
    /// Regex over the code-only view
    CodeMatches(&'static str),
    /// Literal occurs more than `n` times
    OccursMoreThan(&'static str, usize),
    /// Regex matches at least `n` times
    MatchesAtLeast(&'static str, usize),
    /// First regex matches more often than the second
    Outnumbers(&'static str, &'static str),
    /// At least `n` of the probes hold
    AtLeast(usize, &'static [Probe]),
    AnyOf(&'static [Probe]),
    AllOf(&'static [Probe]),
    Not(&'static Probe),
}

impl Probe {
    pub fn holds(&self, source: &SourceText) -> bool {
        match *self {
            Probe::Contains(needle) => source.raw().contains(needle),
            Probe::Matches(pattern) => is_match(pattern, source.raw()),
            Probe::CodeMatches(pattern) => is_match(pattern, source.code()),
            Probe::OccursMoreThan(needle, n) => source.raw().matches(needle).count() > n,
            Probe::MatchesAtLeast(pattern, n) => count_matches(pattern, source.raw()) >= n,
            Probe::Outnumbers(subject, reference) => {
                count_matches(subject, source.raw()) > count_matches(reference, source.raw())
            }
            Probe::AtLeast(n, probes) => probes.iter().filter(|p| p.holds(source)).count() >= n,
            Probe::AnyOf(probes) => probes.iter().any(|p| p.holds(source)),
            Probe::AllOf(probes) => probes.iter().all(|p| p.holds(source)),
            Probe::Not(probe) => !probe.holds(source),
        }
    }

    /// Every regex pattern referenced by this probe
    pub fn patterns(&self) -> Vec<&'static str> {
        match *self {
            Probe::Matches(p) | Probe::CodeMatches(p) | Probe::MatchesAtLeast(p, _) => vec![p],
            Probe::Outnumbers(a, b) => vec![a, b],
            Probe::AtLeast(_, probes) | Probe::AnyOf(probes) | Probe::AllOf(probes) => {
                probes.iter().flat_map(|p| p.patterns()).collect()
            }
            Probe::Not(probe) => probe.patterns(),
            Probe::Contains(_) | Probe::OccursMoreThan(..) => Vec::new(),
        }
    }
}

thread_local! {
    static REGEX_CACHE: RefCell<HashMap<&'static str, Option<Regex>>> = RefCell::new(HashMap::new());
}

/// Compile (once per thread) and hand back a pattern
pub fn compiled(pattern: &'static str) -> Option<Regex> {
    REGEX_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .entry(pattern)
            .or_insert_with(|| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    log::error!("Invalid check pattern {:?}: {}", pattern, e);
                    None
                }
            })
            .clone()
    })
}

pub fn is_match(pattern: &'static str, text: &str) -> bool {
    compiled(pattern).is_some_and(|re| re.is_match(text))
}

pub fn count_matches(pattern: &'static str, text: &str) -> usize {
    compiled(pattern).map_or(0, |re| re.find_iter(text).count())
}
