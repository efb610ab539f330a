use regex::{Regex, RegexBuilder};

/// A user-entered suppression pattern.
///
/// The pattern is searched across the whole message, case-sensitive, with `.`
/// matching newlines; `^` and `$` anchor to the message start and end. A
/// pattern that fails to compile matches nothing.
#[derive(Debug, Clone)]
pub struct FilterPattern {
    source: String,
    regex: Option<Regex>,
}

impl FilterPattern {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let regex = RegexBuilder::new(&source)
            .dot_matches_new_line(true)
            .build()
            .map_err(|err| {
                tracing::warn!(pattern = %source, error = %err, "invalid filter pattern ignored");
            })
            .ok();
        Self { source, regex }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_valid(&self) -> bool {
        self.regex.is_some()
    }

    pub fn matches(&self, message: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(message))
    }
}

/// Ordered, duplicate-free list of [`FilterPattern`]s.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    patterns: Vec<FilterPattern>,
}

impl FilterSet {
    /// Empty and repeated sources are dropped, first occurrence wins.
    pub fn from_sources<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = FilterSet::default();
        for source in sources {
            set.add(source);
        }
        set
    }

    /// Returns `false` (and changes nothing) for an empty or already present pattern.
    pub fn add(&mut self, source: impl Into<String>) -> bool {
        let source = source.into();
        if source.is_empty() || self.contains(&source) {
            return false;
        }
        self.patterns.push(FilterPattern::new(source));
        true
    }

    /// Removes by exact string match.
    pub fn remove(&mut self, source: &str) -> bool {
        let before = self.patterns.len();
        self.patterns.retain(|p| p.as_str() != source);
        self.patterns.len() != before
    }

    pub fn contains(&self, source: &str) -> bool {
        self.patterns.iter().any(|p| p.as_str() == source)
    }

    /// `true` when at least one pattern matches the message.
    pub fn excludes(&self, message: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(message))
    }

    pub fn sources(&self) -> Vec<String> {
        self.patterns.iter().map(|p| p.source.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn clear(&mut self) {
        self.patterns.clear();
    }
}
