//! Property paths
//!
//! A path addresses a location inside an item's nested properties. It is a
//! sequence of literal keys plus the wildcard `*`, which appends a new
//! element to a sequence.

use std::fmt;

/// Wildcard segment text
pub const APPEND: &str = "*";

/// One step of a property path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A mapping key, or a position when applied to a sequence
    Key(String),
    /// Append a new element to a sequence
    Append,
}

impl Segment {
    pub fn key(key: impl Into<String>) -> Self {
        Segment::Key(key.into())
    }

    pub fn is_append(&self) -> bool {
        matches!(self, Segment::Append)
    }

    /// The key parsed as a sequence position
    pub fn position(&self) -> Option<usize> {
        match self {
            Segment::Key(key) => key.parse().ok(),
            Segment::Append => None,
        }
    }
}

impl From<&str> for Segment {
    fn from(raw: &str) -> Self {
        if raw == APPEND {
            Segment::Append
        } else {
            Segment::Key(raw.to_string())
        }
    }
}

impl From<String> for Segment {
    fn from(raw: String) -> Self {
        if raw == APPEND {
            Segment::Append
        } else {
            Segment::Key(raw)
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Append => f.write_str(APPEND),
        }
    }
}

/// An ordered sequence of segments
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Split a dotted string into segments
    ///
    /// The empty string is the empty path; otherwise every dot separates a
    /// segment, so `"a..b"` contains an empty key.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::default();
        }
        Self::new(raw.split('.').map(Segment::from).collect())
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// A new path with `segment` appended
    pub fn join(&self, segment: impl Into<Segment>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.segments.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

impl From<&str> for Path {
    fn from(raw: &str) -> Self {
        Path::parse(raw)
    }
}

impl From<String> for Path {
    fn from(raw: String) -> Self {
        Path::parse(&raw)
    }
}

impl From<&String> for Path {
    fn from(raw: &String) -> Self {
        Path::parse(raw)
    }
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        Path::new(segments)
    }
}

/// Pre-split segments; each element is parsed like a dotted segment, so
/// `"*"` is the wildcard
impl<const N: usize> From<[&str; N]> for Path {
    fn from(parts: [&str; N]) -> Self {
        Path::new(parts.iter().map(|p| Segment::from(*p)).collect())
    }
}

impl From<&[&str]> for Path {
    fn from(parts: &[&str]) -> Self {
        Path::new(parts.iter().map(|p| Segment::from(*p)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dotted() {
        let path = Path::parse("a.b.*.c");
        assert_eq!(
            path.segments(),
            &[
                Segment::key("a"),
                Segment::key("b"),
                Segment::Append,
                Segment::key("c")
            ]
        );
        assert_eq!(path.to_string(), "a.b.*.c");
    }

    #[test]
    fn test_parse_edge_cases() {
        assert!(Path::parse("").is_empty());
        assert_eq!(Path::parse("a").len(), 1);
        assert_eq!(
            Path::parse("a..b").segments()[1],
            Segment::Key(String::new())
        );
        assert_eq!(Path::parse("*").segments(), &[Segment::Append]);
    }

    #[test]
    fn test_pre_split_segments() {
        let path = Path::from(["names", "short", "*"]);
        assert_eq!(path, Path::parse("names.short.*"));

        // A pre-split key may contain dots
        let path = Path::from(["links", "00A.B"]);
        assert_eq!(path.len(), 2);
        assert_eq!(path.segments()[1], Segment::key("00A.B"));
    }

    #[test]
    fn test_position_and_join() {
        assert_eq!(Segment::key("3").position(), Some(3));
        assert_eq!(Segment::key("x").position(), None);
        assert_eq!(Segment::Append.position(), None);

        let path = Path::parse("a").join("*");
        assert!(path.segments()[1].is_append());
    }
}
