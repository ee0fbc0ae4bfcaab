//! Path specifications.
//!
//! A path is an ordered list of segments written as `/`-separated text:
//!
//! ```text
//! /recordArray/*/value
//! /recordUnion/com.example.AspectFoo/value
//! ```
//!
//! Text parsing only knows names and wildcards. Binding a path against a
//! [`RecordSchema`] re-classifies every name that lands on a union as a
//! [`Segment::UnionMember`] and checks that each name is declared.

use aspekt_core::{Error, Result};
use std::fmt;
use std::str::FromStr;

use crate::schema::{DataSchema, RecordSchema};

/// Literal text of the wildcard segment.
pub const WILDCARD: &str = "*";

/// One step of a path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Record field name.
    Name(String),
    /// Every element of an array.
    Wildcard,
    /// Union member tag.
    UnionMember(String),
}

impl Segment {
    /// Text form of the segment.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Name(name) | Self::UnionMember(name) => name,
            Self::Wildcard => WILDCARD,
        }
    }

    /// Short segment kind used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Name(_) => "field name",
            Self::Wildcard => "wildcard",
            Self::UnionMember(_) => "union member",
        }
    }

    fn is_index(&self) -> bool {
        matches!(self, Self::Name(name) if name.bytes().all(|b| b.is_ascii_digit()))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed path.
///
/// # Example
///
/// ```rust
/// use aspekt_record::{PathSpec, Segment};
///
/// let path: PathSpec = "/recordArray/*/value/".parse().unwrap();
/// assert_eq!(path.len(), 3);
/// assert_eq!(path.segments()[1], Segment::Wildcard);
/// assert_eq!(path.to_string(), "/recordArray/*/value");
///
/// let built = PathSpec::root().field("recordArray").items().field("value");
/// assert_eq!(built, path);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PathSpec {
    segments: Vec<Segment>,
}

impl PathSpec {
    /// The empty path `/`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a path from its segments.
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Parses path text.
    ///
    /// The text must start with `/`. A single trailing `/` is ignored and
    /// `/` alone is the empty path. Empty interior segments are rejected.
    pub fn parse(text: &str) -> Result<Self> {
        let Some(body) = text.strip_prefix('/') else {
            return Err(Error::invalid_path(text, "path must start with `/`"));
        };
        if body.is_empty() {
            return Ok(Self::root());
        }
        let body = body.strip_suffix('/').unwrap_or(body);

        let mut segments = Vec::new();
        for part in body.split('/') {
            let segment = match part {
                "" => return Err(Error::invalid_path(text, "empty segment")),
                WILDCARD => Segment::Wildcard,
                name => Segment::Name(name.to_string()),
            };
            segments.push(segment);
        }
        Ok(Self { segments })
    }

    /// Segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether this is the empty path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Appends a field name.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.segments.push(Segment::Name(name.into()));
        self
    }

    /// Appends a wildcard.
    pub fn items(mut self) -> Self {
        self.segments.push(Segment::Wildcard);
        self
    }

    /// Appends a union member selector.
    pub fn member(mut self, tag: impl Into<String>) -> Self {
        self.segments.push(Segment::UnionMember(tag.into()));
        self
    }

    /// Whether the path fans out over any array.
    pub fn has_wildcard(&self) -> bool {
        self.segments.contains(&Segment::Wildcard)
    }

    /// Checks the path against `schema` and returns it with union positions
    /// typed as [`Segment::UnionMember`].
    pub fn bind(&self, schema: &RecordSchema) -> Result<Self> {
        ensure_no_index(self)?;

        let mut position = Position::Record(schema);
        let mut bound = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            let (next, typed) = position.step(segment)?;
            bound.push(typed);
            position = next;
        }
        Ok(Self { segments: bound })
    }
}

/// Fails when any name segment is a literal array index.
pub(crate) fn ensure_no_index(path: &PathSpec) -> Result<()> {
    match path.segments.iter().find(|s| s.is_index()) {
        Some(segment) => Err(Error::unsupported(format!(
            "array index `{segment}` in path `{path}`; use `*` instead"
        ))),
        None => Ok(()),
    }
}

/// Where a binding walk currently stands in the schema.
#[derive(Clone, Copy)]
enum Position<'s> {
    Record(&'s RecordSchema),
    Other(&'s DataSchema),
}

impl<'s> Position<'s> {
    fn of(schema: &'s DataSchema) -> Self {
        match schema.dereference() {
            DataSchema::Record(record) => Position::Record(record),
            other => Position::Other(other),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Position::Record(_) => "record",
            Position::Other(schema) => schema.kind(),
        }
    }

    fn step(&self, segment: &Segment) -> Result<(Position<'s>, Segment)> {
        match (*self, segment) {
            (Position::Record(record), Segment::Name(name)) => {
                let field = record
                    .field(name)
                    .ok_or_else(|| Error::schema_mismatch(record.name(), name.as_str()))?;
                Ok((Position::of(field.schema()), segment.clone()))
            }
            (Position::Other(DataSchema::Union(union)), Segment::Name(tag))
            | (Position::Other(DataSchema::Union(union)), Segment::UnionMember(tag)) => {
                let member = union
                    .member(tag)
                    .ok_or_else(|| Error::schema_mismatch(union.display_name(), tag.as_str()))?;
                Ok((
                    Position::of(member.schema()),
                    Segment::UnionMember(tag.clone()),
                ))
            }
            (Position::Other(DataSchema::Array(items)), Segment::Wildcard) => {
                Ok((Position::of(items), Segment::Wildcard))
            }
            (position, segment) => Err(Error::unsupported(format!(
                "{} `{}` cannot be applied to {}",
                segment.kind(),
                segment,
                position.kind()
            ))),
        }
    }
}

impl fmt::Display for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for PathSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// ============================================================================
// Tests
// ============================================================================
