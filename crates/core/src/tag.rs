//! Human-assigned version tags and their total order.
//!
//! A tag is an optional, trimmed string. Blank input is the same as no tag,
//! and "no tag" sorts below every present tag. Two present tags compare as
//! dotted-numeric versions with an optional qualifier, so
//! `1.2.3 < 1.2.4 < 1.10.0` and `1.2.3.4-SNAPSHOT < 1.2.3.4`.
//!
//! The order is consistent with equality: [`compare`] returns
//! [`Ordering::Equal`] only for identical normalized strings. Tags that are
//! equivalent as versions (`1.0` and `1`) fall back to comparing the raw
//! strings, which keeps exact-match lookups and ordering in agreement.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An optional version tag attached to a deployed definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub struct VersionTag(Option<String>);

impl VersionTag {
    /// Build a tag from raw text. Whitespace-only text yields an absent tag.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            Self(None)
        } else {
            Self(Some(trimmed.to_owned()))
        }
    }

    /// The absent tag.
    #[must_use]
    pub const fn absent() -> Self {
        Self(None)
    }

    /// The normalized tag text, or `None` when absent.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Whether no tag is present.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        self.0.is_none()
    }
}

impl From<Option<String>> for VersionTag {
    fn from(value: Option<String>) -> Self {
        value.map_or_else(Self::absent, Self::new)
    }
}

impl From<Option<&str>> for VersionTag {
    fn from(value: Option<&str>) -> Self {
        value.map_or_else(Self::absent, Self::new)
    }
}

impl From<&str> for VersionTag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<VersionTag> for Option<String> {
    fn from(tag: VersionTag) -> Self {
        tag.0
    }
}

impl FromStr for VersionTag {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(tag) => f.write_str(tag),
            None => f.write_str("<untagged>"),
        }
    }
}

impl Ord for VersionTag {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self.as_str(), other.as_str())
    }
}

impl PartialOrd for VersionTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two raw tags after trim-to-absent normalization.
///
/// Absent sorts first. Present tags compare by release segments, then by
/// qualifier rank, then by the raw text.
pub fn compare(a: Option<&str>, b: Option<&str>) -> Ordering {
    let a = a.map(str::trim).filter(|s| !s.is_empty());
    let b = b.map(str::trim).filter(|s| !s.is_empty());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) if a == b => Ordering::Equal,
        (Some(a), Some(b)) => {
            let (left, right) = (ParsedTag::parse(a), ParsedTag::parse(b));
            compare_release(&left.release, &right.release)
                .then_with(|| left.qualifier.cmp(&right.qualifier))
                .then_with(|| a.cmp(b))
        }
    }
}

struct ParsedTag<'a> {
    release: Vec<Segment<'a>>,
    qualifier: Qualifier,
}

impl<'a> ParsedTag<'a> {
    fn parse(tag: &'a str) -> Self {
        let (release, qualifier) = match tag.split_once('-') {
            Some((release, qualifier)) => (release, Some(qualifier)),
            None => (tag, None),
        };
        Self {
            release: release.split('.').map(Segment::parse).collect(),
            qualifier: Qualifier::parse(qualifier),
        }
    }
}

/// One `.`-separated piece of the release part.
#[derive(Debug, Clone, Copy)]
enum Segment<'a> {
    /// Digits with leading zeros stripped (`"0"` becomes `""`).
    Number(&'a str),
    Text(&'a str),
}

const ZERO: Segment<'static> = Segment::Number("");

impl<'a> Segment<'a> {
    fn parse(raw: &'a str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            Segment::Number(raw.trim_start_matches('0'))
        } else {
            Segment::Text(raw)
        }
    }
}

fn compare_segment(a: Segment<'_>, b: Segment<'_>) -> Ordering {
    match (a, b) {
        // Arbitrary-length numbers: more digits is larger, then digit order.
        (Segment::Number(a), Segment::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
        (Segment::Number(_), Segment::Text(_)) => Ordering::Greater,
        (Segment::Text(_), Segment::Number(_)) => Ordering::Less,
        (Segment::Text(a), Segment::Text(b)) => cmp_ignore_case(a, b),
    }
}

/// Missing trailing segments count as zero, so `1.2` and `1.2.0` are peers.
fn compare_release(a: &[Segment<'_>], b: &[Segment<'_>]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let left = a.get(i).copied().unwrap_or(ZERO);
            let right = b.get(i).copied().unwrap_or(ZERO);
            compare_segment(left, right)
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

/// Qualifier after the first `-`, ordered by rank and then text.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Qualifier {
    rank: u8,
    text: String,
}

impl Qualifier {
    const RELEASE_RANK: u8 = 5;

    fn parse(raw: Option<&str>) -> Self {
        let text = raw.unwrap_or_default().to_ascii_lowercase();
        let rank = match text.as_str() {
            "alpha" | "a" => 0,
            "beta" | "b" => 1,
            "milestone" | "m" => 2,
            "rc" | "cr" => 3,
            "snapshot" => 4,
            "" | "ga" | "final" | "release" => Self::RELEASE_RANK,
            "sp" => 6,
            _ => 7,
        };
        Self { rank, text }
    }
}
