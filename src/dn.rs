//! Distinguished-name path algebra
//!
//! APIC names every managed object by a DN such as
//! `uni/tn-Prod/ap-Web/epg-Front/rspathAtt-[topology/pod-1/paths-101/pathep-[eth1/1]]`.
//! A DN is a `/`-separated list of relative names ("segments"), each of the
//! form `marker-value`. Bracketed values are atomic: a `/` inside `[...]`
//! never splits a segment, which is how relation DNs embed whole target paths.
//!
//! Everything in the crate that takes a DN apart goes through this module.

use serde::{Deserialize, Serialize};
use std::fmt;

// ── Dn ────────────────────────────────────────────────────────

/// An APIC distinguished name.
///
/// Ordering and equality are those of the raw string, which keeps registries
/// keyed by `Dn` deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dn(String);

impl Dn {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ordered segments of this DN.
    pub fn segments(&self) -> Vec<Segment<'_>> {
        split_segments(&self.0).into_iter().map(Segment::new).collect()
    }

    pub fn segment_count(&self) -> usize {
        split_segments(&self.0).len()
    }

    pub fn last_segment(&self) -> Option<Segment<'_>> {
        split_segments(&self.0).pop().map(Segment::new)
    }

    /// The DN with its last segment removed; `None` for single-segment DNs.
    pub fn parent(&self) -> Option<Dn> {
        self.ancestors().next()
    }

    /// Append a relative name.
    pub fn child(&self, rn: &str) -> Dn {
        if self.0.is_empty() {
            Dn::new(rn)
        } else {
            Dn::new(format!("{}/{}", self.0, rn))
        }
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = Dn> + '_ {
        let ends = segment_ends(&self.0);
        let count = ends.len();
        ends.into_iter()
            .take(count.saturating_sub(1))
            .rev()
            .map(move |end| Dn::new(&self.0[..end]))
    }

    /// `true` when `self` names a strict ancestor of `other`, compared segment
    /// by segment (so `BD-Prod` is not a prefix of `BD-Prod2/...`).
    pub fn is_strict_prefix_of(&self, other: &Dn) -> bool {
        let mine = split_segments(&self.0);
        let theirs = split_segments(&other.0);
        !mine.is_empty() && mine.len() < theirs.len() && theirs[..mine.len()] == mine[..]
    }

    /// Value of the last segment carrying `marker`, brackets stripped.
    pub fn after_marker(&self, marker: &str) -> Option<&str> {
        split_segments(&self.0)
            .into_iter()
            .map(Segment::new)
            .rev()
            .find(|segment| segment.marker() == marker)
            .map(|segment| segment.name())
    }

    /// [`extract_after_marker`] on this DN.
    pub fn name_after(&self, marker: &str) -> String {
        extract_after_marker(&self.0, marker)
    }

    pub fn has_marker(&self, marker: &str) -> bool {
        self.after_marker(marker).is_some()
    }
}

impl fmt::Display for Dn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Dn {
    fn from(value: &str) -> Self {
        Dn::new(value)
    }
}

impl From<String> for Dn {
    fn from(value: String) -> Self {
        Dn(value)
    }
}

// ── Segment ───────────────────────────────────────────────────

/// One relative name inside a DN, e.g. `pathep-[eth1/1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    raw: &'a str,
}

impl<'a> Segment<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// Text before the first `-` that sits outside brackets (`tn` in `tn-Prod`).
    /// A segment without a dash is all marker (`uni`).
    pub fn marker(&self) -> &'a str {
        match self.dash_position() {
            Some(pos) => &self.raw[..pos],
            None => self.raw,
        }
    }

    /// Raw text after the marker dash; empty when there is no dash.
    pub fn value(&self) -> &'a str {
        match self.dash_position() {
            Some(pos) => &self.raw[pos + 1..],
            None => "",
        }
    }

    /// The value with one enclosing bracket pair removed, if the whole value
    /// is bracketed (`[eth1/1]` -> `eth1/1`, `[Pool]-dynamic` unchanged).
    pub fn name(&self) -> &'a str {
        strip_enclosing_brackets(self.value())
    }

    fn dash_position(&self) -> Option<usize> {
        let mut depth = 0usize;
        for (idx, ch) in self.raw.char_indices() {
            match ch {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                '-' if depth == 0 => return Some(idx),
                _ => {}
            }
        }
        None
    }
}

// ── Free functions ────────────────────────────────────────────

/// Split a DN into segment slices. `/` only separates at bracket depth zero;
/// empty segments are skipped.
pub fn split_segments(path: &str) -> Vec<&str> {
    segment_spans(path)
        .into_iter()
        .map(|(start, end)| &path[start..end])
        .collect()
}

/// Byte offsets at which each segment of `path` ends.
fn segment_ends(path: &str) -> Vec<usize> {
    segment_spans(path).into_iter().map(|(_, end)| end).collect()
}

fn segment_spans(path: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (idx, ch) in path.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                if idx > start {
                    spans.push((start, idx));
                }
                start = idx + 1;
            }
            _ => {}
        }
    }
    if start < path.len() {
        spans.push((start, path.len()));
    }
    spans
}

/// Longest candidate that is a strict (segment-wise) prefix of `child`.
///
/// Equal-length matches can only be identical DNs; the lexicographically
/// smallest wins so the result never depends on candidate order.
pub fn owner_of<'a, I>(child: &Dn, candidates: I) -> Option<&'a Dn>
where
    I: IntoIterator<Item = &'a Dn>,
{
    candidates
        .into_iter()
        .filter(|candidate| candidate.is_strict_prefix_of(child))
        .max_by(|a, b| {
            a.segment_count()
                .cmp(&b.segment_count())
                .then_with(|| b.as_str().cmp(a.as_str()))
        })
}

/// Token after the last `marker-` segment, with enclosing brackets removed.
///
/// Falls back to the final segment when no segment carries `marker`, and to
/// the empty string for an empty path. Never fails.
pub fn extract_after_marker(path: &str, marker: &str) -> String {
    let segments = split_segments(path);
    segments
        .iter()
        .rev()
        .map(|raw| Segment::new(raw))
        .find(|segment| segment.marker() == marker)
        .map(|segment| segment.name().to_string())
        .or_else(|| segments.last().map(|raw| raw.to_string()))
        .unwrap_or_default()
}

/// Interior of the last top-level `[...]` group in `path`.
///
/// `uni/tn-T/ap-A/esg-E/epgselector-[uni/tn-T/ap-A/epg-W]` yields
/// `uni/tn-T/ap-A/epg-W`, which can be parsed again as a DN.
pub fn decode_bracketed_interior(path: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut open = 0usize;
    let mut last = None;

    for (idx, ch) in path.char_indices() {
        match ch {
            '[' => {
                if depth == 0 {
                    open = idx + 1;
                }
                depth += 1;
            }
            ']' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    last = Some((open, idx));
                }
            }
            _ => {}
        }
    }
    last.map(|(start, end)| &path[start..end])
}

fn strip_enclosing_brackets(value: &str) -> &str {
    if !value.starts_with('[') {
        return value;
    }
    let mut depth = 0usize;
    for (idx, ch) in value.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return if idx == value.len() - 1 {
                        &value[1..idx]
                    } else {
                        value
                    };
                }
            }
            _ => {}
        }
    }
    value
}
