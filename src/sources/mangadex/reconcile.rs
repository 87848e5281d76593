//! Absolute chapter numbering.
//!
//! Some series number their chapters per volume, so volume 2 starts over at
//! chapter 1 and chapter numbers collide across volumes. This module detects
//! that pattern in the aggregate document and assigns every chapter a number
//! that keeps increasing across volume boundaries.
//!
//! The rules:
//!
//! - Detection only looks at volume `"2"`. If the smallest integer chapter
//!   number in it is `<= 1`, numbering is treated as per-volume.
//! - Volumes are walked in numeric order. Each chapter's number is shifted by
//!   the number of chapter entries in all earlier volumes. If that still
//!   leaves the volume at or below the highest number assigned so far (a gap
//!   in an earlier volume), the shift grows just enough to clear it.
//! - Volumes with non-numeric labels (`"none"`, specials) are skipped
//!   entirely. They add nothing to the shift and get no entries, so their
//!   chapters keep the raw feed number.
//! - Chapters with non-numeric keys (`"EX"`) count towards their volume's
//!   size but get no entry.

use std::cmp::Ordering;
use std::fmt;

use tracing::debug;

use super::api::{AggregateResponse, AggregateVolume};
use crate::models::AbsoluteNumberMap;
use crate::sources::SourceError;

/// Label of the volume inspected for a numbering reset.
const RESET_CHECK_VOLUME: &str = "2";

/// Why absolute numbers could not be produced
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The aggregate document could not be fetched or decoded
    #[error("Failed to fetch aggregate: {0}")]
    Fetch(#[from] SourceError),

    /// The aggregate was fetched but numbers could not be computed from it
    #[error("Failed to compute absolute chapter numbers: {0}")]
    Compute(String),
}

/// Compute corrected chapter numbers from an aggregate document.
///
/// Returns an empty map when the series does not restart its numbering.
pub(crate) fn reconcile(aggregate: &AggregateResponse) -> Result<AbsoluteNumberMap, ReconcileError> {
    debug!("Aggregate volumes: {:?}", aggregate.volumes.keys().collect::<Vec<_>>());

    if !numbering_resets(aggregate) {
        return Ok(AbsoluteNumberMap::new());
    }

    absolute_numbers(aggregate)
}

/// Whether volume 2 restarts chapter numbering
pub(crate) fn numbering_resets(aggregate: &AggregateResponse) -> bool {
    let Some(volume) = aggregate.volumes.get(RESET_CHECK_VOLUME) else {
        return false;
    };

    let numbers: Vec<i64> = volume
        .chapters
        .keys()
        .filter_map(|key| leading_integer(key))
        .collect();
    let min = numbers.iter().min().copied();

    debug!("Volume {} chapter numbers: {:?}, min: {:?}", RESET_CHECK_VOLUME, numbers, min);

    matches!(min, Some(min) if min <= 1)
}

fn absolute_numbers(aggregate: &AggregateResponse) -> Result<AbsoluteNumberMap, ReconcileError> {
    let mut volumes: Vec<(f64, &AggregateVolume)> = aggregate
        .volumes
        .iter()
        .filter_map(|(label, volume)| numeric(label).map(|n| (n, volume)))
        .collect();
    volumes.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut numbers = AbsoluteNumberMap::new();
    let mut preceding = 0i64;
    let mut highest: Option<ChapterNumber> = None;

    for (label, volume) in volumes {
        let mut chapters: Vec<(ChapterNumber, _)> = volume
            .chapters
            .iter()
            .filter_map(|(key, chapter)| ChapterNumber::parse(key).map(|n| (n, chapter)))
            .collect();
        chapters.sort_by(|a, b| a.0.cmp(&b.0));

        let overflow = || ReconcileError::Compute(format!("chapter numbers in volume {} overflow", label));

        if let Some(&(lowest, _)) = chapters.first() {
            let mut offset = preceding;
            if let Some(highest) = highest {
                if lowest.shifted(offset).ok_or_else(overflow)? <= highest {
                    offset = highest
                        .floor_distance(lowest)
                        .and_then(|distance| distance.checked_add(1))
                        .ok_or_else(overflow)?;
                }
            }

            for (number, chapter) in chapters {
                let corrected = number.shifted(offset).ok_or_else(overflow)?;
                let formatted = corrected.to_string();
                for id in chapter.ids() {
                    numbers.insert(id, formatted.clone());
                }
                highest = Some(highest.map_or(corrected, |h| h.max(corrected)));
            }
        }

        preceding = i64::try_from(volume.chapters.len())
            .ok()
            .and_then(|len| preceding.checked_add(len))
            .ok_or_else(overflow)?;
    }

    debug!("Absolute chapter numbers: {:?}", numbers);
    Ok(numbers)
}

/// Exact decimal chapter number: `units / 10^scale`.
///
/// Keeps the key's own decimal places, so `"0.14"` shifted by 1 prints as
/// `"1.14"` and `"1.50"` as `"2.50"`.
#[derive(Debug, Clone, Copy)]
struct ChapterNumber {
    units: i64,
    scale: u32,
}

/// Decimal places beyond this do not fit the `i64` representation
const MAX_SCALE: u32 = 18;

impl ChapterNumber {
    /// Plain decimal keys only (`"3"`, `"-1"`, `"10.15"`); anything else is non-numeric
    fn parse(key: &str) -> Option<Self> {
        let key = key.trim();
        let (negative, rest) = match key.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, key.strip_prefix('+').unwrap_or(key)),
        };
        let (whole, fraction) = rest.split_once('.').unwrap_or((rest, ""));
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let scale = u32::try_from(fraction.len()).ok().filter(|s| *s <= MAX_SCALE)?;
        let units: i64 = format!("{}{}", whole, fraction).parse().ok()?;
        Some(Self {
            units: if negative { -units } else { units },
            scale,
        })
    }

    fn shifted(self, offset: i64) -> Option<Self> {
        let units = offset
            .checked_mul(10i64.checked_pow(self.scale)?)?
            .checked_add(self.units)?;
        Some(Self { units, scale: self.scale })
    }

    /// `floor(self - other)` as a whole number
    fn floor_distance(self, other: Self) -> Option<i64> {
        let scale = self.scale.max(other.scale);
        let diff = self.rescaled(scale) - other.rescaled(scale);
        i64::try_from(diff.div_euclid(10i128.pow(scale))).ok()
    }

    fn rescaled(self, scale: u32) -> i128 {
        i128::from(self.units) * 10i128.pow(scale - self.scale)
    }
}

impl PartialEq for ChapterNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ChapterNumber {}

impl PartialOrd for ChapterNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChapterNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        let scale = self.scale.max(other.scale);
        self.rescaled(scale).cmp(&other.rescaled(scale))
    }
}

impl fmt::Display for ChapterNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.units < 0 { "-" } else { "" };
        let magnitude = self.units.unsigned_abs();
        if self.scale == 0 {
            return write!(f, "{}{}", sign, magnitude);
        }

        let divisor = 10u64.pow(self.scale);
        write!(
            f,
            "{}{}.{:0width$}",
            sign,
            magnitude / divisor,
            magnitude % divisor,
            width = self.scale as usize
        )
    }
}

/// Integer prefix of a label: `"12"` and `"12.5"` give 12, `"EX"` gives nothing
fn leading_integer(label: &str) -> Option<i64> {
    let label = label.trim();
    let (sign, digits) = match label.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, label.strip_prefix('+').unwrap_or(label)),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Numeric value of a volume label
fn numeric(label: &str) -> Option<f64> {
    label.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate(json: &str) -> AggregateResponse {
        serde_json::from_str(json).unwrap()
    }

    /// Builds `{"volumes": {label: {"chapters": {number: {"id": id}}}}}`
    fn volumes(layout: &[(&str, &[(&str, &str)])]) -> AggregateResponse {
        let volumes: serde_json::Map<String, serde_json::Value> = layout
            .iter()
            .map(|(label, chapters)| {
                let chapters: serde_json::Map<String, serde_json::Value> = chapters
                    .iter()
                    .map(|(number, id)| {
                        (
                            number.to_string(),
                            serde_json::json!({ "chapter": number, "id": id, "others": [] }),
                        )
                    })
                    .collect();
                (
                    label.to_string(),
                    serde_json::json!({ "volume": label, "chapters": chapters }),
                )
            })
            .collect();

        serde_json::from_value(serde_json::json!({ "volumes": volumes })).unwrap()
    }

    #[test]
    fn test_leading_integer() {
        assert_eq!(leading_integer("1"), Some(1));
        assert_eq!(leading_integer("12.5"), Some(12));
        assert_eq!(leading_integer(" 7 "), Some(7));
        assert_eq!(leading_integer("0"), Some(0));
        assert_eq!(leading_integer("-1"), Some(-1));
        assert_eq!(leading_integer("EX"), None);
        assert_eq!(leading_integer(".5"), None);
        assert_eq!(leading_integer(""), None);
    }

    #[test]
    fn test_chapter_number_parse_and_display() {
        let shown = |key: &str, offset: i64| {
            ChapterNumber::parse(key)
                .and_then(|n| n.shifted(offset))
                .map(|n| n.to_string())
        };

        assert_eq!(shown("2", 0).as_deref(), Some("2"));
        assert_eq!(shown("4.5", 0).as_deref(), Some("4.5"));
        assert_eq!(shown(" 0 ", 0).as_deref(), Some("0"));
        assert_eq!(shown("0.14", 1).as_deref(), Some("1.14"));
        assert_eq!(shown("10.15", 5).as_deref(), Some("15.15"));
        assert_eq!(shown("1.05", 2).as_deref(), Some("3.05"));
        assert_eq!(shown("-0.5", 3).as_deref(), Some("2.5"));
        assert_eq!(shown("-1", 0).as_deref(), Some("-1"));
        assert_eq!(shown("-0.5", 0).as_deref(), Some("-0.5"));
        assert_eq!(shown("EX", 0), None);
        assert_eq!(shown("1e3", 0), None);
        assert_eq!(shown(".5", 0), None);
        assert_eq!(shown("1.2.3", 0), None);
        assert_eq!(shown("", 0), None);
    }

    #[test]
    fn test_chapter_number_ordering() {
        let n = |key: &str| ChapterNumber::parse(key).unwrap();
        assert!(n("1.14") > n("1.1"));
        assert!(n("1.5") < n("2"));
        assert_eq!(n("1.50"), n("1.5"));
        assert_eq!(n("2.75").floor_distance(n("0.5")), Some(2));
        assert_eq!(n("1").floor_distance(n("1")), Some(0));
    }

    #[test]
    fn test_shift_overflow_is_reported() {
        let agg = volumes(&[
            ("1", &[("9223372036854775807", "a")]),
            ("2", &[("1", "b")]),
        ]);
        assert!(matches!(reconcile(&agg), Err(ReconcileError::Compute(_))));
    }

    #[test]
    fn test_two_volume_reset() {
        let agg = volumes(&[("1", &[("1", "a")]), ("2", &[("1", "b")])]);

        let numbers = reconcile(&agg).unwrap();
        assert_eq!(numbers.get("b"), Some("2"));
        assert_eq!(numbers.get("a"), Some("1"));
        assert_eq!(numbers.len(), 2);
    }

    #[test]
    fn test_no_reset_when_volume_two_continues() {
        let agg = volumes(&[
            ("1", &[("1", "a"), ("2", "b")]),
            ("2", &[("3", "c"), ("4", "d")]),
        ]);

        assert!(!numbering_resets(&agg));
        assert!(reconcile(&agg).unwrap().is_empty());
    }

    #[test]
    fn test_no_volume_two() {
        let agg = volumes(&[("1", &[("1", "a")]), ("none", &[("2", "b")])]);
        assert!(reconcile(&agg).unwrap().is_empty());

        let empty = aggregate(r#"{"volumes":[]}"#);
        assert!(reconcile(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_volume_two_without_integer_chapters() {
        let agg = volumes(&[("1", &[("1", "a")]), ("2", &[("EX", "b")])]);
        assert!(!numbering_resets(&agg));
        assert!(reconcile(&agg).unwrap().is_empty());
    }

    #[test]
    fn test_detection_uses_integer_part() {
        // 1.5 parses as 1, which triggers the reset
        let agg = volumes(&[("1", &[("1", "a")]), ("2", &[("1.5", "b"), ("3", "c")])]);
        assert!(numbering_resets(&agg));

        // Chapter 0 also counts as a restart
        let agg = volumes(&[("1", &[("1", "a")]), ("2", &[("0", "b")])]);
        assert!(numbering_resets(&agg));
    }

    #[test]
    fn test_three_volumes_cumulative_offset() {
        let agg = volumes(&[
            ("1", &[("1", "a1"), ("2", "a2"), ("3", "a3")]),
            ("2", &[("1", "b1"), ("2", "b2")]),
            ("3", &[("1", "c1"), ("1.5", "c15"), ("2", "c2")]),
        ]);

        let numbers = reconcile(&agg).unwrap();
        assert_eq!(numbers.get("a3"), Some("3"));
        assert_eq!(numbers.get("b1"), Some("4"));
        assert_eq!(numbers.get("b2"), Some("5"));
        assert_eq!(numbers.get("c1"), Some("6"));
        assert_eq!(numbers.get("c15"), Some("6.5"));
        assert_eq!(numbers.get("c2"), Some("7"));
    }

    #[test]
    fn test_fractional_chapters_keep_their_decimals() {
        let agg = volumes(&[
            ("1", &[("1", "a")]),
            ("2", &[("0.14", "b"), ("1", "c")]),
            ("3", &[("1", "d"), ("10.15", "e")]),
        ]);

        let numbers = reconcile(&agg).unwrap();
        assert_eq!(numbers.get("b"), Some("1.14"));
        assert_eq!(numbers.get("c"), Some("2"));
        assert_eq!(numbers.get("d"), Some("4"));
        assert_eq!(numbers.get("e"), Some("13.15"));
    }

    #[test]
    fn test_volumes_sorted_numerically_not_lexically() {
        let volumes: serde_json::Map<String, serde_json::Value> = (1..=10)
            .map(|v| {
                (
                    v.to_string(),
                    serde_json::json!({ "chapters": { "1": { "id": format!("v{}", v) } } }),
                )
            })
            .collect();
        let agg: AggregateResponse =
            serde_json::from_value(serde_json::json!({ "volumes": volumes })).unwrap();

        let numbers = reconcile(&agg).unwrap();
        assert_eq!(numbers.get("v2"), Some("2"));
        assert_eq!(numbers.get("v9"), Some("9"));
        assert_eq!(numbers.get("v10"), Some("10"));
    }

    #[test]
    fn test_corrected_numbers_exceed_earlier_volumes() {
        // Volume 1 has a gap (1, 2, 7), so a plain count of 3 would put
        // volume 2's first chapter at 4, below chapter 7.
        let agg = volumes(&[
            ("1", &[("1", "a1"), ("2", "a2"), ("7", "a7")]),
            ("2", &[("1", "b1"), ("2", "b2")]),
            ("3", &[("0", "c0"), ("1", "c1")]),
        ]);

        let numbers = reconcile(&agg).unwrap();
        let value = |id: &str| numbers.get(id).unwrap().parse::<f64>().unwrap();

        let volume1 = ["a1", "a2", "a7"];
        let volume2 = ["b1", "b2"];
        let volume3 = ["c0", "c1"];

        for later in volume2.iter().chain(volume3.iter()) {
            for earlier in volume1 {
                assert!(value(later) > value(earlier), "{} <= {}", later, earlier);
            }
        }
        for later in volume3 {
            for earlier in volume2 {
                assert!(value(later) > value(earlier), "{} <= {}", later, earlier);
            }
        }
        assert_eq!(numbers.get("b1"), Some("8"));
    }

    #[test]
    fn test_non_numeric_volume_excluded() {
        let agg = volumes(&[
            ("1", &[("1", "a")]),
            ("2", &[("1", "b")]),
            ("none", &[("1", "n1"), ("2", "n2")]),
        ]);

        let numbers = reconcile(&agg).unwrap();
        assert_eq!(numbers.get("b"), Some("2"));
        assert!(numbers.get("n1").is_none());
        assert!(numbers.get("n2").is_none());
    }

    #[test]
    fn test_non_numeric_chapter_counts_but_has_no_entry() {
        let agg = volumes(&[
            ("1", &[("1", "a"), ("EX", "ex")]),
            ("2", &[("1", "b")]),
        ]);

        let numbers = reconcile(&agg).unwrap();
        assert!(numbers.get("ex").is_none());
        assert_eq!(numbers.get("b"), Some("3"));
    }

    #[test]
    fn test_alternate_uploads_share_number() {
        let agg = aggregate(
            r#"{"volumes":{
                "1":{"volume":"1","chapters":{"1":{"chapter":"1","id":"a","others":[]}}},
                "2":{"volume":"2","chapters":{"1":{"chapter":"1","id":"b","others":["b-alt"]}}}
            }}"#,
        );

        let numbers = reconcile(&agg).unwrap();
        assert_eq!(numbers.get("b"), Some("2"));
        assert_eq!(numbers.get("b-alt"), Some("2"));
    }

    #[test]
    fn test_reconcile_is_deterministic() {
        let agg = volumes(&[
            ("1", &[("1", "a"), ("2", "b")]),
            ("2", &[("1", "c")]),
        ]);
        assert_eq!(reconcile(&agg).unwrap(), reconcile(&agg).unwrap());
    }
}
