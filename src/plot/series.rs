//! Time series samples, windowing and gap handling.
//!
//! A series arrives as a list of `{timestamp, value}` samples where the
//! value may be missing or non-numeric (`"unavailable"`, `null`). Such
//! samples are *gaps*. How gaps split the drawn line is controlled by
//! [`SpanGaps`]:
//!
//! | `span_gaps` | Behavior |
//! |-------------|----------|
//! | `false` | every gap breaks the line |
//! | `true` | gaps are ignored, all valid samples are joined |
//! | `N` (seconds) | gaps are ignored; the line breaks where two consecutive valid samples are more than N seconds apart |

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, de};
use serde_json::Value;

/// One recorded value of an entity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeriesSample {
    pub timestamp: DateTime<FixedOffset>,
    #[serde(default, deserialize_with = "deserialize_sample_value")]
    pub value: Option<f64>,
}

impl SeriesSample {
    pub fn new(timestamp: DateTime<FixedOffset>, value: Option<f64>) -> Self {
        Self { timestamp, value }
    }
}

/// Numbers and numeric strings are values; anything else is a gap.
fn deserialize_sample_value<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite()))
}

/// Gap policy of a plotted series.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SpanGaps {
    #[default]
    Never,
    Always,
    /// Break only where valid samples are further apart than this many seconds
    Seconds(f64),
}

impl<'de> Deserialize<'de> for SpanGaps {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Bool(false) | Value::Null => Ok(SpanGaps::Never),
            Value::Bool(true) => Ok(SpanGaps::Always),
            Value::Number(n) => n
                .as_f64()
                .filter(|s| s.is_finite() && *s >= 0.0)
                .map(SpanGaps::Seconds)
                .ok_or_else(|| de::Error::custom(format!("invalid span_gaps {}", n))),
            other => Err(de::Error::custom(format!(
                "span_gaps must be a bool or a number of seconds, got {}",
                other
            ))),
        }
    }
}

/// A run of valid samples drawn as one connected line.
pub type Segment = Vec<(DateTime<FixedOffset>, f64)>;

/// Restrict samples to `[start, end]`.
///
/// Samples are ordered by time. The last sample before `start` is kept
/// with its timestamp moved onto `start`, since it is the value in effect
/// when the window opens.
pub fn window(samples: &[SeriesSample], start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Vec<SeriesSample> {
    let mut sorted: Vec<&SeriesSample> = samples.iter().filter(|s| s.timestamp <= end).collect();
    sorted.sort_by_key(|s| s.timestamp);

    let first_inside = sorted.partition_point(|s| s.timestamp < start);
    let mut out = Vec::with_capacity(sorted.len() - first_inside + 1);
    if first_inside > 0 {
        let before = sorted[first_inside - 1];
        out.push(SeriesSample::new(start, before.value));
    }
    out.extend(sorted[first_inside..].iter().map(|s| (*s).clone()));
    out
}

/// Split samples into drawable segments, scaling each value.
pub fn segments(samples: &[SeriesSample], span_gaps: SpanGaps, value_scale: f64) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut current: Segment = Vec::new();
    let mut prev_time: Option<DateTime<FixedOffset>> = None;

    for sample in samples {
        let Some(value) = sample.value else {
            if span_gaps == SpanGaps::Never && !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            continue;
        };

        if let (SpanGaps::Seconds(max_gap), Some(prev)) = (span_gaps, prev_time) {
            let gap = (sample.timestamp - prev).num_milliseconds() as f64 / 1000.0;
            if gap > max_gap && !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        }
        current.push((sample.timestamp, value * value_scale));
        prev_time = Some(sample.timestamp);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn t(minutes: i64) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-03-01T12:00:00+01:00").unwrap() + Duration::minutes(minutes)
    }

    fn samples(values: &[(i64, Option<f64>)]) -> Vec<SeriesSample> {
        values.iter().map(|&(m, v)| SeriesSample::new(t(m), v)).collect()
    }

    fn lens(segs: &[Segment]) -> Vec<usize> {
        segs.iter().map(Vec::len).collect()
    }

    #[test]
    fn test_span_gaps_false_breaks_at_null() {
        let s = samples(&[(0, Some(1.0)), (1, Some(2.0)), (2, None), (3, Some(3.0))]);
        assert_eq!(lens(&segments(&s, SpanGaps::Never, 1.0)), vec![2, 1]);
    }

    #[test]
    fn test_span_gaps_true_joins_everything() {
        let s = samples(&[(0, Some(1.0)), (1, Some(2.0)), (2, None), (3, Some(3.0))]);
        assert_eq!(lens(&segments(&s, SpanGaps::Always, 1.0)), vec![3]);
    }

    #[test]
    fn test_span_gaps_seconds() {
        let s = samples(&[(0, Some(1.0)), (1, None), (2, Some(2.0)), (30, Some(3.0))]);
        // 2 minutes apart is within 300 s, 28 minutes is not
        assert_eq!(lens(&segments(&s, SpanGaps::Seconds(300.0), 1.0)), vec![2, 1]);
    }

    #[test]
    fn test_value_scale() {
        let s = samples(&[(0, Some(1.5))]);
        assert_eq!(segments(&s, SpanGaps::Never, 2.0)[0][0].1, 3.0);
    }

    #[test]
    fn test_window_clamps_previous_sample() {
        let s = samples(&[(40, Some(4.0)), (-90, Some(1.0)), (-30, Some(2.0)), (10, Some(3.0)), (90, Some(9.0))]);
        let w = window(&s, t(0), t(60));
        assert_eq!(
            w,
            samples(&[(0, Some(2.0)), (10, Some(3.0)), (40, Some(4.0))])
        );
    }

    #[test]
    fn test_deserialize_samples_and_policy() {
        let parsed: Vec<SeriesSample> = serde_json::from_str(
            r#"[{"timestamp": "2024-03-01T12:00:00Z", "value": "21.5"},
                {"timestamp": "2024-03-01T12:05:00Z", "value": "unavailable"},
                {"timestamp": "2024-03-01T12:10:00Z", "value": 22},
                {"timestamp": "2024-03-01T12:15:00Z"}]"#,
        )
        .unwrap();
        let values: Vec<Option<f64>> = parsed.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![Some(21.5), None, Some(22.0), None]);

        let policies: Vec<SpanGaps> = serde_json::from_str("[false, true, 600]").unwrap();
        assert_eq!(policies, vec![SpanGaps::Never, SpanGaps::Always, SpanGaps::Seconds(600.0)]);
        assert!(serde_json::from_str::<SpanGaps>(r#""often""#).is_err());
    }
}
