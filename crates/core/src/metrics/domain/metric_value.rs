use std::fmt;

use serde::Serialize;

/// Value of one metric for one frame.
///
/// Serializes as a JSON number, a string, or `null` for [`MetricValue::NotApplicable`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Score(f32),
    Label(&'static str),
    /// No face was detected in the frame.
    NotApplicable,
}

impl MetricValue {
    pub fn as_score(&self) -> Option<f32> {
        match self {
            MetricValue::Score(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<&'static str> {
        match self {
            MetricValue::Label(l) => Some(l),
            _ => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        !matches!(self, MetricValue::NotApplicable)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Score(s) => write!(f, "{s:.2}"),
            MetricValue::Label(l) => f.write_str(l),
            MetricValue::NotApplicable => f.write_str("N/A"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(MetricValue::Score(12.3456), "12.35")]
    #[case(MetricValue::Label("east asian"), "east asian")]
    #[case(MetricValue::NotApplicable, "N/A")]
    fn test_display(#[case] value: MetricValue, #[case] expected: &str) {
        assert_eq!(value.to_string(), expected);
    }

    #[test]
    fn test_serializes_untagged() {
        assert_eq!(serde_json::to_string(&MetricValue::Score(1.5)).unwrap(), "1.5");
        assert_eq!(
            serde_json::to_string(&MetricValue::Label("male")).unwrap(),
            "\"male\""
        );
        assert_eq!(
            serde_json::to_string(&MetricValue::NotApplicable).unwrap(),
            "null"
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(MetricValue::Score(3.0).as_score(), Some(3.0));
        assert_eq!(MetricValue::Label("yes").as_score(), None);
        assert_eq!(MetricValue::Label("yes").as_label(), Some("yes"));
        assert!(!MetricValue::NotApplicable.is_applicable());
        assert!(MetricValue::Score(0.0).is_applicable());
    }
}
