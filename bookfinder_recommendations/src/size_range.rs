use std::fmt;

use serde::{Deserialize, Serialize};

/// Count requested for a bucket nobody recognizes
pub const UNRECOGNIZED_RANGE_COUNT: usize = 15;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
/// How many books the user would like, as picked in the range selector
pub enum SizeRange {
    #[default]
    From10To20,
    From20To30,
    From30To40,
    From40To50,
    Over50,
    Over100,
    /// Any other selector value, kept verbatim so it survives persistence
    Unrecognized(String),
}

impl SizeRange {
    pub const BUCKETS: [SizeRange; 6] = [
        SizeRange::From10To20,
        SizeRange::From20To30,
        SizeRange::From30To40,
        SizeRange::From40To50,
        SizeRange::Over50,
        SizeRange::Over100,
    ];

    /// Number of books requested from the server, which is also the display limit
    pub fn requested_count(&self) -> usize {
        match self {
            SizeRange::From10To20 => 20,
            SizeRange::From20To30 => 30,
            SizeRange::From30To40 => 40,
            SizeRange::From40To50 => 50,
            SizeRange::Over50 => 75,
            SizeRange::Over100 => 120,
            SizeRange::Unrecognized(_) => UNRECOGNIZED_RANGE_COUNT,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SizeRange::From10To20 => "10-20",
            SizeRange::From20To30 => "20-30",
            SizeRange::From30To40 => "30-40",
            SizeRange::From40To50 => "40-50",
            SizeRange::Over50 => "50+",
            SizeRange::Over100 => "100+",
            SizeRange::Unrecognized(value) => value,
        }
    }
}

impl From<&str> for SizeRange {
    fn from(value: &str) -> Self {
        match value.trim() {
            "" | "10-20" => SizeRange::From10To20,
            "20-30" => SizeRange::From20To30,
            "30-40" => SizeRange::From30To40,
            "40-50" => SizeRange::From40To50,
            "50+" => SizeRange::Over50,
            "100+" => SizeRange::Over100,
            other => SizeRange::Unrecognized(other.to_string()),
        }
    }
}

impl From<String> for SizeRange {
    fn from(value: String) -> Self {
        SizeRange::from(value.as_str())
    }
}

/// A missing selector value is the default bucket
impl From<Option<String>> for SizeRange {
    fn from(value: Option<String>) -> Self {
        value.map(SizeRange::from).unwrap_or_default()
    }
}

impl From<SizeRange> for String {
    fn from(value: SizeRange) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for SizeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
