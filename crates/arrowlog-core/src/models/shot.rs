//! Shot model and the closed set of ring values

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use super::ids::ShotId;
use crate::error::ValidationError;

/// The symbolic value of one arrow.
///
/// `X` and `10` both score 10 but stay distinct symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ShotValue {
    Miss,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    X,
}

impl ShotValue {
    /// Every token in picker order.
    pub const ALL: [Self; 12] = [
        Self::Miss,
        Self::One,
        Self::Two,
        Self::Three,
        Self::Four,
        Self::Five,
        Self::Six,
        Self::Seven,
        Self::Eight,
        Self::Nine,
        Self::Ten,
        Self::X,
    ];

    /// Numeric score for this value.
    pub const fn score(self) -> u8 {
        match self {
            Self::Miss => 0,
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
            Self::Nine => 9,
            Self::Ten | Self::X => 10,
        }
    }

    /// Token as written on the wire and in the store.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Miss => "M",
            Self::One => "1",
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Five => "5",
            Self::Six => "6",
            Self::Seven => "7",
            Self::Eight => "8",
            Self::Nine => "9",
            Self::Ten => "10",
            Self::X => "X",
        }
    }

    /// Plain numeric value for a score; 10 maps to `Ten`, never `X`.
    pub fn from_score(score: i64) -> Result<Self, ValidationError> {
        match score {
            0 => Ok(Self::Miss),
            1..=10 => Ok(Self::ALL[usize::try_from(score).unwrap_or(0)]),
            _ => Err(ValidationError::InvalidShotValue(score.to_string())),
        }
    }

    /// Parse a user or wire token. Case-insensitive; `0` is accepted as a miss.
    pub fn parse_token(raw: &str) -> Result<Self, ValidationError> {
        let token = raw.trim().to_ascii_uppercase();
        if token == "0" {
            return Ok(Self::Miss);
        }
        if !token_pattern().is_match(&token) {
            return Err(ValidationError::InvalidShotValue(raw.to_string()));
        }
        Self::ALL
            .into_iter()
            .find(|value| value.as_str() == token)
            .ok_or_else(|| ValidationError::InvalidShotValue(raw.to_string()))
    }
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(?:X|M|10|[1-9])$").expect("Invalid regex"))
}

impl fmt::Display for ShotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShotValue {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_token(s)
    }
}

impl TryFrom<String> for ShotValue {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_token(&value)
    }
}

impl From<ShotValue> for String {
    fn from(value: ShotValue) -> Self {
        value.as_str().to_string()
    }
}

/// One arrow. The score is always derived from the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawShot", into = "RawShot")]
pub struct Shot {
    pub shot_id: ShotId,
    /// 1-based position within the end
    pub shot_index: u32,
    pub value: ShotValue,
}

impl Shot {
    /// A fresh miss at the given position.
    #[must_use]
    pub fn miss(shot_index: u32) -> Self {
        Self {
            shot_id: ShotId::new(),
            shot_index,
            value: ShotValue::Miss,
        }
    }

    pub const fn score(&self) -> u8 {
        self.value.score()
    }
}

/// Wire shape of a shot, carrying the redundant numeric score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawShot {
    shot_id: ShotId,
    shot_index: u32,
    #[serde(default)]
    score: Option<i64>,
    #[serde(default)]
    value: Option<String>,
}

impl TryFrom<RawShot> for Shot {
    type Error = ValidationError;

    fn try_from(raw: RawShot) -> Result<Self, Self::Error> {
        let token = raw.value.as_deref().map(str::trim).unwrap_or_default();
        let value = if token.is_empty() {
            // Older rows only carried the numeric score.
            ShotValue::from_score(raw.score.unwrap_or(0))?
        } else {
            let value = ShotValue::parse_token(token)?;
            if let Some(score) = raw.score {
                if score != i64::from(value.score()) {
                    return Err(ValidationError::ScoreMismatch {
                        value: token.to_string(),
                        score: u8::try_from(score).unwrap_or(u8::MAX),
                    });
                }
            }
            value
        };

        Ok(Self {
            shot_id: raw.shot_id,
            shot_index: raw.shot_index,
            value,
        })
    }
}

impl From<Shot> for RawShot {
    fn from(shot: Shot) -> Self {
        Self {
            shot_id: shot.shot_id,
            shot_index: shot.shot_index,
            score: Some(i64::from(shot.value.score())),
            value: Some(shot.value.as_str().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_token_agrees_with_its_score() {
        for value in ShotValue::ALL {
            match value {
                ShotValue::Miss => assert_eq!(value.score(), 0),
                ShotValue::X | ShotValue::Ten => assert_eq!(value.score(), 10),
                other => assert_eq!(other.as_str().parse::<u8>().unwrap(), other.score()),
            }
        }
    }

    #[test]
    fn parse_token_accepts_closed_set_case_insensitively() {
        assert_eq!(ShotValue::parse_token("x").unwrap(), ShotValue::X);
        assert_eq!(ShotValue::parse_token(" m ").unwrap(), ShotValue::Miss);
        assert_eq!(ShotValue::parse_token("0").unwrap(), ShotValue::Miss);
        assert_eq!(ShotValue::parse_token("10").unwrap(), ShotValue::Ten);
        assert_eq!(ShotValue::parse_token("7").unwrap(), ShotValue::Seven);
    }

    #[test]
    fn parse_token_rejects_values_outside_the_set() {
        for raw in ["11", "01", "-1", "XX", "", "ten", "5.5"] {
            assert!(ShotValue::parse_token(raw).is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn from_score_never_produces_x() {
        assert_eq!(ShotValue::from_score(10).unwrap(), ShotValue::Ten);
        assert_eq!(ShotValue::from_score(0).unwrap(), ShotValue::Miss);
        assert!(ShotValue::from_score(11).is_err());
    }

    #[test]
    fn shot_serializes_score_next_to_value() {
        let mut shot = Shot::miss(1);
        shot.value = ShotValue::X;
        let json = serde_json::to_value(&shot).unwrap();
        assert_eq!(json["score"], 10);
        assert_eq!(json["value"], "X");
        assert_eq!(json["shotIndex"], 1);
    }

    #[test]
    fn shot_rejects_mismatched_score() {
        let raw = json!({
            "shotId": ShotId::new(),
            "shotIndex": 1,
            "score": 7,
            "value": "9"
        });
        assert!(serde_json::from_value::<Shot>(raw).is_err());
    }

    #[test]
    fn shot_without_token_derives_it_from_score() {
        let raw = json!({ "shotId": ShotId::new(), "shotIndex": 2, "score": 0, "value": "" });
        let shot: Shot = serde_json::from_value(raw).unwrap();
        assert_eq!(shot.value, ShotValue::Miss);

        let raw = json!({ "shotId": ShotId::new(), "shotIndex": 3, "score": 8 });
        let shot: Shot = serde_json::from_value(raw).unwrap();
        assert_eq!(shot.value, ShotValue::Eight);
    }
}
