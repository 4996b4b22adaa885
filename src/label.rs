// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Posture label definitions.
//!
//! The label set is closed. Declaration order is the classifier's output
//! order, so [`Label::from_index`] maps an arg-max index straight to a label.

use std::fmt;
use std::str::FromStr;

/// Posture categories recognised by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    /// Upper body slumped forward.
    Hunched,
    /// Leaning to the left.
    Left,
    /// Leaning to the right.
    Right,
    /// Upright posture.
    Good,
}

impl Label {
    /// All labels in classifier output order.
    pub const ALL: [Self; 4] = [Self::Hunched, Self::Left, Self::Right, Self::Good];

    /// Number of labels.
    pub const COUNT: usize = Self::ALL.len();

    /// Returns the directory / display name of the label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hunched => "hunched",
            Self::Left => "left",
            Self::Right => "right",
            Self::Good => "good",
        }
    }

    /// Label for a classifier output index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Classifier output index of this label.
    #[must_use]
    pub const fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Label {
    type Err = LabelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hunched" | "hunch" => Ok(Self::Hunched),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "good" | "upright" => Ok(Self::Good),
            _ => Err(LabelParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid label string.
#[derive(Debug, Clone)]
pub struct LabelParseError(String);

impl fmt::Display for LabelParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid label '{}', expected one of: hunched, left, right, good",
            self.0
        )
    }
}

impl std::error::Error for LabelParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_str() {
        assert_eq!("hunched".parse::<Label>().unwrap(), Label::Hunched);
        assert_eq!("LEFT".parse::<Label>().unwrap(), Label::Left);
        assert_eq!("right".parse::<Label>().unwrap(), Label::Right);
        assert_eq!("good".parse::<Label>().unwrap(), Label::Good);
        assert!("slouch".parse::<Label>().is_err());
    }

    #[test]
    fn test_label_display() {
        assert_eq!(Label::Hunched.to_string(), "hunched");
        assert_eq!(Label::Good.to_string(), "good");
    }

    #[test]
    fn test_label_index_roundtrip() {
        for (i, label) in Label::ALL.iter().enumerate() {
            assert_eq!(label.index(), i);
            assert_eq!(Label::from_index(i), Some(*label));
        }
        assert_eq!(Label::from_index(Label::COUNT), None);
    }
}
