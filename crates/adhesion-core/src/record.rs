use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Binary class of a protein.
///
/// The discriminants are the numeric labels the classifier is trained on,
/// and `Display` gives the strings written to prediction CSVs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum Label {
    #[strum(serialize = "Non-adhesion")]
    NonAdhesion = 0,
    #[strum(serialize = "Adhesion")]
    Adhesion = 1,
}

impl Label {
    pub fn as_index(&self) -> u8 {
        *self as u8
    }
    /// Any non-zero value is the positive class.
    pub fn from_index(index: u8) -> Self {
        if index == 0 {
            Label::NonAdhesion
        } else {
            Label::Adhesion
        }
    }
}

/// A single protein sequence.
///
/// Ids are not checked for uniqueness: two files may contribute records with
/// the same id and both are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceRecord {
    pub id: String,
    pub sequence: String,
    pub label: Option<Label>,
}

impl SequenceRecord {
    pub fn new(id: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sequence: sequence.into(),
            label: None,
        }
    }
    pub fn with_label(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }
    pub fn len(&self) -> usize {
        self.sequence.len()
    }
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Classifier output for one sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub label: Label,
    pub probability_adhesion: f32,
}

impl Prediction {
    pub fn is_adhesion(&self) -> bool {
        self.label == Label::Adhesion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_label_display_matches_csv_strings() {
        assert_eq!(Label::Adhesion.to_string(), "Adhesion");
        assert_eq!(Label::NonAdhesion.to_string(), "Non-adhesion");
        assert_eq!(Label::from_str("Non-adhesion").unwrap(), Label::NonAdhesion);
    }

    #[test]
    fn test_label_index() {
        for label in Label::iter() {
            assert_eq!(Label::from_index(label.as_index()), label);
        }
        assert_eq!(Label::Adhesion.as_index(), 1);
        assert_eq!(Label::from_index(7), Label::Adhesion);
    }

    #[test]
    fn test_record_with_label() {
        let rec = SequenceRecord::new("seq1", "MSEQ").with_label(Label::Adhesion);
        assert_eq!(rec.label, Some(Label::Adhesion));
        assert_eq!(rec.len(), 4);
    }
}
