//! Ordered class labels of the letter classifier.
//!
//! Index `i` of the classifier output corresponds to label `i`. The ordering is a property of the
//! trained model, so a label file can be shipped next to the model to replace the built-in one.
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Static ASL alphabet without J and Z, which need motion to be signed.
pub const ASL_ALPHABET: &str = "ABCDEFGHIKLMNOPQRSTUVWXY";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Labels {
    letters: Vec<char>,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            letters: ASL_ALPHABET.chars().collect(),
        }
    }
}

impl Labels {
    /// Parse labels from text.
    ///
    /// Either one label per line or all letters on a single line. Whitespace is ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let letters: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
        if letters.is_empty() {
            bail!("label list is empty");
        }

        Ok(Self { letters })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read labels from {}", path.display()))?;
        Self::parse(&text)
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    /// Letter for a classifier output index.
    pub fn get(&self, index: usize) -> Option<char> {
        self.letters.get(index).copied()
    }

    /// Fail if the classifier produces a different number of classes than there are labels.
    pub fn check_num_classes(&self, num_classes: usize) -> Result<()> {
        if num_classes != self.len() {
            bail!(
                "classifier has {} output classes but {} labels are configured",
                num_classes,
                self.len()
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_default_alphabet_order() {
        let labels = Labels::default();
        assert_eq!(labels.len(), 24);
        assert_eq!(labels.get(0), Some('A'));
        assert_eq!(labels.get(8), Some('I'));
        // J is skipped
        assert_eq!(labels.get(9), Some('K'));
        assert_eq!(labels.get(23), Some('Y'));
        assert_eq!(labels.get(24), None);
    }

    #[test]
    fn test_parse_one_per_line() -> Result<()> {
        let labels = Labels::parse("A\nB\nC\n")?;
        assert_eq!(labels, Labels::parse("ABC")?);
        assert_eq!(labels.get(2), Some('C'));

        Ok(())
    }

    #[test]
    fn test_parse_empty_fails() {
        assert!(Labels::parse(" \n ").is_err());
    }

    #[test]
    fn test_check_num_classes() {
        let labels = Labels::default();
        assert!(labels.check_num_classes(24).is_ok());
        assert!(labels.check_num_classes(26).is_err());
    }
}
