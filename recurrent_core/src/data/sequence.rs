//! Text sequences turned into per-step training samples.

use std::fmt;
use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use recurrent_shared::{encode_text, end_marker};

use crate::neural::Vector;

/// Errors raised while reading a sequence dataset.
#[derive(Debug)]
pub enum DatasetError {
    Io(std::io::Error),
    /// A line could not be split into an input and a target.
    Parse { line: usize, reason: String },
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetError::Io(err) => write!(f, "IO error: {}", err),
            DatasetError::Parse { line, reason } => {
                write!(f, "Parse error on line {}: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for DatasetError {}

impl From<std::io::Error> for DatasetError {
    fn from(value: std::io::Error) -> Self {
        DatasetError::Io(value)
    }
}

/// An input sequence and the target sequence the network should emit.
///
/// Training walks `target.len() + 1` steps. Step `i` feeds `input[i]` and
/// expects `target[i]`; past the end of either sequence the end marker (the
/// encoding of byte `0`) is used, so the final step teaches the network to
/// signal the end of its answer.
#[derive(Clone, Debug)]
pub struct SequencePair {
    pub input: Vec<Vector>,
    pub target: Vec<Vector>,
    /// Human-readable description
    pub description: String,
}

impl SequencePair {
    pub fn new(input: Vec<Vector>, target: Vec<Vector>, description: impl Into<String>) -> Self {
        Self {
            input,
            target,
            description: description.into(),
        }
    }

    /// Encodes both strings byte by byte.
    ///
    /// # Examples
    ///
    /// ```
    /// use recurrent_core::data::SequencePair;
    ///
    /// let pair = SequencePair::from_text("0", "1");
    /// assert_eq!(pair.steps(), 2);
    /// ```
    pub fn from_text(input: &str, target: &str) -> Self {
        Self::new(
            encode_text(input),
            encode_text(target),
            format!("{:?} -> {:?}", input, target),
        )
    }

    /// Number of training steps for this pair.
    pub fn steps(&self) -> usize {
        self.target.len() + 1
    }

    /// Input and target for step `index`, padded with the end marker.
    pub fn step(&self, index: usize) -> (Vector, Vector) {
        let pick = |sequence: &[Vector]| {
            sequence
                .get(index)
                .cloned()
                .unwrap_or_else(end_marker)
        };
        (pick(self.input.as_slice()), pick(self.target.as_slice()))
    }
}

/// Ordered collection of sequence pairs.
#[derive(Clone, Debug, Default)]
pub struct SequenceDataset {
    pub pairs: Vec<SequencePair>,
}

impl SequenceDataset {
    pub fn new(pairs: Vec<SequencePair>) -> Self {
        Self { pairs }
    }

    pub fn from_text_pairs<I, A, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: AsRef<str>,
        B: AsRef<str>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(input, target)| SequencePair::from_text(input.as_ref(), target.as_ref()))
                .collect(),
        )
    }

    /// Parses one `input<TAB>target` pair per line.
    ///
    /// Blank lines and lines starting with `#` are skipped. The target may be
    /// empty, the tab may not be missing.
    pub fn from_tsv(contents: &str) -> Result<Self, DatasetError> {
        let mut pairs = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let (input, target) = line.split_once('\t').ok_or_else(|| DatasetError::Parse {
                line: index + 1,
                reason: "expected `input<TAB>target`".to_string(),
            })?;
            pairs.push(SequencePair::from_text(input, target));
        }
        Ok(Self::new(pairs))
    }

    pub fn load_tsv<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let contents = fs::read_to_string(path)?;
        Self::from_tsv(&contents)
    }

    /// Deterministically shuffles the pairs.
    pub fn shuffle(&mut self, seed: u64) {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        self.pairs.shuffle(&mut rng);
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SequencePair> {
        self.pairs.iter()
    }
}

impl<'a> IntoIterator for &'a SequenceDataset {
    type Item = &'a SequencePair;
    type IntoIter = std::slice::Iter<'a, SequencePair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recurrent_shared::encode_byte;

    #[test]
    fn test_steps_pad_with_end_marker() {
        let pair = SequencePair::from_text("ab", "c");
        assert_eq!(pair.steps(), 2);

        let (input, target) = pair.step(0);
        assert_eq!(input, encode_byte(b'a'));
        assert_eq!(target, encode_byte(b'c'));

        let (input, target) = pair.step(1);
        assert_eq!(input, encode_byte(b'b'));
        assert_eq!(target, end_marker());

        let (input, _) = pair.step(2);
        assert_eq!(input, end_marker());
    }

    #[test]
    fn test_from_tsv() {
        let dataset =
            SequenceDataset::from_tsv("# greetings\nhi\thello\n\n0\t1\r\nquiet\t\n").unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.pairs[0].input.len(), 2);
        assert_eq!(dataset.pairs[0].target.len(), 5);
        assert_eq!(dataset.pairs[1].target, vec![encode_byte(b'1')]);
        assert!(dataset.pairs[2].target.is_empty());
        assert_eq!(dataset.pairs[2].steps(), 1);
    }

    #[test]
    fn test_from_tsv_reports_line() {
        match SequenceDataset::from_tsv("a\tb\nno tab here\n") {
            Err(DatasetError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {:?}", other.map(|d| d.len())),
        }
    }

    #[test]
    fn test_shuffle_is_deterministic() {
        let pairs: Vec<(String, String)> = (0..20).map(|i| (i.to_string(), i.to_string())).collect();
        let mut a = SequenceDataset::from_text_pairs(pairs.clone());
        let mut b = SequenceDataset::from_text_pairs(pairs);
        a.shuffle(5);
        b.shuffle(5);
        let names = |d: &SequenceDataset| d.iter().map(|p| p.description.clone()).collect::<Vec<_>>();
        assert_eq!(names(&a), names(&b));
        assert_eq!(a.len(), 20);
    }
}
