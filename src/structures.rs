use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Strand {
    Plus,
    Minus,
}

impl Strand {
    pub fn from_char(x: char) -> Option<Strand> {
        match x {
            '+' => Some(Strand::Plus),
            '-' => Some(Strand::Minus),
            _ => None,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
        }
    }
}

/// One annotated interval. `start` and `stop` are 0-based inclusive offsets into the region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRecord {
    pub region_id: String,
    pub feature_type: String,
    pub start: i64,
    pub stop: i64,
    pub group_id: String,
    pub strand: Strand,
}

impl FeatureRecord {
    pub fn len(&self) -> usize {
        self.stop.saturating_sub(self.start).saturating_add(1).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for FeatureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}..{}\t{}\t{}",
            self.region_id, self.feature_type, self.start, self.stop, self.strand, self.group_id
        )
    }
}

/// Records keyed by group id, each group in annotation file order.
pub type FeatureGroups = BTreeMap<String, Vec<FeatureRecord>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledSequence {
    pub group_id: String,
    pub strand: Strand,
    pub sequence: Vec<u8>,
}

impl AssembledSequence {
    pub fn size(&self) -> usize {
        self.sequence.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strand_from_char() {
        assert_eq!(Strand::from_char('+'), Some(Strand::Plus));
        assert_eq!(Strand::from_char('-'), Some(Strand::Minus));
        assert_eq!(Strand::from_char('.'), None);
        assert_eq!(Strand::Minus.to_string(), "-");
    }

    #[test]
    fn record_length_is_inclusive() {
        let rec = FeatureRecord {
            region_id: "chr1".into(),
            feature_type: "exon".into(),
            start: 0,
            stop: 3,
            group_id: "g1".into(),
            strand: Strand::Plus,
        };
        assert_eq!(rec.len(), 4);
        assert!(!rec.is_empty());
        assert_eq!(rec.to_string(), "chr1\texon\t0..3\t+\tg1");

        let wide = FeatureRecord { start: i64::MIN, stop: i64::MAX, ..rec.clone() };
        assert_eq!(wide.len(), i64::MAX as usize);
        let backwards = FeatureRecord { start: 5, stop: 1, ..rec };
        assert!(backwards.is_empty());
    }
}
