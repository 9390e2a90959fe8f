use crate::gff3::GroupingOptions;
use std::path::PathBuf;

/// Everything a single extraction run needs.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub annotation: PathBuf,
    pub genome: PathBuf,
    /// Destination FASTA; standard output when unset.
    pub output: Option<PathBuf>,
    pub grouping: GroupingOptions,
    /// Skip malformed lines and failing groups instead of aborting.
    pub lenient: bool,
    /// Worker threads for assembly; rayon's default pool when unset.
    pub threads: Option<usize>,
}

impl ExtractConfig {
    pub fn new(annotation: impl Into<PathBuf>, genome: impl Into<PathBuf>) -> Self {
        Self {
            annotation: annotation.into(),
            genome: genome.into(),
            output: None,
            grouping: GroupingOptions::default(),
            lenient: false,
            threads: None,
        }
    }
}
