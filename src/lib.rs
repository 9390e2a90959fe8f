//! Assembles the nucleotide sequence of multi-part features (a transcript's exons, a gene's CDS
//! pieces) from a genome FASTA and a GFF-like annotation.
//!
//! Annotation lines are grouped by the first `key=value;` attribute, each group is cut out of its
//! region in ascending genomic order, concatenated and reverse complemented when on the minus
//! strand.

pub mod config;
pub mod error;
pub mod genome;
pub mod gff3;
pub mod structures;
pub mod transcript_builder;

pub use config::ExtractConfig;
pub use error::{Diagnostic, ExtractError, Severity};
pub use genome::GenomeIndex;
pub use gff3::GroupingOptions;
pub use structures::{AssembledSequence, FeatureGroups, FeatureRecord, Strand};
pub use transcript_builder::{RunSummary, assemble_group, reverse_complement, run};
