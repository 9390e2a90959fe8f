use crate::config::ExtractConfig;
use crate::error::{Diagnostic, ExtractError};
use crate::genome::GenomeIndex;
use crate::gff3::read_feature_groups;
use crate::structures::{AssembledSequence, FeatureGroups, FeatureRecord, Strand};
use anyhow::{Context, Result};
use bio::io::fasta;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, Write};

/// Reverse complement over `A/T` and `C/G`. Every other byte is kept as is.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&b| match b {
            b'A' => b'T',
            b'T' => b'A',
            b'C' => b'G',
            b'G' => b'C',
            other => other,
        })
        .collect()
}

/// Extract the sequence of one feature group.
///
/// Sub-features are always taken in ascending genomic order (by start, then stop) and the
/// concatenation is reverse complemented as a whole for minus strand groups.
pub fn assemble_group(
    group_id: &str,
    records: &[FeatureRecord],
    genome: &GenomeIndex,
) -> Result<AssembledSequence, ExtractError> {
    let Some(first) = records.first() else {
        return Err(ExtractError::InconsistentGroup {
            group: group_id.to_owned(),
            reason: "group has no records".to_owned(),
        });
    };

    if let Some(other) = records.iter().find(|r| r.region_id != first.region_id) {
        return Err(ExtractError::InconsistentGroup {
            group: group_id.to_owned(),
            reason: format!("regions {} and {} are mixed", first.region_id, other.region_id),
        });
    }
    if records.iter().any(|r| r.strand != first.strand) {
        return Err(ExtractError::InconsistentGroup {
            group: group_id.to_owned(),
            reason: "both strands are present".to_owned(),
        });
    }

    let region_seq = genome.get(&first.region_id).ok_or_else(|| ExtractError::UnknownRegion {
        group: group_id.to_owned(),
        region: first.region_id.clone(),
    })?;

    let mut sorted: Vec<&FeatureRecord> = records.iter().collect();
    sorted.sort_by_key(|r| (r.start, r.stop));

    let length = region_seq.len();
    if let Some(bad) = sorted
        .iter()
        .find(|r| r.start < 0 || r.start > r.stop || r.stop as u64 >= length as u64)
    {
        return Err(ExtractError::CoordinateOutOfRange {
            group: group_id.to_owned(),
            start: bad.start,
            stop: bad.stop,
            length,
        });
    }

    // every interval now lies inside the region
    let mut sequence = Vec::with_capacity(sorted.iter().map(|r| r.len()).sum());
    for record in sorted {
        sequence.extend_from_slice(&region_seq[record.start as usize..=record.stop as usize]);
    }

    if first.strand == Strand::Minus {
        sequence = reverse_complement(&sequence);
    }

    Ok(AssembledSequence { group_id: group_id.to_owned(), strand: first.strand, sequence })
}

/// Assemble every group in parallel. Results come back in group id order.
///
/// Without `lenient` the first failing group (in that order) is returned as the error.
/// With it, failing groups are dropped and reported in `diagnostics`.
pub fn assemble_groups(
    groups: &FeatureGroups,
    genome: &GenomeIndex,
    lenient: bool,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<AssembledSequence>, ExtractError> {
    let results: Vec<_> = groups
        .par_iter()
        .map(|(id, records)| assemble_group(id, records, genome))
        .collect();

    let mut assembled = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(seq) => {
                debug!("Assembled {} ({}, {} bp)", seq.group_id, seq.strand, seq.size());
                assembled.push(seq);
            }
            Err(e) if lenient && e.is_skippable() => {
                warn!("Skipping {e}");
                diagnostics.push(Diagnostic::warning(e.to_string()));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(assembled)
}

/// Write one FASTA record per sequence: `>group_id` then the sequence on a single line.
pub fn write_fasta<W: Write>(sequences: &[AssembledSequence], out: W) -> io::Result<()> {
    let mut writer = fasta::Writer::new(out);
    for seq in sequences {
        writer.write(&seq.group_id, None, &seq.sequence)?;
    }
    writer.flush()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub regions: usize,
    pub groups: usize,
    pub sequences: usize,
}

/// Read both inputs, assemble all groups and write the FASTA output.
///
/// Nothing is written unless assembly as a whole succeeded.
pub fn run(config: &ExtractConfig, diagnostics: &mut Vec<Diagnostic>) -> Result<RunSummary> {
    let result = run_inner(config, diagnostics);
    if let Err(e) = &result {
        diagnostics.push(Diagnostic::fatal(format!("{e:#}")));
    }
    result
}

fn run_inner(config: &ExtractConfig, diagnostics: &mut Vec<Diagnostic>) -> Result<RunSummary> {
    let genome = GenomeIndex::from_fasta(&config.genome)
        .with_context(|| format!("Failed to load genome {}", config.genome.display()))?;

    let groups = read_feature_groups(&config.annotation, &config.grouping, config.lenient, diagnostics)
        .with_context(|| format!("Failed to read annotation {}", config.annotation.display()))?;

    let assembled = match config.threads {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .context("Failed to build worker pool")?;
            pool.install(|| assemble_groups(&groups, &genome, config.lenient, diagnostics))?
        }
        None => assemble_groups(&groups, &genome, config.lenient, diagnostics)?,
    };

    match &config.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_fasta(&assembled, file)?;
        }
        None => write_fasta(&assembled, io::stdout().lock())?,
    }

    let summary = RunSummary { regions: genome.len(), groups: groups.len(), sequences: assembled.len() };
    info!(
        "Wrote {} of {} groups ({} regions in genome)",
        summary.sequences, summary.groups, summary.regions
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gff3::{GroupingOptions, group_features};

    fn genome() -> GenomeIndex {
        GenomeIndex::from_records([("chr1".to_string(), "ACGTACGTAA")]).unwrap()
    }

    fn record(start: i64, stop: i64, strand: Strand) -> FeatureRecord {
        FeatureRecord {
            region_id: "chr1".into(),
            feature_type: "exon".into(),
            start,
            stop,
            group_id: "g1".into(),
            strand,
        }
    }

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement(b"ACGTGTAA"), b"TTACACGT");
        assert_eq!(reverse_complement(b"GATTACA"), b"TGTAATC");
        assert_eq!(reverse_complement(b"ANcg"), b"cgNT");
        assert_eq!(reverse_complement(b""), b"");
    }

    #[test]
    fn test_reverse_complement_is_an_involution() {
        for seq in [&b"ACGT"[..], b"AAAACCCGT", b"T", b"GGGGCATTAC"] {
            assert_eq!(reverse_complement(&reverse_complement(seq)), seq);
        }
    }

    #[test]
    fn test_plus_strand_concatenates_in_start_order() {
        let recs = vec![record(6, 9, Strand::Plus), record(0, 3, Strand::Plus)];
        let seq = assemble_group("g1", &recs, &genome()).unwrap();
        assert_eq!(seq.sequence, b"ACGTGTAA");
        assert_eq!(seq.strand, Strand::Plus);
        assert_eq!(seq.group_id, "g1");
    }

    #[test]
    fn test_minus_strand_is_reverse_complement_of_plus() {
        let recs = vec![record(0, 3, Strand::Minus), record(6, 9, Strand::Minus)];
        let seq = assemble_group("g1", &recs, &genome()).unwrap();
        assert_eq!(seq.sequence, b"TTACACGT");
    }

    #[test]
    fn test_overlapping_intervals_use_start_then_stop() {
        let recs = vec![record(2, 5, Strand::Plus), record(2, 3, Strand::Plus), record(0, 1, Strand::Plus)];
        let seq = assemble_group("g1", &recs, &genome()).unwrap();
        assert_eq!(seq.sequence, b"ACGTGTAC");
    }

    #[test]
    fn test_out_of_range_is_reported() {
        let err = assemble_group("g1", &[record(8, 12, Strand::Plus)], &genome()).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::CoordinateOutOfRange { start: 8, stop: 12, length: 10, ref group } if group == "g1"
        ));

        let err = assemble_group("g1", &[record(-1, 2, Strand::Plus)], &genome()).unwrap_err();
        assert!(matches!(err, ExtractError::CoordinateOutOfRange { .. }));

        assert!(assemble_group("g1", &[record(9, 9, Strand::Plus)], &genome()).is_ok());
    }

    #[test]
    fn test_huge_stop_is_out_of_range_not_allocated() {
        let rec = crate::gff3::parse_feature_line(
            1,
            "chr1\tsrc\texon\t1\t1000000000000000\t.\t+\t.\tParent=g1;",
            None,
        )
        .unwrap();
        let err = assemble_group("g1", &[rec], &genome()).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::CoordinateOutOfRange { start: 0, stop: 999_999_999_999_999, length: 10, .. }
        ));

        let widest = record(0, i64::MAX, Strand::Minus);
        let err = assemble_group("g1", &[record(0, 3, Strand::Minus), widest], &genome()).unwrap_err();
        assert!(matches!(err, ExtractError::CoordinateOutOfRange { stop: i64::MAX, .. }));
    }

    #[test]
    fn test_unknown_region() {
        let mut rec = record(0, 3, Strand::Plus);
        rec.region_id = "chrX".into();
        let err = assemble_group("g1", &[rec], &genome()).unwrap_err();
        assert!(matches!(err, ExtractError::UnknownRegion { ref region, .. } if region == "chrX"));
    }

    #[test]
    fn test_inconsistent_groups() {
        let mixed_strand = vec![record(0, 3, Strand::Plus), record(6, 9, Strand::Minus)];
        let err = assemble_group("g1", &mixed_strand, &genome()).unwrap_err();
        assert!(matches!(err, ExtractError::InconsistentGroup { ref group, .. } if group == "g1"));

        let mut other = record(6, 9, Strand::Plus);
        other.region_id = "chr2".into();
        let err = assemble_group("g1", &[record(0, 3, Strand::Plus), other], &genome()).unwrap_err();
        assert!(err.to_string().contains("chr2"));

        assert!(assemble_group("g1", &[], &genome()).is_err());
    }

    #[test]
    fn test_assemble_groups_strict_and_lenient() {
        let lines = [
            "chr1\tsrc\texon\t1\t4\t.\t+\t.\tParent=a;",
            "chr1\tsrc\texon\t9\t13\t.\t+\t.\tParent=b;",
            "chrZ\tsrc\texon\t1\t2\t.\t-\t.\tParent=c;",
            "chr1\tsrc\texon\t7\t10\t.\t-\t.\tParent=d;",
        ];
        let mut diagnostics = Vec::new();
        let groups = group_features(lines, &GroupingOptions::default(), false, &mut diagnostics).unwrap();

        let err = assemble_groups(&groups, &genome(), false, &mut diagnostics).unwrap_err();
        assert!(matches!(err, ExtractError::CoordinateOutOfRange { ref group, .. } if group == "b"));
        assert!(diagnostics.is_empty());

        let seqs = assemble_groups(&groups, &genome(), true, &mut diagnostics).unwrap();
        let ids: Vec<_> = seqs.iter().map(|s| s.group_id.as_str()).collect();
        assert_eq!(ids, ["a", "d"]);
        assert_eq!(seqs[1].sequence, b"TTAC");
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_write_fasta() {
        let seqs = vec![
            AssembledSequence { group_id: "a".into(), strand: Strand::Plus, sequence: b"ACGT".to_vec() },
            AssembledSequence { group_id: "b".into(), strand: Strand::Minus, sequence: b"TT".to_vec() },
        ];
        let mut out = Vec::new();
        write_fasta(&seqs, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), ">a\nACGT\n>b\nTT\n");
    }
}
