use crate::error::ExtractError;
use bio::io::fasta;
use log::info;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Region id to full nucleotide sequence, stored verbatim. Read-only once built.
#[derive(Debug, Default, Clone)]
pub struct GenomeIndex {
    regions: HashMap<String, Vec<u8>>,
}

impl GenomeIndex {
    /// Builds the index, failing on the first region id seen twice.
    pub fn from_records<I, S>(records: I) -> Result<Self, ExtractError>
    where
        I: IntoIterator<Item = (String, S)>,
        S: Into<Vec<u8>>,
    {
        let mut regions = HashMap::new();
        for (id, seq) in records {
            match regions.entry(id) {
                Entry::Occupied(e) => {
                    return Err(ExtractError::DuplicateRegion { region: e.key().clone() });
                }
                Entry::Vacant(e) => {
                    e.insert(seq.into());
                }
            }
        }
        Ok(Self { regions })
    }

    pub fn from_fasta_reader<R: Read>(reader: R) -> Result<Self, ExtractError> {
        let reader = fasta::Reader::new(reader);
        let records = reader
            .records()
            .map(|r| r.map(|rec| (rec.id().to_owned(), rec.seq().to_owned())))
            .collect::<std::io::Result<Vec<_>>>()?;
        Self::from_records(records)
    }

    /// Load genome sequences into memory from a FASTA file.
    pub fn from_fasta(path: impl AsRef<Path>) -> Result<Self, ExtractError> {
        let index = Self::from_fasta_reader(File::open(path.as_ref())?)?;
        info!("Loaded {} regions from {}", index.len(), path.as_ref().display());
        Ok(index)
    }

    pub fn get(&self, region_id: &str) -> Option<&[u8]> {
        self.regions.get(region_id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
