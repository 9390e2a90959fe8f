use crate::error::{Diagnostic, ExtractError};
use crate::structures::{FeatureGroups, FeatureRecord, Strand};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Group id given to records whose attributes carry no usable `key=value;` token.
pub const UNKNOWN_GROUP: &str = "unknown";

const MIN_COLUMNS: usize = 9;

#[derive(Debug, Clone)]
pub struct GroupingOptions {
    /// Lines whose type column contains any of these are container records and are dropped.
    pub excluded_types: Vec<String>,
    /// Take the group id from this attribute key instead of the first one present.
    pub group_key: Option<String>,
    pub allow_duplicate_intervals: bool,
}

impl Default for GroupingOptions {
    fn default() -> Self {
        Self {
            excluded_types: vec!["mRNA".to_string()],
            group_key: None,
            allow_duplicate_intervals: true,
        }
    }
}

impl GroupingOptions {
    pub fn is_excluded(&self, feature_type: &str) -> bool {
        self.excluded_types
            .iter()
            .any(|t| !t.is_empty() && feature_type.contains(t.as_str()))
    }
}

/// Parses one tab-separated annotation line. `line_no` is only used for error messages.
///
/// Raw coordinates are 1-based inclusive; the record stores both bounds shifted down by one.
pub fn parse_feature_line(
    line_no: usize,
    line: &str,
    group_key: Option<&str>,
) -> Result<FeatureRecord, ExtractError> {
    let cols: Vec<&str> = line.split('\t').collect();
    if cols.len() < MIN_COLUMNS {
        return Err(ExtractError::parse(
            line_no,
            format!("expected at least {MIN_COLUMNS} tab-separated columns, found {}", cols.len()),
        ));
    }

    let start = parse_coordinate(line_no, "start", cols[3])?;
    let stop = parse_coordinate(line_no, "stop", cols[4])?;
    let (Some(start0), Some(stop0)) = (start.checked_sub(1), stop.checked_sub(1)) else {
        return Err(ExtractError::parse(line_no, format!("coordinate {start} is out of range")));
    };
    if start > stop {
        return Err(ExtractError::parse(
            line_no,
            format!("start {start} is greater than stop {stop}"),
        ));
    }

    let strand_col = cols[6].trim();
    let strand = match strand_col.chars().next() {
        Some(c) if strand_col.len() == 1 => Strand::from_char(c),
        _ => None,
    }
    .ok_or_else(|| ExtractError::parse(line_no, format!("invalid strand '{strand_col}'")))?;

    let group_id = extract_group_id(cols[8], group_key).unwrap_or(UNKNOWN_GROUP);

    Ok(FeatureRecord {
        region_id: cols[0].to_owned(),
        feature_type: cols[2].to_owned(),
        start: start0,
        stop: stop0,
        group_id: group_id.to_owned(),
        strand,
    })
}

fn parse_coordinate(line_no: usize, name: &str, raw: &str) -> Result<i64, ExtractError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ExtractError::parse(line_no, format!("{name} coordinate '{raw}' is not an integer")))
}

/// Value of the first `key=value;` token in the attribute column.
///
/// A token only counts when a `;` follows it, so a trailing `key=value` without one is ignored.
fn extract_group_id<'a>(attributes: &'a str, key: Option<&str>) -> Option<&'a str> {
    let (terminated, _) = attributes.rsplit_once(';')?;
    terminated
        .split(';')
        .filter_map(|token| token.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .find(|(k, v)| !k.is_empty() && !v.is_empty() && key.is_none_or(|want| *k == want))
        .map(|(_, v)| v)
}

/// Folds annotation lines into feature groups.
pub struct FeatureGrouper<'a> {
    options: &'a GroupingOptions,
    groups: FeatureGroups,
    line_no: usize,
    excluded: usize,
    duplicates: usize,
}

impl<'a> FeatureGrouper<'a> {
    pub fn new(options: &'a GroupingOptions) -> Self {
        Self { options, groups: FeatureGroups::new(), line_no: 0, excluded: 0, duplicates: 0 }
    }

    pub fn push_line(&mut self, line: &str) -> Result<(), ExtractError> {
        self.line_no += 1;
        self.push_current(line)
    }

    /// Same as `push_line` for raw bytes; invalid UTF-8 is a parse error on that line.
    pub fn push_bytes(&mut self, line: &[u8]) -> Result<(), ExtractError> {
        self.line_no += 1;
        let line = std::str::from_utf8(line)
            .map_err(|e| ExtractError::parse(self.line_no, format!("invalid UTF-8: {e}")))?;
        self.push_current(line)
    }

    fn push_current(&mut self, line: &str) -> Result<(), ExtractError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.starts_with('#') || line.trim().is_empty() {
            return Ok(());
        }

        if let Some(feature_type) = line.split('\t').nth(2) {
            if self.options.is_excluded(feature_type) {
                self.excluded += 1;
                return Ok(());
            }
        }

        let record = parse_feature_line(self.line_no, line, self.options.group_key.as_deref())?;
        let group = self.groups.entry(record.group_id.clone()).or_default();

        if !self.options.allow_duplicate_intervals
            && group.iter().any(|r| r.start == record.start && r.stop == record.stop)
        {
            debug!("Dropping duplicate interval {record}");
            self.duplicates += 1;
            return Ok(());
        }

        group.push(record);
        Ok(())
    }

    pub fn line_no(&self) -> usize {
        self.line_no
    }

    pub fn finish(self) -> FeatureGroups {
        info!(
            "Grouped {} annotation lines into {} groups ({} container lines excluded, {} duplicates dropped)",
            self.line_no,
            self.groups.len(),
            self.excluded,
            self.duplicates
        );
        self.groups
    }
}

/// Groups annotation lines. In lenient mode malformed lines are skipped and reported in `diagnostics`.
pub fn group_features<I, S>(
    lines: I,
    options: &GroupingOptions,
    lenient: bool,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<FeatureGroups, ExtractError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut grouper = FeatureGrouper::new(options);
    for line in lines {
        let result = grouper.push_line(line.as_ref());
        skip_if_lenient(result, grouper.line_no(), lenient, diagnostics)?;
    }
    Ok(grouper.finish())
}

pub fn group_reader<R: BufRead>(
    mut reader: R,
    options: &GroupingOptions,
    lenient: bool,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<FeatureGroups, ExtractError> {
    let mut grouper = FeatureGrouper::new(options);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let result = grouper.push_bytes(&buf);
        skip_if_lenient(result, grouper.line_no(), lenient, diagnostics)?;
    }
    Ok(grouper.finish())
}

pub fn read_feature_groups(
    path: impl AsRef<Path>,
    options: &GroupingOptions,
    lenient: bool,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<FeatureGroups, ExtractError> {
    let reader = BufReader::new(File::open(path)?);
    group_reader(reader, options, lenient, diagnostics)
}

fn skip_if_lenient(
    result: Result<(), ExtractError>,
    line_no: usize,
    lenient: bool,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), ExtractError> {
    match result {
        Err(e) if lenient && e.is_skippable() => {
            warn!("Skipping line {line_no}: {e}");
            diagnostics.push(Diagnostic::warning(e.to_string()));
            Ok(())
        }
        other => other,
    }
}
