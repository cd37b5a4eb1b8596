//! A minimal delimited-text reader: legend characters assign a role to each
//! column, mirroring the original's `CSVData`. Deliberately thin — no format
//! sniffing, no quoting/escaping beyond `str::split`, no dataset-specific
//! loaders.

use std::path::Path;

use crate::algorithms::trees::sample::{Sample, SampleKey, TabularOracle};
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FieldRole {
    Key,
    Feature,
    RegressionOutput,
    CategoricalOutput,
    Ignored,
}

fn parse_legend(legend: &str) -> Result<Vec<FieldRole>> {
    legend
        .chars()
        .map(|c| match c {
            'k' => Ok(FieldRole::Key),
            'f' => Ok(FieldRole::Feature),
            'r' => Ok(FieldRole::RegressionOutput),
            'c' => Ok(FieldRole::CategoricalOutput),
            'i' => Ok(FieldRole::Ignored),
            other => Err(Error::MalformedInput(format!(
                "unknown legend character '{other}'"
            ))),
        })
        .collect()
}

/// Read `path` into `Sample<TabularOracle>` records. `legend` assigns each
/// comma-separated column a role (`k`=key, `f`=continuous feature,
/// `r`=regression output, `c`=categorical output, `i`=ignored); exactly one
/// of `r`/`c` must appear. `output_categories` bounds categorical values and
/// is recorded on every sample; `skip_rows` skips a leading header block.
pub fn from_csv(
    path: impl AsRef<Path>,
    legend: &str,
    output_categories: usize,
    skip_rows: usize,
) -> Result<Vec<Sample<TabularOracle>>> {
    let roles = parse_legend(legend)?;
    let is_regression = roles.iter().any(|r| *r == FieldRole::RegressionOutput);
    let is_categorical = roles.iter().any(|r| *r == FieldRole::CategoricalOutput);
    if is_regression == is_categorical {
        return Err(Error::MalformedInput(
            "legend must name exactly one of 'r' or 'c' as the output column".into(),
        ));
    }

    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| Error::MalformedInput(format!("failed to read '{}': {e}", path.as_ref().display())))?;

    let mut samples = Vec::new();
    for (row_index, line) in text.lines().enumerate().skip(skip_rows) {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != roles.len() {
            return Err(Error::MalformedInput(format!(
                "row {row_index} has {} fields, legend expects {}",
                fields.len(),
                roles.len()
            )));
        }

        let mut features = Vec::new();
        let mut output = None;
        let mut key = SampleKey::from(samples.len() as u64);

        for (role, field) in roles.iter().zip(fields.iter()) {
            match role {
                FieldRole::Key => {
                    // Keys are opaque identifiers (spec.md's "opaque
                    // identifier"), not required to be numeric: a row may be
                    // keyed by a UUID or content hash just as well as a
                    // row number, so the raw field is kept as-is.
                    key = SampleKey(field.to_string());
                }
                FieldRole::Feature => {
                    features.push(field.parse().map_err(|_| {
                        Error::MalformedInput(format!(
                            "row {row_index}: non-numeric feature '{field}'"
                        ))
                    })?);
                }
                FieldRole::RegressionOutput => {
                    output = Some(field.parse().map_err(|_| {
                        Error::MalformedInput(format!(
                            "row {row_index}: non-numeric regression output '{field}'"
                        ))
                    })?);
                }
                FieldRole::CategoricalOutput => {
                    let category: usize = field.parse().map_err(|_| {
                        Error::MalformedInput(format!(
                            "row {row_index}: non-numeric category '{field}'"
                        ))
                    })?;
                    if category >= output_categories {
                        return Err(Error::MalformedInput(format!(
                            "row {row_index}: category {category} out of range [0, {output_categories})"
                        )));
                    }
                    output = Some(category as f64);
                }
                FieldRole::Ignored => {}
            }
        }

        let output = output.ok_or_else(|| {
            Error::MalformedInput(format!("row {row_index}: no output column present"))
        })?;
        let categories = if is_categorical { output_categories } else { 1 };
        samples.push(Sample::new(
            key,
            1.0,
            output,
            categories,
            TabularOracle::new(features),
        ));
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn write_temp_csv(contents: &str) -> std::path::PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "blocks_ml_forest_csv_test_{}_{}.csv",
            std::process::id(),
            n
        ));
        std::fs::File::create(&path)
            .unwrap()
            .write_all(contents.as_bytes())
            .unwrap();
        path
    }

    #[test]
    fn parses_regression_rows_with_a_key_column() {
        let path = write_temp_csv("1,2.0,3.0,5.0\n2,4.0,1.0,6.0\n");
        let samples = from_csv(&path, "kffr", 1, 0).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].output(), 5.0);
        assert_eq!(samples[0].feature(0), 2.0);
        assert_eq!(samples[0].feature(1), 3.0);
        assert_eq!(*samples[0].key(), SampleKey("1".to_string()));
    }

    #[test]
    fn accepts_non_numeric_keys() {
        let path = write_temp_csv("row-a,2.0,5.0\nrow-b,4.0,6.0\n");
        let samples = from_csv(&path, "kfr", 1, 0).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(*samples[0].key(), SampleKey("row-a".to_string()));
        assert_eq!(*samples[1].key(), SampleKey("row-b".to_string()));
    }

    #[test]
    fn skips_header_rows() {
        let path = write_temp_csv("id,x,y\n1,2.0,7.0\n");
        let samples = from_csv(&path, "kfr", 1, 1).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].output(), 7.0);
    }

    #[test]
    fn rejects_field_count_mismatch() {
        let path = write_temp_csv("1,2.0\n");
        let result = from_csv(&path, "kff", 1, 0);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn rejects_category_out_of_range() {
        let path = write_temp_csv("1,2.0,5\n");
        let result = from_csv(&path, "kfc", 3, 0);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn rejects_ambiguous_output_legend() {
        let path = write_temp_csv("1,2.0,3.0,1\n");
        let result = from_csv(&path, "kfrc", 2, 0);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }
}
