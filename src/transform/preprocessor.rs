//! Column-wise preprocessor: raw string cells to a dense feature matrix.
//!
//! Output layout is the numeric block (one column per numeric feature, in
//! [`NUMERIC_COLUMNS`] order) followed by one one-hot block per categorical
//! feature (in [`CATEGORICAL_COLUMNS`] order, categories sorted).

use std::collections::BTreeMap;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::data::Table;
use crate::domain::{CATEGORICAL_COLUMNS, NUMERIC_COLUMNS};
use crate::error::{AppError, ErrorKind};
use crate::math::{mean, median, std_dev};

/// Median imputation, then standard scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct NumericColumn {
    name: String,
    fill: f64,
    mean: f64,
    scale: f64,
}

/// Most-frequent imputation, one-hot encoding, then unit-variance scaling
/// of each indicator column (no centering).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CategoricalColumn {
    name: String,
    fill: String,
    categories: Vec<String>,
    scales: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    numeric: Vec<NumericColumn>,
    categorical: Vec<CategoricalColumn>,
}

/// Empty, `NA` and `nan` cells count as missing.
pub fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || cell.eq_ignore_ascii_case("na") || cell.eq_ignore_ascii_case("nan")
}

fn feature_column<'a>(table: &'a Table, name: &str) -> Result<Vec<&'a str>, AppError> {
    table.column(name).ok_or_else(|| {
        AppError::new(ErrorKind::Transformation, format!("Missing feature column '{name}'"))
    })
}

/// Parse a numeric cell; missing cells yield `None`.
fn parse_numeric(column: &str, row: usize, cell: &str) -> Result<Option<f64>, AppError> {
    if is_missing(cell) {
        return Ok(None);
    }
    let value = cell.trim().parse::<f64>().map_err(|e| {
        AppError::wrap(
            ErrorKind::Transformation,
            format!("Non-numeric value '{cell}' in column '{column}' at row {row}"),
            e,
        )
    })?;
    if !value.is_finite() {
        return Err(AppError::new(
            ErrorKind::Transformation,
            format!("Non-finite value '{cell}' in column '{column}' at row {row}"),
        ));
    }
    Ok(Some(value))
}

impl NumericColumn {
    fn fit(name: &str, cells: &[&str]) -> Result<Self, AppError> {
        let mut present = Vec::with_capacity(cells.len());
        let mut missing = 0usize;
        for (row, cell) in cells.iter().enumerate() {
            match parse_numeric(name, row, cell)? {
                Some(v) => present.push(v),
                None => missing += 1,
            }
        }

        let fill = median(&present).ok_or_else(|| {
            AppError::new(ErrorKind::Transformation, format!("Column '{name}' has no values to fit"))
        })?;
        present.extend(std::iter::repeat_n(fill, missing));

        let sd = std_dev(&present);
        Ok(Self {
            name: name.to_string(),
            fill,
            mean: mean(&present),
            scale: if sd > 0.0 { sd } else { 1.0 },
        })
    }

    fn transform(&self, cells: &[&str], out: &mut DMatrix<f64>, col: usize) -> Result<(), AppError> {
        for (row, cell) in cells.iter().enumerate() {
            let value = parse_numeric(&self.name, row, cell)?.unwrap_or(self.fill);
            out[(row, col)] = (value - self.mean) / self.scale;
        }
        Ok(())
    }
}

impl CategoricalColumn {
    fn fit(name: &str, cells: &[&str]) -> Result<Self, AppError> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut missing = 0usize;
        for cell in cells {
            if is_missing(cell) {
                missing += 1;
            } else {
                *counts.entry(cell.trim()).or_default() += 1;
            }
        }

        // BTreeMap iterates in sorted order, so the first maximum is the
        // lexicographically smallest.
        let mut fill: Option<(&str, usize)> = None;
        for (&category, &count) in &counts {
            if fill.is_none_or(|(_, best)| count > best) {
                fill = Some((category, count));
            }
        }
        let Some((fill, _)) = fill else {
            return Err(AppError::new(
                ErrorKind::Transformation,
                format!("Column '{name}' has no values to fit"),
            ));
        };
        *counts.entry(fill).or_default() += missing;

        let n = cells.len() as f64;
        let scales = counts
            .values()
            .map(|&count| {
                let p = count as f64 / n;
                let sd = (p * (1.0 - p)).sqrt();
                if sd > 0.0 { sd } else { 1.0 }
            })
            .collect();

        Ok(Self {
            name: name.to_string(),
            fill: fill.to_string(),
            categories: counts.keys().map(|c| c.to_string()).collect(),
            scales,
        })
    }

    fn width(&self) -> usize {
        self.categories.len()
    }

    fn transform(&self, cells: &[&str], out: &mut DMatrix<f64>, offset: usize) -> Result<(), AppError> {
        for (row, cell) in cells.iter().enumerate() {
            let value = if is_missing(cell) { self.fill.as_str() } else { cell.trim() };
            let idx = self
                .categories
                .binary_search_by(|c| c.as_str().cmp(value))
                .map_err(|_| {
                    AppError::new(
                        ErrorKind::Transformation,
                        format!("Unknown category '{value}' in column '{}'", self.name),
                    )
                })?;
            out[(row, offset + idx)] = 1.0 / self.scales[idx];
        }
        Ok(())
    }
}

impl Preprocessor {
    /// Learn imputation values, scalings and category sets from `table`.
    pub fn fit(table: &Table) -> Result<Self, AppError> {
        if table.is_empty() {
            return Err(AppError::new(ErrorKind::Transformation, "Cannot fit a preprocessor on zero rows"));
        }

        let numeric = NUMERIC_COLUMNS
            .iter()
            .map(|name| NumericColumn::fit(name, &feature_column(table, name)?))
            .collect::<Result<Vec<_>, _>>()?;
        let categorical = CATEGORICAL_COLUMNS
            .iter()
            .map(|name| CategoricalColumn::fit(name, &feature_column(table, name)?))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { numeric, categorical })
    }

    /// Width of the matrix produced by [`Preprocessor::transform`].
    pub fn n_features_out(&self) -> usize {
        self.numeric.len() + self.categorical.iter().map(CategoricalColumn::width).sum::<usize>()
    }

    /// Encode the feature columns of `table`; extra columns are ignored.
    pub fn transform(&self, table: &Table) -> Result<DMatrix<f64>, AppError> {
        let mut out = DMatrix::zeros(table.len(), self.n_features_out());

        for (col, numeric) in self.numeric.iter().enumerate() {
            numeric.transform(&feature_column(table, &numeric.name)?, &mut out, col)?;
        }
        let mut offset = self.numeric.len();
        for categorical in &self.categorical {
            categorical.transform(&feature_column(table, &categorical.name)?, &mut out, offset)?;
            offset += categorical.width();
        }

        Ok(out)
    }

    /// Output column names, e.g. `writing score` or `lunch=standard`.
    pub fn feature_names(&self) -> Vec<String> {
        self.numeric
            .iter()
            .map(|n| n.name.clone())
            .chain(self.categorical.iter().flat_map(|c| {
                c.categories.iter().map(move |cat| format!("{}={cat}", c.name))
            }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::REQUEST_COLUMNS;

    fn table(rows: &[[&str; 7]]) -> Table {
        Table::new(
            REQUEST_COLUMNS.iter().map(|s| s.to_string()).collect(),
            rows.iter().map(|r| r.iter().map(|s| s.to_string()).collect()).collect(),
        )
        .unwrap()
    }

    fn train() -> Table {
        table(&[
            ["female", "group B", "some college", "standard", "none", "72", "74"],
            ["male", "group C", "high school", "free/reduced", "completed", "90", "88"],
            ["female", "group B", "some college", "standard", "none", "", "70"],
            ["male", "group A", "master's degree", "standard", "none", "60", "NA"],
        ])
    }

    #[test]
    fn layout_is_numeric_then_sorted_one_hot() {
        let pre = Preprocessor::fit(&train()).unwrap();
        let names = pre.feature_names();
        assert_eq!(&names[..2], &["writing score".to_string(), "reading score".to_string()]);
        assert_eq!(&names[2..4], &["gender=female".to_string(), "gender=male".to_string()]);
        assert_eq!(names.len(), pre.n_features_out());
        // 2 numeric + 2 + 3 + 3 + 2 + 2 categories.
        assert_eq!(pre.n_features_out(), 14);
    }

    #[test]
    fn numeric_block_is_imputed_and_standardized() {
        let pre = Preprocessor::fit(&train()).unwrap();
        let x = pre.transform(&train()).unwrap();

        for col in 0..2 {
            let values: Vec<f64> = x.column(col).iter().copied().collect();
            assert!(mean(&values).abs() < 1e-12);
            assert!((std_dev(&values) - 1.0).abs() < 1e-12);
        }
        // Missing reading score takes the median of 72, 90, 60 = 72.
        assert_eq!(x[(2, 1)], x[(0, 1)]);
    }

    #[test]
    fn one_hot_is_scaled_by_column_std() {
        let pre = Preprocessor::fit(&train()).unwrap();
        let x = pre.transform(&train()).unwrap();
        // gender=female appears in half the rows: std = 0.5.
        assert_eq!(x[(0, 2)], 2.0);
        assert_eq!(x[(0, 3)], 0.0);
        assert_eq!(x[(1, 3)], 2.0);
    }

    #[test]
    fn missing_category_takes_smallest_most_frequent() {
        let rows = table(&[
            ["female", "group B", "x", "standard", "none", "1", "1"],
            ["male", "group C", "x", "standard", "none", "2", "2"],
            ["", "group B", "x", "standard", "none", "3", "3"],
        ]);
        let pre = Preprocessor::fit(&rows).unwrap();
        let x = pre.transform(&rows).unwrap();
        // female/male tie at one each; the blank row is imputed as "female".
        assert!(x[(2, 2)] > 0.0);
        assert_eq!(x[(2, 3)], 0.0);
    }

    #[test]
    fn unknown_category_fails() {
        let pre = Preprocessor::fit(&train()).unwrap();
        let query = table(&[["other", "group B", "some college", "standard", "none", "70", "70"]]);
        let err = pre.transform(&query).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transformation);
        assert!(err.message().contains("Unknown category 'other'"));
    }

    #[test]
    fn missing_column_and_bad_number_fail() {
        let pre = Preprocessor::fit(&train()).unwrap();

        let narrow = Table::new(vec!["gender".into()], vec![vec!["male".into()]]).unwrap();
        assert!(pre.transform(&narrow).unwrap_err().message().contains("Missing feature column"));

        let bad = table(&[["male", "group B", "some college", "standard", "none", "seventy", "70"]]);
        assert_eq!(pre.transform(&bad).unwrap_err().kind(), ErrorKind::Transformation);
    }

    #[test]
    fn infinite_numbers_fail_in_fit_and_transform() {
        let pre = Preprocessor::fit(&train()).unwrap();
        for raw in ["inf", "-inf", "1e309"] {
            let query = table(&[["male", "group B", "some college", "standard", "none", raw, "70"]]);
            let err = pre.transform(&query).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Transformation, "{raw}");
            assert!(err.message().contains("Non-finite"));
        }

        let rows = table(&[
            ["female", "group B", "x", "standard", "none", "1", "1"],
            ["male", "group C", "x", "standard", "none", "inf", "2"],
        ]);
        assert_eq!(Preprocessor::fit(&rows).unwrap_err().kind(), ErrorKind::Transformation);
    }
}
