//! Synthetic student-performance dataset.
//!
//! The real dataset is not shipped with the repository, so `score synth`
//! writes a stand-in with the same schema. Scores are driven by one latent
//! ability draw per student plus additive effects of the categorical
//! columns and independent noise, which gives the math score a strong but
//! imperfect relationship to the other columns.

use std::fs::create_dir_all;
use std::path::Path;

use rand::SeedableRng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::data::table::Table;
use crate::error::{AppError, ErrorKind};

const GENDERS: [(&str, f64); 2] = [("female", 0.52), ("male", 0.48)];

const GROUPS: [(&str, f64); 5] = [
    ("group A", 0.09),
    ("group B", 0.19),
    ("group C", 0.32),
    ("group D", 0.26),
    ("group E", 0.14),
];

const EDUCATION: [(&str, f64); 6] = [
    ("some high school", 0.18),
    ("high school", 0.20),
    ("some college", 0.23),
    ("associate's degree", 0.22),
    ("bachelor's degree", 0.12),
    ("master's degree", 0.05),
];

const LUNCH: [(&str, f64); 2] = [("standard", 0.645), ("free/reduced", 0.355)];

const PREP: [(&str, f64); 2] = [("none", 0.64), ("completed", 0.36)];

/// Raw dataset column order.
pub const RAW_COLUMNS: [&str; 8] = [
    "gender",
    "race/ethnicity",
    "parental level of education",
    "lunch",
    "test preparation course",
    "math score",
    "reading score",
    "writing score",
];

struct Categorical {
    labels: Vec<&'static str>,
    index: WeightedIndex<f64>,
}

impl Categorical {
    fn new(choices: &[(&'static str, f64)]) -> Result<Self, AppError> {
        let index = WeightedIndex::new(choices.iter().map(|(_, w)| *w)).map_err(|e| {
            AppError::wrap(ErrorKind::Config, "Invalid category weights", e)
        })?;
        Ok(Self {
            labels: choices.iter().map(|(l, _)| *l).collect(),
            index,
        })
    }

    fn sample(&self, rng: &mut StdRng) -> (usize, &'static str) {
        let idx = self.index.sample(rng);
        (idx, self.labels[idx])
    }
}

/// Generate `rows` students with a seeded RNG.
pub fn generate_students(rows: usize, seed: u64) -> Result<Table, AppError> {
    if rows == 0 {
        return Err(AppError::new(ErrorKind::Config, "Row count must be > 0."));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::wrap(ErrorKind::Config, "Noise distribution error", e))?;

    let gender = Categorical::new(&GENDERS)?;
    let group = Categorical::new(&GROUPS)?;
    let education = Categorical::new(&EDUCATION)?;
    let lunch = Categorical::new(&LUNCH)?;
    let prep = Categorical::new(&PREP)?;

    let mut out = Vec::with_capacity(rows);
    for _ in 0..rows {
        let (g_idx, g) = gender.sample(&mut rng);
        let (r_idx, r) = group.sample(&mut rng);
        let (e_idx, e) = education.sample(&mut rng);
        let (l_idx, l) = lunch.sample(&mut rng);
        let (p_idx, p) = prep.sample(&mut rng);

        let female = g_idx == 0;
        let standard_lunch = l_idx == 0;
        let prepared = p_idx == 1;

        let ability: f64 = normal.sample(&mut rng);
        let common = 1.5 * e_idx as f64
            + if standard_lunch { 6.0 } else { -3.0 }
            + 1.2 * r_idx as f64;

        let reading = 66.0
            + 12.5 * ability
            + common
            + if female { 4.0 } else { -3.5 }
            + if prepared { 5.0 } else { 0.0 }
            + 4.0 * normal.sample(&mut rng);
        let writing = 64.0
            + 13.0 * ability
            + common
            + if female { 5.5 } else { -4.5 }
            + if prepared { 8.0 } else { 0.0 }
            + 4.0 * normal.sample(&mut rng);
        let math = 62.0
            + 13.5 * ability
            + common
            + if female { -3.0 } else { 3.0 }
            + if prepared { 3.0 } else { 0.0 }
            + if r_idx == 4 { 4.0 } else { 0.0 }
            + 5.0 * normal.sample(&mut rng);

        out.push(vec![
            g.to_string(),
            r.to_string(),
            e.to_string(),
            l.to_string(),
            p.to_string(),
            format_score(math),
            format_score(reading),
            format_score(writing),
        ]);
    }

    Table::new(RAW_COLUMNS.iter().map(|c| c.to_string()).collect(), out)
        .map_err(|e| AppError::wrap(ErrorKind::Config, "Synthetic table shape", e))
}

/// Generate a dataset and write it to `path`, creating parent directories.
pub fn write_synthetic_dataset(path: &Path, rows: usize, seed: u64) -> Result<Table, AppError> {
    let table = generate_students(rows, seed)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent).map_err(|e| {
            AppError::wrap(
                ErrorKind::Config,
                format!("Failed to create '{}'", parent.display()),
                e,
            )
        })?;
    }

    table.write_csv(path).map_err(|e| {
        AppError::wrap(
            ErrorKind::Config,
            format!("Failed to write synthetic dataset '{}'", path.display()),
            e,
        )
    })?;

    tracing::info!("Wrote {rows} synthetic rows to {}", path.display());
    Ok(table)
}

fn format_score(value: f64) -> String {
    format!("{}", value.round().clamp(0.0, 100.0) as i64)
}
