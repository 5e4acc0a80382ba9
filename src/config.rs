use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;

/// Outcome of a config scan: the winning table number and the first PV
/// value found after its marker line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PvSelection {
    pub table: u64,
    pub value: String,
}

/// Line scanner for `TABLE_<n>` markers and `PV=<value>` assignments.
pub struct ConfigScanner {
    table_pattern: Regex,
    pv_pattern: Regex,
}

impl ConfigScanner {
    pub fn new() -> Self {
        Self {
            table_pattern: Regex::new(r"TABLE_(\d+)").expect("Invalid table regex"),
            pv_pattern: Regex::new(r"PV=([\d.]+)").expect("Invalid PV regex"),
        }
    }

    /// Selects the PV value belonging to the highest-numbered table marker.
    ///
    /// A marker only wins if its number strictly exceeds the running
    /// maximum; on a win the previous candidate is discarded and the first
    /// `PV=` line after the marker (searching to the end of the sequence)
    /// becomes the new candidate. A winning marker with no following `PV=`
    /// line therefore yields `None` even if an earlier table had one.
    pub fn select_pv<S: AsRef<str>>(&self, lines: &[S]) -> Option<PvSelection> {
        let mut largest_table: u64 = 0;
        let mut selected: Option<PvSelection> = None;

        for (i, line) in lines.iter().enumerate() {
            let Some(caps) = self.table_pattern.captures(line.as_ref()) else {
                continue;
            };
            let Ok(table) = caps[1].parse::<u64>() else {
                continue;
            };
            if table > largest_table {
                largest_table = table;
                selected = self
                    .first_pv(&lines[i + 1..])
                    .map(|value| PvSelection { table, value });
            }
        }

        selected
    }

    fn first_pv<S: AsRef<str>>(&self, lines: &[S]) -> Option<String> {
        lines.iter().find_map(|line| {
            self.pv_pattern
                .captures(line.as_ref())
                .map(|caps| caps[1].to_string())
        })
    }

    /// Scans `config_path` and persists the selected PV value to `out_path`.
    ///
    /// Prints a confirmation naming the winning table, or "No PV value
    /// found." when no candidate survives, in which case `out_path` is left
    /// untouched.
    pub fn scan_config(&self, config_path: &Path, out_path: &Path) -> Result<Option<PvSelection>> {
        let text = fs::read_to_string(config_path)
            .with_context(|| format!("Reading {:?}", config_path))?;
        let lines: Vec<&str> = text.lines().collect();

        match self.select_pv(&lines) {
            Some(selection) => {
                fs::write(out_path, &selection.value)
                    .with_context(|| format!("Writing {:?}", out_path))?;
                println!(
                    "PV value '{}' from TABLE_{}.",
                    selection.value, selection.table
                );
                Ok(Some(selection))
            }
            None => {
                println!("No PV value found.");
                Ok(None)
            }
        }
    }
}

impl Default for ConfigScanner {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unit tests for marker selection and the scan-and-persist operation.
// ─────────────────────────────────────────────────────────────────────────────
