// ============================================================
// Layer 6 — Result Store
// ============================================================
// Writes one benchmark table as CSV with a header row.
//
// Output layout (one file per test set and end epoch):
//   {output_dir}/{prefix}-series-roll-avg/
//     bench_config.json
//     init_14.csv
//     sample_14.csv
//     cur_iter1_27.csv
//
// Example CSV output:
//   file,actual,detected,conf,conf_std,hit
//   data/images/a.jpg,dog,dog,0.812000,0.031000,true
//   data/images/a.jpg,cat,,0.000000,0.000000,false
//
// The table is written to `{path}.tmp` and renamed into place, so
// a benchmark point either exists completely or not at all. The
// orchestrator relies on that when it skips existing files.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::domain::traits::TabularRow;

pub struct ResultStore;

impl ResultStore {
    /// Write `rows` to `path`, replacing any previous file.
    pub fn save<R: TabularRow>(rows: &[R], path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }

        let tmp = temp_path(path);
        {
            let file = fs::File::create(&tmp)
                .with_context(|| format!("Cannot create '{}'", tmp.display()))?;
            let mut w = BufWriter::new(file);

            writeln!(w, "{}", R::COLUMNS.join(","))?;
            for row in rows {
                let line = row
                    .fields()
                    .iter()
                    .map(|f| quote(f))
                    .collect::<Vec<_>>()
                    .join(",");
                writeln!(w, "{line}")?;
            }
            w.flush()?;
        }

        fs::rename(&tmp, path)
            .with_context(|| format!("Cannot move results into '{}'", path.display()))?;

        let mut images: Vec<&str> = rows.iter().map(|r| r.file()).collect();
        images.dedup();
        tracing::debug!(
            "Saved {} rows for {} images to '{}'",
            rows.len(),
            images.len(),
            path.display()
        );
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Quote a field containing a comma, quote or line break.
fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
