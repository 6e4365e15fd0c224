// src/export/mod.rs

use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

pub mod csv;
pub mod parquet;

/// Write through `<path>.tmp` and rename, so a failed export never leaves a
/// half-written artifact at `path`.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(BufWriter<File>) -> Result<()>,
{
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let file = File::create(&tmp_path)
        .with_context(|| format!("could not create temporary file `{}`", tmp_path.display()))?;
    if let Err(e) = write(BufWriter::new(file)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path).with_context(|| {
        format!(
            "failed to rename `{}` to `{}`",
            tmp_path.display(),
            path.display()
        )
    })
}
