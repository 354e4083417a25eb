use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::export::pipeline::ExportedFile;
use crate::foundation::error::{StudioError, StudioResult};

/// Destination of finished export files.
pub trait DownloadSink {
    fn save(&mut self, file: &ExportedFile) -> StudioResult<()>;
}

/// Saves files into a directory.
///
/// Each file is first written to a hidden staging file next to its destination and then renamed
/// into place; the staging file is removed on every path.
#[derive(Clone, Debug)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

struct StagingGuard(Option<PathBuf>);

impl Drop for StagingGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

impl DownloadSink for DirectorySink {
    fn save(&mut self, file: &ExportedFile) -> StudioResult<()> {
        let plain = Path::new(&file.name)
            .file_name()
            .is_some_and(|n| n == file.name.as_str());
        if !plain || file.name.starts_with('.') {
            return Err(StudioError::validation(format!(
                "download name must be a plain file name: '{}'",
                file.name
            )));
        }

        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create download dir '{}'", self.dir.display()))?;

        let dest = self.dir.join(&file.name);
        let staging = self.dir.join(format!(".{}.part", file.name));
        let _guard = StagingGuard(Some(staging.clone()));

        std::fs::write(&staging, &file.bytes)
            .with_context(|| format!("write '{}'", staging.display()))?;
        std::fs::rename(&staging, &dest)
            .with_context(|| format!("move download into '{}'", dest.display()))?;
        tracing::debug!(path = %dest.display(), bytes = file.bytes.len(), "download saved");
        Ok(())
    }
}

/// Keeps files in memory, in save order.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDownloads {
    files: Vec<ExportedFile>,
}

impl InMemoryDownloads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[ExportedFile] {
        &self.files
    }

    pub fn names(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.name.as_str()).collect()
    }
}

impl DownloadSink for InMemoryDownloads {
    fn save(&mut self, file: &ExportedFile) -> StudioResult<()> {
        self.files.push(file.clone());
        Ok(())
    }
}

/// Save `files` one after another. A failing save is logged and the rest still go out.
///
/// Returns the names of the files that were saved, in save order.
pub fn download_all<'a>(
    files: impl IntoIterator<Item = &'a ExportedFile>,
    sink: &mut dyn DownloadSink,
) -> Vec<&'a str> {
    let mut saved = Vec::new();
    for file in files {
        match sink.save(file) {
            Ok(()) => saved.push(file.name.as_str()),
            Err(e) => tracing::warn!(file = %file.name, error = %e, "download failed"),
        }
    }
    saved
}

#[cfg(test)]
#[path = "../../tests/unit/export/sink.rs"]
mod tests;
