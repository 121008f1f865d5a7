//! Per-file work: translate scripts, copy everything else.

use crate::codec::{self, LineFilter};
use crate::config::ScriptsConfig;
use crate::error::{CodecError, ProcessError};
use crate::progress::Progress;
use crate::translator::{Outcome, Translator};
use crate::utils::{decode_utf16, encode_utf16_with_bom, extension_lowercase, split_line_ending};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One source file and where its output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileJob {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl FileJob {
    /// Short name for log output.
    pub fn display_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

/// How a file is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Text script whose dialogue gets translated.
    Script,
    /// Anything else, copied verbatim.
    Other,
}

/// Line statistics for a translated script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptStats {
    /// All lines in the file.
    pub lines: usize,
    /// Lines sent through the codec.
    pub translatable: usize,
    /// Lines translated by the backend during this run.
    pub translated: usize,
    /// Lines served from the cache.
    pub cached: usize,
    /// Lines kept in the original language after a backend failure.
    pub failed: usize,
    /// Lines kept verbatim because placeholders did not survive translation.
    pub mismatched: usize,
}

/// What happened to one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileReport {
    /// Copied without changes.
    Copied,
    /// Script rewritten.
    Translated(ScriptStats),
}

/// Translates or copies files according to the script settings.
pub struct FileProcessor {
    translator: Arc<Translator>,
    extensions: Vec<String>,
    filter: LineFilter,
    progress: Arc<Progress>,
}

impl FileProcessor {
    /// Create a new FileProcessor.
    pub fn new(
        translator: Arc<Translator>,
        scripts: &ScriptsConfig,
        progress: Arc<Progress>,
    ) -> Self {
        Self {
            translator,
            extensions: scripts
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            filter: LineFilter::new(&scripts.control_prefixes),
            progress,
        }
    }

    /// Classifies a file by its extension.
    pub fn classify(&self, path: &Path) -> FileKind {
        match extension_lowercase(path) {
            Some(ext) if self.extensions.contains(&ext) => FileKind::Script,
            _ => FileKind::Other,
        }
    }

    /// Processes one job. I/O errors end this job only.
    pub async fn process(&self, job: &FileJob) -> Result<FileReport, ProcessError> {
        if let Some(parent) = job.destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ProcessError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        match self.classify(&job.source) {
            FileKind::Other => {
                copy_verbatim(job).await?;
                Ok(FileReport::Copied)
            }
            FileKind::Script => self.translate_script(job).await.map(FileReport::Translated),
        }
    }

    /// Reads, translates and rewrites a UTF-16 script.
    async fn translate_script(&self, job: &FileJob) -> Result<ScriptStats, ProcessError> {
        let data = tokio::fs::read(&job.source)
            .await
            .map_err(|source| ProcessError::Read {
                path: job.source.clone(),
                source,
            })?;
        let text = decode_utf16(&data);
        let lines: Vec<&str> = text.split_inclusive('\n').collect();

        let name = job.display_name();
        let file_progress = self.progress.start_file(&name, lines.len());
        let mut stats = ScriptStats {
            lines: lines.len(),
            ..ScriptStats::default()
        };
        let mut output = String::with_capacity(text.len());

        for line in lines {
            if self.filter.is_translatable(line) {
                stats.translatable += 1;
                let (body, ending) = split_line_ending(line);
                match self.translate_line(body, &mut stats).await {
                    Ok(rebuilt) => {
                        output.push_str(&rebuilt);
                        output.push_str(ending);
                    }
                    Err(e) => {
                        stats.mismatched += 1;
                        self.progress.warning(&format!(
                            "{}: kept original line ({}): {}",
                            name,
                            e,
                            body.trim()
                        ));
                        output.push_str(line);
                    }
                }
            } else {
                output.push_str(line);
            }
            file_progress.advance();
        }

        tokio::fs::write(&job.destination, encode_utf16_with_bom(&output))
            .await
            .map_err(|source| ProcessError::Write {
                path: job.destination.clone(),
                source,
            })?;

        Ok(stats)
    }

    /// Extract, translate, reassemble.
    async fn translate_line(
        &self,
        body: &str,
        stats: &mut ScriptStats,
    ) -> Result<String, CodecError> {
        let extracted = codec::extract(body);
        let outcome = self.translator.translate(&extracted.cleaned).await;
        match &outcome {
            Outcome::Translated(_) => stats.translated += 1,
            Outcome::Cached(_) => stats.cached += 1,
            Outcome::Failed(_) => stats.failed += 1,
            Outcome::Unchanged => {}
        }
        let translated = outcome.text(&extracted.cleaned);
        codec::reassemble(&translated, &extracted.tokens)
    }
}

/// Copies bytes, permissions and modification time.
async fn copy_verbatim(job: &FileJob) -> Result<(), ProcessError> {
    let source = job.source.clone();
    let destination = job.destination.clone();

    tokio::task::spawn_blocking(move || {
        let copy_err = |e| ProcessError::Copy {
            from: source.clone(),
            to: destination.clone(),
            source: e,
        };
        std::fs::copy(&source, &destination).map_err(copy_err)?;
        let modified = std::fs::metadata(&source)
            .and_then(|meta| meta.modified())
            .map_err(copy_err)?;
        std::fs::OpenOptions::new()
            .write(true)
            .open(&destination)
            .and_then(|file| file.set_modified(modified))
            .map_err(copy_err)
    })
    .await
    .map_err(|e| ProcessError::TaskAborted(e.to_string()))?
}
