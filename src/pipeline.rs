//! Job enumeration and bounded parallel dispatch.
//!
//! The whole input tree is listed up front, then every file is handed to a
//! pool of `workers` concurrent tasks. A failing job is reported and skipped;
//! the rest of the run carries on and the cache is saved at the end.

use crate::backend::TranslationBackend;
use crate::cache::TranslationCache;
use crate::config::Config;
use crate::console::Console;
use crate::error::PipelineError;
use crate::processor::{FileJob, FileProcessor, FileReport};
use crate::progress::Progress;
use crate::translator::Translator;
use futures::{FutureExt, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use walkdir::WalkDir;

/// Aggregate result of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Jobs scheduled.
    pub total: usize,
    /// Scripts rewritten.
    pub scripts: usize,
    /// Files copied verbatim.
    pub copied: usize,
    /// Jobs that ended with an error.
    pub failed: usize,
    /// Lines translated by the backend.
    pub lines_translated: usize,
    /// Lines served from the cache.
    pub lines_cached: usize,
    /// Lines left untranslated after backend failures.
    pub lines_failed: usize,
    /// Lines kept verbatim after a placeholder mismatch.
    pub lines_mismatched: usize,
    /// Files that could not be processed, with the error message.
    pub failures: Vec<(PathBuf, String)>,
}

impl RunSummary {
    fn record(&mut self, job: &FileJob, result: Result<FileReport, String>) {
        match result {
            Ok(FileReport::Copied) => self.copied += 1,
            Ok(FileReport::Translated(stats)) => {
                self.scripts += 1;
                self.lines_translated += stats.translated;
                self.lines_cached += stats.cached;
                self.lines_failed += stats.failed;
                self.lines_mismatched += stats.mismatched;
            }
            Err(message) => {
                self.failed += 1;
                self.failures.push((job.source.clone(), message));
            }
        }
    }
}

/// Lists every file under `input_root` with its mirrored path under `output_root`.
///
/// Symbolic links are followed, so a linked file is listed under the link's
/// own path. Failing to read the root itself is an error; unreadable entries
/// further down (including broken links and link loops) are reported and
/// skipped.
pub fn enumerate_jobs(
    input_root: &Path,
    output_root: &Path,
    console: &Console,
) -> Result<Vec<FileJob>, PipelineError> {
    if !input_root.is_dir() {
        return Err(PipelineError::InputUnreadable {
            path: input_root.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let mut jobs = Vec::new();
    for entry in WalkDir::new(input_root)
        .follow_links(true)
        .sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(PipelineError::InputUnreadable {
                    path: input_root.to_path_buf(),
                    message: e.to_string(),
                });
            }
            Err(e) => {
                console.warning(&format!("Skipping unreadable entry: {}", e));
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(input_root)
            .map_err(|_| PipelineError::OutsideRoot(entry.path().to_path_buf()))?;
        jobs.push(FileJob {
            source: entry.path().to_path_buf(),
            destination: output_root.join(relative),
        });
    }

    Ok(jobs)
}

/// Drives a set of jobs through a bounded worker pool.
pub struct Pipeline {
    processor: Arc<FileProcessor>,
    progress: Arc<Progress>,
    workers: usize,
}

impl Pipeline {
    /// Create a new Pipeline.
    pub fn new(processor: Arc<FileProcessor>, progress: Arc<Progress>, workers: usize) -> Self {
        Self {
            processor,
            progress,
            workers: workers.max(1),
        }
    }

    /// Runs every job and waits for all of them.
    ///
    /// Jobs run as separate tasks, at most `workers` at a time. Each one
    /// advances overall progress exactly once, whatever its outcome.
    pub async fn run(&self, jobs: Vec<FileJob>) -> RunSummary {
        let mut summary = RunSummary {
            total: jobs.len(),
            ..RunSummary::default()
        };

        let mut results = futures::stream::iter(jobs)
            .map(|job| {
                let processor = Arc::clone(&self.processor);
                let progress = Arc::clone(&self.progress);
                let fallback = job.clone();
                tokio::spawn(async move {
                    let result = processor.process(&job).await.map_err(|e| e.to_string());
                    if let Err(message) = &result {
                        progress.error(&format!("Error in {}: {}", job.display_name(), message));
                    }
                    progress.job_finished(result.is_ok());
                    result
                })
                .map(move |joined| (fallback, joined))
            })
            .buffer_unordered(self.workers);

        while let Some((job, joined)) = results.next().await {
            match joined {
                Ok(result) => summary.record(&job, result),
                Err(e) => {
                    // A panicking job still counts as finished.
                    let message = format!("worker task failed: {}", e);
                    self.progress.job_finished(false);
                    self.progress
                        .error(&format!("Error in {}: {}", job.display_name(), message));
                    summary.record(&job, Err(message));
                }
            }
        }

        self.progress.finish();
        summary
    }

    /// Loads the cache, processes the configured tree and saves the cache.
    ///
    /// Only an unreadable input directory stops the run early. The cache is
    /// written even when some jobs failed.
    pub async fn execute(
        config: &Config,
        backend: Arc<dyn TranslationBackend>,
        console: Console,
    ) -> Result<RunSummary, PipelineError> {
        let cache = Arc::new(TranslationCache::load(&config.paths.cache_file));
        console.info(&format!(
            "Translation cache: {} entries",
            console.count(cache.len())
        ));

        let jobs = enumerate_jobs(&config.paths.input, &config.paths.output, &console)?;
        console.info(&format!(
            "Found {} files in {}",
            console.count(jobs.len()),
            config.paths.input.display()
        ));

        let translator = Arc::new(Translator::new(
            backend,
            Arc::clone(&cache),
            config.translation.source_language.clone(),
            config.translation.target_language.clone(),
            config.translation.timeout(),
        ));
        console.step(&format!(
            "Translating to '{}' via {} with {} workers...",
            config.translation.target_language,
            translator.backend_name(),
            config.translation.workers
        ));

        let progress = Arc::new(Progress::new(console, jobs.len()));
        let processor = Arc::new(FileProcessor::new(
            translator,
            &config.scripts,
            Arc::clone(&progress),
        ));
        let pipeline = Pipeline::new(processor, progress, config.translation.workers);
        let summary = pipeline.run(jobs).await;

        match cache.save(&config.paths.cache_file) {
            Ok(()) => console.success(&format!(
                "Saved {} cached translations to {}",
                console.count(cache.len()),
                config.paths.cache_file.display()
            )),
            Err(e) => console.error(&format!("Could not save translation cache: {}", e)),
        }

        Ok(summary)
    }
}

/// Prints the end-of-run summary.
pub fn print_summary(console: &Console, summary: &RunSummary, elapsed: Duration) {
    console.section("Summary");
    console.info(&format!(
        "{} scripts translated, {} files copied, {} failed {} in {}",
        console.count(summary.scripts),
        console.count(summary.copied),
        summary.failed,
        console.muted(&format!("({} total)", summary.total)),
        console.elapsed(elapsed)
    ));
    console.info(&format!(
        "Lines: {} translated, {} from cache, {} untranslated after backend errors, {} kept after placeholder mismatch",
        summary.lines_translated,
        summary.lines_cached,
        summary.lines_failed,
        summary.lines_mismatched
    ));
    for (path, message) in &summary.failures {
        console.error(&format!("{}: {}", path.display(), message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScriptsConfig;
    use crate::error::TranslationError;
    use crate::translator::tests::UppercaseBackend;
    use crate::utils::{decode_utf16, encode_utf16_with_bom};
    use async_trait::async_trait;
    use std::sync::atomic::Ordering;
    use tempfile::tempdir;

    fn console() -> Console {
        Console::with_colors(false)
    }

    fn write_tree(root: &Path) {
        std::fs::create_dir_all(root.join("scenario")).unwrap();
        std::fs::create_dir_all(root.join("bgm").join("loops")).unwrap();
        std::fs::write(
            root.join("scenario").join("prologue.ks"),
            encode_utf16_with_bom("@bg storage=sky\nWelcome[r]\n"),
        )
        .unwrap();
        std::fs::write(
            root.join("scenario").join("day1.ks"),
            encode_utf16_with_bom("Welcome[r]\nGood night[p]\n"),
        )
        .unwrap();
        std::fs::write(root.join("bgm").join("loops").join("theme.ogg"), b"OggS\x00\x02").unwrap();
        std::fs::write(root.join("startup.tjs"), encode_utf16_with_bom("// init\n")).unwrap();
    }

    fn make_pipeline(
        backend: Arc<dyn TranslationBackend>,
        cache: Arc<TranslationCache>,
        total: usize,
        workers: usize,
    ) -> Pipeline {
        let translator = Arc::new(Translator::new(
            backend,
            cache,
            "auto",
            "en",
            Duration::from_secs(5),
        ));
        let progress = Arc::new(Progress::new(console(), total));
        let processor = Arc::new(FileProcessor::new(
            translator,
            &ScriptsConfig::default(),
            Arc::clone(&progress),
        ));
        Pipeline::new(processor, progress, workers)
    }

    #[test]
    fn test_enumerate_mirrors_paths() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        write_tree(&input);

        let jobs = enumerate_jobs(&input, &output, &console()).unwrap();
        let pairs: Vec<(PathBuf, PathBuf)> = jobs
            .into_iter()
            .map(|j| (j.source, j.destination))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (
                    input.join("bgm/loops/theme.ogg"),
                    output.join("bgm/loops/theme.ogg")
                ),
                (input.join("scenario/day1.ks"), output.join("scenario/day1.ks")),
                (
                    input.join("scenario/prologue.ks"),
                    output.join("scenario/prologue.ks")
                ),
                (input.join("startup.tjs"), output.join("startup.tjs")),
            ]
        );
    }

    #[test]
    fn test_enumerate_missing_root_is_error() {
        let dir = tempdir().unwrap();
        let result = enumerate_jobs(&dir.path().join("nope"), &dir.path().join("out"), &console());
        assert!(matches!(result, Err(PipelineError::InputUnreadable { .. })));
    }

    #[test]
    fn test_enumerate_empty_root() {
        let dir = tempdir().unwrap();
        let jobs = enumerate_jobs(dir.path(), &dir.path().join("out"), &console()).unwrap();
        assert!(jobs.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_enumerate_includes_symlinked_files() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::write(input.join("plain.ogg"), b"plain").unwrap();
        std::fs::write(dir.path().join("real.ogg"), b"real").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.ogg"), input.join("linked.ogg")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.ogg"), input.join("broken.ogg")).unwrap();

        let jobs = enumerate_jobs(&input, &output, &console()).unwrap();
        let names: Vec<String> = jobs.iter().map(FileJob::display_name).collect();
        assert_eq!(names, vec!["linked.ogg", "plain.ogg"]);
        assert_eq!(jobs[0].destination, output.join("linked.ogg"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_copies_symlink_target() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::write(dir.path().join("real.ogg"), b"real").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.ogg"), input.join("linked.ogg")).unwrap();

        let jobs = enumerate_jobs(&input, &output, &console()).unwrap();
        let pipeline = make_pipeline(
            Arc::new(UppercaseBackend::default()),
            Arc::new(TranslationCache::new()),
            jobs.len(),
            1,
        );
        let summary = pipeline.run(jobs).await;

        assert_eq!(summary.copied, 1);
        let copied = output.join("linked.ogg");
        assert!(!std::fs::symlink_metadata(&copied).unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read(copied).unwrap(), b"real");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_run_processes_every_job() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        write_tree(&input);

        let backend = Arc::new(UppercaseBackend::default());
        let cache = Arc::new(TranslationCache::new());
        let jobs = enumerate_jobs(&input, &output, &console()).unwrap();
        let pipeline = make_pipeline(backend.clone(), Arc::clone(&cache), jobs.len(), 2);

        let summary = pipeline.run(jobs).await;

        assert_eq!(summary.total, 4);
        assert_eq!(summary.scripts, 3);
        assert_eq!(summary.copied, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(pipeline.progress.completed(), 4);
        assert_eq!(
            std::fs::read(output.join("bgm/loops/theme.ogg")).unwrap(),
            b"OggS\x00\x02"
        );
        assert_eq!(
            decode_utf16(&std::fs::read(output.join("scenario/prologue.ks")).unwrap()),
            "@bg storage=sky\nWELCOME[r]\n"
        );
        assert_eq!(
            decode_utf16(&std::fs::read(output.join("startup.tjs")).unwrap()),
            "// INIT\n"
        );
        // "Welcome @" appears in two files; it may be translated twice if both
        // workers miss the cache at the same moment, never more.
        let calls = backend.calls.load(Ordering::SeqCst);
        assert!((3..=4).contains(&calls), "unexpected backend calls: {}", calls);
        assert_eq!(cache.get("Welcome @").as_deref(), Some("WELCOME @"));
    }

    #[tokio::test]
    async fn test_failed_job_does_not_stop_others() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        write_tree(&input);

        let jobs = enumerate_jobs(&input, &output, &console()).unwrap();
        std::fs::remove_file(input.join("scenario/day1.ks")).unwrap();

        let cache = Arc::new(TranslationCache::new());
        let pipeline = make_pipeline(
            Arc::new(UppercaseBackend::default()),
            Arc::clone(&cache),
            jobs.len(),
            3,
        );
        let summary = pipeline.run(jobs).await;

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.scripts + summary.copied, 3);
        assert_eq!(summary.failures[0].0, input.join("scenario/day1.ks"));
        assert_eq!(pipeline.progress.completed(), 4);
        assert_eq!(pipeline.progress.failed(), 1);
        assert!(output.join("scenario/prologue.ks").exists());
        assert!(!output.join("scenario/day1.ks").exists());

        let cache_path = dir.path().join("cache.json");
        cache.save(&cache_path).unwrap();
        assert_eq!(TranslationCache::load(&cache_path).get("Welcome @").as_deref(), Some("WELCOME @"));
    }

    /// Backend that refuses everything, to check output is left readable.
    struct DownBackend;

    #[async_trait]
    impl TranslationBackend for DownBackend {
        fn name(&self) -> &'static str {
            "down"
        }

        async fn translate(
            &self,
            _text: &str,
            _source: &str,
            _target: &str,
        ) -> Result<String, TranslationError> {
            Err(TranslationError::ApiError("HTTP 503: unavailable".to_string()))
        }
    }

    /// Backend that panics, taking its worker task down with it.
    struct PanickingBackend;

    #[async_trait]
    impl TranslationBackend for PanickingBackend {
        fn name(&self) -> &'static str {
            "panicking"
        }

        async fn translate(
            &self,
            _text: &str,
            _source: &str,
            _target: &str,
        ) -> Result<String, TranslationError> {
            panic!("backend crashed");
        }
    }

    #[tokio::test]
    async fn test_panicking_job_is_listed_in_failures() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        write_tree(&input);

        let jobs = enumerate_jobs(&input, &output, &console()).unwrap();
        let pipeline = make_pipeline(
            Arc::new(PanickingBackend),
            Arc::new(TranslationCache::new()),
            jobs.len(),
            2,
        );
        let summary = pipeline.run(jobs).await;

        assert_eq!(summary.copied, 1);
        assert_eq!(summary.failed, 3);
        assert_eq!(summary.failures.len(), summary.failed);
        let mut failed: Vec<PathBuf> = summary.failures.iter().map(|(p, _)| p.clone()).collect();
        failed.sort();
        assert_eq!(
            failed,
            vec![
                input.join("scenario/day1.ks"),
                input.join("scenario/prologue.ks"),
                input.join("startup.tjs"),
            ]
        );
        assert!(summary.failures[0].1.contains("worker task failed"));
        assert_eq!(pipeline.progress.completed(), 4);
        assert_eq!(pipeline.progress.failed(), 3);
    }

    #[tokio::test]
    async fn test_execute_saves_cache_after_partial_failure() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.paths.input = dir.path().join("in");
        config.paths.output = dir.path().join("out");
        config.paths.cache_file = dir.path().join("state").join("cache.json");
        config.translation.workers = 2;
        write_tree(&config.paths.input);

        // A plain file where the `bgm` directory should go makes that job fail.
        std::fs::create_dir_all(&config.paths.output).unwrap();
        std::fs::write(config.paths.output.join("bgm"), b"in the way").unwrap();

        let summary = Pipeline::execute(&config, Arc::new(UppercaseBackend::default()), console())
            .await
            .unwrap();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.scripts, 3);
        assert_eq!(summary.copied, 0);
        assert_eq!(
            summary.failures[0].0,
            config.paths.input.join("bgm/loops/theme.ogg")
        );

        let saved = TranslationCache::load(&config.paths.cache_file);
        assert_eq!(saved.get("Welcome @").as_deref(), Some("WELCOME @"));
        assert_eq!(saved.get("Good night @").as_deref(), Some("GOOD NIGHT @"));
        assert_eq!(saved.get("// init").as_deref(), Some("// INIT"));
    }

    #[tokio::test]
    async fn test_execute_with_failing_backend_keeps_text() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.paths.input = dir.path().join("in");
        config.paths.output = dir.path().join("out");
        config.paths.cache_file = dir.path().join("cache.json");
        write_tree(&config.paths.input);

        let summary = Pipeline::execute(&config, Arc::new(DownBackend), console())
            .await
            .unwrap();

        assert_eq!(summary.failed, 0);
        assert_eq!(summary.lines_failed, 4);
        assert_eq!(
            decode_utf16(&std::fs::read(config.paths.output.join("scenario/day1.ks")).unwrap()),
            "Welcome[r]\nGood night[p]\n"
        );
        assert!(TranslationCache::load(&config.paths.cache_file).is_empty());
    }

    #[tokio::test]
    async fn test_execute_missing_input_aborts() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.paths.input = dir.path().join("missing");
        config.paths.cache_file = dir.path().join("cache.json");

        let result = Pipeline::execute(&config, Arc::new(DownBackend), console()).await;
        assert!(matches!(result, Err(PipelineError::InputUnreadable { .. })));
        assert!(!config.paths.cache_file.exists());
    }
}
