//! Orchestrates a rewrite run.

use crate::cli::{Args, LineLookup};
use crate::config::SpliceConfig;
use crate::output::{FileReport, FileStatus, Formatter, RewriteSummary};
use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use source_map::{LineIndex, SourceMapStore};
use splice_transformer::{
    FsLoader, RewritingLoader, SourceLoader, TransformationRegistry, Transformer,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

const DEFAULT_IGNORES: [&str; 2] = ["**/.git/**", "**/vendor/**"];

/// Orchestration errors.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Invalid glob pattern.
    #[error("invalid glob pattern `{pattern}`: {message}")]
    InvalidGlob {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        message: String,
    },

    /// The working directory could not be determined.
    #[error("failed to resolve the workspace: {0}")]
    Workspace(#[from] std::io::Error),

    /// A path was not valid UTF-8.
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(String),

    /// `--lookup` named a file this run did not process.
    #[error("`{0}` was not rewritten in this run")]
    LookupNotProcessed(Utf8PathBuf),
}

/// The outcome of rewriting a set of files.
#[derive(Debug)]
pub struct RunResult {
    /// The absolute workspace root.
    pub workspace: Utf8PathBuf,
    /// One report per file, in path order.
    pub reports: Vec<FileReport>,
    /// Output text of every file that loaded, in path order.
    pub outputs: Vec<(Utf8PathBuf, String)>,
    /// Line maps of the rewritten files, keyed by absolute path.
    pub store: Arc<SourceMapStore>,
}

impl RunResult {
    /// Returns the totals.
    pub fn summary(&self) -> RewriteSummary {
        RewriteSummary::from_reports(&self.reports)
    }

    /// Maps a line of a processed file back to its input line.
    ///
    /// Files without directives pass through unchanged, so their lines map to
    /// themselves. `Ok(None)` means the line was synthesized or lies past the
    /// end of the output.
    pub fn lookup(&self, lookup: &LineLookup) -> Result<Option<u32>, OrchestratorError> {
        let path = absolute(&self.workspace, &lookup.file);
        let relative = path.strip_prefix(&self.workspace).unwrap_or(&path);
        let processed = self
            .reports
            .iter()
            .find(|report| report.path.as_path() == relative);

        match processed.map(|report| report.status) {
            Some(FileStatus::Failed) | None => {
                Err(OrchestratorError::LookupNotProcessed(lookup.file.clone()))
            }
            Some(_) => match self.store.get(path.as_str()) {
                Some(map) => Ok(map.line(lookup.line)),
                None => {
                    let line_count = self
                        .outputs
                        .iter()
                        .find(|(output, _)| output.as_path() == relative)
                        .filter(|(_, text)| !text.is_empty())
                        .map_or(0, |(_, text)| LineIndex::new(text).line_count());
                    Ok((lookup.line as usize <= line_count).then_some(lookup.line))
                }
            },
        }
    }
}

/// Runs the rewriter and prints results.
pub fn run(args: &Args) -> Result<RewriteSummary, OrchestratorError> {
    let result = execute(args)?;

    if args.emit {
        let multiple = result.outputs.len() > 1;
        for (path, text) in &result.outputs {
            if multiple {
                println!("==> {path} <==");
            }
            print!("{text}");
        }
    }

    if let Some(lookup) = &args.lookup {
        match result.lookup(lookup)? {
            Some(line) => println!("{}:{} -> {}", lookup.file, lookup.line, line),
            None => println!("{}:{} -> (no original line)", lookup.file, lookup.line),
        }
    }

    let summary = result.summary();
    let formatter = Formatter::new(args.output);
    if args.emit {
        eprintln!("{}", formatter.format(&result.reports, &summary));
    } else {
        println!("{}", formatter.format(&result.reports, &summary));
    }
    Ok(summary)
}

/// Rewrites every selected file without printing anything.
pub fn execute(args: &Args) -> Result<RunResult, OrchestratorError> {
    let workspace = if args.workspace.is_absolute() {
        args.workspace.clone()
    } else {
        let current = std::env::current_dir()?;
        let current = Utf8PathBuf::try_from(current)
            .map_err(|e| OrchestratorError::NonUtf8Path(e.into_path_buf().display().to_string()))?;
        current.join(&args.workspace)
    };

    let config = SpliceConfig::load(&workspace);
    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| config.output_dir.clone())
        .map(|dir| absolute(&workspace, &dir));

    let files = if args.paths.is_empty() {
        let ignore_set = build_ignore_set(config.exclude.iter().chain(&args.ignore))?;
        discover(
            &workspace,
            &config.file_extensions(),
            &ignore_set,
            output_dir.as_deref(),
        )
    } else {
        let mut files: Vec<Utf8PathBuf> = args
            .paths
            .iter()
            .map(|path| absolute(&workspace, path))
            .collect();
        files.sort();
        files.dedup();
        files
    };
    info!(workspace = %workspace, files = files.len(), "rewriting");

    let store = Arc::new(SourceMapStore::new());
    let transformer = Transformer::with_registry(TransformationRegistry::with_builtins());
    let mut loader = RewritingLoader::new(FsLoader, transformer, Arc::clone(&store));
    if let Some(dir) = &output_dir {
        loader = loader.persist_to(dir.clone()).relative_to(workspace.clone());
    }

    let outcomes: Vec<(FileReport, Option<String>)> = files
        .par_iter()
        .map(|path| rewrite_one(&loader, &workspace, path))
        .collect();

    let mut reports = Vec::with_capacity(outcomes.len());
    let mut outputs = Vec::new();
    for (report, text) in outcomes {
        if let Some(text) = text {
            outputs.push((report.path.clone(), text));
        }
        reports.push(report);
    }

    Ok(RunResult {
        workspace,
        reports,
        outputs,
        store,
    })
}

fn rewrite_one<L: SourceLoader>(
    loader: &RewritingLoader<L>,
    workspace: &Utf8Path,
    path: &Utf8Path,
) -> (FileReport, Option<String>) {
    let relative = path.strip_prefix(workspace).unwrap_or(path).to_path_buf();
    match loader.load(path) {
        Ok(loaded) => {
            let status = if loaded.rewritten {
                FileStatus::Rewritten
            } else {
                FileStatus::Unchanged
            };
            let written_to = if loaded.rewritten {
                loader.persisted_path(path).map(|target| {
                    target
                        .strip_prefix(workspace)
                        .map(Utf8Path::to_path_buf)
                        .unwrap_or(target)
                })
            } else {
                None
            };
            debug!(path = %relative, ?status, "processed file");
            let report = FileReport {
                path: relative,
                status,
                written_to,
                error: None,
            };
            (report, Some(loaded.text))
        }
        Err(error) => {
            let report = FileReport {
                path: relative,
                status: FileStatus::Failed,
                written_to: None,
                error: Some(error.to_string()),
            };
            (report, None)
        }
    }
}

fn absolute(workspace: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}

fn build_ignore_set<'a>(
    patterns: impl IntoIterator<Item = &'a String>,
) -> Result<GlobSet, OrchestratorError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(glob(pattern)?);
    }
    for pattern in DEFAULT_IGNORES {
        builder.add(glob(pattern)?);
    }
    builder.build().map_err(|e| OrchestratorError::InvalidGlob {
        pattern: e.glob().unwrap_or_default().to_string(),
        message: e.kind().to_string(),
    })
}

fn glob(pattern: &str) -> Result<Glob, OrchestratorError> {
    Glob::new(pattern).map_err(|e| OrchestratorError::InvalidGlob {
        pattern: pattern.to_string(),
        message: e.kind().to_string(),
    })
}

/// Finds the files to rewrite below `workspace`, sorted.
fn discover(
    workspace: &Utf8Path,
    extensions: &[&str],
    ignore_set: &GlobSet,
    output_dir: Option<&Utf8Path>,
) -> Vec<Utf8PathBuf> {
    let mut files: Vec<Utf8PathBuf> = WalkDir::new(workspace)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| Utf8PathBuf::try_from(e.into_path()).ok())
        .filter(|p| {
            let file_name = p.file_name().unwrap_or("");
            extensions.iter().any(|ext| file_name.ends_with(ext))
        })
        .filter(|p| output_dir.map_or(true, |dir| !p.starts_with(dir)))
        .filter(|p| {
            let relative = p.strip_prefix(workspace).unwrap_or(p);
            !ignore_set.is_match(relative.as_str())
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use std::fs;

    struct Workspace {
        _dir: tempfile::TempDir,
        root: Utf8PathBuf,
    }

    impl Workspace {
        fn new(files: &[(&str, &str)]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
            for (path, text) in files {
                let path = root.join(path);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(path, text).unwrap();
            }
            Self { _dir: dir, root }
        }

        fn args(&self, extra: &[&str]) -> Args {
            let mut argv = vec!["splice", "--workspace", self.root.as_str()];
            argv.extend_from_slice(extra);
            Args::parse_from(argv)
        }
    }

    fn paths(result: &RunResult) -> Vec<(&str, FileStatus)> {
        result
            .reports
            .iter()
            .map(|report| (report.path.as_str(), report.status))
            .collect()
    }

    #[test]
    fn test_discovers_matching_files() {
        let ws = Workspace::new(&[
            ("lib/a.rb", "transform!(Splice::Strip)\nx\ny\n"),
            ("lib/b.rb", "plain\n"),
            ("lib/notes.txt", "transform!(Splice::Strip)\nx\n"),
            ("vendor/gem.rb", "transform!(Splice::Strip)\nx\n"),
        ]);
        let result = execute(&ws.args(&[])).unwrap();

        assert_eq!(
            paths(&result),
            vec![
                ("lib/a.rb", FileStatus::Rewritten),
                ("lib/b.rb", FileStatus::Unchanged),
            ]
        );
        assert_eq!(result.outputs[0].1, "y\n");
        assert_eq!(result.outputs[1].1, "plain\n");
    }

    #[test]
    fn test_ignore_patterns_and_config() {
        let ws = Workspace::new(&[
            ("splice.json", r#"{ "exclude": ["test/**"] }"#),
            ("lib/a.rb", "a\n"),
            ("test/a_test.rb", "a\n"),
            ("script/run.rb", "a\n"),
        ]);
        let result = execute(&ws.args(&["--ignore", "script/**"])).unwrap();
        assert_eq!(paths(&result), vec![("lib/a.rb", FileStatus::Unchanged)]);
    }

    #[test]
    fn test_invalid_glob_is_reported() {
        let ws = Workspace::new(&[]);
        let error = execute(&ws.args(&["--ignore", "a/[b"])).unwrap_err();
        assert!(matches!(error, OrchestratorError::InvalidGlob { .. }));
    }

    #[test]
    fn test_failures_do_not_stop_other_files() {
        let ws = Workspace::new(&[
            ("a.rb", "transform!(Missing)\nx\n"),
            ("b.rb", "transform!(Splice::Strip)\nx\nkeep\n"),
        ]);
        let result = execute(&ws.args(&[])).unwrap();

        assert_eq!(
            paths(&result),
            vec![("a.rb", FileStatus::Failed), ("b.rb", FileStatus::Rewritten)]
        );
        let error = result.reports[0].error.as_deref().unwrap();
        assert!(error.contains("unknown transformation `Missing`"), "{error}");
        assert_eq!(result.summary().failed, 1);
    }

    #[test]
    fn test_output_dir_mirrors_workspace_layout() {
        let ws = Workspace::new(&[("lib/a.rb", "transform!(Splice::Strip)\nx\ny\n")]);
        let result = execute(&ws.args(&["--output-dir", "out"])).unwrap();

        assert_eq!(
            result.reports[0].written_to.as_deref(),
            Some(Utf8Path::new("out/lib/a.rb"))
        );
        assert_eq!(fs::read_to_string(ws.root.join("out/lib/a.rb")).unwrap(), "y\n");
        // The input is left alone.
        assert_eq!(
            fs::read_to_string(ws.root.join("lib/a.rb")).unwrap(),
            "transform!(Splice::Strip)\nx\ny\n"
        );

        // A second run does not pick up its own output.
        let again = execute(&ws.args(&["--output-dir", "out"])).unwrap();
        assert_eq!(again.reports.len(), 1);
    }

    #[test]
    fn test_explicit_paths() {
        let ws = Workspace::new(&[("a.rb", "a\n"), ("b.rb", "b\n"), ("c.txt", "c\n")]);
        let result = execute(&ws.args(&["c.txt", "a.rb", "a.rb"])).unwrap();
        assert_eq!(
            paths(&result),
            vec![("a.rb", FileStatus::Unchanged), ("c.txt", FileStatus::Unchanged)]
        );
    }

    #[test]
    fn test_lookup() {
        let ws = Workspace::new(&[
            ("a.rb", "head\ntransform!(Splice::Strip)\nx\ntail\n"),
            ("b.rb", "one\ntwo\n"),
            ("bad.rb", "transform!(Splice::Strip)\nclass\n"),
        ]);
        let result = execute(&ws.args(&[])).unwrap();
        let lookup = |file: &str, line| {
            result.lookup(&LineLookup {
                file: Utf8PathBuf::from(file),
                line,
            })
        };

        assert_eq!(lookup("a.rb", 2).unwrap(), Some(4));
        assert_eq!(lookup("a.rb", 9).unwrap(), None);
        assert_eq!(lookup("b.rb", 2).unwrap(), Some(2));
        assert_eq!(lookup("b.rb", 3).unwrap(), None);
        assert_eq!(lookup("b.rb", 9999).unwrap(), None);
        assert!(matches!(
            lookup("bad.rb", 1),
            Err(OrchestratorError::LookupNotProcessed(_))
        ));
        assert!(matches!(
            lookup("missing.rb", 1),
            Err(OrchestratorError::LookupNotProcessed(_))
        ));
    }
}
