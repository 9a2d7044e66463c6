//! Rewrite error types.

use camino::Utf8PathBuf;
use smol_str::SmolStr;
use source_map::Location;
use splice_parser::ParseError;
use thiserror::Error;

/// The error type transformations report failures with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A directive names a transformation that is not registered.
#[derive(Debug, Clone, Error)]
#[error("unknown transformation `{name}`{}", at(.location))]
pub struct ResolutionError {
    /// The name as written in the directive.
    pub name: SmolStr,
    /// Where the directive appears, if known.
    pub location: Option<Location>,
}

/// A transformation failed while being applied.
#[derive(Debug, Error)]
#[error("transformation `{name}` failed{}: {source}", at(.location))]
pub struct TransformationError {
    /// The transformation's name.
    pub name: SmolStr,
    /// Where the directive appears, if known.
    pub location: Option<Location>,
    /// What the transformation reported.
    pub source: BoxError,
}

/// Any failure while rewriting one document.
///
/// A failed rewrite never produces partial output.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// The input could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A directive could not be resolved.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// A transformation failed.
    #[error(transparent)]
    Transformation(#[from] TransformationError),
}

/// A failure while loading a source through a [`SourceLoader`](crate::SourceLoader).
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    /// The file contains a directive marker but is not valid UTF-8.
    #[error("{path} is not valid UTF-8")]
    InvalidUtf8 { path: Utf8PathBuf },

    /// Rewriting the file failed.
    #[error("failed to rewrite {path}: {source}")]
    Rewrite {
        path: Utf8PathBuf,
        source: RewriteError,
    },

    /// The rewritten text could not be persisted.
    #[error("failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
}

fn at(location: &Option<Location>) -> String {
    match location {
        Some(location) => format!(" at {location}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use source_map::LineIndex;
    use source_map::Span;

    #[test]
    fn test_resolution_error_display() {
        let index = LineIndex::new("a\n  transform!(Missing)\n");
        let error = ResolutionError {
            name: "Missing".into(),
            location: index.location(Span::from_usize(4, 23)),
        };
        assert_eq!(error.to_string(), "unknown transformation `Missing` at 2:3");
    }

    #[test]
    fn test_transformation_error_display() {
        let error = TransformationError {
            name: "Foo::Bar".into(),
            location: None,
            source: "bad node".into(),
        };
        assert_eq!(error.to_string(), "transformation `Foo::Bar` failed: bad node");
    }
}
