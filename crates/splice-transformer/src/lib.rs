//! Directive-driven rewriting with line provenance.
//!
//! Source files mark statements for rewriting with a directive placed right
//! before them:
//!
//! ```text
//! transform!(Splice::Strip)
//! debug_only_setup
//! ```
//!
//! This crate handles:
//! - Finding directives and the statements they annotate
//! - Resolving transformation names through an explicit registry
//! - Splicing transformation results back into the tree
//! - Recording, for every output line, the input line it came from
//! - Rewriting files transparently as they are loaded
//!
//! # Example
//!
//! ```
//! use source_map::SourceMapStore;
//! use splice_transformer::{rewrite, TransformationRegistry, Transformer};
//!
//! let transformer = Transformer::with_registry(TransformationRegistry::with_builtins());
//! let store = SourceMapStore::new();
//!
//! let source = "setup\ntransform!(Splice::Strip)\ndebug_only\nrun\n";
//! let output = rewrite(source, "main.rb", &transformer, &store).unwrap();
//!
//! assert_eq!(output, "setup\nrun\n");
//! assert_eq!(store.lookup("main.rb", 2), Some(4));
//! ```

mod builtins;
pub mod directive;
mod error;
mod intercept;
mod registry;
mod rewriter;
mod transform;

pub use builtins::{Strip, Unwrap};
pub use directive::{contains_marker, directive_name, scan, DirectiveMatch, MARKER};
pub use error::{BoxError, LoadError, ResolutionError, RewriteError, TransformationError};
pub use intercept::{FsLoader, LoadedSource, RewritingLoader, SourceLoader};
pub use registry::{Transformation, TransformationRegistry};
pub use rewriter::{Pass, Rewriter, DIRECT_PASS_NAME};
pub use transform::{rewrite, rewrite_document, Rewritten, Step, Transformer};
