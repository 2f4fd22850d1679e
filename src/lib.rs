//! # cppygen: annotation-driven test-fixture generation
//!
//! cppygen expands `.cppy` templates into concrete C++ test sources.
//! Templates carry two annotation forms:
//!
//! - `/*py ... */` blocks, whose `name = expr` statements populate a
//!   per-file variable environment as a side effect;
//! - `// py_<name>` inline markers (optionally `// py_<name> = expr`),
//!   each of which gets a fully rendered initializer declaration spliced
//!   in on the line beneath it.
//!
//! Numeric data is computed by a small closed expression language with
//! array builtins (`zeros`, `arange`, `rand`, ...) and a seedable RNG, so
//! large or random fixtures are authored once and regenerated
//! byte-identically.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Template → Annotation Scanner → [Environment ⇄ Evaluator] → Literal Renderer → Output
//! ```
//!
//! ### Stage 1: Scanning
//!
//! The [`scanner`] module walks the template once, line by line,
//! recognizing the two annotation forms and copying everything else
//! through unchanged.
//!
//! ### Stage 2: Expression Evaluation
//!
//! The [`expr`] module parses `name = expr` statements into a small AST;
//! the [`eval`] module evaluates them against the per-file
//! [`eval::Environment`], threading an explicitly seeded RNG through
//! every call.
//!
//! ### Stage 3: Rendering
//!
//! The [`render`] module classifies each bound value into a C++ type
//! spelling and formats it as a nested brace initializer list with fixed
//! decimal precision and aligned continuation lines.
//!
//! ### Batch Driving
//!
//! The [`driver`] module discovers templates, re-seeds per file, and
//! writes outputs atomically next to their sources. The [`includes`]
//! module is a separate header include-cycle checker sharing the CLI.

pub mod config;
pub mod driver;
pub mod error;
pub mod eval;
pub mod expr;
pub mod includes;
pub mod render;
pub mod scanner;
pub mod value;

// Re-exports
pub use config::GeneratorConfig;
pub use error::{Error, InternalResult};
pub use scanner::{ScanError, Scanner};
pub use value::{ArrayValue, Element, ElementKind, Value};
