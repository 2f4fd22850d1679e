use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::config::GeneratorConfig;
use crate::error::{Error, InternalResult};
use crate::scanner::Scanner;

/// What a batch run produced. A failed template aborts that file only;
/// the rest of the batch still runs.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, Error)>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Discover templates under `dir` (by the configured glob pattern, in
/// sorted order), expand each one, and write the outputs next to their
/// templates. The output name drops the trailing `y`: `case.cppy`
/// becomes `case.cpp`. Writes go through a temp file and a rename, so a
/// failing template never leaves partial output behind.
pub fn run(dir: &Path, config: &GeneratorConfig) -> InternalResult<BatchOutcome> {
    let pattern = dir.join(&config.pattern);
    let pattern = pattern
        .to_str()
        .ok_or_else(|| Error::internal(format!("non-UTF-8 path: {}", pattern.display())))?;

    let mut templates: Vec<PathBuf> = glob::glob(pattern)
        .map_err(|e| Error::internal(format!("bad glob pattern: {}", e)))?
        .filter_map(|entry| entry.ok())
        .collect();
    templates.sort();
    info!(count = templates.len(), pattern, "discovered templates");

    let scanner = Scanner::new(config.clone());
    let mut outcome = BatchOutcome::default();

    for template_path in templates {
        match generate_one(&scanner, &template_path) {
            Ok(out_path) => {
                info!(template = %template_path.display(), output = %out_path.display(), "generated");
                outcome.written.push(out_path);
            }
            Err(e) => {
                error!(template = %template_path.display(), error = %e, "generation failed");
                outcome.failed.push((template_path, e));
            }
        }
    }
    Ok(outcome)
}

fn generate_one(scanner: &Scanner, template_path: &Path) -> InternalResult<PathBuf> {
    let file_name = template_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            Error::internal(format!("non-UTF-8 file name: {}", template_path.display()))
        })?;
    let out_name = file_name.strip_suffix('y').ok_or_else(|| {
        Error::internal(format!("template name must end in 'y': {}", file_name))
    })?;

    let contents = fs::read_to_string(template_path)?;
    let output = scanner.process(&contents, file_name)?;

    let parent = template_path.parent().unwrap_or_else(|| Path::new("."));
    let out_path = parent.join(out_name);
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(output.as_bytes())?;
    tmp.persist(&out_path)
        .map_err(|e| Error::Io(e.error))?;
    Ok(out_path)
}
