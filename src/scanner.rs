use rand::rngs::StdRng;
use rand::SeedableRng;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::config::GeneratorConfig;
use crate::eval::{EvalError, Environment, Evaluator};
use crate::render;

/// Opening token of an annotation block, at the start of a trimmed line.
pub const BLOCK_OPEN: &str = "/*py";
/// Closing token of an annotation block.
pub const BLOCK_CLOSE: &str = "*/";
/// Prefix of an inline marker line, followed by an identifier.
pub const MARKER_PREFIX: &str = "// py_";

/// The provenance comment is inserted once this many input lines have
/// been consumed; shorter files simply go without it.
const PROVENANCE_AFTER: usize = 8;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("unclosed /*py block opened at line {line}")]
    UnclosedBlock { line: usize },
    #[error("line {line}: {source}")]
    Eval {
        line: usize,
        #[source]
        source: EvalError,
    },
}

enum State {
    Scanning,
    InBlock {
        opened_at: usize,
        lines: Vec<String>,
    },
}

/// Single-pass annotation scanner.
///
/// Copies every template line through unchanged; `/*py` blocks feed the
/// variable environment as a side effect, and each `// py_<name>` marker
/// gets one freshly rendered declaration spliced in directly beneath it.
/// Each [`Scanner::process`] call owns a fresh environment and a freshly
/// seeded RNG, so repeated runs are byte-identical and file order never
/// matters.
pub struct Scanner {
    config: GeneratorConfig,
    evaluator: Evaluator,
    re_marker: Regex,
}

impl Scanner {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            evaluator: Evaluator::new(),
            re_marker: Regex::new(&format!(
                r"^{}([A-Za-z_][A-Za-z0-9_]*)[ \t]*(?:=(.*))?$",
                regex::escape(MARKER_PREFIX)
            ))
            .unwrap(),
        }
    }

    /// Expand one template. `source_name` only feeds the provenance
    /// comment near the top of the output.
    pub fn process(&self, template: &str, source_name: &str) -> Result<String, ScanError> {
        let mut env = Environment::new();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let opts = self.config.render_options();

        let mut out: Vec<String> = Vec::new();
        let mut state = State::Scanning;

        for (idx, line) in template.split('\n').enumerate() {
            let lineno = idx + 1;
            if idx == PROVENANCE_AFTER {
                out.push(format!(
                    "// This file is generated from {} by cppygen!",
                    source_name
                ));
                out.push(String::new());
            }

            let trimmed = line.trim_start();
            match &mut state {
                State::InBlock { opened_at, lines } => {
                    out.push(line.to_string());
                    if trimmed.trim_end() == BLOCK_CLOSE {
                        let opened_at = *opened_at;
                        let block: Vec<String> = std::mem::take(lines);
                        debug!(opened_at, statements = block.len(), "evaluating block");
                        self.evaluator
                            .eval_block(block.iter().map(String::as_str), &mut env, &mut rng)
                            .map_err(|source| ScanError::Eval {
                                line: opened_at,
                                source,
                            })?;
                        state = State::Scanning;
                    } else {
                        lines.push(line.to_string());
                    }
                }
                State::Scanning => {
                    if trimmed.starts_with(BLOCK_OPEN) {
                        out.push(line.to_string());
                        // a block that closes on its opening line has no content
                        if !trimmed.trim_end().ends_with(BLOCK_CLOSE) || trimmed.trim_end() == BLOCK_OPEN {
                            state = State::InBlock {
                                opened_at: lineno,
                                lines: Vec::new(),
                            };
                        }
                    } else if let Some(caps) = self.re_marker.captures(trimmed) {
                        let indent = &line[..line.len() - trimmed.len()];
                        let name = &caps[1];
                        if let Some(expr) = caps.get(2) {
                            self.evaluator
                                .eval_assignment(
                                    &format!("{} = {}", name, expr.as_str().trim()),
                                    &mut env,
                                    &mut rng,
                                )
                                .map_err(|source| ScanError::Eval {
                                    line: lineno,
                                    source,
                                })?;
                        }
                        let value = env.lookup(name).map_err(|source| ScanError::Eval {
                            line: lineno,
                            source,
                        })?;
                        let rendered =
                            render::declaration(&format!("py_{}", name), value, &opts);
                        debug!(name, line = lineno, "rendered declaration");
                        out.push(line.to_string());
                        for decl_line in rendered.split('\n') {
                            out.push(format!("{}{}", indent, decl_line));
                        }
                    } else {
                        out.push(line.to_string());
                    }
                }
            }
        }

        if let State::InBlock { opened_at, .. } = state {
            return Err(ScanError::UnclosedBlock { line: opened_at });
        }

        Ok(out.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn scanner() -> Scanner {
        Scanner::new(GeneratorConfig::default())
    }

    #[test]
    fn test_plain_lines_round_trip() {
        let template = "#include <test.hpp>\n\nint main() {\n    return 0;\n}\n";
        let output = scanner().process(template, "plain.cppy").unwrap();
        assert_eq!(output, template);
    }

    #[test]
    fn test_marker_with_assignment() {
        let template = "  // py_x = [1, 2, 3]\n";
        let output = scanner().process(template, "t.cppy").unwrap();
        assert_eq!(
            output,
            "  // py_x = [1, 2, 3]\n  xarray<long> py_x = {1,2,3};\n"
        );
    }

    #[test]
    fn test_block_then_bare_marker_scalar_precedence() {
        let template = "/*py\nx = 5\n*/\n// py_x\n";
        let output = scanner().process(template, "t.cppy").unwrap();
        assert_eq!(output, "/*py\nx = 5\n*/\n// py_x\nint py_x = 5;\n");
    }

    #[test]
    fn test_bare_marker_without_binding_is_fatal() {
        let err = scanner().process("// py_y\n", "t.cppy").unwrap_err();
        match err {
            ScanError::Eval { line, source } => {
                assert_eq!(line, 1);
                assert_eq!(source.to_string(), "unbound identifier: y");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_block_is_fatal() {
        let err = scanner().process("/*py\nx = 1\n", "t.cppy").unwrap_err();
        assert!(matches!(err, ScanError::UnclosedBlock { line: 1 }));
    }

    #[test]
    fn test_malformed_marker_expression_is_fatal() {
        let err = scanner().process("// py_x = zeros((\n", "t.cppy").unwrap_err();
        assert!(matches!(
            err,
            ScanError::Eval {
                line: 1,
                source: EvalError::Parse(_)
            }
        ));
    }

    #[test]
    fn test_marker_with_empty_expression_is_fatal() {
        let err = scanner().process("// py_x =\n", "t.cppy").unwrap_err();
        assert!(matches!(
            err,
            ScanError::Eval {
                line: 1,
                source: EvalError::Parse(_)
            }
        ));
    }

    #[test]
    fn test_provenance_comment_after_eight_lines() {
        let template = "1\n2\n3\n4\n5\n6\n7\n8\n9\n10\n";
        let output = scanner().process(template, "prov.cppy").unwrap();
        let lines: Vec<&str> = output.split('\n').collect();
        assert_eq!(
            lines[8],
            "// This file is generated from prov.cppy by cppygen!"
        );
        assert_eq!(lines[9], "");
        assert_eq!(lines[10], "9");
    }

    #[test]
    fn test_short_file_goes_without_provenance() {
        let template = "a\nb\n";
        let output = scanner().process(template, "short.cppy").unwrap();
        assert_eq!(output, template);
    }

    #[test]
    fn test_bindings_persist_across_annotations_within_a_file() {
        let template = "/*py\nbase = arange(3)\n*/\n// py_doubled = base * 2\n";
        let output = scanner().process(template, "t.cppy").unwrap();
        assert!(output.contains("xarray<long> py_doubled = {0,2,4};"));
    }

    #[test]
    fn test_process_is_deterministic_with_random_data() {
        let template = "/*py\nr = rand([2, 3])\n*/\n// py_r\n";
        let s = scanner();
        let first = s.process(template, "t.cppy").unwrap();
        let second = s.process(template, "t.cppy").unwrap();
        assert_eq!(first, second);
        assert!(first.contains("xarray<double> py_r = "));
    }

    #[test]
    fn test_block_lines_pass_through_unchanged() {
        let template = "/*py\nx = 1\n*/\n";
        let output = scanner().process(template, "t.cppy").unwrap();
        assert_eq!(output, template);
    }

    #[test]
    fn test_marker_indentation_is_reused() {
        let template = "    // py_v = ones(2)\n";
        let output = scanner().process(template, "t.cppy").unwrap();
        assert_eq!(
            output,
            "    // py_v = ones(2)\n    xarray<double> py_v = {1.0,1.0};\n"
        );
    }
}
