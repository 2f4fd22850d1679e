//! Local-include dependency scanning for a directory of C++ headers,
//! with cycle reporting. Unrelated to the template engine; shares only
//! the CLI.

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum IncludeError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Build the include graph for `dir`. Only the leading block of
/// `#include "..."` lines in each file is scanned: once at least one
/// local include has been seen, the first non-include line ends the scan
/// for that file.
pub fn build_graph(dir: &Path) -> Result<DiGraph<String, ()>, IncludeError> {
    let mut graph = DiGraph::new();
    let mut nodes: HashMap<String, NodeIndex> = HashMap::new();

    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|source| IncludeError::Read {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    entries.sort();

    for path in entries {
        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        let from = node(&mut graph, &mut nodes, &file_name);

        let reader = BufReader::new(fs::File::open(&path).map_err(|source| IncludeError::Read {
            path: path.clone(),
            source,
        })?);
        let mut entered_includes = false;
        for line in reader.lines() {
            let line = line.map_err(|source| IncludeError::Read {
                path: path.clone(),
                source,
            })?;
            if let Some(target) = local_include_target(&line) {
                entered_includes = true;
                let to = node(&mut graph, &mut nodes, target);
                graph.add_edge(from, to, ());
            } else if entered_includes {
                break;
            }
        }
    }
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "built include graph"
    );
    Ok(graph)
}

fn local_include_target(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("#include \"")?;
    let end = rest.find('"')?;
    Some(&rest[..end])
}

fn node(
    graph: &mut DiGraph<String, ()>,
    nodes: &mut HashMap<String, NodeIndex>,
    name: &str,
) -> NodeIndex {
    match nodes.get(name) {
        Some(index) => *index,
        None => {
            let index = graph.add_node(name.to_string());
            nodes.insert(name.to_string(), index);
            index
        }
    }
}

/// Enumerate include cycles: every strongly connected component with two
/// or more headers, plus any header that includes itself.
pub fn find_cycles(graph: &DiGraph<String, ()>) -> Vec<Vec<String>> {
    tarjan_scc(graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .map(|scc| scc.into_iter().map(|n| graph[n].clone()).collect())
        .collect()
}

/// Scan `dir` and return the cycle report.
pub fn check(dir: &Path) -> Result<Vec<Vec<String>>, IncludeError> {
    let graph = build_graph(dir)?;
    Ok(find_cycles(&graph))
}
