//! Terragrunt module graph built from the filesystem + petgraph
//!
//! ## Graph Structure
//!
//! - **Modules**: every directory below the root that directly contains the
//!   module file (`terragrunt.hcl`), keyed by repository-relative path in a
//!   `BTreeMap` so iteration is path-sorted and deterministic
//! - **Directed edges**: `A → B` means "A includes something inside B",
//!   derived from dependency fragments that resolve to real paths
//! - **Classification**: account (nearest `account.hcl` owner), region and
//!   sub-environment (path segment vocabularies)
//!
//! Raw fragments are kept alongside resolved paths; the impact rules fall back
//! to fragment matching when a fragment does not resolve.

use crate::core::error::{ImpactError, ImpactResult, TraversalError};
use crate::utils::{PathMatching, join_normalized, normalize_rel, path_to_slash, segments};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// What the builder looks for while walking the tree.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
  pub module_file: String,
  pub account_file: String,
  pub exclude_paths: Vec<String>,
  pub dependency_keywords: Vec<String>,
  pub regions: Vec<String>,
  pub environments: Vec<String>,
}

impl Default for DiscoveryOptions {
  fn default() -> Self {
    crate::core::config::MonitorConfig::default().discovery_options()
  }
}

/// One deployable Terragrunt unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDescriptor {
  /// Repository-relative path with `/` separators (primary key)
  pub path: String,

  /// Quoted tokens from dependency lines, verbatim and in file order
  pub dependencies: Vec<String>,

  /// Fragments that resolved to an existing repository path
  pub resolved_dependencies: Vec<String>,

  /// Base name of the nearest directory owning the account file
  pub account: String,

  pub region: String,

  pub sub_environment: String,
}

impl ModuleDescriptor {
  /// Descriptor with no dependencies or classification, for assembling graphs by hand
  pub fn new(path: impl Into<String>) -> Self {
    Self {
      path: normalize_rel(&path.into()),
      dependencies: Vec::new(),
      resolved_dependencies: Vec::new(),
      account: String::new(),
      region: String::new(),
      sub_environment: String::new(),
    }
  }

  /// Raw fragments and resolved paths, the strings the impact rules test against
  pub fn dependency_keys(&self) -> impl Iterator<Item = &str> {
    self
      .dependencies
      .iter()
      .chain(self.resolved_dependencies.iter())
      .map(String::as_str)
  }
}

/// Module graph for one repository tree.
pub struct ModuleGraph {
  /// Absolute or cwd-relative root the graph was built from
  root: PathBuf,

  /// Path-sorted module table
  modules: BTreeMap<String, ModuleDescriptor>,

  /// Nodes: module paths. Edges: "depends on"
  graph: DiGraph<String, ()>,

  /// Index: module path → node index
  path_to_node: HashMap<String, NodeIndex>,
}

impl ModuleGraph {
  /// Walk `root` and build the graph.
  ///
  /// Any unreadable directory or module file aborts the build.
  pub fn build(root: &Path, options: &DiscoveryOptions) -> ImpactResult<Self> {
    if !root.is_dir() {
      return Err(ImpactError::Traversal(TraversalError::Unreadable {
        path: root.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "repository root is not a directory"),
      }));
    }

    let mut modules = Vec::new();
    let walker = WalkDir::new(root)
      .sort_by_file_name()
      .into_iter()
      .filter_entry(|entry| !is_excluded(root, entry, &options.exclude_paths));

    for entry in walker {
      let entry = entry?;
      // The scan root holds the shared root config, not a plannable unit
      if entry.depth() == 0 || !entry.file_type().is_dir() {
        continue;
      }

      let dir = entry.path();
      let declaration = dir.join(&options.module_file);
      if !declaration.is_file() {
        continue;
      }

      let path = relative_path(root, dir);
      let content = fs::read(&declaration).map_err(|source| {
        ImpactError::Traversal(TraversalError::Unreadable {
          path: declaration.clone(),
          source,
        })
      })?;
      let dependencies = parse_dependencies(&String::from_utf8_lossy(&content), &options.dependency_keywords);
      let resolved_dependencies = resolve_dependencies(root, &path, &dependencies);
      let (region, sub_environment) = classify(&path, &options.regions, &options.environments);

      tracing::trace!(module = %path, deps = dependencies.len(), "discovered module");
      let mut module = ModuleDescriptor::new(path);
      module.account = find_account(root, dir, &options.account_file);
      module.dependencies = dependencies;
      module.resolved_dependencies = resolved_dependencies;
      module.region = region;
      module.sub_environment = sub_environment;
      modules.push(module);
    }

    let graph = Self::from_modules(root, modules);
    tracing::debug!(
      root = %root.display(),
      modules = graph.len(),
      edges = graph.graph.edge_count(),
      "module graph built"
    );
    Ok(graph)
  }

  /// Assemble a graph from descriptors; later duplicates of a path replace earlier ones.
  ///
  /// Edges come from `resolved_dependencies`: a module depends on every module
  /// at, inside, or enclosing one of its resolved paths.
  pub fn from_modules(root: &Path, descriptors: impl IntoIterator<Item = ModuleDescriptor>) -> Self {
    let modules: BTreeMap<String, ModuleDescriptor> = descriptors.into_iter().map(|m| (m.path.clone(), m)).collect();

    let mut graph = DiGraph::new();
    let mut path_to_node = HashMap::new();
    for path in modules.keys() {
      let idx = graph.add_node(path.clone());
      path_to_node.insert(path.clone(), idx);
    }

    let segment = PathMatching::Segment;
    for module in modules.values() {
      let from = path_to_node[&module.path];
      let mut targets = BTreeSet::new();
      for dep in &module.resolved_dependencies {
        for other in modules.keys() {
          if *other != module.path && (segment.is_under(other, dep) || segment.is_under(dep, other)) {
            targets.insert(other.as_str());
          }
        }
      }
      for target in targets {
        graph.add_edge(from, path_to_node[target], ());
      }
    }

    Self {
      root: root.to_path_buf(),
      modules,
      graph,
      path_to_node,
    }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn len(&self) -> usize {
    self.modules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }

  pub fn get(&self, path: &str) -> Option<&ModuleDescriptor> {
    self.modules.get(path)
  }

  /// Modules in path order
  pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
    self.modules.values()
  }

  /// The most specific module whose directory contains `file`.
  pub fn containing_module(&self, file: &str, matching: PathMatching) -> Option<&ModuleDescriptor> {
    self
      .modules
      .values()
      .filter(|m| matching.is_under(file, &m.path))
      .max_by_key(|m| m.path.len())
  }

  /// All modules located under `dir`.
  pub fn modules_under<'a>(&'a self, dir: &'a str, matching: PathMatching) -> impl Iterator<Item = &'a ModuleDescriptor> {
    self.modules.values().filter(move |m| matching.is_under(&m.path, dir))
  }

  /// Modules that `path` depends on (outgoing edges).
  pub fn dependencies_of(&self, path: &str) -> Vec<String> {
    self.neighbors(path, Direction::Outgoing)
  }

  /// Modules that depend on `path` (incoming edges).
  pub fn dependents_of(&self, path: &str) -> Vec<String> {
    self.neighbors(path, Direction::Incoming)
  }

  /// Every module that reaches `path` through dependency edges, sorted.
  ///
  /// DFS over incoming edges; cycles are tolerated.
  pub fn transitive_dependents(&self, path: &str) -> Vec<String> {
    let Some(&start) = self.path_to_node.get(path) else {
      return Vec::new();
    };

    let mut visited = HashSet::new();
    let mut stack = vec![start];
    let mut dependents = Vec::new();

    while let Some(idx) = stack.pop() {
      if !visited.insert(idx) {
        continue;
      }
      if idx != start {
        dependents.push(self.graph[idx].clone());
      }
      stack.extend(self.graph.neighbors_directed(idx, Direction::Incoming));
    }

    dependents.sort();
    dependents
  }

  pub fn edge_count(&self) -> usize {
    self.graph.edge_count()
  }

  fn neighbors(&self, path: &str, direction: Direction) -> Vec<String> {
    let Some(&idx) = self.path_to_node.get(path) else {
      return Vec::new();
    };
    let mut out: Vec<String> = self
      .graph
      .neighbors_directed(idx, direction)
      .map(|n| self.graph[n].clone())
      .collect();
    out.sort();
    out.dedup();
    out
  }
}

/// Prune directories whose relative path contains an exclude pattern.
fn is_excluded(root: &Path, entry: &DirEntry, patterns: &[String]) -> bool {
  if entry.depth() == 0 || !entry.file_type().is_dir() {
    return false;
  }
  let rel = relative_path(root, entry.path());
  let excluded = patterns.iter().any(|p| rel.contains(p.as_str()));
  if excluded {
    tracing::trace!(dir = %rel, "pruned excluded subtree");
  }
  excluded
}

fn relative_path(root: &Path, path: &Path) -> String {
  let rel = path.strip_prefix(root).unwrap_or(path);
  normalize_rel(&path_to_slash(rel))
}

/// Base name of the nearest directory (the module itself included, the scan
/// root excluded) that holds `account_file`.
fn find_account(root: &Path, module_dir: &Path, account_file: &str) -> String {
  module_dir
    .ancestors()
    .take_while(|dir| *dir != root)
    .find(|dir| dir.join(account_file).is_file())
    .and_then(|dir| dir.file_name())
    .map(|name| name.to_string_lossy().to_string())
    .unwrap_or_default()
}

/// Region and sub-environment from path segments; the rightmost match wins.
pub fn classify(path: &str, regions: &[String], environments: &[String]) -> (String, String) {
  let mut region = String::new();
  let mut sub_environment = String::new();
  for segment in segments(path) {
    if regions.iter().any(|r| r == segment) {
      region = segment.to_string();
    }
    if environments.iter().any(|e| e == segment) {
      sub_environment = segment.to_string();
    }
  }
  (region, sub_environment)
}

/// Extract the first quoted token from every line starting with a keyword.
///
/// Lines are trimmed first. Lines without a closing quote and empty tokens are
/// skipped.
pub fn parse_dependencies(content: &str, keywords: &[String]) -> Vec<String> {
  content
    .lines()
    .map(str::trim)
    .filter(|line| keywords.iter().any(|k| line.starts_with(k.as_str())))
    .filter_map(|line| {
      let mut parts = line.split('"');
      parts.next()?;
      let token = parts.next()?;
      parts.next()?;
      (!token.is_empty()).then(|| token.to_string())
    })
    .collect()
}

/// Resolve fragments against the module directory, then against the root.
fn resolve_dependencies(root: &Path, module_path: &str, fragments: &[String]) -> Vec<String> {
  let mut resolved = Vec::new();
  for fragment in fragments {
    let candidates = [join_normalized(module_path, fragment), join_normalized("", fragment)];
    let hit = candidates
      .into_iter()
      .flatten()
      .find(|candidate| !candidate.is_empty() && root.join(candidate).exists());
    match hit {
      Some(path) if !resolved.contains(&path) => resolved.push(path),
      Some(_) => {}
      None => tracing::trace!(module = %module_path, fragment = %fragment, "dependency did not resolve"),
    }
  }
  resolved
}
