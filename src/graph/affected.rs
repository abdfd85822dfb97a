//! Affected module analysis
//!
//! Given a set of changed files, every file is checked against four
//! independent rules:
//! - **direct**: the file lives inside a module directory
//! - **dependency**: the file lies under a path some module declares as a dependency
//! - **shared**: the file is in the shared modules area and some module depends on it
//! - **account**: the file is an account marker, so every module of that account is hit
//!
//! Optionally, modules reaching an affected module through resolved
//! dependency edges are added as **dependent** matches.
//!
//! Rules over-approximate on purpose: an extra plan is cheap, a skipped one is not.

use super::module_graph::{ModuleDescriptor, ModuleGraph};
use crate::utils::{PathMatching, normalize_rel, parent_dir};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Resolver settings.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
  pub account_file: String,
  pub shared_marker: String,
  pub matching: PathMatching,
  /// Extend the result with transitive dependents over resolved edges
  pub transitive: bool,
}

impl Default for ResolveOptions {
  fn default() -> Self {
    crate::core::config::MonitorConfig::default().resolve_options()
  }
}

/// Which rule caused a module to be affected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactRule {
  /// Changed file is inside the module
  Direct,
  /// Changed file is under one of the module's declared dependencies
  Dependency,
  /// Changed file is a shared module the module includes
  Shared,
  /// Changed file is the account marker of the module's account
  Account,
  /// Module depends (transitively) on a module affected by the same file
  Dependent,
}

impl fmt::Display for ImpactRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      ImpactRule::Direct => "direct",
      ImpactRule::Dependency => "dependency",
      ImpactRule::Shared => "shared",
      ImpactRule::Account => "account",
      ImpactRule::Dependent => "dependent",
    };
    write!(f, "{}", label)
  }
}

/// One rule firing for one changed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactMatch {
  pub module: String,
  pub rule: ImpactRule,
  pub changed_file: String,
}

/// Why a module is affected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactReason {
  pub rule: ImpactRule,
  pub changed_file: String,
}

/// A module copy plus every reason it was matched, first match first.
#[derive(Debug, Clone, Serialize)]
pub struct AffectedModule {
  #[serde(flatten)]
  pub module: ModuleDescriptor,
  pub reasons: Vec<ImpactReason>,
}

impl AffectedModule {
  /// Distinct rule labels, in order of first firing
  pub fn rule_labels(&self) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for reason in &self.reasons {
      let label = reason.rule.to_string();
      if !labels.contains(&label) {
        labels.push(label);
      }
    }
    labels
  }
}

/// Result of one resolution pass.
#[derive(Debug, Clone, Serialize)]
pub struct ImpactReport {
  /// Normalized changed files, in input order
  pub changed_files: Vec<String>,

  /// Every rule firing in evaluation order (may repeat modules)
  pub matches: Vec<ImpactMatch>,

  /// Deduplicated affected modules in order of first match
  affected: Vec<AffectedModule>,
}

impl ImpactReport {
  /// Deduplicated affected modules
  pub fn modules(&self) -> &[AffectedModule] {
    &self.affected
  }

  /// Affected module paths in order of first match
  pub fn paths(&self) -> Vec<&str> {
    self.affected.iter().map(|a| a.module.path.as_str()).collect()
  }

  pub fn is_empty(&self) -> bool {
    self.affected.is_empty()
  }

  pub fn len(&self) -> usize {
    self.affected.len()
  }

  /// Number of matches per rule, for summaries
  pub fn rule_counts(&self) -> Vec<(ImpactRule, usize)> {
    let mut counts: Vec<(ImpactRule, usize)> = Vec::new();
    for m in &self.matches {
      match counts.iter_mut().find(|(rule, _)| *rule == m.rule) {
        Some((_, n)) => *n += 1,
        None => counts.push((m.rule, 1)),
      }
    }
    counts
  }
}

/// Analyze which modules are affected by `changed_files`.
///
/// Never fails: a file that matches nothing contributes nothing.
pub fn analyze(graph: &ModuleGraph, changed_files: &[impl AsRef<str>], options: &ResolveOptions) -> ImpactReport {
  let changed_files: Vec<String> = changed_files.iter().map(|f| normalize_rel(f.as_ref())).collect();
  let mut matches = Vec::new();

  for file in changed_files.iter().filter(|f| !f.is_empty()) {
    let before = matches.len();

    direct_containment(graph, file, options, &mut matches);
    declared_dependency(graph, file, options, &mut matches);
    shared_module(graph, file, options, &mut matches);
    account_wide(graph, file, options, &mut matches);

    if options.transitive {
      transitive_dependents(graph, file, before, &mut matches);
    }

    if matches.len() == before {
      tracing::debug!(file = %file, "changed file affects no module");
    }
  }

  let affected = dedup(graph, &matches);
  tracing::info!(
    changed = changed_files.len(),
    matches = matches.len(),
    affected = affected.len(),
    "impact analysis complete"
  );

  ImpactReport {
    changed_files,
    matches,
    affected,
  }
}

fn record(matches: &mut Vec<ImpactMatch>, module: &ModuleDescriptor, rule: ImpactRule, file: &str) {
  tracing::debug!(module = %module.path, rule = %rule, file = %file, "module affected");
  matches.push(ImpactMatch {
    module: module.path.clone(),
    rule,
    changed_file: file.to_string(),
  });
}

/// Dependency strings in the shape the matching mode compares.
///
/// Prefix mode keeps raw fragments for parity with plain string tests.
fn dependency_keys(module: &ModuleDescriptor, matching: PathMatching) -> Vec<String> {
  module
    .dependency_keys()
    .map(|d| match matching {
      PathMatching::Prefix => d.to_string(),
      PathMatching::Segment => normalize_rel(d),
    })
    .filter(|d| !d.is_empty())
    .collect()
}

fn direct_containment(graph: &ModuleGraph, file: &str, options: &ResolveOptions, matches: &mut Vec<ImpactMatch>) {
  if let Some(module) = graph.containing_module(file, options.matching) {
    record(matches, module, ImpactRule::Direct, file);
  }
}

fn declared_dependency(graph: &ModuleGraph, file: &str, options: &ResolveOptions, matches: &mut Vec<ImpactMatch>) {
  for module in graph.iter() {
    let hit = dependency_keys(module, options.matching)
      .iter()
      .any(|dep| options.matching.is_under(file, dep));
    if hit {
      record(matches, module, ImpactRule::Dependency, file);
    }
  }
}

fn shared_module(graph: &ModuleGraph, file: &str, options: &ResolveOptions, matches: &mut Vec<ImpactMatch>) {
  let matching = options.matching;
  if options.shared_marker.is_empty() || !matching.contains(file, &options.shared_marker) {
    return;
  }

  for module in graph.iter() {
    let hit = dependency_keys(module, matching)
      .iter()
      .any(|dep| matching.contains(dep, &options.shared_marker) && matching.contains(file, dep));
    if hit {
      record(matches, module, ImpactRule::Shared, file);
    }
  }
}

fn account_wide(graph: &ModuleGraph, file: &str, options: &ResolveOptions, matches: &mut Vec<ImpactMatch>) {
  if !options.matching.names_file(file, &options.account_file) {
    return;
  }

  let account_dir = parent_dir(file);
  for module in graph.modules_under(account_dir, options.matching) {
    record(matches, module, ImpactRule::Account, file);
  }
}

/// Add dependents of everything matched for `file` since index `from`.
fn transitive_dependents(graph: &ModuleGraph, file: &str, from: usize, matches: &mut Vec<ImpactMatch>) {
  let hit: HashSet<String> = matches[from..].iter().map(|m| m.module.clone()).collect();
  let mut seeds: Vec<&String> = hit.iter().collect();
  seeds.sort();

  let mut added = HashSet::new();
  for seed in seeds {
    for dependent in graph.transitive_dependents(seed) {
      if hit.contains(&dependent) || !added.insert(dependent.clone()) {
        continue;
      }
      if let Some(module) = graph.get(&dependent) {
        record(matches, module, ImpactRule::Dependent, file);
      }
    }
  }
}

fn dedup(graph: &ModuleGraph, matches: &[ImpactMatch]) -> Vec<AffectedModule> {
  let mut affected: Vec<AffectedModule> = Vec::new();
  let mut position: HashMap<&str, usize> = HashMap::new();

  for m in matches {
    let reason = ImpactReason {
      rule: m.rule,
      changed_file: m.changed_file.clone(),
    };
    match position.get(m.module.as_str()) {
      Some(&i) => affected[i].reasons.push(reason),
      None => {
        let Some(module) = graph.get(&m.module) else {
          continue;
        };
        position.insert(m.module.as_str(), affected.len());
        affected.push(AffectedModule {
          module: module.clone(),
          reasons: vec![reason],
        });
      }
    }
  }

  affected
}
