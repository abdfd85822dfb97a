//! `tg-impact modules` - List discovered modules and their dependency edges

use crate::core::context::RepoContext;
use crate::core::error::ImpactResult;
use serde_json::json;

/// Run the modules command
pub fn run_modules(ctx: &RepoContext, json: bool) -> ImpactResult<()> {
  let graph = &ctx.graph;

  if json {
    let modules: Vec<_> = graph
      .iter()
      .map(|m| {
        json!({
            "path": m.path,
            "account": m.account,
            "region": m.region,
            "sub_environment": m.sub_environment,
            "dependencies": m.dependencies,
            "resolved_dependencies": m.resolved_dependencies,
            "depends_on": graph.dependencies_of(&m.path),
            "dependents": graph.dependents_of(&m.path),
        })
      })
      .collect();

    let output = json!({
        "root": graph.root().display().to_string(),
        "modules": modules,
        "summary": {
            "module_count": graph.len(),
            "edge_count": graph.edge_count()
        }
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    return Ok(());
  }

  println!("Modules under {}", graph.root().display());
  println!("=================");
  println!();

  if graph.is_empty() {
    println!("No directories with {} found", ctx.config.module_file);
    return Ok(());
  }

  for module in graph.iter() {
    println!("📦 {}", module.path);
    if !module.account.is_empty() {
      println!("   account: {}", module.account);
    }
    if !module.region.is_empty() || !module.sub_environment.is_empty() {
      println!("   region: {}  env: {}", module.region, module.sub_environment);
    }
    for dep in &module.dependencies {
      println!("   includes \"{}\"", dep);
    }
    for target in graph.dependencies_of(&module.path) {
      println!("   → {}", target);
    }
  }

  println!();
  println!("{} modules, {} dependency edges", graph.len(), graph.edge_count());
  Ok(())
}
