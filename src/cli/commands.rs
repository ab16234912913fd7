//! Command dispatch

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::menu::Menu;
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{BinaryTree, SearchOutcome, SearchReport};
use crate::infrastructure::{InfraError, ServiceContainer};

pub fn execute_command(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Generate {
            nodes,
            none_probability,
            seed,
            output,
        }) => cmd_generate(container, *nodes, *none_probability, *seed, output.as_deref()),
        Some(Commands::Build { values, output }) => {
            cmd_build(container, values, output.as_deref())
        }
        Some(Commands::Show { file }) => cmd_show(container, file),
        Some(Commands::Find {
            file,
            root,
            blocked,
            output,
        }) => cmd_find(container, file, *root, blocked, output.as_deref()),
        Some(Commands::First {
            file,
            blocked,
            strategy,
            output,
        }) => {
            let tree = container.tree.load(file)?;
            let blocked = container.tree.blocked_from(blocked)?;
            let report = container.tree.find_first_valid(&tree, &blocked, *strategy);
            report_search(container, &report, output.as_deref())
        }
        Some(Commands::Menu) | None => cmd_menu(container),
        Some(Commands::Config { command }) => cmd_config(container, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}

#[instrument(level = "debug", skip(container))]
fn cmd_generate(
    container: &ServiceContainer,
    nodes: usize,
    none_probability: Option<f64>,
    seed: Option<u64>,
    output: Option<&Path>,
) -> CliResult<()> {
    let tree = container.tree.generate(nodes, none_probability, seed)?;
    output::success(&format!("generated tree with {} nodes", tree.size()));
    if let Some(path) = &container.settings.generate.autosave {
        output::detail(&format!("saved to {}", path.display()));
    }
    save_if_requested(container, &tree, output)?;
    show_tree(container, &tree);
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_build(container: &ServiceContainer, values: &str, output: Option<&Path>) -> CliResult<()> {
    let tree = container.tree.build_from_list(values)?;
    output::success(&format!("tree created with {} nodes", tree.size()));
    save_if_requested(container, &tree, output)?;
    show_tree(container, &tree);
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_show(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let tree = container.tree.load(file)?;
    output::header(&format!(
        "{} ({} nodes, depth {})",
        file.display(),
        tree.size(),
        tree.depth()
    ));
    output::info(&container.tree.render(&tree)?);
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_find(
    container: &ServiceContainer,
    file: &Path,
    root: i64,
    blocked: &[i64],
    output: Option<&Path>,
) -> CliResult<()> {
    let tree = container.tree.load(file)?;
    let blocked = container.tree.blocked_from(blocked)?;
    debug!(blocked = ?blocked.sorted(), "searching");
    let report = container.tree.find_with_root(&tree, root, &blocked)?;
    report_search(container, &report, output)
}

fn report_search(
    container: &ServiceContainer,
    report: &SearchReport,
    output: Option<&Path>,
) -> CliResult<()> {
    match &report.outcome {
        SearchOutcome::Found(tree) => {
            output::success(&format!(
                "found subtree rooted at {} with {} nodes ({:.3} ms)",
                tree.root_value().map(|v| v.to_string()).unwrap_or_default(),
                tree.size(),
                report.elapsed_ms()
            ));
            save_if_requested(container, tree, output)?;
            show_tree(container, tree);
        }
        SearchOutcome::Missed(miss) => {
            output::miss(&format!("{} ({:.3} ms)", miss, report.elapsed_ms()));
        }
    }
    Ok(())
}

fn save_if_requested(
    container: &ServiceContainer,
    tree: &BinaryTree,
    output: Option<&Path>,
) -> CliResult<()> {
    if let Some(path) = output {
        container.tree.save(tree, path)?;
        output::detail(&format!("saved to {}", path.display()));
    }
    Ok(())
}

/// Render when small enough, otherwise list the level-order values.
fn show_tree(container: &ServiceContainer, tree: &BinaryTree) {
    match container.tree.render(tree) {
        Ok(rendered) => output::info(&rendered),
        Err(e) => {
            output::warning(&e);
            let head = tree
                .iter_level_order()
                .take(20)
                .map(|(_, node)| node.value)
                .join(", ");
            output::detail(&format!("level order: {} ...", head));
        }
    }
}

fn cmd_menu(container: &ServiceContainer) -> CliResult<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    Menu::new(&container.tree, stdin.lock(), stdout.lock()).run()
}

fn cmd_config(container: &ServiceContainer, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let rendered = toml::to_string_pretty(container.settings.as_ref())
                .map_err(|e| CliError::Usage(format!("cannot render config: {}", e)))?;
            output::info(&rendered);
        }
        ConfigCommands::Path => {
            let global = global_config_path();
            let local = local_config_path();
            for (label, path) in [("global", global.as_deref()), ("local", Some(local.as_path()))] {
                match path {
                    Some(p) => {
                        let marker = if container.fs.exists(p) { "" } else { " (missing)" };
                        output::info(&format!("{}: {}{}", label, p.display(), marker));
                    }
                    None => output::info(&format!("{}: unavailable", label)),
                }
            }
        }
        ConfigCommands::Init { global, force } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".to_string())
                })?
            } else {
                local_config_path()
            };
            if container.fs.exists(&path) && !force {
                return Err(CliError::Usage(format!(
                    "{} already exists, use --force to overwrite",
                    path.display()
                )));
            }
            let template = Settings::template()?;
            container
                .fs
                .ensure_parent(&path)
                .and_then(|_| container.fs.write(&path, &template))
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("created {}", path.display()));
        }
    }
    Ok(())
}
