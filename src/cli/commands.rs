//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::{Device, MeterFormat, TraversalOrder, TreeNodeConvert};
use crate::infrastructure::{InfraError, ServiceContainer};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Tree { file }) => cmd_tree(cli, file),
        Some(Commands::Traverse {
            file,
            order,
            no_dedup,
        }) => cmd_traverse(cli, file, order.as_deref(), *no_dedup),
        Some(Commands::Meter { file, format }) => cmd_meter(cli, file, format.as_deref()),
        Some(Commands::Dispatch { file, device }) => cmd_dispatch(cli, file, device.as_deref()),
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => cmd_config_show(cli),
            ConfigCommands::Init { force } => cmd_config_init(cli, *force),
            ConfigCommands::Path => cmd_config_path(cli),
        },
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see --help".to_string(),
        )),
    }
}

fn container(cli: &Cli) -> CliResult<ServiceContainer> {
    let settings = Settings::load(cli.config.as_deref())?;
    debug!("settings: {:?}", settings);
    Ok(ServiceContainer::new(settings))
}

#[instrument(skip(cli))]
fn cmd_tree(cli: &Cli, file: &Path) -> CliResult<()> {
    let container = container(cli)?;
    let tree = container.search_space.load(file)?;
    output::info(&tree.to_tree_string());
    if cli.verbose {
        output::detail(&format!(
            "{} mutables, depth {}",
            tree.len() - 1,
            tree.depth()
        ));
    }
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_traverse(cli: &Cli, file: &Path, order: Option<&str>, no_dedup: bool) -> CliResult<()> {
    let container = container(cli)?;
    // Fail on a bad order before touching the file
    let order = match order {
        Some(s) => s.parse::<TraversalOrder>()?,
        None => container.settings.traversal.order,
    };
    let deduplicate = container.settings.traversal.deduplicate && !no_dedup;

    let tree = container.search_space.load(file)?;
    if cli.verbose {
        output::header(&format!("{}-order, deduplicate={}", order, deduplicate));
    }
    for mutable in tree.traverse(tree.root(), order, deduplicate) {
        output::info(&format!("{}\t{}", mutable.key(), mutable.kind()));
    }
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_meter(cli: &Cli, file: &Path, format: Option<&str>) -> CliResult<()> {
    let container = container(cli)?;
    let format = match format {
        Some(s) => s.parse::<MeterFormat>()?,
        None => container.settings.meter_format()?,
    };

    let verbose = cli.verbose;
    let group = container.metrics.replay(file, format, |step, group| {
        if verbose {
            output::detail(&format!("[{}] {}", step, group));
        }
    })?;

    if group.is_empty() {
        output::warning("no metrics found");
        return Ok(());
    }
    output::header("Summary");
    output::info(&group.summary());
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_dispatch(cli: &Cli, file: &Path, device: Option<&str>) -> CliResult<()> {
    let container = container(cli)?;
    let device = match device {
        Some(s) => s.parse::<Device>()?,
        None => container.settings.device,
    };
    let moved = container.dispatch.dispatch_file(file, device)?;
    let rendered = serde_json::to_string_pretty(&moved).map_err(|e| ApplicationError::OperationFailed {
        context: "render payload".to_string(),
        source: Box::new(e),
    })?;
    output::info(&rendered);
    Ok(())
}

fn cmd_config_show(cli: &Cli) -> CliResult<()> {
    let container = container(cli)?;
    output::info(&container.settings.to_toml()?);
    Ok(())
}

fn config_target(cli: &Cli) -> CliResult<PathBuf> {
    cli.config
        .clone()
        .or_else(global_config_path)
        .ok_or_else(|| CliError::Usage("cannot determine config directory, use --config".into()))
}

fn cmd_config_init(cli: &Cli, force: bool) -> CliResult<()> {
    let target = config_target(cli)?;
    // Settings are not loaded here: the target may not exist yet
    let container = ServiceContainer::new(Settings::default());
    if container.fs.exists(&target) && !force {
        return Err(CliError::Usage(format!(
            "config file already exists: {} (use --force to overwrite)",
            target.display()
        )));
    }
    container
        .fs
        .write(&target, &Settings::template())
        .map_err(|e| InfraError::io(format!("write {}", target.display()), e))?;
    output::success(&format!("created {}", target.display()));
    Ok(())
}

fn cmd_config_path(cli: &Cli) -> CliResult<()> {
    match global_config_path() {
        Some(path) => {
            let state = if path.exists() { "" } else { " (not found)" };
            output::action("global", &format!("{}{}", path.display(), state));
        }
        None => output::action("global", "unavailable"),
    }
    if let Some(path) = &cli.config {
        output::action("--config", &path.display());
    }
    Ok(())
}
