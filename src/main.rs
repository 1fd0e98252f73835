//! neuroml-widgets command line front end.
//!
//! Usage:
//!   neuroml-widgets project model.net.nml --tab ExpTwoSynapse --format html > model.html
//!   neuroml-widgets project dump.json --max-list-members 5
//!   neuroml-widgets simulate LEMS_sim.xml --set step=0.025 --set length=500ms --run
//!   neuroml-widgets choose lems --dir ./models

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use neuroml_widgets::chooser::{lems_file_chooser, nml_file_chooser};
use neuroml_widgets::config::{Config, RuntimeConfig};
use neuroml_widgets::introspect::Introspectable;
use neuroml_widgets::lems::LemsDocument;
use neuroml_widgets::model::{JsonComponent, XmlComponent};
use neuroml_widgets::projector::Projector;
use neuroml_widgets::runner::CommandRunner;
use neuroml_widgets::simulation::ParameterForm;
use neuroml_widgets::visual::html_document;

#[derive(Parser)]
#[command(name = "neuroml-widgets")]
#[command(about = "Explore NeuroML components and edit LEMS simulations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Project a NeuroML/LEMS file or a JSON introspection dump into a visual tree
    Project {
        file: PathBuf,
        /// List entries expanded before a list is summarised
        #[arg(long)]
        max_list_members: Option<usize>,
        /// Declared type whose list children get their own tab (repeatable)
        #[arg(long = "tab", value_name = "TYPE")]
        tabs: Vec<String>,
        /// Stop projecting below this nesting depth
        #[arg(long)]
        max_depth: Option<usize>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Outline)]
        format: OutputFormat,
    },
    /// Show and edit step, length and seed of a LEMS simulation
    Simulate {
        file: PathBuf,
        /// Parameter edit such as step=0.025 or length=500ms (repeatable)
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,
        /// Runner identifier, e.g. jneuroml or neuron
        #[arg(long)]
        runner: Option<String>,
        /// Directory for the submitted file
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Save a timestamped copy and run it
        #[arg(long)]
        run: bool,
    },
    /// List NeuroML or LEMS files in a directory
    Choose {
        #[arg(value_enum)]
        kind: FileKind,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        /// Include hidden files
        #[arg(long)]
        hidden: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Html,
    Outline,
}

#[derive(Clone, Copy, ValueEnum)]
enum FileKind {
    Nml,
    Lems,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // logging first so configuration warnings are visible
    Config::load_env_file();
    tracing_subscriber::fmt()
        .with_env_filter(RuntimeConfig::load_from_env().log_level.as_str())
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    match cli.command {
        Commands::Project {
            file,
            max_list_members,
            tabs,
            max_depth,
            format,
        } => project(&config, &file, max_list_members, tabs, max_depth, format),
        Commands::Simulate {
            file,
            set,
            runner,
            out_dir,
            run,
        } => simulate(&config, &file, &set, runner, out_dir, run),
        Commands::Choose { kind, dir, hidden } => choose(&config, kind, dir, hidden),
    }
}

fn load_component(path: &Path) -> Result<Box<dyn Introspectable>> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        let load = JsonComponent::read(path)?;
        if !load.warnings.is_empty() {
            tracing::warn!(
                "{} malformed value(s) skipped in {}",
                load.warnings.len(),
                path.display()
            );
        }
        Ok(Box::new(load.component))
    } else {
        Ok(Box::new(XmlComponent::read(path)?))
    }
}

fn project(
    config: &Config,
    file: &Path,
    max_list_members: Option<usize>,
    tabs: Vec<String>,
    max_depth: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let mut projection = config.projection.clone();
    if let Some(max) = max_list_members {
        projection.max_list_members = max;
    }
    if !tabs.is_empty() {
        projection.tabbed_types = tabs;
    }
    if max_depth.is_some() {
        projection.max_depth = max_depth;
    }
    projection.validate()?;

    let component = load_component(file)?;
    let projector = Projector::new(projection.options());
    let Some(tree) = projector.project(component.as_ref()) else {
        info!("{} has nothing to display", file.display());
        return Ok(());
    };

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&tree)?,
        OutputFormat::Html => html_document(&tree, &file.display().to_string()),
        OutputFormat::Outline => tree.outline(),
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn simulate(
    config: &Config,
    file: &Path,
    edits: &[String],
    runner: Option<String>,
    out_dir: Option<PathBuf>,
    run: bool,
) -> Result<()> {
    let document = LemsDocument::read(file)?;
    let mut form = ParameterForm::from_config(document, &config.simulation)?;
    if let Some(runner) = runner {
        form = form.with_runner(runner);
    }
    if let Some(dir) = out_dir {
        form = form.with_output_dir(dir);
    }

    for edit in edits {
        let (name, value) = edit
            .split_once('=')
            .with_context(|| format!("expected NAME=VALUE, got '{edit}'"))?;
        form.edit_text(name.trim(), value.trim())?;
    }

    for field in form.fields() {
        let marker = if form.state().is_changed(field) { "*" } else { " " };
        println!(
            "{marker} {:<8} {:>12} {}",
            field.name,
            field.quantity.magnitude_text(),
            field.unit()
        );
    }

    if run {
        let runner = CommandRunner::new(&config.simulation.runner_command);
        let submission = form.submit(&runner)?;
        println!("Submitted {}", submission.path.display());
        if !submission.report.stdout.trim().is_empty() {
            println!("{}", submission.report.stdout.trim_end());
        }
    }
    Ok(())
}

fn choose(config: &Config, kind: FileKind, dir: PathBuf, hidden: bool) -> Result<()> {
    let chooser = match kind {
        FileKind::Nml => nml_file_chooser(&config.chooser, "")?,
        FileKind::Lems => lems_file_chooser(&config.chooser, "")?,
    };
    let chooser = chooser.with_root(dir).with_hidden(hidden || config.chooser.show_hidden);

    println!("{} ({})", chooser.title(), chooser.pattern());
    for path in chooser.list()? {
        println!("  {}", path.display());
    }
    Ok(())
}
