//! pdf-atomizer CLI - explode a PDF into atoms, export and rebuild

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdf_atomizer::render::{self, JsonFormat, SlugCollision, YamlOptions};
use pdf_atomizer::{rebuild, AtomDocument, Atomizer, ExplodeObserver, ExplodeOptions, Step, StepOutcome};

#[derive(Parser)]
#[command(name = "pdf-atomizer")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Explode a PDF into atoms, export them as JSON/YAML and rebuild a partial PDF", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "PDF")]
    pdf: PathBuf,

    /// Print the atom summary (the default when no export is requested)
    #[arg(long)]
    explode: bool,

    /// Write the full atom store as JSON
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Write the page text coordinate map as YAML
    #[arg(long, value_name = "PATH")]
    yaml: Option<PathBuf>,

    /// Rebuild a partial PDF from the atoms
    #[arg(long, value_name = "PATH")]
    rebuild: Option<PathBuf>,

    /// Output compact JSON
    #[arg(long)]
    compact: bool,

    /// Include the raw object dump
    #[arg(long)]
    raw: bool,

    /// Abort on the first failed extraction step
    #[arg(long)]
    strict: bool,

    /// What to do with duplicate slugs on one page
    #[arg(long, value_enum, default_value = "suffix")]
    slug_collision: CollisionMode,

    /// More log output (repeat for debug)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum CollisionMode {
    /// Keep every span: name, name_2, name_3, ...
    Suffix,
    /// Last span with a slug wins
    Overwrite,
}

impl From<CollisionMode> for SlugCollision {
    fn from(mode: CollisionMode) -> Self {
        match mode {
            CollisionMode::Suffix => SlugCollision::Suffix,
            CollisionMode::Overwrite => SlugCollision::Overwrite,
        }
    }
}

impl Cli {
    fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

/// Spinner plus one colored line per finished step.
struct ProgressObserver {
    pb: ProgressBar,
}

impl ProgressObserver {
    fn new(pb: ProgressBar) -> Self {
        Self { pb }
    }
}

impl ExplodeObserver for ProgressObserver {
    fn step_started(&mut self, step: Step) {
        self.pb.set_message(format!("Extracting {}...", step));
    }

    fn step_finished(&mut self, step: Step, outcome: &StepOutcome) {
        let status = match outcome {
            StepOutcome::Captured(_) => outcome.to_string().green(),
            StepOutcome::Empty | StepOutcome::Skipped => outcome.to_string().dimmed(),
            StepOutcome::Failed(_) => outcome.to_string().red(),
        };
        let name = format!("{:<11}", step.name());
        self.pb.println(format!("  {} {}", name.bold(), status));
    }

    fn page_finished(&mut self, index: u32, total: u32) {
        self.pb
            .set_message(format!("Extracting pages ({}/{})...", index + 1, total));
    }
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = ExplodeOptions::new().with_raw_objects(cli.raw);
    if cli.strict {
        options = options.strict();
    }

    // Fails on a missing or non-PDF source before anything is printed
    let atomizer = Atomizer::open_with_options(&cli.pdf, options)?;

    println!("{} {}", "Exploding".cyan().bold(), cli.pdf.display());
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));

    let mut atomizer = atomizer.with_observer(ProgressObserver::new(pb.clone()));
    let report = atomizer.explode();
    pb.finish_and_clear();
    let report = report?;
    let atoms = atomizer.into_atoms();

    let exports = cli.json.is_some() || cli.yaml.is_some() || cli.rebuild.is_some();
    if cli.explode || !exports {
        print_summary(&atoms, report.failures().count());
    }

    let mut outputs = Vec::new();
    if let Some(path) = &cli.json {
        let format = if cli.compact {
            JsonFormat::Compact
        } else {
            JsonFormat::Pretty
        };
        render::write_json(&atoms, path, format)?;
        outputs.push(path.as_path());
    }
    if let Some(path) = &cli.yaml {
        let yaml_options = YamlOptions::new().with_collision(cli.slug_collision.into());
        render::write_yaml(&atoms, path, &yaml_options)?;
        outputs.push(path.as_path());
    }
    if let Some(path) = &cli.rebuild {
        rebuild::rebuild(&atoms, path)?;
        outputs.push(path.as_path());
    }

    print_outputs(&outputs);
    Ok(())
}

fn print_summary(atoms: &AtomDocument, failures: usize) {
    println!();
    println!("{}", "Atom Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!(
        "{}: PDF {}",
        "Format".bold(),
        atoms.header.version.as_deref().unwrap_or("unknown")
    );
    println!("{}: {}", "Pages".bold(), atoms.page_count());
    println!("{}: {}", "Text spans".bold(), atoms.span_count());
    println!("{}: {}", "Images".bold(), atoms.image_count());
    println!("{}: {}", "Embedded files".bold(), atoms.embeds.names.len());
    println!("{}: {}", "JavaScript".bold(), atoms.js.len());
    println!("{}: {}", "Form fields".bold(), atoms.acroform.fields.len());
    println!("{}: {}", "Signatures".bold(), atoms.signatures.fields.len());
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if atoms.encrypt.is_empty() { "No" } else { "Yes" }
    );

    if failures > 0 {
        println!(
            "{} {} step(s) failed, their atoms are empty",
            "Warning:".yellow().bold(),
            failures
        );
    }
}

fn print_outputs(outputs: &[&Path]) {
    if outputs.is_empty() {
        return;
    }
    println!("\n{}", "Output files:".green().bold());
    for (i, path) in outputs.iter().enumerate() {
        let branch = if i + 1 == outputs.len() { "└─" } else { "├─" };
        println!("  {} {}", branch.dimmed(), path.display());
    }
}
