use af_app::{execute_run_with_progress, AppResult, RunProgressEvent, RunRequest};
use af_data::{preprocess, ColumnSpec, RawTable};
use af_fit::{resolve_configs, CancelToken, FitSettings};
use af_models::IsothermModel;
use af_results::RunStore;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "af-cli")]
#[command(about = "ADSORBFIT CLI - batch fitting of adsorption isotherm models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the registered isotherm models
    Models,
    /// Validate a fit settings file
    Validate {
        /// Path to the settings YAML file
        settings_path: PathBuf,
    },
    /// Preprocess a dataset and print its statistics
    Preprocess {
        /// Path to the dataset CSV file
        dataset_path: PathBuf,
        /// Require exact column names instead of auto-detection
        #[arg(long)]
        no_detect: bool,
    },
    /// Fit all enabled models to every experiment in a dataset
    Fit {
        /// Path to the dataset CSV file
        dataset_path: PathBuf,
        /// Path to a settings YAML file (defaults to all models with
        /// default bounds)
        #[arg(short, long)]
        settings: Option<PathBuf>,
        /// Override the per-fit evaluation budget
        #[arg(long)]
        max_iter: Option<usize>,
        /// Override the worker count (0 = all cores, 1 = sequential)
        #[arg(long)]
        workers: Option<usize>,
        /// Skip writing per-model best-fit subsets
        #[arg(long)]
        no_save_best: bool,
        /// Output directory for run artifacts
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// List stored runs
    Runs {
        /// Output directory the runs were written to
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Show details of a stored run
    ShowRun {
        /// Run ID to display
        run_id: String,
        /// Output directory the runs were written to
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Models => cmd_models(),
        Commands::Validate { settings_path } => cmd_validate(&settings_path),
        Commands::Preprocess {
            dataset_path,
            no_detect,
        } => cmd_preprocess(&dataset_path, no_detect),
        Commands::Fit {
            dataset_path,
            settings,
            max_iter,
            workers,
            no_save_best,
            out,
        } => cmd_fit(
            &dataset_path,
            settings.as_deref(),
            max_iter,
            workers,
            no_save_best,
            &out,
        ),
        Commands::Runs { out } => cmd_runs(&out),
        Commands::ShowRun { run_id, out } => cmd_show_run(&run_id, &out),
    }
}

fn cmd_models() -> AppResult<()> {
    println!("Registered isotherm models:");
    for model in IsothermModel::ALL {
        println!(
            "  {:<11} params: {:<12} {}",
            model.name(),
            model.param_names().join(", "),
            model.formula()
        );
    }
    Ok(())
}

fn cmd_validate(settings_path: &Path) -> AppResult<()> {
    println!("Validating settings: {}", settings_path.display());
    let content = std::fs::read_to_string(settings_path)?;
    let settings = FitSettings::from_yaml_str(&content)
        .map_err(|e| af_app::AppError::Config(e.to_string()))?;
    let configs = resolve_configs(&settings).map_err(|e| af_app::AppError::Config(e.to_string()))?;
    println!(
        "✓ Settings are valid ({} models, {} evaluations per fit)",
        configs.models.len(),
        configs.max_evaluations
    );
    Ok(())
}

fn cmd_preprocess(dataset_path: &Path, no_detect: bool) -> AppResult<()> {
    let table =
        RawTable::read_csv(dataset_path).map_err(|e| af_app::AppError::Data(e.to_string()))?;
    let spec = ColumnSpec {
        detect_columns: !no_detect,
        ..ColumnSpec::default()
    };
    let (_, summary) = preprocess(&table, &spec).map_err(|e| af_app::AppError::Data(e.to_string()))?;
    println!("{summary}");
    Ok(())
}

fn cmd_fit(
    dataset_path: &Path,
    settings_path: Option<&Path>,
    max_iter: Option<usize>,
    workers: Option<usize>,
    no_save_best: bool,
    out: &Path,
) -> AppResult<()> {
    let mut settings = match settings_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            FitSettings::from_yaml_str(&content)
                .map_err(|e| af_app::AppError::Config(e.to_string()))?
        }
        None => FitSettings::default(),
    };
    if let Some(max_iter) = max_iter {
        settings.max_iterations = max_iter;
    }
    if let Some(workers) = workers {
        settings.workers = workers;
    }
    if no_save_best {
        settings.save_best = false;
    }

    println!("Fitting dataset: {}", dataset_path.display());

    let request = RunRequest {
        dataset_path: dataset_path.to_path_buf(),
        settings,
        out_dir: out.to_path_buf(),
    };

    let mut last_emit = Instant::now();
    let mut last_stage = String::new();
    let mut cb = |event: RunProgressEvent| {
        let stage_key = event.stage.label().to_string();
        let emit_now = stage_key != last_stage || last_emit.elapsed().as_millis() >= 100;
        if emit_now {
            render_cli_progress(&event);
            last_stage = stage_key;
            last_emit = Instant::now();
        }
    };
    let response = execute_run_with_progress(&request, Some(&mut cb), &CancelToken::new())?;
    clear_progress_line();

    if response.cancelled {
        println!("✗ Run cancelled: {}", response.run_id);
    } else {
        println!("✓ Fitting completed: {}", response.run_id);
    }

    println!("\n{}", response.summary);

    let manifest = &response.manifest;
    println!("\nFit summary:");
    println!("  Models:      {}", manifest.models.join(", "));
    println!("  Fits:        {}", manifest.fits_total);
    println!("  Failed fits: {}", manifest.fits_failed);

    let preview_rows = response.wide_table.rows.len().min(5);
    if preview_rows > 0 {
        println!("\nBest model per experiment:");
        for row in response.wide_table.rows.iter().take(preview_rows) {
            println!(
                "  {:<20} {}",
                row.experiment,
                row.best_model.as_deref().unwrap_or("-")
            );
        }
        if response.wide_table.rows.len() > preview_rows {
            println!("  ... {} more", response.wide_table.rows.len() - preview_rows);
        }
    }

    println!(
        "\nArtifacts: {}",
        out.join(".adsorbfit")
            .join("runs")
            .join(&response.run_id)
            .display()
    );

    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    match &event.fitting {
        Some(fitting) if fitting.total > 0 => {
            let width = 28usize;
            let fraction = fitting.done as f64 / fitting.total as f64;
            let filled = ((fraction * width as f64).round() as usize).min(width);
            let bar = format!(
                "{}{}",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled))
            );
            print!(
                "\r[{}] {:>6.2}%  {}/{} experiments  elapsed={:.1}s",
                bar,
                fraction * 100.0,
                fitting.done,
                fitting.total,
                event.elapsed_wall_s
            );
            let _ = io::stdout().flush();
        }
        _ => {
            let spinner = ['|', '/', '-', '\\'];
            let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
            let mut line = format!(
                "\r{} {}  elapsed={:.2}s",
                spinner[spin_idx],
                event.stage.label(),
                event.elapsed_wall_s
            );
            if let Some(msg) = &event.message {
                line.push_str(&format!("  {}", msg));
            }
            print!("{}", line);
            let _ = io::stdout().flush();
        }
    }
}

fn cmd_runs(out: &Path) -> AppResult<()> {
    let store =
        RunStore::for_output_dir(out).map_err(|e| af_app::AppError::Results(e.to_string()))?;
    let runs = store
        .list_runs()
        .map_err(|e| af_app::AppError::Results(e.to_string()))?;

    if runs.is_empty() {
        println!("No stored runs found under {}", out.display());
    } else {
        println!("Stored runs:");
        for manifest in runs {
            println!(
                "  {} ({}, {} experiments, {} failed fits{})",
                manifest.run_id,
                manifest.timestamp,
                manifest.experiment_count,
                manifest.fits_failed,
                if manifest.cancelled { ", cancelled" } else { "" }
            );
        }
    }
    Ok(())
}

fn cmd_show_run(run_id: &str, out: &Path) -> AppResult<()> {
    let store =
        RunStore::for_output_dir(out).map_err(|e| af_app::AppError::Results(e.to_string()))?;
    let manifest = store
        .load_manifest(run_id)
        .map_err(|e| af_app::AppError::RunNotFound(e.to_string()))?;

    println!("Run {}", manifest.run_id);
    println!("  Dataset:      {}", manifest.dataset);
    println!("  Timestamp:    {}", manifest.timestamp);
    println!("  Solver:       {}", manifest.solver_version);
    println!("  Experiments:  {}", manifest.experiment_count);
    println!("  Models:       {}", manifest.models.join(", "));
    println!("  Max iter:     {}", manifest.max_iterations);
    println!("  Workers:      {}", manifest.workers);
    println!(
        "  Fits:         {} total, {} failed",
        manifest.fits_total, manifest.fits_failed
    );
    if manifest.cancelled {
        println!("  Cancelled:    yes (partial results)");
    }
    Ok(())
}
