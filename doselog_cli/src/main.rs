use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use doselog_core::stats::{self, WeeklyChangePolicy};
use doselog_core::titration;
use doselog_core::*;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "doselog")]
#[command(about = "GLP-1 journey tracker for weight, dose and side effects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override the data file
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a new entry
    Add {
        /// Date of the entry (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Weight in pounds
        #[arg(long)]
        weight: f64,

        /// Dose in milligrams
        #[arg(long)]
        dose: f64,

        #[command(flatten)]
        side_effects: SideEffectArgs,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List all entries, newest first
    List {
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change fields of an existing entry
    Edit {
        #[command(flatten)]
        target: Target,

        #[arg(long)]
        weight: Option<f64>,

        #[arg(long)]
        dose: Option<f64>,

        #[arg(long)]
        nausea: Option<u8>,

        #[arg(long)]
        fatigue: Option<u8>,

        #[arg(long)]
        gi: Option<u8>,

        #[arg(long)]
        sleep: Option<u8>,

        #[arg(long, conflicts_with = "clear_notes")]
        notes: Option<String>,

        /// Remove the entry's notes
        #[arg(long)]
        clear_notes: bool,
    },

    /// Delete an entry
    Delete {
        #[command(flatten)]
        target: Target,
    },

    /// Show summary statistics (default)
    Stats {
        /// How the weekly change is measured (by-row-count, by-calendar-window)
        #[arg(long)]
        policy: Option<WeeklyChangePolicy>,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export all entries
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show the standard titration schedule
    Schedule,
}

#[derive(Args)]
struct SideEffectArgs {
    /// Nausea severity (0-10)
    #[arg(long, default_value_t = 0)]
    nausea: u8,

    /// Fatigue severity (0-10)
    #[arg(long, default_value_t = 0)]
    fatigue: u8,

    /// GI issues severity (0-10)
    #[arg(long, default_value_t = 0)]
    gi: u8,

    /// Sleep issues severity (0-10)
    #[arg(long, default_value_t = 0)]
    sleep: u8,
}

/// Which entry to act on
#[derive(Args)]
#[group(required = true, multiple = false)]
struct Target {
    /// Entry id, as shown by `list`
    #[arg(long)]
    id: Option<EntryId>,

    /// Entry label, e.g. "2024-01-01 | 200.0 lbs | 2.0mg"
    #[arg(long)]
    entry: Option<String>,
}

impl Target {
    fn selector(&self) -> Result<Selector> {
        match (&self.id, &self.entry) {
            (Some(id), _) => Ok(Selector::Id(*id)),
            (None, Some(label)) => Selector::from_label(label),
            (None, None) => Err(Error::Validation("an --id or --entry is required".into())),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

fn main() -> Result<()> {
    doselog_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_file = cli
        .data_file
        .clone()
        .unwrap_or_else(|| config.data.data_file.clone());
    tracing::debug!("Using data file {:?}", data_file);
    let mut store = EntryStore::with_limits(data_file, config.limits.clone());

    match cli.command {
        Some(Commands::Add {
            date,
            weight,
            dose,
            side_effects,
            notes,
        }) => {
            let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
            let mut entry = Entry::new(date, weight, dose).with_side_effects(
                side_effects.nausea,
                side_effects.fatigue,
                side_effects.gi,
                side_effects.sleep,
            );
            if let Some(notes) = notes {
                entry = entry.with_notes(notes);
            }
            cmd_add(&mut store, entry)
        }
        Some(Commands::List { json }) => cmd_list(&mut store, json),
        Some(Commands::Edit {
            target,
            weight,
            dose,
            nausea,
            fatigue,
            gi,
            sleep,
            notes,
            clear_notes,
        }) => {
            let changes = EntryChanges {
                weight,
                dose,
                nausea,
                fatigue,
                gi,
                sleep,
                notes: if clear_notes { Some(None) } else { notes.map(Some) },
            };
            cmd_edit(&mut store, &target.selector()?, &changes)
        }
        Some(Commands::Delete { target }) => cmd_delete(&mut store, &target.selector()?),
        Some(Commands::Stats { policy, json }) => cmd_stats(
            &mut store,
            policy.unwrap_or(config.stats.weekly_change_policy),
            json,
        ),
        Some(Commands::Export { format, output }) => cmd_export(&mut store, format, output),
        Some(Commands::Schedule) => cmd_schedule(),
        None => cmd_stats(&mut store, config.stats.weekly_change_policy, false),
    }
}

fn cmd_add(store: &mut EntryStore, entry: Entry) -> Result<()> {
    let label = entry.display_label();
    let id = entry.id;
    store.add(entry)?;

    println!("✓ Saved {}", label);
    println!("  id: {}", id);
    Ok(())
}

fn cmd_list(store: &mut EntryStore, json: bool) -> Result<()> {
    let collection = store.load()?;

    if json {
        let rows: Vec<&Entry> = collection.table_view();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if collection.is_empty() {
        println!("No data yet. Start logging!");
        return Ok(());
    }

    for entry in collection.table_view() {
        println!(
            "{}  {}  nausea {} · fatigue {} · gi {} · sleep {}",
            entry.id,
            entry.display_label(),
            entry.nausea,
            entry.fatigue,
            entry.gi,
            entry.sleep
        );
        if let Some(notes) = &entry.notes {
            println!("    {}", notes.replace('\n', "\n    "));
        }
    }
    Ok(())
}

fn cmd_edit(store: &mut EntryStore, selector: &Selector, changes: &EntryChanges) -> Result<()> {
    if changes.is_empty() {
        return Err(Error::Validation("no changes given".into()));
    }

    let collection = store.update(selector, changes)?;
    if let Some(entry) = collection.find(selector) {
        println!("✓ Updated {}", entry.display_label());
    }
    Ok(())
}

fn cmd_delete(store: &mut EntryStore, selector: &Selector) -> Result<()> {
    store.delete(selector)?;
    println!("✓ Deleted {}", selector);
    Ok(())
}

fn cmd_stats(store: &mut EntryStore, policy: WeeklyChangePolicy, json: bool) -> Result<()> {
    let collection = store.load()?;
    let summary = stats::derive_stats(&collection, policy);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let Some(summary) = summary else {
        println!("No data yet. Start logging!");
        return Ok(());
    };

    let change = if summary.total_change > 0.0 {
        format!("{:.1} lbs", summary.total_change)
    } else {
        format!("+{:.1} lbs", summary.total_change.abs())
    };

    println!("Current Weight   {:.1} lbs", summary.current_weight);
    println!("Total Loss       {}", change);
    println!("Current Dose     {:.1} mg", summary.current_dose);
    println!("Days Tracking    {}", summary.days_tracking);
    if let Some(weekly) = summary.weekly_change {
        println!("This Week        {:+.1} lbs ({})", weekly, policy);
    }
    println!();
    println!("Average Side Effects");
    println!("  Nausea   {:.1}/10", summary.averages.nausea);
    println!("  Fatigue  {:.1}/10", summary.averages.fatigue);
    println!("  GI       {:.1}/10", summary.averages.gi);
    println!("  Sleep    {:.1}/10", summary.averages.sleep);
    Ok(())
}

fn cmd_export(store: &mut EntryStore, format: ExportFormat, output: Option<PathBuf>) -> Result<()> {
    let bytes = match format {
        ExportFormat::Csv => store.export()?,
        ExportFormat::Json => {
            let mut json = export_json(&store.load()?)?;
            json.push('\n');
            json.into_bytes()
        }
    };

    match output {
        Some(path) => {
            std::fs::write(&path, &bytes)?;
            eprintln!("✓ Exported to {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn cmd_schedule() -> Result<()> {
    println!("Standard Titration Schedule");
    println!("  Week  Dose (mg)");
    for step in titration::standard_schedule() {
        println!("  {:>4}  {:>9.1}", step.week, step.dose_mg);
    }
    Ok(())
}
