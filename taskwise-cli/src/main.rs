use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use taskwise_core::{
    apply_schedule, build_schedule, ConfidenceLevel, DateProvider, DraftField, FixedDate,
    ParsedTaskDraft, ScheduleBlock, TaskParser,
};

mod config;
mod state;

#[derive(Parser, Debug)]
#[command(name = "taskwise", version, about = "Quick-add task parsing and day planning")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a quick-add sentence into a task draft
    Parse {
        /// The sentence, e.g. `urgent call mom tomorrow at 6pm`
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Resolve relative dates against this day instead of today (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Print the draft as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build today's time-blocked plan from a JSON task list
    Schedule {
        /// JSON array of tasks (camelCase fields)
        #[arg(long)]
        tasks: PathBuf,

        /// Work day start hour (overrides config)
        #[arg(long)]
        start: Option<u32>,

        /// Work day end hour (overrides config)
        #[arg(long)]
        end: Option<u32>,

        /// Write block start times back into the task file
        #[arg(long)]
        apply: bool,

        /// Print the blocks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage ~/.taskwise/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,

    /// Print the effective config
    Show,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("taskwise=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Parse { text, date, json } => {
            let input = text.join(" ");
            let draft = match date {
                Some(d) => TaskParser::new(FixedDate(d)).parse(&input),
                None => {
                    let cfg = config::load_config()?;
                    TaskParser::new(cfg.date_provider()?).parse(&input)
                }
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&draft)?);
            } else {
                print_draft(&draft)?;
            }
        }

        Command::Schedule {
            tasks,
            start,
            end,
            apply,
            json,
        } => {
            let cfg = config::load_config()?;
            let window = cfg.work_window(start, end)?;
            let mut list = state::read_tasks(&tasks)?;
            let blocks = build_schedule(&list, window);
            info!(
                tasks = list.len(),
                blocks = blocks.len(),
                "built schedule for {:02}:00-{:02}:00",
                window.start_hour,
                window.end_hour
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&blocks)?);
            } else {
                let today = cfg.date_provider()?.today();
                print_blocks(today, &blocks)?;
            }

            if apply {
                let n = apply_schedule(&mut list, &blocks);
                state::write_tasks(&tasks, &list)?;
                eprintln!("Updated {n} tasks in {}", tasks.display());
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                let s = toml::to_string_pretty(&cfg).context("serialize config")?;
                println!("# {}", config::config_path()?.display());
                print!("{s}");
            }
        },
    }

    Ok(())
}

/// Lowercase wire name of an enum value, as it appears in JSON.
fn label<T: Serialize>(value: &T) -> Result<String> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => bail!("expected a string label, got {other}"),
    }
}

fn print_draft(draft: &ParsedTaskDraft) -> Result<()> {
    println!("Title: {}", draft.title);

    let mut rows: Vec<(DraftField, String)> = Vec::new();
    if let Some(p) = &draft.priority {
        rows.push((DraftField::Priority, label(p)?));
    }
    if let Some(c) = &draft.category {
        rows.push((DraftField::Category, label(c)?));
    }
    if let Some(d) = draft.due_date {
        rows.push((DraftField::DueDate, d.to_string()));
    }
    if let Some(t) = draft.due_time {
        rows.push((DraftField::DueTime, t.to_string()));
    }
    if let Some(m) = draft.estimated_duration {
        rows.push((DraftField::EstimatedDuration, format!("{m} min")));
    }
    if let Some(r) = &draft.recurrence {
        rows.push((DraftField::Recurrence, label(r)?));
    }
    if let Some(e) = &draft.energy_level {
        rows.push((DraftField::EnergyLevel, label(e)?));
    }

    if rows.is_empty() {
        println!("(nothing recognized)");
        return Ok(());
    }

    for (field, value) in rows {
        let key = label(&field)?;
        match draft.confidence.get(field) {
            Some(s) => println!(
                "  {key:<18} {value:<12} {s:.2} ({})",
                label(&ConfidenceLevel::from_score(s))?
            ),
            None => println!("  {key:<18} {value}"),
        }
    }
    Ok(())
}

fn print_blocks(today: NaiveDate, blocks: &[ScheduleBlock]) -> Result<()> {
    println!("# Plan for {today}\n");
    if blocks.is_empty() {
        println!("(nothing to schedule: only open tasks with a due date are planned)");
        return Ok(());
    }
    for b in blocks {
        let energy = match &b.energy_level {
            Some(e) => label(e)?,
            None => "-".to_string(),
        };
        println!(
            "{}-{}  [{:<6}] [{:<5}] {} ({} min)",
            b.start_time,
            b.end_time,
            label(&b.priority)?,
            energy,
            b.title,
            b.duration_minutes()
        );
    }
    let planned: u32 = blocks.iter().map(ScheduleBlock::duration_minutes).sum();
    println!("\n{} blocks, {} min planned", blocks.len(), planned);
    Ok(())
}
