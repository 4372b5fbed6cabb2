use anyhow::{Context, Result, bail};
use chrono::{Duration, NaiveDate};
use clap::{Parser, Subcommand};
use dayplan_core::{NewTask, Planner, SystemClock, parse_local_date};
use std::time::Duration as StdDuration;

mod config;
mod logging;
mod render;
mod state;

use config::{Config, load_config};
use state::JsonFileStore;

type CliPlanner = Planner<JsonFileStore, SystemClock>;

#[derive(Parser, Debug)]
#[command(
    name = "dayplan",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("DAYPLAN_BUILD_SHA"), ")"),
    about = "Daily workload planner"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a task
    Add {
        title: String,

        /// Total effort in hours
        #[arg(long)]
        hours: f64,

        /// Higher = more important
        #[arg(long, default_value_t = 1)]
        priority: i32,

        /// Deadline as YYYY-MM-DD (local calendar date)
        #[arg(long)]
        deadline: String,
    },

    /// List all tasks
    List {
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show the plan for today or another day
    Plan {
        #[command(flatten)]
        day: DayArgs,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Toggle a task's completed flag
    Done { id: String },

    /// Delete a task
    Rm { id: String },

    /// Start the timer on a task (stops any other running timer)
    Start { id: String },

    /// Stop a running timer (defaults to whichever task is tracking)
    Stop { id: Option<String> },

    /// Log hours by hand
    Log { id: String, hours: f64 },

    /// Show or set the daily capacity in hours
    Capacity { hours: Option<f64> },

    /// Re-render the plan periodically while a timer runs
    Watch {
        #[command(flatten)]
        day: DayArgs,

        /// Refresh interval (default from config.watch.interval_secs)
        #[arg(long)]
        interval_secs: Option<u64>,
    },

    /// Config file commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(clap::Args, Debug, Clone)]
struct DayArgs {
    /// Day to view as YYYY-MM-DD
    #[arg(long, conflicts_with = "offset")]
    date: Option<String>,

    /// Day to view relative to today (e.g. 1 = tomorrow, -1 = yesterday)
    #[arg(long, allow_hyphen_values = true)]
    offset: Option<i64>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config.toml if none exists
    Init,
    /// Print the effective config
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = load_config()?;
    logging::init_logging(&cfg.logging.filter)?;

    match cli.command {
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => print!("{}", toml::to_string_pretty(&cfg)?),
        },
        command => {
            let planner = open_planner(&cfg)?;
            run(command, &planner, &cfg).await?;
        }
    }

    Ok(())
}

fn open_planner(cfg: &Config) -> Result<CliPlanner> {
    let store = JsonFileStore::open_default()?;
    Ok(Planner::new(store, SystemClock, cfg.timezone()?).with_policy(cfg.planner.in_flight_policy))
}

async fn run(command: Command, planner: &CliPlanner, cfg: &Config) -> Result<()> {
    match command {
        Command::Add {
            title,
            hours,
            priority,
            deadline,
        } => {
            let task = planner.add_task(NewTask {
                title,
                estimated_hours: hours,
                priority,
                deadline,
            })?;
            println!("Added {} ({})", task.title, task.id);
        }

        Command::List { json } => {
            let tasks = planner.tasks()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else {
                print!("{}", render::render_task_list(&tasks, planner.today()));
            }
        }

        Command::Plan { day, json } => {
            let viewed = resolve_day(&day, planner.today())?;
            let plan = planner.plan(Some(viewed))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                let capacity = planner.settings()?.daily_capacity;
                print!("{}", render::render_plan(&plan, capacity));
            }
        }

        Command::Done { id } => {
            let completed = planner.toggle_complete(&id)?;
            println!("{} {}", id, if completed { "completed" } else { "reopened" });
        }

        Command::Rm { id } => {
            let task = planner.delete_task(&id)?;
            println!("Deleted {}", task.title);
        }

        Command::Start { id } => {
            if let Some(prev) = planner.start_timer(&id)? {
                println!(
                    "Stopped {} (+{:.2}h, total {:.2}h)",
                    prev.task_id, prev.elapsed_hours, prev.time_worked
                );
            }
            println!("Tracking {id}");
        }

        Command::Stop { id } => {
            let id = match id {
                Some(id) => id,
                None => planner
                    .active_task()?
                    .map(|t| t.id)
                    .context("no timer is running")?,
            };
            let s = planner.stop_timer(&id)?;
            println!(
                "Stopped {} (+{:.2}h, total {:.2}h)",
                s.task_id, s.elapsed_hours, s.time_worked
            );
        }

        Command::Log { id, hours } => {
            let total = planner.log_time(&id, hours)?;
            println!("Logged {hours}h on {id} (total {total:.2}h)");
        }

        Command::Capacity { hours } => match hours {
            Some(h) => {
                let s = planner.set_capacity(h)?;
                println!("{} hrs", s.daily_capacity);
            }
            None => println!("{} hrs", planner.settings()?.daily_capacity),
        },

        Command::Watch { day, interval_secs } => {
            let secs = interval_secs.unwrap_or(cfg.watch.interval_secs).max(1);
            watch(planner, &day, StdDuration::from_secs(secs)).await?;
        }

        Command::Config { .. } => bail!("config commands are handled before opening the store"),
    }

    Ok(())
}

/// Every tick recomputes from the store; ticks with no running timer are no-ops.
async fn watch(planner: &CliPlanner, day: &DayArgs, every: StdDuration) -> Result<()> {
    let mut ticker = tokio::time::interval(every);
    let mut first = true;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }

        let viewed = resolve_day(day, planner.today())?;
        let plan = if first {
            Some(planner.plan(Some(viewed))?)
        } else {
            planner.refresh(Some(viewed))?
        };
        first = false;

        match plan {
            Some(plan) => {
                let capacity = planner.settings()?.daily_capacity;
                // clear screen + home
                print!("\x1b[2J\x1b[H{}", render::render_plan(&plan, capacity));
            }
            None => tracing::debug!("no timer running; skipping refresh"),
        }
    }
    Ok(())
}

fn resolve_day(day: &DayArgs, today: NaiveDate) -> Result<NaiveDate> {
    if let Some(s) = &day.date {
        return Ok(parse_local_date(s)?);
    }
    let n = day.offset.unwrap_or(0);
    match Duration::try_days(n).and_then(|d| today.checked_add_signed(d)) {
        Some(viewed) => Ok(viewed),
        None => bail!("--offset {n} is out of range"),
    }
}
