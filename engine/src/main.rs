//! Calorie tracker CLI
//!
//! Logs foods, exercise, weight and habits into a document kept in the data
//! directory, and prints every result as JSON on stdout.
//!
//! ```bash
//! calorie-tracker profile set --weight 82 --activity lightly_active
//! calorie-tracker food add "Greek yogurt" --qty 2
//! calorie-tracker exercise add Jogging --mins 30
//! calorie-tracker weight set 176 --unit lbs --date 2024-03-02
//! calorie-tracker summary --date 2024-03-02
//! ```

use anyhow::Result;
use calorie_tracker_engine::config::AppConfig;
use calorie_tracker_engine::error::{TrackerError, TrackerResult};
use calorie_tracker_engine::state::{StoreSettings, TrackerStore};
use calorie_tracker_engine::storage::{FileStorage, KeyValueStorage};
use calorie_tracker_shared::validation::{parse_iso_date, parse_time_of_day};
use calorie_tracker_shared::{
    ActivityLevel, BiologicalSex, Catalog, CreateHabitItemRequest, DistanceUnit, EnergyUnit, Food,
    HabitKind, HabitValue, LogExerciseRequest, LogFoodRequest, StrengthInput,
    UpdateProfileRequest, WeightUnit,
};
use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "calorie-tracker",
    about = "Calorie and weight tracker",
    long_about = "Tracks intake, exercise and body weight, and predicts weight from the daily energy balance."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Data directory override
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Treat this date as today (YYYY-MM-DD)
    #[arg(long, global = true, value_parser = parse_iso_date)]
    today: Option<NaiveDate>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Show or change the active user's profile
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },

    /// Food log
    Food {
        #[command(subcommand)]
        action: FoodCommand,
    },

    /// User-defined foods
    CustomFood {
        #[command(subcommand)]
        action: CustomFoodCommand,
    },

    /// Exercise log
    Exercise {
        #[command(subcommand)]
        action: ExerciseCommand,
    },

    /// Body weight samples
    Weight {
        #[command(subcommand)]
        action: WeightCommand,
    },

    /// Habit items, daily entries and the streak
    Habit {
        #[command(subcommand)]
        action: HabitCommand,
    },

    /// Energy balance of one date
    Summary {
        #[arg(long, value_parser = parse_iso_date)]
        date: Option<NaiveDate>,
    },

    /// Predicted and recorded weight for every logged date
    Series,

    /// Averages and weight trend over a trailing window
    Insights {
        /// Last day of the window
        #[arg(long, value_parser = parse_iso_date)]
        end: Option<NaiveDate>,

        #[arg(long, default_value = "30")]
        days: u32,
    },

    /// Fasting or eating, and minutes until that changes
    Fasting {
        /// Time of day to evaluate (HH:MM), defaults to now
        #[arg(long, value_parser = parse_time_of_day)]
        at: Option<NaiveTime>,
    },

    /// Users sharing the document
    Users {
        #[command(subcommand)]
        action: UsersCommand,
    },

    /// Foods and activities available by name
    Catalog {
        /// Inspect a JSON or CSV catalog file instead of the configured one
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Profile with BMR, TDEE and target intake
    Show,

    /// Change one or more profile fields
    Set {
        #[arg(long)]
        age: Option<u32>,

        /// Height in cm
        #[arg(long)]
        height: Option<f64>,

        #[arg(long)]
        weight: Option<f64>,

        /// Unit of --weight and --initial-weight (kg, lbs, stone)
        #[arg(long, default_value = "kg")]
        weight_unit: WeightUnit,

        /// male or female
        #[arg(long)]
        sex: Option<BiologicalSex>,

        /// sedentary, lightly_active, moderately_active, very_active, extra_active
        #[arg(long)]
        activity: Option<ActivityLevel>,

        /// Daily deficit goal in kcal
        #[arg(long)]
        deficit: Option<f64>,

        #[arg(long, value_parser = parse_time_of_day)]
        fasting_start: Option<NaiveTime>,

        #[arg(long, value_parser = parse_time_of_day)]
        fasting_end: Option<NaiveTime>,

        /// Remove the fasting window
        #[arg(long)]
        clear_fasting: bool,

        #[arg(long)]
        initial_weight: Option<f64>,
    },
}

#[derive(Subcommand)]
enum FoodCommand {
    /// Log a food by name; numbers given here override the catalog
    Add {
        name: String,

        #[arg(long, value_parser = parse_iso_date)]
        date: Option<NaiveDate>,

        #[arg(long, value_parser = parse_time_of_day)]
        time: Option<NaiveTime>,

        #[arg(long)]
        qty: Option<f64>,

        #[arg(long)]
        kcal: Option<f64>,

        /// Unit of --kcal (kcal or kj)
        #[arg(long, default_value = "kcal")]
        energy_unit: EnergyUnit,

        #[arg(long)]
        protein: Option<f64>,

        #[arg(long)]
        fat: Option<f64>,

        #[arg(long)]
        carbs: Option<f64>,

        #[arg(long)]
        alcohol: Option<f64>,

        #[arg(long)]
        fiber: Option<f64>,

        #[arg(long)]
        measure: Option<String>,
    },

    Remove {
        id: String,
    },

    /// Foods of one date
    List {
        #[arg(long, value_parser = parse_iso_date)]
        date: Option<NaiveDate>,
    },

    /// Selectable foods grouped by category
    Groups,
}

#[derive(Subcommand)]
enum CustomFoodCommand {
    Add {
        name: String,

        /// Per serving
        #[arg(long)]
        kcal: f64,

        #[arg(long, default_value = "kcal")]
        energy_unit: EnergyUnit,

        #[arg(long, default_value = "0")]
        protein: f64,

        #[arg(long, default_value = "0")]
        fat: f64,

        #[arg(long, default_value = "0")]
        carbs: f64,

        #[arg(long, default_value = "")]
        category: String,

        #[arg(long)]
        measure: Option<String>,
    },

    Remove {
        name: String,
    },
}

#[derive(Subcommand)]
enum ExerciseCommand {
    /// Log cardio by minutes or clock times, or strength with --sets
    Add {
        label: String,

        #[arg(long, value_parser = parse_iso_date)]
        date: Option<NaiveDate>,

        #[arg(long)]
        mins: Option<f64>,

        #[arg(long, value_parser = parse_time_of_day)]
        start: Option<NaiveTime>,

        #[arg(long, value_parser = parse_time_of_day)]
        end: Option<NaiveTime>,

        #[arg(long)]
        met: Option<f64>,

        /// Calories burned, when known from a device
        #[arg(long)]
        kcal: Option<f64>,

        #[arg(long)]
        distance: Option<f64>,

        /// Unit of --distance (km, miles, meters)
        #[arg(long, default_value = "km")]
        distance_unit: DistanceUnit,

        /// Treadmill incline in percent
        #[arg(long)]
        incline: Option<f64>,

        #[arg(long, requires = "reps")]
        sets: Option<u32>,

        #[arg(long, requires = "sets")]
        reps: Option<u32>,

        /// Load per rep in kg
        #[arg(long, default_value = "0")]
        load: f64,
    },

    Remove {
        id: String,
    },

    List {
        #[arg(long, value_parser = parse_iso_date)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum WeightCommand {
    /// Record the weight for a date, replacing any earlier value
    Set {
        weight: f64,

        #[arg(long, value_parser = parse_iso_date)]
        date: Option<NaiveDate>,

        #[arg(long, default_value = "kg")]
        unit: WeightUnit,
    },

    Remove {
        #[arg(long, value_parser = parse_iso_date)]
        date: NaiveDate,
    },

    /// Weight known on a date
    AsOf {
        #[arg(long, value_parser = parse_iso_date)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum HabitCommand {
    ItemAdd {
        name: String,

        /// Track an amount instead of yes/no
        #[arg(long)]
        numeric: bool,

        #[arg(long, requires = "numeric")]
        unit: Option<String>,
    },

    ItemRemove {
        id: String,
    },

    /// Record a day: values as ITEM_ID=true|false|NUMBER
    Save {
        #[arg(long, value_parser = parse_iso_date)]
        date: Option<NaiveDate>,

        /// The plan was broken on this day
        #[arg(long)]
        broke_plan: bool,

        values: Vec<String>,
    },

    /// Values recorded for a day
    Show {
        #[arg(long, value_parser = parse_iso_date)]
        date: Option<NaiveDate>,
    },

    Streak,
}

#[derive(Subcommand)]
enum UsersCommand {
    List,
    Add { id: String },
    Switch { id: String },
    Remove { id: String },
    /// Record that first-run setup is done
    Onboarded,
}

fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = AppConfig::load()?;
    let data_dir = cli.data_dir.clone().unwrap_or_else(|| config.storage.data_dir.clone());
    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if AppConfig::is_production() { "production" } else { "development" },
        data_dir = %data_dir.display(),
        "Starting calorie tracker"
    );

    let storage = FileStorage::new(data_dir);
    let outcome = TrackerStore::open(storage, StoreSettings::from(&config), config.load_catalog(), today)
        .and_then(|mut store| run(&mut store, cli.command));

    match outcome {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            debug!(error = ?e, "Command failed");
            eprintln!("{}", serde_json::to_string_pretty(&e.to_response())?);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Initialize tracing/logging on stderr; stdout carries the JSON result
fn init_tracing(verbose: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            "calorie_tracker_engine=debug,calorie_tracker=debug".into()
        } else {
            "calorie_tracker_engine=info,calorie_tracker=info".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if AppConfig::is_production() {
        // JSON logging for production (better for log aggregation)
        subscriber
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        // Pretty logging for development
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }
}

fn to_json<T: Serialize>(value: T) -> TrackerResult<Value> {
    Ok(serde_json::to_value(value)?)
}

fn run<S: KeyValueStorage>(store: &mut TrackerStore<S>, command: Command) -> TrackerResult<Value> {
    let today = store.today();

    match command {
        Command::Profile { action } => match action {
            ProfileCommand::Show => Ok(json!({
                "profile": to_json(store.profile()?)?,
                "metrics": to_json(store.profile_metrics()?)?,
            })),
            ProfileCommand::Set {
                age,
                height,
                weight,
                weight_unit,
                sex,
                activity,
                deficit,
                fasting_start,
                fasting_end,
                clear_fasting,
                initial_weight,
            } => to_json(store.update_profile(UpdateProfileRequest {
                age,
                height_cm: height,
                weight_kg: weight.map(|w| weight_unit.to_kg(w)),
                sex,
                activity_level: activity,
                target_deficit: deficit,
                fasting_start,
                fasting_end,
                clear_fasting_window: clear_fasting,
                initial_weight_kg: initial_weight.map(|w| weight_unit.to_kg(w)),
            })?),
        },

        Command::Food { action } => match action {
            FoodCommand::Add {
                name,
                date,
                time,
                qty,
                kcal,
                energy_unit,
                protein,
                fat,
                carbs,
                alcohol,
                fiber,
                measure,
            } => to_json(store.add_food(LogFoodRequest {
                date: date.unwrap_or(today),
                time,
                name,
                quantity: qty,
                kcal: kcal.map(|k| energy_unit.to_kcal(k)),
                protein,
                fat,
                carbs,
                alcohol,
                fiber,
                measure,
            })?),
            FoodCommand::Remove { id } => Ok(json!({ "removed": store.remove_food(&id)? })),
            FoodCommand::List { date } => to_json(store.foods_on(date.unwrap_or(today))?),
            FoodCommand::Groups => to_json(store.food_groups()?),
        },

        Command::CustomFood { action } => match action {
            CustomFoodCommand::Add {
                name,
                kcal,
                energy_unit,
                protein,
                fat,
                carbs,
                category,
                measure,
            } => to_json(store.add_custom_food(Food {
                name,
                category,
                measure,
                kcal: energy_unit.to_kcal(kcal),
                protein,
                fat,
                carbs,
            })?),
            CustomFoodCommand::Remove { name } => {
                Ok(json!({ "removed": store.remove_custom_food(&name)? }))
            }
        },

        Command::Exercise { action } => match action {
            ExerciseCommand::Add {
                label,
                date,
                mins,
                start,
                end,
                met,
                kcal,
                distance,
                distance_unit,
                incline,
                sets,
                reps,
                load,
            } => {
                let strength = match (sets, reps) {
                    (Some(sets), Some(reps)) => Some(StrengthInput { sets, reps, load_kg: load }),
                    _ => None,
                };
                to_json(store.add_exercise(LogExerciseRequest {
                    date: date.unwrap_or(today),
                    time: start,
                    end_time: end,
                    label,
                    met,
                    duration_min: mins,
                    kcal_burn: kcal,
                    distance_km: distance.map(|d| distance_unit.to_km(d)),
                    incline_pct: incline,
                    strength,
                })?)
            }
            ExerciseCommand::Remove { id } => Ok(json!({ "removed": store.remove_exercise(&id)? })),
            ExerciseCommand::List { date } => to_json(store.exercises_on(date.unwrap_or(today))?),
        },

        Command::Weight { action } => match action {
            WeightCommand::Set { weight, date, unit } => {
                to_json(store.upsert_weight(date.unwrap_or(today), unit.to_kg(weight))?)
            }
            WeightCommand::Remove { date } => Ok(json!({ "removed": store.remove_weight(date)? })),
            WeightCommand::AsOf { date } => {
                let date = date.unwrap_or(today);
                Ok(json!({ "date": date, "weight_kg": store.weight_as_of(date)? }))
            }
        },

        Command::Habit { action } => match action {
            HabitCommand::ItemAdd { name, numeric, unit } => {
                let kind = if numeric { HabitKind::Numeric } else { HabitKind::Boolean };
                to_json(store.add_habit_item(CreateHabitItemRequest { name, kind, unit })?)
            }
            HabitCommand::ItemRemove { id } => {
                Ok(json!({ "removed": store.remove_habit_item(&id)? }))
            }
            HabitCommand::Save {
                date,
                broke_plan,
                values,
            } => {
                let values = parse_habit_values(&values)?;
                to_json(store.save_habit_day(date.unwrap_or(today), values, !broke_plan)?)
            }
            HabitCommand::Show { date } => to_json(store.habit_entry_on(date.unwrap_or(today))?),
            HabitCommand::Streak => to_json(store.habit_streak(today)?),
        },

        Command::Summary { date } => to_json(store.summarize(date.unwrap_or(today))?),
        Command::Series => to_json(store.series()?),
        Command::Insights { end, days } => to_json(store.insights(end.unwrap_or(today), days)?),
        Command::Fasting { at } => {
            let now = at.unwrap_or_else(|| Local::now().time());
            to_json(store.fasting_status(now)?)
        }

        Command::Users { action } => match action {
            UsersCommand::List => to_json(store.list_users()),
            UsersCommand::Add { id } => {
                store.add_user(&id)?;
                to_json(store.list_users())
            }
            UsersCommand::Switch { id } => {
                store.switch_user(&id)?;
                to_json(store.list_users())
            }
            UsersCommand::Remove { id } => {
                store.remove_user(&id)?;
                to_json(store.list_users())
            }
            UsersCommand::Onboarded => {
                store.mark_onboarded()?;
                Ok(json!({ "onboarded": true }))
            }
        },

        Command::Catalog { file: None } => to_json(store.catalog()),
        Command::Catalog { file: Some(path) } => to_json(Catalog::from_path(&path)?),
    }
}

/// `ITEM_ID=true|false|NUMBER` pairs
fn parse_habit_values(pairs: &[String]) -> TrackerResult<BTreeMap<String, HabitValue>> {
    pairs
        .iter()
        .map(|pair| {
            let (id, raw) = pair
                .split_once('=')
                .ok_or_else(|| TrackerError::invalid("habit", format!("Expected ID=VALUE, got '{}'", pair)))?;
            let value = match raw.trim() {
                "true" | "yes" => HabitValue::Flag(true),
                "false" | "no" => HabitValue::Flag(false),
                number => number
                    .parse::<f64>()
                    .map(HabitValue::Amount)
                    .map_err(|_| TrackerError::invalid("habit", format!("'{}' is not yes, no or a number", raw)))?,
            };
            Ok((id.trim().to_string(), value))
        })
        .collect()
}
