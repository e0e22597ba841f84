mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    FoodArgs, LinkArgs, UomArgs, cmd_convert, cmd_data_show, cmd_data_status, cmd_data_switch,
    cmd_food_add, cmd_food_brands, cmd_food_list, cmd_food_remove, cmd_food_show,
    cmd_food_update, cmd_uom_add, cmd_uom_deactivate, cmd_uom_link, cmd_uom_list,
    cmd_uom_remove, cmd_uom_unlink, json_error,
};
use crate::config::Config;
use calpal_core::CalPalService;

#[derive(Parser)]
#[command(
    name = "calpal",
    version,
    about = "Barcode food catalog with unit conversions"
)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage foods in the catalog
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Manage units of measure and the conversions between them
    Uom {
        #[command(subcommand)]
        command: UomCommands,
    },
    /// Convert a value between two units (code or name)
    Convert {
        /// Value to convert
        #[arg(allow_negative_numbers = true)]
        value: f64,
        /// Source unit
        from: String,
        /// Target unit
        to: String,
    },
    /// Inspect or switch the active data file
    Data {
        #[command(subcommand)]
        command: DataCommands,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// Show a food by barcode
    Show {
        /// Barcode number
        barcode: String,
    },
    /// Add a food (an existing barcode is left unchanged)
    Add(FoodArgs),
    /// Replace the food with the same barcode, adding it if absent
    Update(FoodArgs),
    /// Remove a food by barcode
    Remove {
        /// Barcode number
        barcode: String,
    },
    /// List all foods, ordered by barcode
    List,
    /// List distinct brands
    Brands,
}

#[derive(Subcommand)]
enum UomCommands {
    /// Register a new unit
    Add(UomArgs),
    /// List units and conversions
    List,
    /// Remove a unit that nothing references
    Remove {
        /// Unit code or name
        unit: String,
    },
    /// Mark a unit inactive without removing it
    Deactivate {
        /// Unit code or name
        unit: String,
    },
    /// Register a conversion: value * multiply / factor
    Link(LinkArgs),
    /// Remove the conversion from one unit to another
    Unlink {
        /// Source unit code or name
        from: String,
        /// Target unit code or name
        to: String,
    },
}

#[derive(Subcommand)]
enum DataCommands {
    /// Make another file the active data file
    Switch {
        /// Path to an existing data file
        path: PathBuf,
    },
    /// Print the catalog as it is written to disk
    Show,
    /// Show the active file and how it loaded
    Status,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("calpal=warn,calpal_core=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli) {
        if json {
            println!("{}", json_error(&format!("{e:#}")));
        } else {
            eprintln!("Error: {e:#}");
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let mut svc = CalPalService::open(&config.settings_path, &config.default_catalog_path)?;
    debug!(path = %svc.active_path().display(), state = ?svc.state(), "catalog ready");
    let json = cli.json;

    match cli.command {
        Commands::Food { command } => match command {
            FoodCommands::Show { barcode } => cmd_food_show(&svc, &barcode, json),
            FoodCommands::Add(args) => cmd_food_add(&mut svc, args, json),
            FoodCommands::Update(args) => cmd_food_update(&mut svc, args, json),
            FoodCommands::Remove { barcode } => cmd_food_remove(&mut svc, &barcode, json),
            FoodCommands::List => cmd_food_list(&svc, json),
            FoodCommands::Brands => cmd_food_brands(&svc, json),
        },
        Commands::Uom { command } => match command {
            UomCommands::Add(args) => cmd_uom_add(&mut svc, args, json),
            UomCommands::List => cmd_uom_list(&svc, json),
            UomCommands::Remove { unit } => cmd_uom_remove(&mut svc, &unit, json),
            UomCommands::Deactivate { unit } => cmd_uom_deactivate(&mut svc, &unit, json),
            UomCommands::Link(args) => cmd_uom_link(&mut svc, args, json),
            UomCommands::Unlink { from, to } => cmd_uom_unlink(&mut svc, &from, &to, json),
        },
        Commands::Convert { value, from, to } => cmd_convert(&svc, value, &from, &to, json),
        Commands::Data { command } => match command {
            DataCommands::Switch { path } => cmd_data_switch(&mut svc, &path, json),
            DataCommands::Show => cmd_data_show(&svc),
            DataCommands::Status => cmd_data_status(&svc, json),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert_negative_value() {
        let cli = Cli::try_parse_from(["calpal", "convert", "-2.5", "lbs", "g", "--json"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Convert { value, from, to } => {
                assert!((value + 2.5).abs() < f64::EPSILON);
                assert_eq!(from, "lbs");
                assert_eq!(to, "g");
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_parse_food_add() {
        let cli = Cli::try_parse_from([
            "calpal",
            "food",
            "add",
            "041271025903",
            "--description",
            "Oats",
            "--calories",
            "150",
            "--serving-size",
            "40",
            "--uom",
            "g",
        ])
        .unwrap();
        match cli.command {
            Commands::Food {
                command: FoodCommands::Add(args),
            } => {
                assert_eq!(args.barcode, "041271025903");
                assert_eq!(args.uom, "g");
                assert!(args.brand.is_empty());
            }
            _ => panic!("expected food add"),
        }
    }
}
