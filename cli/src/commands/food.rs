use anyhow::Result;
use clap::Args;
use std::process;

use calpal_core::CalPalService;
use calpal_core::models::{FoodRecord, NewFood};

use super::helpers::{fmt_amount, json_error, print_food_table};
use super::resolve_uom;

#[derive(Args)]
pub(crate) struct FoodArgs {
    /// Barcode number
    pub barcode: String,
    /// Short description
    #[arg(long)]
    pub description: String,
    /// Calories per serving
    #[arg(long)]
    pub calories: f64,
    /// Serving size, in the serving unit
    #[arg(long)]
    pub serving_size: f64,
    /// Serving unit code or name (must be a count or weight unit)
    #[arg(long)]
    pub uom: String,
    /// Long description
    #[arg(long, default_value = "")]
    pub detailed_description: String,
    #[arg(long, default_value = "")]
    pub name: String,
    #[arg(long, default_value = "")]
    pub brand: String,
}

fn build_record(svc: &CalPalService, args: FoodArgs) -> Result<FoodRecord> {
    let uom = resolve_uom(svc, &args.uom)?;
    let record = FoodRecord::new(
        NewFood {
            barcode: args.barcode,
            name: args.name,
            brand: args.brand,
            description: args.description,
            detailed_description: args.detailed_description,
            calories_per_serving: args.calories,
            serving_size: args.serving_size,
        },
        uom,
    )?;
    Ok(record)
}

pub(crate) fn cmd_food_show(svc: &CalPalService, barcode: &str, json: bool) -> Result<()> {
    let Some(food) = svc.find_by_barcode(barcode) else {
        if json {
            println!("{}", json_error(&format!("No food with barcode '{barcode}'")));
        } else {
            eprintln!("No food with barcode '{barcode}'");
        }
        process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(food)?);
        return Ok(());
    }

    let uom = svc.find_uom_by_id(food.serving_size_uom_id);
    println!("{} ({})", food.description, food.barcode);
    if !food.name.is_empty() {
        println!("  Name:      {}", food.name);
    }
    if !food.brand.is_empty() {
        println!("  Brand:     {}", food.brand);
    }
    println!(
        "  Serving:   {} {}",
        fmt_amount(food.serving_size),
        uom.map_or("?", |u| u.name.as_str())
    );
    println!("  Calories:  {:.0}", food.calories_per_serving);
    if !food.detailed_description.is_empty() {
        println!("  Details:   {}", food.detailed_description);
    }

    Ok(())
}

pub(crate) fn cmd_food_add(svc: &mut CalPalService, args: FoodArgs, json: bool) -> Result<()> {
    let record = build_record(svc, args)?;
    let barcode = record.barcode.clone();
    let inserted = svc.add_food(record)?;

    if json {
        #[derive(serde::Serialize)]
        struct Added<'a> {
            inserted: bool,
            food: Option<&'a FoodRecord>,
        }
        let out = Added {
            inserted,
            food: svc.find_by_barcode(&barcode),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if inserted {
        println!("Added food {barcode}");
    } else {
        println!("Food {barcode} already exists; left unchanged (use `food update` to replace it)");
    }

    Ok(())
}

pub(crate) fn cmd_food_update(svc: &mut CalPalService, args: FoodArgs, json: bool) -> Result<()> {
    let record = build_record(svc, args)?;
    let barcode = record.barcode.clone();
    let replaced = svc.update_food(record)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&svc.find_by_barcode(&barcode))?);
    } else if replaced {
        println!("Updated food {barcode}");
    } else {
        println!("Added food {barcode}");
    }

    Ok(())
}

pub(crate) fn cmd_food_remove(svc: &mut CalPalService, barcode: &str, json: bool) -> Result<()> {
    let Some(food) = svc.remove_food(barcode)? else {
        if json {
            println!("{}", json_error(&format!("No food with barcode '{barcode}'")));
        } else {
            eprintln!("No food with barcode '{barcode}'");
        }
        process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&food)?);
    } else {
        println!("Removed food {} ({})", food.barcode, food.description);
    }

    Ok(())
}

pub(crate) fn cmd_food_list(svc: &CalPalService, json: bool) -> Result<()> {
    let foods = svc.list_foods();

    if foods.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No foods found");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&foods)?);
    } else {
        print_food_table(svc, &foods);
    }

    Ok(())
}

pub(crate) fn cmd_food_brands(svc: &CalPalService, json: bool) -> Result<()> {
    let brands = svc.brands();

    if json {
        println!("{}", serde_json::to_string_pretty(&brands)?);
    } else if brands.is_empty() {
        eprintln!("No brands found");
    } else {
        for brand in brands {
            if brand.is_empty() {
                println!("(no brand)");
            } else {
                println!("{brand}");
            }
        }
    }

    Ok(())
}
