use anyhow::Result;
use clap::Args;
use serde::Serialize;

use calpal_core::CalPalService;
use calpal_core::models::{ConversionEdge, NewUom, QuantityKind, UnitOfMeasure};

use super::helpers::{fmt_amount, print_conversion_table, print_uom_table};
use super::resolve_uom;

#[derive(Args)]
pub(crate) struct UomArgs {
    /// Display name, e.g. "Grams"
    pub name: String,
    /// Short code, e.g. "g"
    pub code: String,
    /// Quantity kind: count, weight, length, area, volume, time, current, resistance
    #[arg(long, default_value = "weight")]
    pub kind: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// Protect the unit from removal and deactivation
    #[arg(long)]
    pub read_only: bool,
}

#[derive(Args)]
pub(crate) struct LinkArgs {
    /// Source unit code or name
    pub from: String,
    /// Target unit code or name
    pub to: String,
    /// Divisor applied to the source value
    #[arg(long, default_value = "1")]
    pub factor: f64,
    /// Multiplier applied to the source value
    #[arg(long)]
    pub multiply: f64,
    #[arg(long)]
    pub description: Option<String>,
}

pub(crate) fn cmd_uom_add(svc: &mut CalPalService, args: UomArgs, json: bool) -> Result<()> {
    let quantity_kind = QuantityKind::parse(&args.kind)?;
    let id = svc.add_uom(NewUom {
        name: args.name,
        code: args.code,
        description: args.description,
        quantity_kind,
        read_only: args.read_only,
    })?;
    let uom = resolve_id(svc, id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(uom)?);
    } else {
        println!(
            "Added UOM {} ({}, {})",
            uom.name, uom.code, uom.quantity_kind
        );
    }

    Ok(())
}

pub(crate) fn cmd_uom_list(svc: &CalPalService, json: bool) -> Result<()> {
    let uoms = svc.list_uoms();
    let conversions = svc.list_conversions();

    if json {
        #[derive(Serialize)]
        struct Listing<'a> {
            uoms: &'a [&'a UnitOfMeasure],
            conversions: &'a [&'a ConversionEdge],
        }
        let out = Listing {
            uoms: &uoms,
            conversions: &conversions,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_uom_table(&uoms);
    if !conversions.is_empty() {
        println!("\nConversions:");
        print_conversion_table(svc, &conversions);
    }

    Ok(())
}

pub(crate) fn cmd_uom_remove(svc: &mut CalPalService, unit: &str, json: bool) -> Result<()> {
    let id = resolve_uom(svc, unit)?.id;
    let removed = svc.remove_uom(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&removed)?);
    } else {
        println!("Removed UOM {} ({})", removed.name, removed.code);
    }

    Ok(())
}

pub(crate) fn cmd_uom_deactivate(svc: &mut CalPalService, unit: &str, json: bool) -> Result<()> {
    let id = resolve_uom(svc, unit)?.id;
    svc.deactivate_uom(id)?;
    let uom = resolve_id(svc, id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(uom)?);
    } else {
        println!("Deactivated UOM {} ({})", uom.name, uom.code);
    }

    Ok(())
}

pub(crate) fn cmd_uom_link(svc: &mut CalPalService, args: LinkArgs, json: bool) -> Result<()> {
    let from = resolve_uom(svc, &args.from)?.id;
    let to = resolve_uom(svc, &args.to)?.id;
    let edge = svc.add_conversion(from, to, args.factor, args.multiply, args.description)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&edge)?);
    } else {
        println!(
            "{} -> {}: value * {} / {}",
            args.from,
            args.to,
            fmt_amount(edge.multiply),
            fmt_amount(edge.factor)
        );
    }

    Ok(())
}

pub(crate) fn cmd_uom_unlink(svc: &mut CalPalService, from: &str, to: &str, json: bool) -> Result<()> {
    let from_id = resolve_uom(svc, from)?.id;
    let to_id = resolve_uom(svc, to)?.id;
    let removed = svc.remove_conversion(from_id, to_id)?;

    if json {
        println!("{}", serde_json::json!({ "removed": removed }));
    } else if removed {
        println!("Removed conversion {from} -> {to}");
    } else {
        println!("No conversion from {from} to {to}");
    }

    Ok(())
}

pub(crate) fn cmd_convert(
    svc: &CalPalService,
    value: f64,
    from: &str,
    to: &str,
    json: bool,
) -> Result<()> {
    let from_uom = resolve_uom(svc, from)?;
    let to_uom = resolve_uom(svc, to)?;
    let result = svc.convert(from_uom.id, to_uom.id, value)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "value": value,
                "from": from_uom.code,
                "to": to_uom.code,
                "result": result,
            }))?
        );
    } else {
        println!(
            "{} {} = {} {}",
            fmt_amount(value),
            from_uom.code,
            fmt_amount(result),
            to_uom.code
        );
    }

    Ok(())
}

fn resolve_id(svc: &CalPalService, id: calpal_core::models::UomId) -> Result<&UnitOfMeasure> {
    svc.find_uom_by_id(id)
        .ok_or_else(|| calpal_core::CatalogError::UnknownUom(id.to_string()).into())
}
