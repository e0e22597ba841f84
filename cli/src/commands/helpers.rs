use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use calpal_core::CalPalService;
use calpal_core::models::{ConversionEdge, FoodRecord, UnitOfMeasure};

pub(crate) fn print_food_table(svc: &CalPalService, foods: &[&FoodRecord]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "Barcode")]
        barcode: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Brand")]
        brand: String,
        #[tabled(rename = "Description")]
        description: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Serving")]
        serving: String,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .map(|f| FoodRow {
            barcode: f.barcode.clone(),
            name: truncate(&f.name, 30),
            brand: truncate(&f.brand, 20),
            description: truncate(&f.description, 35),
            calories: format!("{:.0}", no_neg_zero(f.calories_per_serving)),
            serving: format!(
                "{} {}",
                fmt_amount(f.serving_size),
                uom_code(svc, f.serving_size_uom_id)
            ),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(4..6)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_uom_table(uoms: &[&UnitOfMeasure]) {
    #[derive(Tabled)]
    struct UomRow {
        #[tabled(rename = "ID")]
        id: u32,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Code")]
        code: String,
        #[tabled(rename = "Kind")]
        kind: String,
        #[tabled(rename = "Status")]
        status: String,
        #[tabled(rename = "Description")]
        description: String,
    }

    let rows: Vec<UomRow> = uoms
        .iter()
        .map(|u| UomRow {
            id: u.id.0,
            name: u.name.clone(),
            code: u.code.clone(),
            kind: u.quantity_kind.to_string(),
            status: uom_status(u).to_string(),
            description: truncate(&u.description, 40),
        })
        .collect();

    println!("{}", Table::new(&rows).with(Style::rounded()));
}

pub(crate) fn print_conversion_table(svc: &CalPalService, edges: &[&ConversionEdge]) {
    #[derive(Tabled)]
    struct ConversionRow {
        #[tabled(rename = "From")]
        from: String,
        #[tabled(rename = "To")]
        to: String,
        #[tabled(rename = "Factor")]
        factor: String,
        #[tabled(rename = "Multiply")]
        multiply: String,
        #[tabled(rename = "Description")]
        description: String,
    }

    let rows: Vec<ConversionRow> = edges
        .iter()
        .map(|e| ConversionRow {
            from: uom_code(svc, e.from),
            to: uom_code(svc, e.to),
            factor: fmt_amount(e.factor),
            multiply: fmt_amount(e.multiply),
            description: e
                .description
                .as_deref()
                .map(|d| truncate(d, 40))
                .unwrap_or_default(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

fn uom_code(svc: &CalPalService, id: calpal_core::models::UomId) -> String {
    svc.find_uom_by_id(id)
        .map_or_else(|| format!("#{id}"), |u| u.code.clone())
}

pub(crate) fn uom_status(uom: &UnitOfMeasure) -> &'static str {
    match (uom.active, uom.read_only) {
        (true, false) => "active",
        (true, true) => "active, read-only",
        (false, false) => "inactive",
        (false, true) => "inactive, read-only",
    }
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

/// Up to four decimals, trailing zeros dropped.
pub(crate) fn fmt_amount(v: f64) -> String {
    let s = format!("{:.4}", no_neg_zero(v));
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s
            .char_indices()
            .nth(max.saturating_sub(3))
            .map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
