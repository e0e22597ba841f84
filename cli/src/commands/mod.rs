mod data;
mod food;
mod helpers;
mod uom;

use anyhow::{Result, bail};

use calpal_core::CalPalService;
use calpal_core::models::UnitOfMeasure;

pub(crate) use data::{cmd_data_show, cmd_data_status, cmd_data_switch};
pub(crate) use food::{
    FoodArgs, cmd_food_add, cmd_food_brands, cmd_food_list, cmd_food_remove, cmd_food_show,
    cmd_food_update,
};
pub(crate) use helpers::json_error;
pub(crate) use uom::{
    LinkArgs, UomArgs, cmd_convert, cmd_uom_add, cmd_uom_deactivate, cmd_uom_link, cmd_uom_list,
    cmd_uom_remove, cmd_uom_unlink,
};

/// Resolve a unit typed on the command line, by code then by name.
pub(super) fn resolve_uom<'a>(svc: &'a CalPalService, key: &str) -> Result<&'a UnitOfMeasure> {
    match svc.resolve_uom(key) {
        Ok(uom) => Ok(uom),
        Err(_) => {
            let known: Vec<&str> = svc.list_uoms().into_iter().map(|u| u.code.as_str()).collect();
            bail!("Unknown unit '{key}'. Known units: {}", known.join(", "))
        }
    }
}
