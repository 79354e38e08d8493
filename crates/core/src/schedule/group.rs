//! Groups and their production targets.

use super::well::deck_enum;
use crate::dynamic_state::DynamicState;
use serde::Serialize;

/// Name of the root group every schedule starts with.
pub const FIELD_GROUP: &str = "FIELD";

/// Target value used when a GCONPROD target is defaulted.
pub const NO_TARGET: f64 = -9.99e100;

deck_enum!(GroupCMode {
    None => ["NONE"],
    Orat => ["ORAT"],
    Wrat => ["WRAT"],
    Grat => ["GRAT"],
    Lrat => ["LRAT"],
    Crat => ["CRAT"],
    Resv => ["RESV"],
    Prbl => ["PRBL"],
    Fld => ["FLD"],
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupProductionControls {
    pub cmode: GroupCMode,
    pub oil_target: f64,
    pub water_target: f64,
    pub gas_target: f64,
    pub liquid_target: f64,
    pub resv_target: f64,
    pub exceed_action: String,
    pub respond_to_parent: bool,
    pub guide_rate: Option<f64>,
}

impl Default for GroupProductionControls {
    fn default() -> Self {
        GroupProductionControls {
            cmode: GroupCMode::None,
            oil_target: NO_TARGET,
            water_target: NO_TARGET,
            gas_target: NO_TARGET,
            liquid_target: NO_TARGET,
            resv_target: NO_TARGET,
            exceed_action: "NONE".to_owned(),
            respond_to_parent: true,
            guide_rate: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub name: String,
    pub creation_step: usize,
    pub production: DynamicState<GroupProductionControls>,
}

impl Group {
    pub fn new(name: &str, step: usize, steps: usize) -> Self {
        Group {
            name: name.to_owned(),
            creation_step: step,
            production: DynamicState::with_len(steps, GroupProductionControls::default()),
        }
    }
}
