//! Wells, their connections and their time-dependent controls.

use crate::dynamic_state::DynamicState;
use serde::Serialize;

macro_rules! deck_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => [$($text:literal),+]),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Read the deck spelling, case-insensitive.
            pub fn parse(text: &str) -> Option<Self> {
                match text.trim().to_ascii_uppercase().as_str() {
                    $($($text)|+ => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => deck_enum!(@first $($text),+),)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
    (@first $first:literal $(, $rest:literal)*) => { $first };
}

pub(crate) use deck_enum;

deck_enum!(WellStatus {
    Open => ["OPEN"],
    Stop => ["STOP"],
    Shut => ["SHUT"],
    Auto => ["AUTO"],
});

deck_enum!(
    /// Preferred phase from WELSPECS.
    Phase {
        Oil => ["OIL"],
        Water => ["WATER", "WAT"],
        Gas => ["GAS"],
        Liquid => ["LIQ", "LIQUID"],
    }
);

deck_enum!(ProducerCMode {
    Orat => ["ORAT"],
    Wrat => ["WRAT"],
    Grat => ["GRAT"],
    Lrat => ["LRAT"],
    Crat => ["CRAT"],
    Resv => ["RESV"],
    Bhp => ["BHP"],
    Thp => ["THP"],
    Grup => ["GRUP"],
});

deck_enum!(InjectorCMode {
    Rate => ["RATE"],
    Resv => ["RESV"],
    Bhp => ["BHP"],
    Thp => ["THP"],
    Grup => ["GRUP"],
});

deck_enum!(InjectorType {
    Water => ["WATER", "WAT"],
    Gas => ["GAS"],
    Oil => ["OIL"],
    Multi => ["MULTI"],
});

deck_enum!(ConnectionState {
    Open => ["OPEN"],
    Shut => ["SHUT"],
    Auto => ["AUTO"],
});

/// Static well data from WELSPECS, re-specifiable over time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WellHead {
    pub group: String,
    pub head_i: i64,
    pub head_j: i64,
    pub ref_depth: Option<f64>,
    pub phase: Phase,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionControls {
    pub cmode: Option<ProducerCMode>,
    pub oil_rate: f64,
    pub water_rate: f64,
    pub gas_rate: f64,
    pub liquid_rate: f64,
    pub resv_rate: f64,
    pub bhp_limit: f64,
    pub thp_limit: f64,
    pub vfp_table: i64,
    pub alq: f64,
}

impl Default for ProductionControls {
    fn default() -> Self {
        ProductionControls {
            cmode: None,
            oil_rate: 0.0,
            water_rate: 0.0,
            gas_rate: 0.0,
            liquid_rate: 0.0,
            resv_rate: 0.0,
            bhp_limit: 1.01325,
            thp_limit: 0.0,
            vfp_table: 0,
            alq: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InjectionControls {
    pub injector_type: Option<InjectorType>,
    pub cmode: Option<InjectorCMode>,
    pub surface_rate: f64,
    pub reservoir_rate: f64,
    pub bhp_limit: f64,
    pub thp_limit: f64,
    pub vfp_table: i64,
}

impl Default for InjectionControls {
    fn default() -> Self {
        InjectionControls {
            injector_type: None,
            cmode: None,
            surface_rate: 0.0,
            reservoir_rate: 0.0,
            bhp_limit: 6895.0,
            thp_limit: 0.0,
            vfp_table: 0,
        }
    }
}

/// One perforated cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection {
    pub i: i64,
    pub j: i64,
    pub k: i64,
    pub state: ConnectionState,
    pub sat_table: i64,
    pub transmissibility: Option<f64>,
    pub diameter: Option<f64>,
    pub kh: f64,
    pub skin: f64,
    pub direction: String,
}

impl Connection {
    pub fn same_cell(&self, other: &Connection) -> bool {
        (self.i, self.j, self.k) == (other.i, other.j, other.k)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Well {
    pub name: String,
    /// Report step of the first WELSPECS for this well.
    pub creation_step: usize,
    pub head: DynamicState<WellHead>,
    pub status: DynamicState<WellStatus>,
    pub is_producer: DynamicState<bool>,
    pub production: DynamicState<ProductionControls>,
    pub injection: DynamicState<InjectionControls>,
    pub connections: DynamicState<Vec<Connection>>,
}

impl Well {
    /// A shut producer with no connections, defined from `step` on.
    pub fn new(name: &str, step: usize, steps: usize, head: WellHead) -> Self {
        Well {
            name: name.to_owned(),
            creation_step: step,
            head: DynamicState::with_len(steps, head),
            status: DynamicState::with_len(steps, WellStatus::Shut),
            is_producer: DynamicState::with_len(steps, true),
            production: DynamicState::with_len(steps, ProductionControls::default()),
            injection: DynamicState::with_len(steps, InjectionControls::default()),
            connections: DynamicState::with_len(steps, Vec::new()),
        }
    }

    pub fn exists_at(&self, step: usize) -> bool {
        step >= self.creation_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deck_spellings() {
        assert_eq!(WellStatus::parse("open"), Some(WellStatus::Open));
        assert_eq!(Phase::parse("WAT"), Some(Phase::Water));
        assert_eq!(Phase::Water.as_str(), "WATER");
        assert_eq!(ProducerCMode::parse("GRUP"), Some(ProducerCMode::Grup));
        assert_eq!(ProducerCMode::parse("XRAT"), None);
        assert_eq!(InjectorType::parse(" gas "), Some(InjectorType::Gas));
        assert_eq!(ConnectionState::Auto.to_string(), "AUTO");
    }

    #[test]
    fn new_well_exists_from_creation_step() {
        let head = WellHead {
            group: "G1".into(),
            head_i: 1,
            head_j: 2,
            ref_depth: None,
            phase: Phase::Oil,
        };
        let well = Well::new("OP1", 2, 5, head);
        assert!(!well.exists_at(1));
        assert!(well.exists_at(2));
        assert_eq!(*well.status.get(4).unwrap(), WellStatus::Shut);
        assert_eq!(well.connections.len(), 5);
    }
}
