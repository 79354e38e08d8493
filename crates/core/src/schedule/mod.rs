//! Schedule assembly: report-step state of wells, groups and solver
//! settings built from the SCHEDULE section of a [`Deck`].
//!
//! Building is two passes over the deck. The first builds the [`TimeMap`]
//! from `START`, `DATES` and `TSTEP`; the second walks the keywords again,
//! tracking the current report step, and hands every SCHEDULE keyword to
//! its handler. Handlers write through [`DynamicState`] so a setting given
//! at step *n* stays in force until a later keyword changes it.

mod events;
mod group;
mod handlers;
mod tuning;
mod well;

pub use events::Events;
pub use group::{Group, GroupCMode, GroupProductionControls, FIELD_GROUP, NO_TARGET};
pub use tuning::Tuning;
pub use well::{
    Connection, ConnectionState, InjectionControls, InjectorCMode, InjectorType, Phase,
    ProducerCMode, ProductionControls, Well, WellHead, WellStatus,
};

use crate::deck::{Deck, DeckKeyword, Location, Section};
use crate::dynamic_state::DynamicState;
use crate::error::DeckError;
use crate::messages::MessageContainer;
use crate::ordered_map::OrderedMap;
use crate::parse_context::ParseContext;
use crate::time_map::{format_time, TimeMap};
use serde::Serialize;

/// NUPCOL value when the deck gives none.
pub const DEFAULT_NUPCOL: i64 = 12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schedule {
    time_map: TimeMap,
    events: Vec<Events>,
    groups: OrderedMap<String, Group>,
    wells: OrderedMap<String, Well>,
    tuning: DynamicState<Tuning>,
    nupcol: DynamicState<i64>,
}

/// What a keyword handler needs besides the schedule itself.
pub(crate) struct HandlerContext<'a> {
    pub step: usize,
    pub keyword: &'a DeckKeyword,
    pub context: &'a ParseContext,
    pub messages: &'a mut MessageContainer,
}

impl HandlerContext<'_> {
    /// Raise `key` at the current keyword.
    pub fn report(&mut self, key: &str, message: &str) -> Result<(), DeckError> {
        let location: &Location = &self.keyword.location;
        self.context
            .handle_error(key, message, Some(location), self.messages)
    }
}

impl Schedule {
    pub fn new(
        deck: &Deck,
        context: &ParseContext,
        messages: &mut MessageContainer,
    ) -> Result<Schedule, DeckError> {
        let time_map = TimeMap::from_deck(deck)?;
        let steps = time_map.len();
        let mut schedule = Schedule {
            events: vec![Events::empty(); steps],
            groups: OrderedMap::new(),
            wells: OrderedMap::new(),
            tuning: DynamicState::new(&time_map, Tuning::default()),
            nupcol: DynamicState::new(&time_map, DEFAULT_NUPCOL),
            time_map,
        };
        schedule
            .groups
            .insert(FIELD_GROUP.to_owned(), Group::new(FIELD_GROUP, 0, steps));

        let mut step = 0;
        for keyword in deck.keywords() {
            if keyword.section != Section::Schedule {
                if keyword.name == "NUPCOL" {
                    schedule.nupcol.update_initial(nupcol_value(keyword)?);
                }
                continue;
            }

            let mut hc = HandlerContext {
                step,
                keyword,
                context,
                messages: &mut *messages,
            };
            match keyword.name.as_str() {
                "DATES" => step += keyword.len(),
                "TSTEP" => {
                    for record in keyword.iter() {
                        step += record.get("step_list")?.len();
                    }
                }
                "SCHEDULE" | "ECHO" | "NOECHO" => {}
                "WELSPECS" => schedule.handle_welspecs(&mut hc)?,
                "COMPDAT" => schedule.handle_compdat(&mut hc)?,
                "WCONPROD" => schedule.handle_wconprod(&mut hc)?,
                "WCONINJE" => schedule.handle_wconinje(&mut hc)?,
                "WELOPEN" => schedule.handle_welopen(&mut hc)?,
                "WELTARG" => schedule.handle_weltarg(&mut hc)?,
                "GCONPROD" => schedule.handle_gconprod(&mut hc)?,
                "TUNING" => schedule.handle_tuning(&mut hc)?,
                "NUPCOL" => {
                    schedule.nupcol.update(step, nupcol_value(keyword)?)?;
                }
                other => hc.report(
                    ParseContext::SCHEDULE_UNHANDLED_KEYWORD,
                    &format!("keyword {} has no schedule handler", other),
                )?,
            }

            if step != hc.step {
                tracing::info!(
                    step,
                    date = %format_time(schedule.time_map.get(step)?),
                    "advanced report step"
                );
            } else {
                tracing::debug!(keyword = %keyword.name, step, "handled schedule keyword");
            }
        }

        messages.check_delayed()?;
        Ok(schedule)
    }

    pub fn time_map(&self) -> &TimeMap {
        &self.time_map
    }

    /// Number of report-step boundaries, including the start.
    pub fn len(&self) -> usize {
        self.time_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_map.is_empty()
    }

    pub fn events(&self, step: usize) -> Result<Events, DeckError> {
        self.events
            .get(step)
            .copied()
            .ok_or(DeckError::IndexOutOfRange {
                index: step,
                len: self.events.len(),
            })
    }

    pub fn has_event(&self, step: usize, event: Events) -> bool {
        self.events(step).map_or(false, |e| e.contains(event))
    }

    pub(crate) fn add_event(&mut self, step: usize, event: Events) {
        if let Some(slot) = self.events.get_mut(step) {
            slot.insert(event);
        }
    }

    pub fn well(&self, name: &str) -> Result<&Well, DeckError> {
        self.wells.at(name)
    }

    pub fn wells(&self) -> impl Iterator<Item = &Well> {
        self.wells.values()
    }

    /// Wells defined at `step`, in creation order.
    pub fn wells_at(&self, step: usize) -> impl Iterator<Item = &Well> {
        self.wells.values().filter(move |w| w.exists_at(step))
    }

    pub fn group(&self, name: &str) -> Result<&Group, DeckError> {
        self.groups.at(name)
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn tuning(&self) -> &DynamicState<Tuning> {
        &self.tuning
    }

    pub fn nupcol(&self) -> &DynamicState<i64> {
        &self.nupcol
    }
}

fn nupcol_value(keyword: &DeckKeyword) -> Result<i64, DeckError> {
    keyword.record(0)?.get("NUM_ITER")?.get_int(0)
}
