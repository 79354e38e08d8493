//! One handler per supported SCHEDULE keyword.
//!
//! Handlers never abort on a bad record themselves: they raise the matching
//! [`ParseContext`] key and skip the record when the configured action lets
//! them continue.

use super::events::Events;
use super::group::{Group, GroupCMode, GroupProductionControls, NO_TARGET};
use super::well::{
    Connection, ConnectionState, InjectionControls, InjectorCMode, InjectorType, Phase,
    ProducerCMode, ProductionControls, Well, WellHead, WellStatus,
};
use super::{HandlerContext, Schedule};
use crate::deck::DeckRecord;
use crate::error::DeckError;
use crate::parse_context::ParseContext;
use crate::pattern::{has_wildcard, wildcard_match};
use crate::value::FromDeckValue;

fn string_item(record: &DeckRecord, name: &str) -> Result<String, DeckError> {
    record.get(name)?.get_trimmed_string(0)
}

fn optional_string(record: &DeckRecord, name: &str) -> Result<Option<String>, DeckError> {
    let item = record.get(name)?;
    if item.has_value(0) {
        Ok(Some(item.get_trimmed_string(0)?))
    } else {
        Ok(None)
    }
}

fn optional_double(record: &DeckRecord, name: &str) -> Result<Option<f64>, DeckError> {
    let item = record.get(name)?;
    if item.has_value(0) {
        Ok(Some(item.get_double(0)?))
    } else {
        Ok(None)
    }
}

fn double_or(record: &DeckRecord, name: &str, fallback: f64) -> Result<f64, DeckError> {
    Ok(optional_double(record, name)?.unwrap_or(fallback))
}

/// Positive integer item; defaulted or non-positive means "any".
fn positive_int(record: &DeckRecord, name: &str) -> Result<Option<i64>, DeckError> {
    let item = record.get(name)?;
    if item.has_value(0) {
        let value = item.get_int(0)?;
        Ok((value > 0).then_some(value))
    } else {
        Ok(None)
    }
}

/// Item the record must supply itself. A defaulted value raises
/// SCHEDULE_INVALID_CONTROL and yields `None`, and the caller skips the record.
fn required<T: FromDeckValue>(
    hc: &mut HandlerContext<'_>,
    record: &DeckRecord,
    name: &str,
) -> Result<Option<T>, DeckError> {
    let item = record.get(name)?;
    if item.has_value(0) {
        return Ok(Some(item.get(0)?));
    }
    hc.report(
        ParseContext::SCHEDULE_INVALID_CONTROL,
        &format!("{}: item {} has no default and must be given", hc.keyword.name, name),
    )?;
    Ok(None)
}

impl Schedule {
    /// Names of existing wells matching `pattern`, in creation order.
    fn matching_wells(&self, pattern: &str, step: usize) -> Vec<String> {
        let wildcard = has_wildcard(pattern);
        self.wells
            .values()
            .filter(|w| w.exists_at(step))
            .filter(|w| {
                if wildcard {
                    wildcard_match(pattern, &w.name)
                } else {
                    w.name == pattern
                }
            })
            .map(|w| w.name.clone())
            .collect()
    }

    fn matching_groups(&self, pattern: &str) -> Vec<String> {
        let wildcard = has_wildcard(pattern);
        self.groups
            .keys()
            .filter(|name| {
                if wildcard {
                    wildcard_match(pattern, name)
                } else {
                    name.as_str() == pattern
                }
            })
            .cloned()
            .collect()
    }

    /// Wells for a record's WELL item, raising SCHEDULE_UNKNOWN_WELL when
    /// nothing matches.
    fn wells_for(
        &self,
        hc: &mut HandlerContext<'_>,
        record: &DeckRecord,
    ) -> Result<Vec<String>, DeckError> {
        let pattern = string_item(record, "WELL")?;
        let names = self.matching_wells(&pattern, hc.step);
        if names.is_empty() {
            hc.report(
                ParseContext::SCHEDULE_UNKNOWN_WELL,
                &format!("{}: no well matches '{}'", hc.keyword.name, pattern),
            )?;
        }
        Ok(names)
    }

    pub(super) fn handle_welspecs(&mut self, hc: &mut HandlerContext<'_>) -> Result<(), DeckError> {
        let steps = self.time_map.len();
        let step = hc.step;
        let mut events = Events::empty();

        let keyword = hc.keyword;
        for record in keyword.iter() {
            let Some(name) = required::<String>(hc, record, "WELL")? else {
                continue;
            };
            let Some(group) = required::<String>(hc, record, "GROUP")? else {
                continue;
            };
            let (name, group) = (name.trim().to_owned(), group.trim().to_owned());
            if let Some(bad) = [&name, &group]
                .into_iter()
                .find(|n| n.contains(char::is_whitespace))
            {
                hc.report(
                    ParseContext::PARSE_WGNAME_SPACE,
                    &format!("well or group name '{}' contains whitespace", bad),
                )?;
                continue;
            }

            let Some(phase_text) = required::<String>(hc, record, "PHASE")? else {
                continue;
            };
            let Some(phase) = Phase::parse(phase_text.trim()) else {
                hc.report(
                    ParseContext::SCHEDULE_INVALID_CONTROL,
                    &format!("invalid preferred phase '{}' for well {}", phase_text, name),
                )?;
                continue;
            };

            let Some(head_i) = required::<i64>(hc, record, "HEAD_I")? else {
                continue;
            };
            let Some(head_j) = required::<i64>(hc, record, "HEAD_J")? else {
                continue;
            };

            let head = WellHead {
                group: group.clone(),
                head_i,
                head_j,
                ref_depth: optional_double(record, "REF_DEPTH")?,
                phase,
            };

            if !self.groups.contains_key(&group) {
                self.groups
                    .insert(group.clone(), Group::new(&group, step, steps));
                events.insert(Events::NEW_GROUP);
            }

            match self.wells.get_mut(&name) {
                None => {
                    self.wells
                        .insert(name.clone(), Well::new(&name, step, steps, head));
                    events.insert(Events::NEW_WELL);
                }
                Some(well) => {
                    let old_group = well.head.get(step)?.group.clone();
                    if well.head.update(step, head)? {
                        events.insert(Events::WELL_WELSPECS_UPDATE);
                        if old_group != group {
                            events.insert(Events::GROUP_CHANGE);
                        }
                    }
                }
            }
        }

        self.add_event(step, events);
        Ok(())
    }

    pub(super) fn handle_compdat(&mut self, hc: &mut HandlerContext<'_>) -> Result<(), DeckError> {
        let step = hc.step;
        let mut events = Events::empty();

        let keyword = hc.keyword;
        for record in keyword.iter() {
            let names = self.wells_for(hc, record)?;

            let state_text = string_item(record, "STATE")?;
            let Some(state) = ConnectionState::parse(&state_text) else {
                hc.report(
                    ParseContext::SCHEDULE_INVALID_CONTROL,
                    &format!("invalid connection state '{}'", state_text),
                )?;
                continue;
            };
            let Some(k1) = required::<i64>(hc, record, "K1")? else {
                continue;
            };
            let Some(k2) = required::<i64>(hc, record, "K2")? else {
                continue;
            };
            if k1 < 1 || k2 < k1 {
                hc.report(
                    ParseContext::SCHEDULE_INVALID_CONTROL,
                    &format!("invalid layer range {}..{}", k1, k2),
                )?;
                continue;
            }
            let i = positive_int(record, "I")?;
            let j = positive_int(record, "J")?;
            let sat_table = record.get("SAT_TABLE")?.get_int(0)?;
            let transmissibility = optional_double(record, "CONNECTION_TRANSMISSIBILITY_FACTOR")?;
            let diameter = optional_double(record, "DIAMETER")?;
            let kh = record.get("Kh")?.get_double(0)?;
            let skin = record.get("SKIN")?.get_double(0)?;
            let direction = string_item(record, "DIR")?;

            for name in names {
                let Some(well) = self.wells.get_mut(&name) else {
                    continue;
                };
                let head = well.head.get(step)?;
                let (i, j) = (i.unwrap_or(head.head_i), j.unwrap_or(head.head_j));

                let mut connections = well.connections.get(step)?.clone();
                for k in k1..=k2 {
                    let connection = Connection {
                        i,
                        j,
                        k,
                        state,
                        sat_table,
                        transmissibility,
                        diameter,
                        kh,
                        skin,
                        direction: direction.clone(),
                    };
                    match connections.iter_mut().find(|c| c.same_cell(&connection)) {
                        Some(existing) => *existing = connection,
                        None => connections.push(connection),
                    }
                }
                if well.connections.update(step, connections)? {
                    events.insert(Events::COMPLETION_CHANGE);
                }
            }
        }

        self.add_event(step, events);
        Ok(())
    }

    pub(super) fn handle_wconprod(&mut self, hc: &mut HandlerContext<'_>) -> Result<(), DeckError> {
        let step = hc.step;
        let mut events = Events::empty();

        let keyword = hc.keyword;
        for record in keyword.iter() {
            let names = self.wells_for(hc, record)?;

            let status_text = string_item(record, "STATUS")?;
            let Some(status) = WellStatus::parse(&status_text) else {
                hc.report(
                    ParseContext::SCHEDULE_INVALID_CONTROL,
                    &format!("invalid well status '{}'", status_text),
                )?;
                continue;
            };
            let cmode_text = optional_string(record, "CMODE")?.unwrap_or_default();
            let Some(cmode) = ProducerCMode::parse(&cmode_text) else {
                hc.report(
                    ParseContext::SCHEDULE_INVALID_CONTROL,
                    &format!("invalid producer control mode '{}'", cmode_text),
                )?;
                continue;
            };

            let defaults = ProductionControls::default();
            let controls = ProductionControls {
                cmode: Some(cmode),
                oil_rate: double_or(record, "ORAT", defaults.oil_rate)?,
                water_rate: double_or(record, "WRAT", defaults.water_rate)?,
                gas_rate: double_or(record, "GRAT", defaults.gas_rate)?,
                liquid_rate: double_or(record, "LRAT", defaults.liquid_rate)?,
                resv_rate: double_or(record, "RESV", defaults.resv_rate)?,
                bhp_limit: double_or(record, "BHP", defaults.bhp_limit)?,
                thp_limit: double_or(record, "THP", defaults.thp_limit)?,
                vfp_table: record.get("VFP_TABLE")?.get_int(0)?,
                alq: double_or(record, "ALQ", defaults.alq)?,
            };

            for name in names {
                let Some(well) = self.wells.get_mut(&name) else {
                    continue;
                };
                if well.is_producer.update(step, true)? {
                    events.insert(Events::WELL_SWITCHED_INJECTOR_PRODUCER);
                }
                if well.status.update(step, status)? {
                    events.insert(Events::WELL_STATUS_CHANGE);
                }
                if well.production.update(step, controls.clone())? {
                    events.insert(Events::PRODUCTION_UPDATE);
                }
            }
        }

        self.add_event(step, events);
        Ok(())
    }

    pub(super) fn handle_wconinje(&mut self, hc: &mut HandlerContext<'_>) -> Result<(), DeckError> {
        let step = hc.step;
        let mut events = Events::empty();

        let keyword = hc.keyword;
        for record in keyword.iter() {
            let names = self.wells_for(hc, record)?;

            let type_text = optional_string(record, "TYPE")?.unwrap_or_default();
            let Some(injector_type) = InjectorType::parse(&type_text) else {
                hc.report(
                    ParseContext::SCHEDULE_INVALID_CONTROL,
                    &format!("invalid injector type '{}'", type_text),
                )?;
                continue;
            };
            let status_text = string_item(record, "STATUS")?;
            let Some(status) = WellStatus::parse(&status_text) else {
                hc.report(
                    ParseContext::SCHEDULE_INVALID_CONTROL,
                    &format!("invalid well status '{}'", status_text),
                )?;
                continue;
            };
            let cmode_text = optional_string(record, "CMODE")?.unwrap_or_default();
            let Some(cmode) = InjectorCMode::parse(&cmode_text) else {
                hc.report(
                    ParseContext::SCHEDULE_INVALID_CONTROL,
                    &format!("invalid injector control mode '{}'", cmode_text),
                )?;
                continue;
            };

            let defaults = InjectionControls::default();
            let controls = InjectionControls {
                injector_type: Some(injector_type),
                cmode: Some(cmode),
                surface_rate: double_or(record, "RATE", defaults.surface_rate)?,
                reservoir_rate: double_or(record, "RESV", defaults.reservoir_rate)?,
                bhp_limit: double_or(record, "BHP", defaults.bhp_limit)?,
                thp_limit: double_or(record, "THP", defaults.thp_limit)?,
                vfp_table: record.get("VFP_TABLE")?.get_int(0)?,
            };

            for name in names {
                let Some(well) = self.wells.get_mut(&name) else {
                    continue;
                };
                if well.is_producer.update(step, false)? {
                    events.insert(Events::WELL_SWITCHED_INJECTOR_PRODUCER);
                }
                if well.status.update(step, status)? {
                    events.insert(Events::WELL_STATUS_CHANGE);
                }
                if well.injection.update(step, controls.clone())? {
                    events.insert(Events::INJECTION_UPDATE);
                }
            }
        }

        self.add_event(step, events);
        Ok(())
    }

    /// Without a connection filter the whole well changes status; with
    /// one, only matching connections change state. `C1`/`C2` select by
    /// 1-based position in the well's connection list.
    pub(super) fn handle_welopen(&mut self, hc: &mut HandlerContext<'_>) -> Result<(), DeckError> {
        let step = hc.step;
        let mut events = Events::empty();

        let keyword = hc.keyword;
        for record in keyword.iter() {
            let names = self.wells_for(hc, record)?;

            let status_text = string_item(record, "STATUS")?;
            let Some(status) = WellStatus::parse(&status_text) else {
                hc.report(
                    ParseContext::SCHEDULE_INVALID_CONTROL,
                    &format!("invalid well status '{}'", status_text),
                )?;
                continue;
            };
            let filter = [
                positive_int(record, "I")?,
                positive_int(record, "J")?,
                positive_int(record, "K")?,
                positive_int(record, "C1")?,
                positive_int(record, "C2")?,
            ];
            let [i, j, k, c1, c2] = filter;

            for name in names {
                let Some(well) = self.wells.get_mut(&name) else {
                    continue;
                };
                if filter.iter().all(Option::is_none) {
                    if well.status.update(step, status)? {
                        events.insert(Events::WELL_STATUS_CHANGE);
                    }
                    continue;
                }

                let state = match status {
                    WellStatus::Open => ConnectionState::Open,
                    WellStatus::Auto => ConnectionState::Auto,
                    WellStatus::Stop | WellStatus::Shut => ConnectionState::Shut,
                };
                let mut connections = well.connections.get(step)?.clone();
                for (index, connection) in connections.iter_mut().enumerate() {
                    let position = index as i64 + 1;
                    let selected = i.map_or(true, |v| v == connection.i)
                        && j.map_or(true, |v| v == connection.j)
                        && k.map_or(true, |v| v == connection.k)
                        && c1.map_or(true, |v| position >= v)
                        && c2.map_or(true, |v| position <= v);
                    if selected {
                        connection.state = state;
                    }
                }
                if well.connections.update(step, connections)? {
                    events.insert(Events::COMPLETION_CHANGE);
                }
            }
        }

        self.add_event(step, events);
        Ok(())
    }

    /// Changes one target of the current controls. The new value replaces
    /// the run of steps that still carries the old controls, so a later
    /// WCONPROD/WCONINJE keeps its own values.
    pub(super) fn handle_weltarg(&mut self, hc: &mut HandlerContext<'_>) -> Result<(), DeckError> {
        let step = hc.step;
        let mut events = Events::empty();

        let keyword = hc.keyword;
        for record in keyword.iter() {
            let names = self.wells_for(hc, record)?;
            let target = string_item(record, "CMODE")?.to_ascii_uppercase();
            let Some(value) = required::<f64>(hc, record, "NEW_VALUE")? else {
                continue;
            };

            for name in names {
                let Some(well) = self.wells.get_mut(&name) else {
                    continue;
                };
                if *well.is_producer.get(step)? {
                    let mut controls = well.production.get(step)?.clone();
                    let slot = match target.as_str() {
                        "ORAT" => Some(&mut controls.oil_rate),
                        "WRAT" => Some(&mut controls.water_rate),
                        "GRAT" => Some(&mut controls.gas_rate),
                        "LRAT" => Some(&mut controls.liquid_rate),
                        "RESV" => Some(&mut controls.resv_rate),
                        "BHP" => Some(&mut controls.bhp_limit),
                        "THP" => Some(&mut controls.thp_limit),
                        "LIFT" => Some(&mut controls.alq),
                        "VFP" => None,
                        _ => {
                            hc.report(
                                ParseContext::SCHEDULE_INVALID_CONTROL,
                                &format!("invalid WELTARG target '{}' for producer {}", target, name),
                            )?;
                            continue;
                        }
                    };
                    match slot {
                        Some(slot) => *slot = value,
                        None => controls.vfp_table = value as i64,
                    }
                    if well.production.update_equal(step, controls)? {
                        events.insert(Events::PRODUCTION_UPDATE);
                    }
                } else {
                    let mut controls = well.injection.get(step)?.clone();
                    match target.as_str() {
                        "ORAT" | "WRAT" | "GRAT" => controls.surface_rate = value,
                        "RESV" => controls.reservoir_rate = value,
                        "BHP" => controls.bhp_limit = value,
                        "THP" => controls.thp_limit = value,
                        "VFP" => controls.vfp_table = value as i64,
                        _ => {
                            hc.report(
                                ParseContext::SCHEDULE_INVALID_CONTROL,
                                &format!("invalid WELTARG target '{}' for injector {}", target, name),
                            )?;
                            continue;
                        }
                    }
                    if well.injection.update_equal(step, controls)? {
                        events.insert(Events::INJECTION_UPDATE);
                    }
                }
            }
        }

        self.add_event(step, events);
        Ok(())
    }

    pub(super) fn handle_gconprod(&mut self, hc: &mut HandlerContext<'_>) -> Result<(), DeckError> {
        let step = hc.step;
        let mut events = Events::empty();

        let keyword = hc.keyword;
        for record in keyword.iter() {
            let pattern = string_item(record, "GROUP")?;
            let names = self.matching_groups(&pattern);
            if names.is_empty() {
                hc.report(
                    ParseContext::SCHEDULE_UNKNOWN_GROUP,
                    &format!("GCONPROD: no group matches '{}'", pattern),
                )?;
                continue;
            }

            let cmode_text = string_item(record, "CONTROL_MODE")?;
            let Some(cmode) = GroupCMode::parse(&cmode_text) else {
                hc.report(
                    ParseContext::SCHEDULE_INVALID_CONTROL,
                    &format!("invalid group control mode '{}'", cmode_text),
                )?;
                continue;
            };
            let controls = GroupProductionControls {
                cmode,
                oil_target: double_or(record, "OIL_TARGET", NO_TARGET)?,
                water_target: double_or(record, "WATER_TARGET", NO_TARGET)?,
                gas_target: double_or(record, "GAS_TARGET", NO_TARGET)?,
                liquid_target: double_or(record, "LIQUID_TARGET", NO_TARGET)?,
                resv_target: double_or(record, "RESERVOIR_FLUID_TARGET", NO_TARGET)?,
                exceed_action: string_item(record, "EXCEED_PROC")?.to_ascii_uppercase(),
                respond_to_parent: !string_item(record, "RESPOND_TO_PARENT")?
                    .eq_ignore_ascii_case("NO"),
                guide_rate: optional_double(record, "GUIDE_RATE")?,
            };

            for name in names {
                let Some(group) = self.groups.get_mut(&name) else {
                    continue;
                };
                if group.production.update(step, controls.clone())? {
                    events.insert(Events::GROUP_PRODUCTION_UPDATE);
                }
            }
        }

        self.add_event(step, events);
        Ok(())
    }

    pub(super) fn handle_tuning(&mut self, hc: &mut HandlerContext<'_>) -> Result<(), DeckError> {
        let tuning = super::Tuning::from_keyword(hc.keyword)?;
        if self.tuning.update(hc.step, tuning)? {
            self.add_event(hc.step, Events::TUNING_CHANGE);
        }
        Ok(())
    }
}
