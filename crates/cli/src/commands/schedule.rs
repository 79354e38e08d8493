use std::fmt::Display;
use std::path::Path;
use std::process;

use deckhand_core::schedule::{ConnectionState, Well};
use deckhand_core::time_map::format_time;
use deckhand_core::{DynamicState, MessageContainer, Schedule};

use super::{fail, load_deck, print_messages};
use crate::config::Settings;
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_schedule(
    file: &Path,
    well: Option<&str>,
    settings: &Settings,
    output: OutputFormat,
    quiet: bool,
) {
    let mut messages = MessageContainer::new();
    let deck = load_deck(file, settings, &mut messages, output, quiet);

    let schedule = match Schedule::new(&deck, &settings.context, &mut messages) {
        Ok(s) => s,
        Err(e) => {
            print_messages(&messages, quiet);
            fail(&e, output, quiet);
        }
    };
    print_messages(&messages, quiet);

    let selected: Vec<&Well> = match well {
        Some(name) => match schedule.well(name) {
            Ok(w) => vec![w],
            Err(e) => {
                report_error(&format!("error: {}", e), output, quiet);
                process::exit(1);
            }
        },
        None => schedule.wells().collect(),
    };

    match output {
        OutputFormat::Json => {
            let json = match well {
                Some(_) => serde_json::to_value(&selected[0]),
                None => serde_json::to_value(&schedule),
            };
            let pretty = json
                .and_then(|v| serde_json::to_string_pretty(&v))
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            print_steps(&schedule);
            for w in selected {
                println!();
                print_well(w);
            }
        }
    }
}

fn print_steps(schedule: &Schedule) {
    println!("Report steps:");
    for (step, date) in schedule.time_map().iter().enumerate() {
        let events = schedule
            .events(step)
            .map(|e| e.names().join(" "))
            .unwrap_or_default();
        println!("  {:>3}  {}  {}", step, format_time(date), events);
    }
}

fn print_well(well: &Well) {
    println!("Well {} (from step {}):", well.name, well.creation_step);
    print_history("head", &well.head, well.creation_step, |h| {
        format!("group {} at ({}, {}) {}", h.group, h.head_i, h.head_j, h.phase)
    });
    print_history("status", &well.status, well.creation_step, |s| s.to_string());
    print_history("role", &well.is_producer, well.creation_step, |p| {
        if *p {
            "producer"
        } else {
            "injector"
        }
    });
    print_history("production", &well.production, well.creation_step, |p| {
        match p.cmode {
            Some(cmode) => format!(
                "{} orat {} wrat {} grat {} lrat {} bhp {}",
                cmode, p.oil_rate, p.water_rate, p.gas_rate, p.liquid_rate, p.bhp_limit
            ),
            None => "none".to_owned(),
        }
    });
    print_history("injection", &well.injection, well.creation_step, |i| {
        match (i.injector_type, i.cmode) {
            (Some(kind), Some(cmode)) => format!(
                "{} {} rate {} bhp {}",
                kind, cmode, i.surface_rate, i.bhp_limit
            ),
            _ => "none".to_owned(),
        }
    });
    print_history("connections", &well.connections, well.creation_step, |c| {
        let open = c.iter().filter(|c| c.state == ConnectionState::Open).count();
        format!("{} ({} open)", c.len(), open)
    });
}

/// One line per run of equal values, starting no earlier than `from`.
fn print_history<T, F, S>(label: &str, state: &DynamicState<T>, from: usize, describe: F)
where
    T: Clone + PartialEq,
    F: Fn(&T) -> S,
    S: Display,
{
    let runs = state.unique();
    for (n, (start, value)) in runs.iter().enumerate() {
        let end = runs.get(n + 1).map(|(next, _)| *next);
        if end.is_some_and(|e| e <= from) {
            continue;
        }
        let first = (*start).max(from);
        let span = match end {
            Some(e) if e - 1 > first => format!("{}-{}", first, e - 1),
            Some(_) => first.to_string(),
            None => format!("{}-", first),
        };
        println!("  {:<12} {:<6} {}", label, span, describe(value));
    }
}
