//! Schedule assembly over the fixture deck and small in-memory decks.

use deckhand_core::schedule::{
    ConnectionState, GroupCMode, InjectorType, ProducerCMode, WellStatus, NO_TARGET,
};
use deckhand_core::{
    Action, DeckError, Events, KeywordDictionary, MessageContainer, ParseContext, Parser,
    Schedule,
};
use std::path::Path;
use time::macros::datetime;

fn build(text: &str, ctx: &ParseContext) -> Result<(Schedule, MessageContainer), DeckError> {
    let parser = Parser::with_builtin().unwrap();
    let mut messages = MessageContainer::new();
    let deck = parser.parse_string(text, ctx, &mut messages)?;
    let schedule = Schedule::new(&deck, ctx, &mut messages)?;
    Ok((schedule, messages))
}

fn small_schedule() -> Schedule {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/decks/SMALL.DATA");
    let ctx = ParseContext::with_defaults();
    let parser = Parser::with_builtin().unwrap();
    let mut messages = MessageContainer::new();
    let deck = parser.parse_file(&path, &ctx, &mut messages).unwrap();
    Schedule::new(&deck, &ctx, &mut messages).unwrap()
}

const PRODUCER: &str = "
START
 1 JAN 2000 /
SCHEDULE
WELSPECS
 'P' 'G' 1 1 1* OIL /
/
COMPDAT
 'P' 2* 1 3 'OPEN' /
/
WCONPROD
 'P' 'OPEN' 'ORAT' 100 /
/
";

#[test]
fn time_map_follows_dates_and_tstep() {
    let schedule = small_schedule();
    let times: Vec<_> = schedule.time_map().iter().collect();
    assert_eq!(
        times,
        vec![
            datetime!(2020-01-01 0:00),
            datetime!(2020-02-01 0:00),
            datetime!(2020-03-01 0:00),
            datetime!(2020-03-11 0:00),
            datetime!(2020-03-31 0:00),
        ]
    );
    assert_eq!(schedule.len(), 5);
    assert_eq!(schedule.time_map().num_steps(), 4);
}

#[test]
fn wells_carry_controls_forward() {
    let schedule = small_schedule();
    let names: Vec<_> = schedule.wells().map(|w| w.name.as_str()).collect();
    assert_eq!(names, vec!["PROD1", "PROD2", "INJ1"]);

    let prod1 = schedule.well("PROD1").unwrap();
    let rates: Vec<f64> = prod1.production.iter().map(|c| c.oil_rate).collect();
    assert_eq!(rates, vec![1000.0, 1000.0, 1500.0, 1500.0, 1500.0]);
    assert_eq!(prod1.production.get(0).unwrap().bhp_limit, 1.01325);
    assert_eq!(prod1.production.get(2).unwrap().bhp_limit, 100.0);
    assert_eq!(prod1.production.get(4).unwrap().cmode, Some(ProducerCMode::Orat));
    assert_eq!(prod1.head.get(0).unwrap().ref_depth, Some(2000.0));

    let prod2 = schedule.well("PROD2").unwrap();
    let status: Vec<_> = prod2.status.iter().copied().collect();
    assert_eq!(
        status,
        vec![
            WellStatus::Shut,
            WellStatus::Shut,
            WellStatus::Open,
            WellStatus::Open,
            WellStatus::Open,
        ]
    );
    assert_eq!(prod2.production.get(0).unwrap().bhp_limit, 150.0);
    assert_eq!(prod2.head.get(0).unwrap().ref_depth, None);

    let inj1 = schedule.well("INJ1").unwrap();
    assert!(!*inj1.is_producer.get(0).unwrap());
    let injection = inj1.injection.get(3).unwrap();
    assert_eq!(injection.injector_type, Some(InjectorType::Water));
    assert_eq!(injection.surface_rate, 2000.0);
    assert_eq!(injection.bhp_limit, 400.0);
    assert_eq!(*inj1.status.get(3).unwrap(), WellStatus::Open);
    assert_eq!(*inj1.status.get(4).unwrap(), WellStatus::Shut);
}

#[test]
fn compdat_defaults_to_well_head() {
    let schedule = small_schedule();
    let prod2 = schedule.well("PROD2").unwrap();
    let cells: Vec<_> = prod2
        .connections
        .get(0)
        .unwrap()
        .iter()
        .map(|c| (c.i, c.j, c.k))
        .collect();
    assert_eq!(cells, vec![(3, 3, 1), (3, 3, 2)]);

    let inj1 = schedule.well("INJ1").unwrap();
    let connections = inj1.connections.get(0).unwrap();
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0].diameter, Some(0.2));
    assert_eq!(connections[0].transmissibility, None);
    assert_eq!(connections[0].state, ConnectionState::Open);
}

#[test]
fn groups_and_targets() {
    let schedule = small_schedule();
    let names: Vec<_> = schedule.groups().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["FIELD", "G1", "G2"]);

    let g1 = schedule.group("G1").unwrap().production.get(1).unwrap();
    assert_eq!(g1.cmode, GroupCMode::Orat);
    assert_eq!(g1.oil_target, 2500.0);
    assert_eq!(g1.water_target, NO_TARGET);
    assert!(g1.respond_to_parent);

    let err = schedule.group("g1").unwrap_err();
    assert!(matches!(err, DeckError::KeyNotFound { suggestion: Some(ref s), .. } if s == "G1"));
}

#[test]
fn tuning_and_nupcol() {
    let schedule = small_schedule();
    let tuning = schedule.tuning().get(0).unwrap();
    assert_eq!(tuning.tsinit, 1.0);
    assert_eq!(tuning.tsmaxz, 30.0);
    assert_eq!(tuning.trgcnv, 0.001);
    assert_eq!(tuning.newtmx, 12);
    assert_eq!(tuning.litmax, 50);
    assert_eq!(tuning.tmaxwc, None);
    assert!(schedule.nupcol().iter().all(|n| *n == 8));
}

#[test]
fn events_per_report_step() {
    let schedule = small_schedule();
    let first = schedule.events(0).unwrap();
    for event in [
        Events::NEW_WELL,
        Events::NEW_GROUP,
        Events::COMPLETION_CHANGE,
        Events::PRODUCTION_UPDATE,
        Events::INJECTION_UPDATE,
        Events::WELL_STATUS_CHANGE,
        Events::GROUP_PRODUCTION_UPDATE,
        Events::TUNING_CHANGE,
    ] {
        assert!(first.contains(event), "missing {event} at step 0");
    }
    assert!(schedule.events(1).unwrap().is_empty());
    assert!(schedule.has_event(2, Events::PRODUCTION_UPDATE));
    assert!(schedule.has_event(2, Events::WELL_STATUS_CHANGE));
    assert!(!schedule.has_event(2, Events::NEW_WELL));
    assert!(schedule.has_event(4, Events::WELL_STATUS_CHANGE));
    assert!(!schedule.has_event(9, Events::NEW_WELL));
    assert!(schedule.events(9).is_err());
}

#[test]
fn weltarg_changes_only_the_current_controls() {
    let text = format!(
        "{PRODUCER}TSTEP\n 1 /\nWELTARG\n 'P' 'ORAT' 200 /\n/\nTSTEP\n 1 /\nWCONPROD\n 'P' 'OPEN' 'ORAT' 300 /\n/\n"
    );
    let (schedule, _) = build(&text, &ParseContext::with_defaults()).unwrap();
    let well = schedule.well("P").unwrap();
    let rates: Vec<f64> = well.production.iter().map(|c| c.oil_rate).collect();
    assert_eq!(rates, vec![100.0, 200.0, 300.0]);
    assert!(schedule.has_event(1, Events::PRODUCTION_UPDATE));
}

#[test]
fn welopen_with_layer_filter_changes_connections() {
    let text = format!("{PRODUCER}TSTEP\n 5 /\nWELOPEN\n 'P' 'SHUT' 0 0 2 /\n/\n");
    let (schedule, _) = build(&text, &ParseContext::with_defaults()).unwrap();
    let well = schedule.well("P").unwrap();
    let states: Vec<_> = well
        .connections
        .get(1)
        .unwrap()
        .iter()
        .map(|c| c.state)
        .collect();
    assert_eq!(
        states,
        vec![ConnectionState::Open, ConnectionState::Shut, ConnectionState::Open]
    );
    assert_eq!(*well.status.get(1).unwrap(), WellStatus::Open);
    assert!(schedule.has_event(1, Events::COMPLETION_CHANGE));
    assert!(!schedule.has_event(1, Events::WELL_STATUS_CHANGE));
}

#[test]
fn welspecs_respecification_moves_group() {
    let text = format!("{PRODUCER}TSTEP\n 1 /\nWELSPECS\n 'P' 'G2' 1 1 1* OIL /\n/\n");
    let (schedule, _) = build(&text, &ParseContext::with_defaults()).unwrap();
    let well = schedule.well("P").unwrap();
    assert_eq!(well.head.get(0).unwrap().group, "G");
    assert_eq!(well.head.get(1).unwrap().group, "G2");
    let events = schedule.events(1).unwrap();
    assert!(events.contains(Events::NEW_GROUP | Events::GROUP_CHANGE | Events::WELL_WELSPECS_UPDATE));
    assert!(!events.contains(Events::NEW_WELL));
}

#[test]
fn unknown_well_follows_policy() {
    let text = format!("{PRODUCER}WCONPROD\n 'NOPE' 'OPEN' 'ORAT' 1 /\n/\n");
    let err = build(&text, &ParseContext::with_defaults()).unwrap_err();
    assert!(matches!(err, DeckError::Schema { ref key, .. } if key == "SCHEDULE_UNKNOWN_WELL"));

    let mut ctx = ParseContext::with_defaults();
    ctx.update("SCHEDULE_UNKNOWN_WELL", Action::Warn);
    let (schedule, messages) = build(&text, &ctx).unwrap();
    assert_eq!(messages.with_key("SCHEDULE_UNKNOWN_WELL").count(), 1);
    assert_eq!(schedule.wells().count(), 1);

    ctx.update("SCHEDULE_UNKNOWN_WELL", Action::Delay);
    let err = build(&text, &ctx).unwrap_err();
    assert!(matches!(err, DeckError::Delayed { count: 1, .. }));
}

#[test]
fn invalid_control_skips_the_record() {
    let text = format!("{PRODUCER}TSTEP\n 1 /\nWCONPROD\n 'P' 'OPEN' 'XRAT' 500 /\n/\n");
    let mut ctx = ParseContext::with_defaults();
    ctx.update("SCHEDULE_INVALID_CONTROL", Action::Ignore);
    let (schedule, messages) = build(&text, &ctx).unwrap();
    assert!(messages.is_empty());
    let well = schedule.well("P").unwrap();
    assert_eq!(well.production.get(1).unwrap().oil_rate, 100.0);
}

#[test]
fn defaulted_required_items_skip_the_record() {
    let text = "
SCHEDULE
WELSPECS
 'P' 'G' 1* 1* 1* OIL /
 'Q' 'G' 4 /
 'R' 'G' 2 3 1* OIL /
/
";
    let mut ctx = ParseContext::with_defaults();
    ctx.update("SCHEDULE_INVALID_CONTROL", Action::Warn);
    let (schedule, messages) = build(text, &ctx).unwrap();
    assert_eq!(messages.with_key("SCHEDULE_INVALID_CONTROL").count(), 2);
    let names: Vec<_> = schedule.wells().map(|w| w.name.as_str()).collect();
    assert_eq!(names, vec!["R"]);

    let err = build(text, &ParseContext::with_defaults()).unwrap_err();
    assert!(matches!(err, DeckError::Schema { ref key, .. } if key == "SCHEDULE_INVALID_CONTROL"));
}

#[test]
fn defaulted_layers_and_targets_leave_the_well_unchanged() {
    let text = format!(
        "{PRODUCER}TSTEP\n 1 /\nCOMPDAT\n 'P' 2* 1* 5 'OPEN' /\n/\nWELTARG\n 'P' 'ORAT' /\n/\n"
    );
    let mut ctx = ParseContext::with_defaults();
    ctx.update("SCHEDULE_INVALID_CONTROL", Action::Warn);
    let (schedule, messages) = build(&text, &ctx).unwrap();
    assert_eq!(messages.with_key("SCHEDULE_INVALID_CONTROL").count(), 2);
    let well = schedule.well("P").unwrap();
    assert_eq!(well.connections.get(1).unwrap().len(), 3);
    assert_eq!(well.production.get(1).unwrap().oil_rate, 100.0);

    let err = build(&text, &ParseContext::with_defaults()).unwrap_err();
    assert!(matches!(err, DeckError::Schema { ref key, .. } if key == "SCHEDULE_INVALID_CONTROL"));
}

#[test]
fn wildcard_patterns_select_wells() {
    let text = "
SCHEDULE
WELSPECS
 'OP1' 'G' 1 1 1* OIL /
 'OP2' 'G' 2 2 1* OIL /
 'WI1' 'G' 3 3 1* WATER /
/
WCONPROD
 'OP?' 'OPEN' 'LRAT' 3* 800 /
/
";
    let (schedule, _) = build(text, &ParseContext::with_defaults()).unwrap();
    for name in ["OP1", "OP2"] {
        let well = schedule.well(name).unwrap();
        assert_eq!(well.production.get(0).unwrap().liquid_rate, 800.0);
        assert_eq!(*well.status.get(0).unwrap(), WellStatus::Open);
    }
    assert_eq!(*schedule.well("WI1").unwrap().status.get(0).unwrap(), WellStatus::Shut);
}

#[test]
fn whitespace_in_well_names_is_reported() {
    let text = "SCHEDULE\nWELSPECS\n 'OP 1' 'G' 1 1 1* OIL /\n/\n";
    let err = build(text, &ParseContext::with_defaults()).unwrap_err();
    assert!(matches!(err, DeckError::Schema { ref key, .. } if key == "PARSE_WGNAME_SPACE"));
}

#[test]
fn nupcol_in_schedule_applies_from_its_step() {
    let text = "RUNSPEC\nNUPCOL\n 5 /\nSCHEDULE\nTSTEP\n 1 1 /\nNUPCOL\n 9 /\n";
    let (schedule, _) = build(text, &ParseContext::with_defaults()).unwrap();
    let values: Vec<i64> = schedule.nupcol().iter().copied().collect();
    assert_eq!(values, vec![5, 5, 9]);
}

#[test]
fn non_increasing_dates_are_rejected() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/decks/BAD_DATES.DATA");
    let ctx = ParseContext::with_defaults();
    let parser = Parser::with_builtin().unwrap();
    let mut messages = MessageContainer::new();
    let deck = parser.parse_file(&path, &ctx, &mut messages).unwrap();
    let err = Schedule::new(&deck, &ctx, &mut messages).unwrap_err();
    assert_eq!(err.kind(), "time");
    assert!(err.to_string().contains("DATES"));
}

#[test]
fn keywords_without_a_handler_follow_policy() {
    let mut dictionary = KeywordDictionary::builtin().unwrap();
    dictionary
        .load_json_str(
            r#"{"name": "WTEST", "size": "slash_terminated", "sections": ["SCHEDULE"],
                "items": [{"name": "WELL", "value_type": "STRING"}]}"#,
        )
        .unwrap();
    let parser = Parser::new(dictionary);
    let text = "SCHEDULE\nWTEST\n 'P' /\n/\n";

    let ctx = ParseContext::with_defaults();
    let mut messages = MessageContainer::new();
    let deck = parser.parse_string(text, &ctx, &mut messages).unwrap();
    let err = Schedule::new(&deck, &ctx, &mut messages).unwrap_err();
    assert!(matches!(err, DeckError::Schema { ref key, .. } if key == "SCHEDULE_UNHANDLED_KEYWORD"));

    let mut ctx = ParseContext::with_defaults();
    ctx.update("SCHEDULE_UNHANDLED_KEYWORD", Action::Ignore);
    let schedule = Schedule::new(&deck, &ctx, &mut messages).unwrap();
    assert_eq!(schedule.len(), 1);
}
