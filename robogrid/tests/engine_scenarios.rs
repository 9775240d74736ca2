//! End-to-end engine scenarios through the public API.
//!
//! Covers the reference scenarios (straight walk, loop walk, blocked move,
//! stop) plus the trace, jump, rotation and cancellation properties.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use robogrid::core::expand::expand;
use robogrid::core::grid::Level;
use robogrid::core::program::Program;
use robogrid::core::types::{Action, Cell, Direction, InstructionKind, RunOutcome, RunStatus};
use robogrid::engine::handle::Engine;
use robogrid::engine::interpreter::{DEFAULT_MAX_UNITS, StepView};
use robogrid::engine::pacer::NoDelay;
use robogrid::engine::session::Session;
use robogrid::io::catalog::builtin_catalog;
use robogrid::io::notation::parse_program;
use robogrid::test_support::{RecordingPacer, level_with_obstacles, program_of};

fn run_to_end(level: &Level, program: &Program) -> (robogrid::engine::handle::RunReport, Engine) {
    let engine = Engine::default();
    let report = engine
        .run(program, Some(level), &NoDelay, |_| {})
        .expect("run accepted");
    (report, engine)
}

#[test]
fn straight_walk_reaches_target() {
    let level = level_with_obstacles(&[]);
    let program = program_of(&[InstructionKind::Forward, InstructionKind::Forward]);

    let (report, engine) = run_to_end(&level, &program);
    assert_eq!(report.outcome, RunOutcome::Won);
    assert_eq!(report.final_state.position, Cell::new(2, 2));
    assert_eq!(report.trace.len(), 3);
    assert_eq!(engine.status(), RunStatus::Complete);
}

#[test]
fn loop_walk_wins_after_second_forward() {
    let level = level_with_obstacles(&[]);
    let mut program = Program::new();
    let outer = program.append_loop(2, None).expect("loop");
    let forward = program
        .append(InstructionKind::Forward, Some(outer))
        .expect("forward");

    let units = expand(&program);
    assert_eq!(units.len(), 3);
    assert!(units[0].loop_marker);
    assert_eq!(units[0].id, outer);
    assert!(units[1..].iter().all(|unit| unit.id == forward && !unit.loop_marker));

    let pacer = RecordingPacer::default();
    let report = Engine::default()
        .run(&program, Some(&level), &pacer, |_| {})
        .expect("run");
    assert_eq!(report.outcome, RunOutcome::Won);
    assert_eq!(report.final_state.position, Cell::new(2, 2));
    assert_eq!(pacer.indices(), vec![0, 1, 2]);
}

#[test]
fn blocked_forward_leaves_robot_in_place() {
    let level = level_with_obstacles(&[(2, 3)]);
    let program = program_of(&[InstructionKind::Forward]);

    let (report, engine) = run_to_end(&level, &program);
    assert_eq!(report.outcome, RunOutcome::NotReached);
    assert_eq!(report.final_state.position, Cell::new(2, 4));
    assert_eq!(report.trace.len(), 1);
    assert_eq!(engine.status(), RunStatus::Idle);
}

#[test]
fn stop_halts_before_remaining_units() {
    let level = level_with_obstacles(&[]);
    let program = program_of(&[
        InstructionKind::Forward,
        InstructionKind::Stop,
        InstructionKind::Forward,
    ]);

    let mut committed = Vec::new();
    let report = Engine::default()
        .run(&program, Some(&level), &NoDelay, |step| committed.push(step.index))
        .expect("run");
    assert_eq!(report.outcome, RunOutcome::Stopped);
    assert!(!report.reached_target());
    assert_eq!(committed, vec![0, 1]);
    assert_eq!(report.final_state.position, Cell::new(2, 3));
}

#[test]
fn win_stops_execution_early() {
    let level = level_with_obstacles(&[]);
    let program = program_of(&[
        InstructionKind::Forward,
        InstructionKind::Forward,
        InstructionKind::Forward,
        InstructionKind::TurnRight,
    ]);

    let (report, engine) = run_to_end(&level, &program);
    assert_eq!(report.outcome, RunOutcome::Won);
    assert_eq!(report.units_executed, 2);
    assert_eq!(report.expanded_len, 4);
    assert_eq!(engine.status(), RunStatus::Complete);
}

#[test]
fn back_onto_target_stops_execution_early() {
    let mut level = level_with_obstacles(&[]);
    level.start = Cell::new(2, 1);
    let program = program_of(&[
        InstructionKind::Back,
        InstructionKind::Forward,
        InstructionKind::Forward,
    ]);

    let (report, engine) = run_to_end(&level, &program);
    assert_eq!(report.outcome, RunOutcome::Won);
    assert_eq!(report.units_executed, 1);
    assert_eq!(report.final_state.position, Cell::new(2, 2));
    assert_eq!(report.trace.len(), 2);
    assert_eq!(engine.status(), RunStatus::Complete);
}

#[test]
fn blocked_back_changes_nothing() {
    let edge = level_with_obstacles(&[]);
    let mut walled = level_with_obstacles(&[(2, 4)]);
    walled.start = Cell::new(2, 3);
    let program = program_of(&[InstructionKind::Back]);

    for level in [edge, walled] {
        let (report, engine) = run_to_end(&level, &program);
        assert_eq!(report.outcome, RunOutcome::NotReached);
        assert_eq!(report.final_state.position, level.start);
        assert_eq!(report.trace.len(), 1);
        assert_eq!(engine.status(), RunStatus::Idle);
    }
}

#[test]
fn exhausted_run_on_target_is_won_but_leaves_status_idle() {
    let mut level = level_with_obstacles(&[]);
    level.target = level.start;
    let program = program_of(&[InstructionKind::Wait]);

    let (report, engine) = run_to_end(&level, &program);
    assert_eq!(report.outcome, RunOutcome::Won);
    assert_eq!(engine.status(), RunStatus::Idle);
}

#[test]
fn nested_loops_expand_in_place() {
    let program = parse_program("loop*2 { forward loop*3 { right } } wait", 3).expect("parse");
    let units = expand(&program);
    let kinds: Vec<_> = units
        .iter()
        .map(|unit| (unit.kind, unit.loop_marker))
        .collect();

    let inner_pass = [
        (InstructionKind::Forward, false),
        (InstructionKind::Loop, true),
        (InstructionKind::TurnRight, false),
        (InstructionKind::TurnRight, false),
        (InstructionKind::TurnRight, false),
    ];
    let mut expected = vec![(InstructionKind::Loop, true)];
    expected.extend(inner_pass);
    expected.extend(inner_pass);
    expected.push((InstructionKind::Wait, false));
    assert_eq!(kinds, expected);
    assert_eq!(expand(&program), units);
}

#[test]
fn jump_checks_only_landing_cell() {
    let mut level = level_with_obstacles(&[(2, 3)]);
    let program = program_of(&[InstructionKind::Jump]);
    let (report, _) = run_to_end(&level, &program);
    assert_eq!(report.outcome, RunOutcome::Won);
    assert_eq!(report.trace[1].action, Some(Action::Jump));

    level.obstacles = [Cell::new(2, 2)].into_iter().collect();
    let (report, _) = run_to_end(&level, &program);
    assert_eq!(report.outcome, RunOutcome::NotReached);
    assert_eq!(report.final_state.position, Cell::new(2, 4));
}

#[test]
fn four_turns_restore_facing_from_any_direction() {
    for direction in [Direction::Up, Direction::Right, Direction::Down, Direction::Left] {
        for turn in [InstructionKind::TurnRight, InstructionKind::TurnLeft] {
            let mut level = level_with_obstacles(&[]);
            level.direction = direction;
            let program = program_of(&[turn, turn, turn, turn]);
            let (report, _) = run_to_end(&level, &program);
            assert_eq!(report.final_state.facing(), direction);
            assert_eq!(report.final_state.rotation.rem_euclid(360), direction.degrees());
            assert_eq!(report.trace.len(), 5);
        }
    }
}

#[test]
fn every_snapshot_stays_on_free_cells() {
    let catalog = builtin_catalog().expect("catalog");
    let programs = [
        "loop*5 { forward jump right }",
        "back back left forward forward jump",
        "repeat { jump } repeat { left forward } loop*4 { back }",
    ];
    for level in catalog.levels() {
        for text in programs {
            let program = parse_program(text, 3).expect("parse");
            let (report, _) = run_to_end(level, &program);
            for snapshot in &report.trace {
                assert!(
                    level.is_valid_cell(snapshot.position),
                    "level {} program {:?} left the board at {:?}",
                    level.id,
                    text,
                    snapshot.position
                );
            }
        }
    }
}

#[test]
fn rerun_from_complete_starts_fresh() {
    let level = level_with_obstacles(&[]);
    let program = program_of(&[InstructionKind::Forward, InstructionKind::Forward]);
    let engine = Engine::default();
    engine
        .run(&program, Some(&level), &NoDelay, |_| {})
        .expect("first");
    assert_eq!(engine.status(), RunStatus::Complete);

    let report = engine
        .run(&program, Some(&level), &NoDelay, |_| {})
        .expect("second");
    assert_eq!(report.outcome, RunOutcome::Won);
    assert_eq!(report.trace.len(), 3);
}

#[test]
fn empty_program_or_missing_level_is_rejected() {
    let level = level_with_obstacles(&[]);
    let engine = Engine::default();
    assert!(
        engine
            .run(&Program::new(), Some(&level), &NoDelay, |_| {})
            .is_none()
    );
    let program = program_of(&[InstructionKind::Forward]);
    assert!(engine.run(&program, None, &NoDelay, |_| {}).is_none());
    assert_eq!(engine.status(), RunStatus::Idle);
}

#[test]
fn oversized_expansion_is_rejected_without_running() {
    let level = level_with_obstacles(&[]);
    let program = parse_program("loop*5 { loop*5 { wait } }", 3).expect("parse");
    let mut session = Session::new(level, 10);
    *session.program_mut() = program;
    assert!(session.run(&NoDelay, |_| {}).is_none());
    assert_eq!(session.status(), RunStatus::Idle);
}

#[test]
fn reset_from_pacer_hook_cancels_run() {
    let level = level_with_obstacles(&[]);
    let program = program_of(&[
        InstructionKind::Wait,
        InstructionKind::Forward,
        InstructionKind::Forward,
    ]);
    let engine = Engine::new(DEFAULT_MAX_UNITS);
    let resetter = engine.clone();
    let pacer = RecordingPacer::with_hook(move |step: &StepView| {
        if step.index == 1 {
            resetter.reset();
        }
    });

    let report = engine
        .run(&program, Some(&level), &pacer, |_| {})
        .expect("run");
    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert_eq!(pacer.indices(), vec![0, 1]);
    assert_eq!(engine.robot().position, Cell::new(2, 4));
    assert!(engine.trace().is_empty());
    assert_eq!(engine.highlighted(), None);
}

#[test]
fn reset_from_another_thread_cancels_run() {
    let level = level_with_obstacles(&[]);
    let program = parse_program("loop*200 { wait }", 3).expect("parse");
    let engine = Engine::default();
    let (started, paused) = mpsc::channel();

    let driver = {
        let engine = engine.clone();
        thread::spawn(move || {
            let pacer = move |step: &StepView| {
                if step.index == 1 {
                    started.send(()).ok();
                }
                thread::sleep(Duration::from_millis(20));
            };
            engine.run(&program, Some(&level), &pacer, |_| {})
        })
    };

    paused.recv().expect("run reached second unit");
    assert_eq!(engine.status(), RunStatus::Running);
    engine.reset();

    let report = driver.join().expect("driver thread").expect("run accepted");
    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert!(report.units_executed < 201);
    assert_eq!(engine.status(), RunStatus::Idle);
    assert!(engine.trace().is_empty());
}

#[test]
fn session_tracks_highlight_during_pause() {
    let level = level_with_obstacles(&[]);
    let mut session = Session::new(level, DEFAULT_MAX_UNITS);
    let wait = session
        .program_mut()
        .append(InstructionKind::Wait, None)
        .expect("wait");

    let engine = session.engine().clone();
    let seen = std::sync::Mutex::new(Vec::new());
    let pacer = |_: &StepView| {
        seen.lock()
            .expect("lock")
            .push((engine.highlighted(), engine.current_step()));
    };
    let report = session.run(&pacer, |_| {}).expect("run");

    assert_eq!(report.outcome, RunOutcome::NotReached);
    assert_eq!(seen.into_inner().expect("lock"), vec![(Some(wait), Some(0))]);
    assert_eq!(session.highlighted(), None);
    assert_eq!(session.current_step(), None);
}
