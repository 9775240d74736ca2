//! Plain-text rendering of levels and finished runs for the CLI.

use anyhow::Result;
use minijinja::{Environment, context};
use serde::Serialize;

use crate::core::grid::Level;
use crate::core::program::Program;
use crate::core::types::{Action, Cell, Direction, Snapshot};
use crate::engine::handle::RunReport;
use crate::engine::interpreter::{Effect, RobotState, StepReport};
use crate::io::notation::render_program;

const REPORT_TEMPLATE: &str = include_str!("templates/report.txt");
const LEVEL_TEMPLATE: &str = include_str!("templates/level.txt");

/// One committed unit as shown in the report.
#[derive(Debug, Clone, Serialize)]
struct StepLine {
    index: usize,
    kind: &'static str,
    marker: bool,
    effect: String,
}

impl StepLine {
    fn from_step(step: &StepReport) -> Self {
        Self {
            index: step.index,
            kind: step.unit.kind.as_str(),
            marker: step.unit.loop_marker,
            effect: describe(step.effect),
        }
    }
}

/// One history snapshot as shown in the report.
#[derive(Debug, Clone, Serialize)]
struct TraceLine {
    x: i32,
    y: i32,
    facing: &'static str,
    action: Option<Action>,
}

impl TraceLine {
    fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            x: snapshot.position.x,
            y: snapshot.position.y,
            facing: Direction::from_rotation(snapshot.rotation).as_str(),
            action: snapshot.action,
        }
    }
}

/// Everything a run report shows.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary<'a> {
    pub level: &'a Level,
    pub program: &'a Program,
    pub report: &'a RunReport,
    pub steps: &'a [StepReport],
    pub stars: u8,
}

struct ReportEngine {
    env: Environment<'static>,
}

impl ReportEngine {
    fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("report", REPORT_TEMPLATE)
            .expect("report template should be valid");
        env.add_template("level", LEVEL_TEMPLATE)
            .expect("level template should be valid");
        Self { env }
    }

    fn render_run(&self, summary: &RunSummary<'_>) -> Result<String> {
        let steps: Vec<StepLine> = summary.steps.iter().map(StepLine::from_step).collect();
        let trace: Vec<TraceLine> = summary
            .report
            .trace
            .iter()
            .map(TraceLine::from_snapshot)
            .collect();
        let reached = summary.report.reached_target();
        let template = self.env.get_template("report")?;
        let rendered = template.render(context! {
            level => summary.level,
            program => render_program(summary.program),
            grid => render_grid(summary.level, Some(&summary.report.final_state)),
            steps => steps,
            trace => trace,
            outcome => summary.report.outcome.as_str(),
            units_executed => summary.report.units_executed,
            expanded_len => summary.report.expanded_len,
            stars => (summary.stars > 0).then_some(summary.stars),
            hint => (!reached && !summary.level.hint.is_empty())
                .then_some(summary.level.hint.as_str()),
        })?;
        Ok(rendered)
    }

    fn render_level(&self, level: &Level) -> Result<String> {
        let commands: Vec<&str> = level.commands.iter().map(|kind| kind.as_str()).collect();
        let template = self.env.get_template("level")?;
        let rendered = template.render(context! {
            level => level,
            commands => commands,
            grid => render_grid(level, None),
        })?;
        Ok(rendered)
    }
}

/// Render a finished run: final grid, per-step effects and outcome.
pub fn render_run(summary: &RunSummary<'_>) -> Result<String> {
    ReportEngine::new().render_run(summary)
}

/// Render a level description with its starting grid.
pub fn render_level(level: &Level) -> Result<String> {
    ReportEngine::new().render_level(level)
}

/// ASCII grid, top row first.
///
/// `S` start, `T` target, `#` obstacle, `.` free. A start cell that is also
/// the target shows as `T`. When `robot` is given it is drawn as an arrow in
/// its facing direction, over whatever lies beneath.
pub fn render_grid(level: &Level, robot: Option<&RobotState>) -> String {
    let mut rows = Vec::with_capacity(level.grid_size.max(0) as usize);
    for y in 0..level.grid_size {
        let row: String = (0..level.grid_size)
            .map(|x| glyph(level, Cell::new(x, y), robot))
            .collect();
        rows.push(row);
    }
    rows.join("\n")
}

fn glyph(level: &Level, cell: Cell, robot: Option<&RobotState>) -> char {
    if let Some(robot) = robot.filter(|robot| robot.position == cell) {
        return match robot.facing() {
            Direction::Up => '^',
            Direction::Right => '>',
            Direction::Down => 'v',
            Direction::Left => '<',
        };
    }
    if level.is_target(cell) {
        'T'
    } else if cell == level.start {
        'S'
    } else if level.is_obstacle(cell) {
        '#'
    } else {
        '.'
    }
}

fn describe(effect: Effect) -> String {
    match effect {
        Effect::Marker => "enter loop".to_string(),
        Effect::Moved { to } => format!("moved to ({}, {})", to.x, to.y),
        Effect::Jumped { to } => format!("jumped to ({}, {})", to.x, to.y),
        Effect::Blocked { toward } => format!("blocked at ({}, {})", toward.x, toward.y),
        Effect::Turned { rotation } => {
            format!("now facing {}", Direction::from_rotation(rotation).as_str())
        }
        Effect::Waited => "waited".to_string(),
        Effect::Stopped => "stopped".to_string(),
    }
}
