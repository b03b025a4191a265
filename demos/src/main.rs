//! waygrid-demo: builds a grid, drops a few obstacles on it and serves a
//! batch of path requests through the cooperative scheduler.
//!
//! Usage: `waygrid-demo [config.json]`. Set `RUST_LOG=debug` to watch the
//! searches.

use std::collections::HashMap;
use std::error::Error;
use std::fs;

use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use waygrid_core::{GridConfig, Point, SchedulerConfig, Vec2};
use waygrid_paths::{NavGrid, PathError, PathResult, PathScheduler, Ticket};

#[derive(Debug, Deserialize)]
struct DemoConfig {
    grid: GridConfig,
    #[serde(default)]
    scheduler: SchedulerConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::new(Vec2::ZERO, Vec2::new(30.0, 16.0), 0.5),
            scheduler: SchedulerConfig::default(),
        }
    }
}

fn load_config() -> Result<DemoConfig, Box<dyn Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let text = fs::read_to_string(&path)?;
            let config = serde_json::from_str(&text)?;
            log::info!("loaded configuration from {path}");
            Ok(config)
        }
        None => Ok(DemoConfig::default()),
    }
}

/// World position of the centre of cell `(x, y)`, clamped into the grid.
fn cell(grid: &NavGrid, x: i32, y: i32) -> Vec2 {
    let p = Point::new(x.clamp(0, grid.width() - 1), y.clamp(0, grid.height() - 1));
    grid.node(p).map_or(grid.origin(), |n| n.world_position())
}

fn render(grid: &NavGrid, route: &PathResult) -> String {
    let mut out = String::new();
    for y in (0..grid.height()).rev() {
        for x in 0..grid.width() {
            let p = Point::new(x, y);
            let c = if route.cells.contains(&p) {
                '*'
            } else if grid.is_walkable(p) {
                '.'
            } else {
                '#'
            };
            out.push(c);
        }
        out.push('\n');
    }
    out
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    let grid = NavGrid::new(config.grid)?;
    let (w, h) = (grid.width(), grid.height());
    log::info!("grid is {w}x{h} cells");

    let mut scheduler = PathScheduler::with_grid(config.scheduler, grid);
    let Some(grid) = scheduler.grid() else {
        return Err("scheduler lost its grid".into());
    };

    // A wall down the middle with a gap near the top, and a block to its left.
    let wall = (cell(grid, w / 2, 0), Point::new(1, (h - 2).max(1)));
    let block = (cell(grid, w / 4, h / 3), Point::new(2, 2));
    for (anchor, size) in [wall, block] {
        match scheduler.set_walkable(anchor, size, false) {
            Ok(outcome) => log::info!("obstacle {size:?} at {anchor}: {outcome:?}"),
            Err(e) => log::warn!("obstacle rejected: {e}"),
        }
    }

    let Some(grid) = scheduler.grid() else {
        return Err("scheduler lost its grid".into());
    };
    let requests = [
        (cell(grid, 0, 0), cell(grid, w - 1, 0)),
        (cell(grid, w - 1, h - 1), cell(grid, 0, h / 2)),
        (cell(grid, w / 2, 0), cell(grid, 0, 0)),
        (cell(grid, 1, 1), cell(grid, 1, 1)),
    ];
    let top = (cell(grid, 0, h - 1), cell(grid, w - 1, h - 1));
    let mut tickets = Vec::new();
    for (start, end) in requests {
        tickets.push(scheduler.request(start, end));
    }
    // Served ahead of everything queued above.
    let urgent = scheduler.request_with_priority(top.0, top.1, -1);
    let dropped = scheduler.request(Vec2::ZERO, Vec2::ONE);
    scheduler.cancel(dropped);

    let mut results: HashMap<Ticket, PathResult> = HashMap::new();
    let ticks = scheduler.run_until_idle(&mut |ticket: Ticket, outcome: Result<PathResult, PathError>| {
        match outcome {
            Ok(r) if r.success => {
                log::info!("{ticket}: {} waypoints, cost {}", r.len(), r.cost);
                results.insert(ticket, r);
            }
            Ok(_) => log::info!("{ticket}: no route"),
            Err(e) => log::info!("{ticket}: {e}"),
        }
    });
    log::info!("served {} requests in {ticks} ticks", tickets.len() + 2);

    let Some(grid) = scheduler.grid() else {
        return Err("scheduler lost its grid".into());
    };
    for ticket in std::iter::once(urgent).chain(tickets) {
        if let Some(route) = results.get(&ticket) {
            println!("route {ticket}:\n{}", render(grid, route));
        }
    }
    Ok(())
}
