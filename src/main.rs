// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! nod CLI entrypoint.
//!
//! By default this opens the interactive viewer on a scene document. `--render` prints the
//! routed scene as text instead, and `--debug-grid` prints the occupancy grid.

use std::error::Error;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use nod::config::NodConfig;
use nod::route::{RouteMode, Scene};

const LOG_FILTER_ENV: &str = "NOD_LOG";
const LOG_FILE_ENV: &str = "NOD_LOG_FILE";
const DEFAULT_LOG_FILTER: &str = "warn";

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<scene.json>] [--config <path>] [--cell-size <n>] [--direct]\n  {program} --demo [--config <path>] [--cell-size <n>] [--direct]\n  {program} (<scene.json> | --demo) --render [--debug-grid]\n\nWithout --render the interactive viewer opens; `w` saves back to <scene.json>.\n--render prints the routed scene as text; --debug-grid adds the occupancy grid.\n--config loads routing settings from a JSON file; --cell-size and --direct override it.\n\nLogging: {LOG_FILTER_ENV} sets the filter (default `{DEFAULT_LOG_FILTER}`). In viewer mode\nlogs go to the file named by {LOG_FILE_ENV}, or nowhere when it is unset."
    );
}

#[derive(Debug, Default, Clone, PartialEq)]
struct CliOptions {
    scene_path: Option<String>,
    demo: bool,
    render: bool,
    debug_grid: bool,
    config_path: Option<String>,
    cell_size: Option<f64>,
    direct: bool,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--demo" => {
                if options.demo {
                    return Err(());
                }
                options.demo = true;
            }
            "--render" => {
                if options.render {
                    return Err(());
                }
                options.render = true;
            }
            "--debug-grid" => {
                if options.debug_grid {
                    return Err(());
                }
                options.debug_grid = true;
            }
            "--direct" => {
                if options.direct {
                    return Err(());
                }
                options.direct = true;
            }
            "--config" => {
                if options.config_path.is_some() {
                    return Err(());
                }
                options.config_path = Some(args.next().ok_or(())?);
            }
            "--cell-size" => {
                if options.cell_size.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let size: f64 = raw.parse().map_err(|_| ())?;
                if !(size.is_finite() && size > 0.0) {
                    return Err(());
                }
                options.cell_size = Some(size);
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.scene_path.is_some() {
                    return Err(());
                }
                options.scene_path = Some(arg);
            }
        }
    }

    if options.demo == options.scene_path.is_some() {
        return Err(());
    }
    if options.debug_grid && !options.render {
        return Err(());
    }

    Ok(options)
}

fn load_config(options: &CliOptions) -> Result<NodConfig, Box<dyn Error>> {
    let mut config = match &options.config_path {
        Some(path) => NodConfig::load(Path::new(path))?,
        None => NodConfig::default(),
    };
    if let Some(cell_size) = options.cell_size {
        config.cell_size = cell_size;
    }
    if options.direct {
        config.route_mode = RouteMode::Direct;
    }
    config.validate()?;
    Ok(config)
}

/// `--render` logs to stderr; the viewer only logs when a log file is named.
fn init_logging(render: bool) -> Result<(), Box<dyn Error>> {
    let filter =
        std::env::var(LOG_FILTER_ENV).unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_owned());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if render {
        let _ = builder.with_writer(std::io::stderr).try_init();
        return Ok(());
    }

    let Some(path) = std::env::var_os(LOG_FILE_ENV) else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let _ = builder.with_ansi(false).with_writer(Mutex::new(file)).try_init();
    Ok(())
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "nod".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        init_logging(options.render)?;
        let config = load_config(&options)?;

        let scene_path = options.scene_path.as_ref().map(PathBuf::from);
        let graph = match &scene_path {
            Some(path) => nod::document::load(path)?,
            None => nod::tui::demo_graph()?,
        };
        let scene = Scene::new(graph, config)?;

        if options.render {
            println!("{}", nod::render::render_scene_unicode(&scene)?);
            if options.debug_grid {
                println!();
                println!("{}", nod::render::text::grid_to_text(scene.grid()));
            }
            return Ok(());
        }

        nod::tui::run(scene, scene_path)
    })();

    if let Err(err) = result {
        eprintln!("nod: {err}");
        std::process::exit(1);
    }
}
