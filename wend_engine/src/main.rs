#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** wendmap **
//! Map-file inspection tool: loads a wayto map database, summarizes each
//! origin block, and reports every data-quality issue found.

use std::env;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use log::info;

use wend_engine::{LoadedMaps, MapId, MapNode, load_file};

fn main() -> Result<ExitCode> {
    env_logger::init();
    let Some(path) = env::args().nth(1) else {
        bail!("usage: wendmap <mapfile.json>");
    };

    info!("Start: loading map data from {path}...");
    let LoadedMaps { registry, issues } =
        load_file(Path::new(&path)).with_context(|| format!("while loading map data from '{path}'"))?;
    info!("Map data loaded successfully.");

    let mut maps: Vec<(&MapId, &MapNode)> = registry.maps().collect();
    maps.sort_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()));

    println!("{} origin blocks, {} loose pool entries\n", maps.len(), registry.pool().len());
    for (id, node) in maps {
        print_map_summary(id, node);
    }
    if !registry.pool().is_empty() {
        let (directions, scripts) = split_kinds(registry.pool().iter().map(|(_, t)| t));
        println!("global pool: {directions} directions, {scripts} scripts");
    }

    if issues.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }
    println!("\n{} data-quality issues:", issues.len());
    for issue in &issues {
        println!("- {issue}");
    }
    Ok(ExitCode::FAILURE)
}

fn print_map_summary(id: &MapId, node: &MapNode) {
    let (directions, scripts) = split_kinds(node.wayto.iter().map(|(_, t)| t));
    let title = node.info.title.as_deref().unwrap_or("untitled");
    print!("map {id} ({title}): {} edges ({directions} directions, {scripts} scripts)", node.wayto.len());
    if let Some(location) = &node.info.location {
        print!(" in {location}");
    }
    if !node.info.tags.is_empty() {
        print!(" [{}]", node.info.tags.join(", "));
    }
    println!();
}

fn split_kinds<'a>(transitions: impl Iterator<Item = &'a wend_engine::Transition>) -> (usize, usize) {
    let mut directions = 0;
    let mut scripts = 0;
    for transition in transitions {
        if transition.is_script() {
            scripts += 1;
        } else {
            directions += 1;
        }
    }
    (directions, scripts)
}
