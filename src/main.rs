//! Square Physics headless demo
//!
//! Builds the demo scene, runs it for a fixed number of frames and prints a
//! JSON status summary. Usage: `square-physics [settings.json]`

use std::process::ExitCode;

use square_physics::scene::Scene;
use square_physics::settings::Settings;

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Square Physics (headless) starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => match Settings::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{e}; using default settings");
                Settings::default()
            }
        },
        None => {
            log::info!("Using default settings");
            Settings::default()
        }
    };

    match run(settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Simulation failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let frames = settings.frames;
    let mut scene = Scene::new(settings)?;

    for _ in 0..frames {
        scene.step()?;
        if scene.frame() % 60 == 0 {
            let status = scene.status();
            log::info!(
                "frame {}: Gravity: {}, Objects: {}",
                status.frame,
                if status.gravity_enabled { "ON" } else { "OFF" },
                status.active_objects
            );
        }
    }

    println!("{}", serde_json::to_string_pretty(&scene.status())?);
    Ok(())
}
