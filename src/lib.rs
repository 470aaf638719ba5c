pub mod canvas;
pub mod classifier;
pub mod cli;
pub mod game;
pub mod settings;
mod utils;

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use log::info;
use rand::Rng;

use canvas::{Point, ToolKind};
use classifier::HttpClassifier;
use cli::{Cli, Command};
use game::{GameController, LogSink, PromptCatalog};
use settings::{GameSettings, SettingsStore};

pub const DEBUG_ENV: &str = "ARTDRAW_DEBUG";

/// Initializes `env_logger`; `RUST_LOG` still overrides the default level.
pub fn init_logging() {
    let debug_mode = std::env::var(DEBUG_ENV)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let level = if debug_mode {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

pub async fn run(cli: Cli) -> Result<()> {
    info!("artdraw starting up...");

    let store = cli.settings.map(SettingsStore::new).transpose()?;
    let settings = store
        .as_ref()
        .map(SettingsStore::game)
        .unwrap_or_default()
        .with_env_overrides();

    match cli.command {
        Command::Play {
            rounds,
            strokes,
            out,
        } => play(&settings, rounds.max(1), strokes, out).await,
        Command::Prompts => {
            for (index, prompt) in load_prompts(&settings)?.prompts().iter().enumerate() {
                println!("{:>3}. {prompt}", index + 1);
            }
            Ok(())
        }
        Command::InitSettings => {
            let Some(store) = store else {
                bail!("--settings <PATH> is required for init-settings");
            };
            store.update(settings)?;
            println!("wrote {}", store.path().display());
            Ok(())
        }
    }
}

pub fn load_prompts(settings: &GameSettings) -> Result<PromptCatalog> {
    match &settings.prompts_path {
        Some(path) => PromptCatalog::load(path),
        None => Ok(PromptCatalog::default()),
    }
}

async fn play(settings: &GameSettings, rounds: u32, strokes: u32, out: Option<PathBuf>) -> Result<()> {
    let classifier = HttpClassifier::from_settings(settings)?;
    info!("classifying drawings via {}", classifier.endpoint());

    let controller = GameController::new(
        settings,
        load_prompts(settings)?,
        Arc::new(classifier),
        Arc::new(LogSink),
    );

    let mut state = controller
        .start_round()
        .await
        .context("failed to start the first round")?;

    for round in 1..=rounds {
        println!("Level {}: {}", state.level, state.current_prompt);
        scribble(&controller, settings, strokes).await;

        if round == rounds {
            controller.end_round().await;
        } else {
            state = controller
                .next_prompt()
                .await
                .context("failed to advance to the next prompt")?;
        }
    }

    controller.wait_for_scoring().await;
    let final_state = controller.snapshot().await;
    println!(
        "Final score {} at level {}{}",
        final_state.score,
        final_state.level,
        final_state
            .last_prediction
            .as_deref()
            .map(|style| format!(" (last drawing looked like {style})"))
            .unwrap_or_default()
    );

    if let Some(dir) = out {
        let path = controller.save_drawing(&dir).await?;
        println!("saved {}", path.display());
    }

    controller.shutdown().await;
    Ok(())
}

/// Random-walk strokes standing in for pointer input.
async fn scribble(controller: &GameController, settings: &GameSettings, strokes: u32) {
    let (width, height) = (settings.canvas_width as f32, settings.canvas_height as f32);

    for _ in 0..strokes {
        let (kind, color, brush_width, mut point, steps) = {
            let mut rng = rand::thread_rng();
            let kind = if rng.gen_bool(0.15) {
                ToolKind::Eraser
            } else {
                ToolKind::Brush
            };
            let color = [rng.gen(), rng.gen(), rng.gen()];
            let point = Point::new(rng.gen_range(0.0..width), rng.gen_range(0.0..height));
            (kind, color, rng.gen_range(2..20), point, rng.gen_range(4..12))
        };

        controller.set_tool(kind).await;
        controller.set_color(color).await;
        controller.set_brush_width(brush_width).await;
        controller.start_stroke(point).await;

        for _ in 0..steps {
            let (dx, dy) = {
                let mut rng = rand::thread_rng();
                (rng.gen_range(-40.0..40.0), rng.gen_range(-40.0..40.0))
            };
            point = Point::new(
                (point.x + dx).clamp(0.0, width),
                (point.y + dy).clamp(0.0, height),
            );
            controller.extend_stroke(point).await;
        }
        controller.end_stroke().await;
    }
}
