use std::env;

use anyhow::{anyhow, Context, Result};

use lantern_runtime::{App, Command, GamePack, JumpRule, PackLoader, Phase, Stage};

const TICK: f32 = 1.0 / 60.0;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let pack = GamePack::open(&options.path)
        .with_context(|| format!("failed to open pack {}", options.path))?;
    let stage = Stage::from_xml(pack.stage_xml()).context("failed to parse stage XML")?;

    println!(
        "Loaded stage with {} surfaces ({} lanterns)",
        stage.surfaces.len(),
        stage.lantern_holders.len()
    );
    for model in &stage.models {
        println!(" - {} ({})", model.name, model.file);
    }

    let mut app = App::from_pack(pack)?;
    if options.held_jump {
        app.set_jump_rule(JumpRule::WhileHeld);
    }

    // Walk the menu flow the way a player would, one readiness barrier at
    // a time.
    app.go_to_start()?;
    app.tick(TICK);
    app.go_to_cutscene()?;
    app.tick(TICK);
    app.go_to_game()?;
    app.tick(TICK);
    if let Some(reason) = app.load_failure() {
        return Err(anyhow!("failed to load gameplay assets: {reason}"));
    }

    for elapsed in 0..options.ticks {
        if app.phase() == Some(Phase::Lose) {
            println!("Spark burned out after {elapsed} ticks");
            break;
        }
        if options.walk {
            app.input().press(Command::Forward);
        }
        app.tick(TICK);
    }

    print_final_state(&app);
    Ok(())
}

fn print_final_state(app: &App<PackLoader>) {
    println!("Final state:");
    println!(
        " - phase {}",
        app.phase().map(Phase::name).unwrap_or("NONE")
    );
    if let Some(session) = app.session() {
        let position = session.player().position();
        println!(
            " - player pos=({:.2}, {:.2}, {:.2})",
            position.x, position.y, position.z
        );
        println!(
            " - lanterns lit {}/{}",
            session.lanterns_lit(),
            session.lantern_count()
        );
        let spark = session.spark();
        println!(
            " - spark {} ({} ticks left)",
            if spark.is_lit() { "lit" } else { "out" },
            spark.remaining()
        );
    }
}

struct CliOptions {
    path: String,
    ticks: u32,
    walk: bool,
    held_jump: bool,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(path) = args.next() else {
            return Err(anyhow!(
                "Usage: lantern-runtime <game.lgpack> [--ticks N] [--walk] [--held-jump]"
            ));
        };
        let mut ticks = 600;
        let mut walk = false;
        let mut held_jump = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--ticks" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--ticks expects a tick count"))?;
                    ticks = value
                        .parse()
                        .map_err(|err| anyhow!("bad tick count {value:?}: {err}"))?;
                }
                "--walk" => walk = true,
                "--held-jump" => held_jump = true,
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --ticks, --walk or --held-jump"
                    ));
                }
            }
        }
        Ok(Self {
            path,
            ticks,
            walk,
            held_jump,
        })
    }
}
