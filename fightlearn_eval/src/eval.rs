mod engine;
mod frame_replay;
mod info;
mod input;
mod pacing;
mod policy;
mod render_engine;
mod watch_engine;

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use fightlearn::reinforcement_learning::{
    ActionSource, Emulator, FighterEnv, FighterEnvConfig, RoundPolicy,
};
use fightlearn::vision::preprocess;
use tracing::info;

use crate::{ActionSourceArg, PolicyArg, RoundPolicyArg, WatchArgs};

use self::{
    engine::Engine,
    frame_replay::FrameReplay,
    input::handle_events,
    pacing::FramePacer,
    policy::{IdlePolicy, Policy, RandomPolicy},
    render_engine::RenderEngine,
    watch_engine::WatchEngine,
};

pub use pacing::DEFAULT_FPS;

pub fn load_config(path: Option<&Path>) -> anyhow::Result<FighterEnvConfig> {
    match path {
        Some(path) => FighterEnvConfig::from_file(path)
            .with_context(|| format!("couldn't load config {}", path.display())),
        None => Ok(FighterEnvConfig::default()),
    }
}

/// File values, overridden by whatever was given on the command line.
fn watch_config(args: &WatchArgs) -> anyhow::Result<FighterEnvConfig> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(round_policy) = &args.round_policy {
        config.round_policy = match round_policy {
            RoundPolicyArg::End => RoundPolicy::EndOnRoundOver,
            RoundPolicyArg::Loop => RoundPolicy::LoopOnRoundOver,
            RoundPolicyArg::Rounds => RoundPolicy::EndAfterRounds(args.rounds),
        };
    }
    if let Some(action_source) = &args.action_source {
        config.action_source = match action_source {
            ActionSourceArg::Caller => ActionSource::Caller,
            ActionSourceArg::Random => ActionSource::RandomSample,
        };
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    Ok(config)
}

pub fn watch(args: WatchArgs) -> anyhow::Result<()> {
    let config = watch_config(&args)?;
    let replay = FrameReplay::from_dir(&args.frames)?;
    info!(
        frames = replay.len(),
        policy = ?config.round_policy,
        source = ?config.action_source,
        "starting evaluation"
    );
    let env = FighterEnv::new(replay, config)?;
    let pacer = FramePacer::new(args.fps);
    let policy: Box<dyn Policy> = match args.policy {
        PolicyArg::Random => Box::new(RandomPolicy::new(args.seed)),
        PolicyArg::Idle => Box::new(IdlePolicy),
    };
    let mut engine = WatchEngine::new(env, policy, pacer, args.max_steps)?;
    if args.headless {
        headless_loop(&mut engine)
    } else {
        dashboard_loop(&mut engine)
    }
}

fn headless_loop<E: Emulator, P: Policy>(engine: &mut WatchEngine<E, P>) -> anyhow::Result<()> {
    while !engine.advance()? {}
    let (wins, losses) = engine.info().session_record();
    info!(steps = engine.info().total_steps(), wins, losses, "evaluation done");
    Ok(())
}

fn dashboard_loop<E: Emulator, P: Policy>(engine: &mut WatchEngine<E, P>) -> anyhow::Result<()> {
    let mut render_engine = RenderEngine::init_render_engine()?;
    let result = run_dashboard(engine, &mut render_engine);
    render_engine.deinit_render_engine()?;
    result
}

fn run_dashboard<E: Emulator, P: Policy>(
    engine: &mut WatchEngine<E, P>,
    render_engine: &mut RenderEngine,
) -> anyhow::Result<()> {
    let mut should_quit = false;
    while !should_quit {
        // rendering
        render_engine.render(|frame| engine.render_frame(frame))?;
        // tick
        let user_input = handle_events(Duration::ZERO)?;
        should_quit = engine.tick(user_input)?;
    }
    Ok(())
}

/// Prints what the reward engine reads from a single frame.
pub fn inspect(frame: &Path, config: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let raw = FrameReplay::load(frame)?;
    let raw = match config.frame_order {
        Some(order) => raw.reinterpret(order),
        None => raw,
    };
    let preprocessed = preprocess(&raw, &config.observation)?;
    let health = config.health_bars.measure(&preprocessed.grayscale)?;
    let dimensions = raw.dimensions();
    println!("frame: {}x{}", dimensions.height, dimensions.width);
    println!("observation: {:?}", preprocessed.observation.dimensions());
    println!("player health: {:.4}", health.player);
    println!("opponent health: {:.4}", health.opponent);
    Ok(())
}
