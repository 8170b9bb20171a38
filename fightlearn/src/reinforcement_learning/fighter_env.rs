// fighter_env.rs
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::vision::{
    preprocess, ChannelOrder, Dimensions2D, Dimensions3D, GrayscaleFrame, ObservationConfig,
    ObservationTensor, Preprocessed, RawFrame,
};

use super::environment::{Emulator, EmulatorStep, RLEnvironment, Reward, Step};
use super::genesis_action::GenesisAction;
use super::health::{HealthBars, HealthState, CALIBRATED_FRAME};
use super::reward::{RewardConfig, RewardEngine, RoundPolicy, RoundResult};
use super::rl_error::{RLError, RLResult};

/// Which action is sent to the emulator on `step`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ActionSource {
    #[default]
    Caller,
    /// Ignore the caller and send a uniformly sampled action.
    RandomSample,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct FighterEnvConfig {
    pub observation: ObservationConfig,
    pub reward: RewardConfig,
    pub health_bars: HealthBars,
    pub round_policy: RoundPolicy,
    pub action_source: ActionSource,
    /// Size of the frames the emulator produces; the health bars must fit inside.
    pub frame: Dimensions2D,
    /// Reinterpret the channels of every emulator frame with this order.
    pub frame_order: Option<ChannelOrder>,
    /// Seed for sampled actions. Random when unset.
    pub seed: Option<u64>,
}

impl Default for FighterEnvConfig {
    fn default() -> Self {
        Self {
            observation: ObservationConfig::default(),
            reward: RewardConfig::default(),
            health_bars: HealthBars::default(),
            round_policy: RoundPolicy::default(),
            action_source: ActionSource::default(),
            frame: CALIBRATED_FRAME,
            frame_order: None,
            seed: None,
        }
    }
}

impl FighterEnvConfig {
    /// Rounds loop forever instead of ending the episode.
    pub fn testing() -> Self {
        Self {
            round_policy: RoundPolicy::LoopOnRoundOver,
            ..Default::default()
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> RLResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> RLResult<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct EpisodeStats {
    pub steps: u64,
    pub cumulative_reward: Reward,
    pub rounds_won: u32,
    pub rounds_lost: u32,
}

impl EpisodeStats {
    pub fn rounds_completed(&self) -> u32 {
        self.rounds_won + self.rounds_lost
    }

    fn record(&mut self, reward: Reward, round: Option<RoundResult>) {
        self.steps += 1;
        self.cumulative_reward += reward;
        match round {
            Some(RoundResult::Win) => self.rounds_won += 1,
            Some(RoundResult::Loss) => self.rounds_lost += 1,
            None => {}
        }
    }
}

#[derive(Clone, Debug)]
pub struct FighterStep<I> {
    pub observation: ObservationTensor,
    pub reward: Reward,
    pub terminal: bool,
    /// Untouched emulator info.
    pub info: I,
    pub round: Option<RoundResult>,
    pub health: HealthState,
    /// The action the emulator received.
    pub action: GenesisAction,
}

impl<I> From<FighterStep<I>> for Step<ObservationTensor, I> {
    fn from(value: FighterStep<I>) -> Self {
        Step {
            observation: value.observation,
            reward: value.reward,
            terminal: value.terminal,
            info: value.info,
        }
    }
}

/// Wraps a fighting game emulator: frames become normalized observations, health bars
/// become a shaped reward and a termination flag.
pub struct FighterEnv<E: Emulator> {
    emulator: E,
    config: FighterEnvConfig,
    engine: RewardEngine,
    health: HealthState,
    last_grayscale: Option<GrayscaleFrame>,
    stats: EpisodeStats,
    finished: bool,
    rng: XorShiftRng,
}

impl<E: Emulator> FighterEnv<E> {
    pub fn new(emulator: E, config: FighterEnvConfig) -> RLResult<Self> {
        config.observation.validate()?;
        let engine = RewardEngine::new(
            config.health_bars,
            config.reward,
            config.round_policy,
            config.frame,
        )?;
        let seed = config.seed.unwrap_or_else(rand::random);
        if config.action_source == ActionSource::RandomSample {
            warn!(seed, "caller actions are ignored, sending sampled actions");
        }
        Ok(Self {
            emulator,
            engine,
            health: HealthState::FULL,
            last_grayscale: None,
            stats: EpisodeStats::default(),
            finished: false,
            rng: XorShiftRng::seed_from_u64(seed),
            config,
        })
    }

    pub fn reset(&mut self) -> RLResult<ObservationTensor> {
        let frame = self.emulator.reset()?;
        let Preprocessed {
            observation,
            grayscale,
        } = preprocess(&self.interpret(frame), &self.config.observation)?;
        self.health = HealthState::FULL;
        self.stats = EpisodeStats::default();
        self.finished = false;
        self.last_grayscale = Some(grayscale);
        info!(policy = ?self.config.round_policy, "episode reset");
        Ok(observation)
    }

    pub fn step(&mut self, action: &GenesisAction) -> RLResult<FighterStep<E::Info>> {
        if self.finished {
            warn!("step called on a finished episode");
            return Err(RLError::EpisodeFinished);
        }
        let sent = match self.config.action_source {
            ActionSource::Caller => *action,
            ActionSource::RandomSample => GenesisAction::sample(&mut self.rng),
        };
        let EmulatorStep { frame, info, .. } = self.emulator.step(&sent)?;
        let Preprocessed {
            observation,
            grayscale,
        } = preprocess(&self.interpret(frame), &self.config.observation)?;
        let outcome =
            self.engine
                .compute(&grayscale, self.health, self.stats.rounds_completed())?;

        self.health = outcome.state;
        self.stats.record(outcome.reward, outcome.round);
        self.finished = outcome.terminal;
        self.last_grayscale = Some(grayscale);

        Ok(FighterStep {
            observation,
            reward: outcome.reward,
            terminal: outcome.terminal,
            info,
            round: outcome.round,
            health: outcome.state,
            action: sent,
        })
    }

    fn interpret(&self, frame: RawFrame) -> RawFrame {
        match self.config.frame_order {
            Some(order) => frame.reinterpret(order),
            None => frame,
        }
    }

    pub fn health(&self) -> HealthState {
        self.health
    }

    pub fn last_grayscale(&self) -> Option<&GrayscaleFrame> {
        self.last_grayscale.as_ref()
    }

    pub fn stats(&self) -> EpisodeStats {
        self.stats
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn config(&self) -> &FighterEnvConfig {
        &self.config
    }

    pub fn emulator(&self) -> &E {
        &self.emulator
    }
}

impl<E> RLEnvironment for FighterEnv<E>
where
    E: Emulator + Send,
    E::Info: Send,
{
    type State = ObservationTensor;
    type Action = GenesisAction;
    type Info = E::Info;

    fn reset(&mut self) -> RLResult<Self::State> {
        FighterEnv::reset(self)
    }

    fn step(&mut self, action: &Self::Action) -> RLResult<Step<Self::State, Self::Info>> {
        FighterEnv::step(self, action).map(Step::from)
    }

    fn dimensions(&self) -> Dimensions3D {
        self.config.observation.dimensions()
    }

    fn cumulative_reward(&self) -> Reward {
        self.stats.cumulative_reward
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::reinforcement_learning::health::{OPPONENT_HEALTH_REGION, PLAYER_HEALTH_REGION};
    use crate::vision::PixelRegion;
    use float_cmp::approx_eq;
    use std::collections::VecDeque;

    /// Calibrated-size frame with the leftmost `player_cols` and `opponent_cols` of the
    /// 88 columns of each bar lit.
    pub(crate) fn raw_with_health(player_cols: usize, opponent_cols: usize) -> RawFrame {
        let mut frame = RawFrame::filled(CALIBRATED_FRAME, ChannelOrder::Bgr, [40, 40, 40]).unwrap();
        for (region, cols) in [
            (PLAYER_HEALTH_REGION, player_cols),
            (OPPONENT_HEALTH_REGION, opponent_cols),
        ] {
            let lit = PixelRegion::new(region.top, region.bottom, region.left, region.left + cols);
            frame.fill_region(&lit, [255, 255, 255]);
        }
        frame
    }

    /// Plays back queued frames; the info of a step is its index.
    pub(crate) struct ScriptedEmulator {
        pub(crate) reset_frame: RawFrame,
        pub(crate) frames: VecDeque<RawFrame>,
        pub(crate) received: Vec<GenesisAction>,
    }

    impl ScriptedEmulator {
        pub(crate) fn new(frames: Vec<RawFrame>) -> Self {
            Self {
                reset_frame: raw_with_health(88, 88),
                frames: frames.into(),
                received: Vec::new(),
            }
        }
    }

    impl Emulator for ScriptedEmulator {
        type Info = usize;

        fn reset(&mut self) -> RLResult<RawFrame> {
            Ok(self.reset_frame.clone())
        }

        fn step(&mut self, action: &GenesisAction) -> RLResult<EmulatorStep<usize>> {
            self.received.push(*action);
            let frame = self
                .frames
                .pop_front()
                .ok_or_else(|| RLError::Emulator("out of frames".to_string()))?;
            Ok(EmulatorStep {
                frame,
                reward: 0.0,
                done: false,
                info: self.received.len() - 1,
            })
        }
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut env =
            FighterEnv::new(ScriptedEmulator::new(vec![]), FighterEnvConfig::default()).unwrap();
        assert!(env.last_grayscale().is_none());
        assert_eq!(env.config().round_policy, RoundPolicy::EndOnRoundOver);
        let first = env.reset().unwrap();
        let gray = env.last_grayscale().unwrap();
        assert_eq!(gray.dimensions(), CALIBRATED_FRAME);
        assert_eq!(
            env.config().health_bars.measure(gray).unwrap(),
            HealthState::FULL
        );
        assert_eq!(env.health(), HealthState::FULL);
        let second = env.reset().unwrap();
        assert_eq!(env.health(), HealthState::FULL);
        assert_eq!(first, second);
        assert_eq!(first.dimensions(), Dimensions3D::new(3, 96, 96));
        assert!(!env.is_finished());
        assert_eq!(env.stats(), EpisodeStats::default());
    }

    #[test]
    fn test_unchanged_health_pays_penalties_and_passes_info() {
        let frames = vec![raw_with_health(88, 88), raw_with_health(88, 88)];
        let mut env =
            FighterEnv::new(ScriptedEmulator::new(frames), FighterEnvConfig::default()).unwrap();
        env.reset().unwrap();
        let first = env.step(&GenesisAction::NOOP).unwrap();
        let second = env.step(&GenesisAction::NOOP).unwrap();
        assert_eq!(second.reward, -(1.0 / 60.0) - (12.0 / 60.0));
        assert!(!second.terminal);
        assert_eq!((first.info, second.info), (0, 1));
        assert_eq!(env.health(), HealthState::FULL);
        assert_eq!(env.stats().steps, 2);
    }

    #[test]
    fn test_knockout_terminates_and_requires_reset() {
        let frames = vec![raw_with_health(44, 88), raw_with_health(0, 44)];
        let mut env =
            FighterEnv::new(ScriptedEmulator::new(frames), FighterEnvConfig::default()).unwrap();
        env.reset().unwrap();
        let hit = env.step(&GenesisAction::NOOP).unwrap();
        assert!(approx_eq!(f64, hit.reward, -100.0 - 13.0 / 60.0, epsilon = 1e-9));
        let knockout = env.step(&GenesisAction::NOOP).unwrap();
        assert!(knockout.terminal);
        assert_eq!(knockout.round, Some(RoundResult::Loss));
        // Player lost 0.5, opponent lost 0.5: shaping cancels, only the bonus and time penalty.
        assert!(approx_eq!(f64, knockout.reward, -300.0 - 1.0 / 60.0, epsilon = 1e-9));
        assert!(env.health().player <= 1e-5);
        assert!(matches!(
            env.step(&GenesisAction::NOOP),
            Err(RLError::EpisodeFinished)
        ));
        env.reset().unwrap();
        assert_eq!(env.health(), HealthState::FULL);
    }

    #[test]
    fn test_testing_mode_loops_rounds() {
        let frames = vec![raw_with_health(0, 44), raw_with_health(88, 88)];
        let mut env =
            FighterEnv::new(ScriptedEmulator::new(frames), FighterEnvConfig::testing()).unwrap();
        env.reset().unwrap();
        let knockout = env.step(&GenesisAction::NOOP).unwrap();
        assert!(!knockout.terminal);
        assert_eq!(env.health(), HealthState::FULL);
        assert_eq!(env.stats().rounds_lost, 1);
        let next = env.step(&GenesisAction::NOOP).unwrap();
        assert!(!next.terminal);
        assert_eq!(next.reward, -(1.0 / 60.0) - (12.0 / 60.0));
    }

    #[test]
    fn test_caller_action_is_sent_by_default() {
        let action = GenesisAction::from_buttons(&[
            crate::reinforcement_learning::GenesisButton::Right,
            crate::reinforcement_learning::GenesisButton::C,
        ]);
        let mut env = FighterEnv::new(
            ScriptedEmulator::new(vec![raw_with_health(88, 88)]),
            FighterEnvConfig::default(),
        )
        .unwrap();
        env.reset().unwrap();
        let step = env.step(&action).unwrap();
        assert_eq!(step.action, action);
        assert_eq!(env.emulator().received, vec![action]);
    }

    #[test]
    fn test_random_sample_overrides_caller() {
        let config = FighterEnvConfig {
            action_source: ActionSource::RandomSample,
            seed: Some(7),
            ..Default::default()
        };
        let frames = (0..8).map(|_| raw_with_health(88, 88)).collect();
        let mut env = FighterEnv::new(ScriptedEmulator::new(frames), config).unwrap();
        env.reset().unwrap();
        let mut expected_rng = XorShiftRng::seed_from_u64(7);
        for _ in 0..8 {
            let step = env.step(&GenesisAction::NOOP).unwrap();
            assert_eq!(step.action, GenesisAction::sample(&mut expected_rng));
        }
        assert_eq!(env.emulator().received.len(), 8);
    }

    fn run_episode<E: RLEnvironment>(env: &mut E, action: E::Action) -> (usize, Reward) {
        env.reset().unwrap();
        let mut steps = 0;
        while !env.step(&action).unwrap().terminal {
            steps += 1;
        }
        (steps + 1, env.cumulative_reward())
    }

    #[test]
    fn test_rl_environment_trait() {
        let frames = vec![raw_with_health(88, 44), raw_with_health(88, 0)];
        let mut env =
            FighterEnv::new(ScriptedEmulator::new(frames), FighterEnvConfig::default()).unwrap();
        assert_eq!(
            RLEnvironment::dimensions(&env),
            Dimensions3D::new(3, 96, 96)
        );
        let (steps, total) = run_episode(&mut env, GenesisAction::NOOP);
        assert_eq!(steps, 2);
        // 100 + 100 for damage dealt, the win bonus, two time penalties.
        assert!(approx_eq!(f64, total, 200.0 + 300.0 - 2.0 / 60.0, epsilon = 1e-9));
    }

    #[test]
    fn test_wrong_frame_size_fails_fast() {
        let small = RawFrame::filled(Dimensions2D::new(100, 100), ChannelOrder::Bgr, [0, 0, 0])
            .unwrap();
        let mut env =
            FighterEnv::new(ScriptedEmulator::new(vec![small]), FighterEnvConfig::default())
                .unwrap();
        env.reset().unwrap();
        assert!(matches!(
            env.step(&GenesisAction::NOOP),
            Err(RLError::HealthRegionOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_config_rejects_regions_outside_frame() {
        let config = FighterEnvConfig {
            frame: Dimensions2D::new(224, 160),
            ..Default::default()
        };
        assert!(FighterEnv::new(ScriptedEmulator::new(vec![]), config).is_err());
    }

    #[test]
    fn test_config_file_round_trip() {
        let path = std::env::temp_dir().join("fightlearn_config_round_trip.json");
        let config = FighterEnvConfig {
            round_policy: RoundPolicy::EndAfterRounds(3),
            seed: Some(11),
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = FighterEnvConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: FighterEnvConfig =
            serde_json::from_str(r#"{ "round_policy": "LoopOnRoundOver" }"#).unwrap();
        assert_eq!(config.round_policy, RoundPolicy::LoopOnRoundOver);
        assert_eq!(config.health_bars, HealthBars::default());
        assert_eq!(config.frame, CALIBRATED_FRAME);
    }
}
