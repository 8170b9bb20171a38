// watch_engine.rs

use fightlearn::reinforcement_learning::{Emulator, FighterEnv, RoundResult};
use fightlearn::vision::ObservationTensor;
use ratatui::Frame;
use tracing::info;

use super::{engine::Engine, info::Info, input::EvalInput, pacing::FramePacer, policy::Policy};

/// Lets a policy play the wrapped game, resetting whenever an episode ends.
pub struct WatchEngine<E: Emulator, P: Policy> {
    env: FighterEnv<E>,
    policy: P,
    pacer: FramePacer,
    info: Info,
    observation: ObservationTensor,
    paused: bool,
    max_steps: Option<u64>,
}

impl<E: Emulator, P: Policy> WatchEngine<E, P> {
    pub fn new(
        mut env: FighterEnv<E>,
        policy: P,
        pacer: FramePacer,
        max_steps: Option<u64>,
    ) -> anyhow::Result<Self> {
        let observation = env.reset()?;
        let info = Info::new(policy.name());
        Ok(Self {
            env,
            policy,
            pacer,
            info,
            observation,
            paused: false,
            max_steps,
        })
    }

    /// Plays one step. Returns true once the step limit is reached.
    pub fn advance(&mut self) -> anyhow::Result<bool> {
        let action = self.policy.act(&self.observation);
        let step = self.env.step(&action)?;
        let stats = self.env.stats();
        self.info.record(&step, stats);
        if step.terminal {
            let (wins, losses) = self.info.session_record();
            info!(
                steps = stats.steps,
                reward = stats.cumulative_reward,
                won = matches!(step.round, Some(RoundResult::Win)),
                wins,
                losses,
                "episode finished"
            );
            self.reset_episode()?;
        } else {
            self.observation = step.observation;
        }
        self.pacer.wait();
        Ok(self
            .max_steps
            .is_some_and(|max_steps| self.info.total_steps() >= max_steps))
    }

    fn reset_episode(&mut self) -> anyhow::Result<()> {
        self.observation = self.env.reset()?;
        self.info.new_episode();
        Ok(())
    }

    pub fn info(&self) -> &Info {
        &self.info
    }

    pub fn env(&self) -> &FighterEnv<E> {
        &self.env
    }
}

impl<E: Emulator, P: Policy> Engine for WatchEngine<E, P> {
    fn tick(&mut self, input: Option<EvalInput>) -> anyhow::Result<bool> {
        match input {
            Some(EvalInput::Quit) => return Ok(true),
            Some(EvalInput::TogglePause) => {
                self.paused = !self.paused;
                self.info.set_paused(self.paused);
            }
            Some(EvalInput::ResetEpisode) => self.reset_episode()?,
            None => {}
        }
        if self.paused {
            return Ok(false);
        }
        self.advance()
    }

    fn render_frame(&self, frame: &mut Frame) {
        frame.render_widget(&self.info, frame.size());
    }
}
