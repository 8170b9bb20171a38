// reward.rs
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::vision::{Dimensions2D, GrayscaleFrame};

use super::environment::Reward;
use super::health::{HealthBars, HealthState};
use super::rl_error::RLResult;

/// Steps per second the per-second penalties are spread over.
pub const STEPS_PER_SECOND: f64 = 60.0;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct RewardConfig {
    /// A full health swing of 1.0 is worth this much.
    pub damage_scale: f64,
    /// Subtracted when the opponent took no damage this step.
    pub idle_penalty: f64,
    /// Opponent health drops at or below this count as no damage.
    pub idle_epsilon: f64,
    /// Subtracted every step.
    pub time_penalty: f64,
    /// Health at or below this counts as knocked out.
    pub knockout_epsilon: f64,
    /// Added on a won round, subtracted on a lost one.
    pub round_bonus: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            damage_scale: 200.0,
            idle_penalty: 12.0 / STEPS_PER_SECOND,
            idle_epsilon: 1e-7,
            time_penalty: 1.0 / STEPS_PER_SECOND,
            knockout_epsilon: 1e-5,
            round_bonus: 300.0,
        }
    }
}

/// What happens to the episode once a round has a winner.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RoundPolicy {
    /// The episode is terminal, the caller resets.
    #[default]
    EndOnRoundOver,
    /// Never terminal: health is reinitialized and play continues into the next round.
    LoopOnRoundOver,
    /// Loop until this many rounds were resolved in the episode, then terminal.
    EndAfterRounds(u32),
}

impl RoundPolicy {
    /// `rounds_completed` counts the round being resolved.
    pub fn ends_episode(&self, rounds_completed: u32) -> bool {
        match self {
            RoundPolicy::EndOnRoundOver => true,
            RoundPolicy::LoopOnRoundOver => false,
            RoundPolicy::EndAfterRounds(rounds) => rounds_completed >= (*rounds).max(1),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundResult {
    Win,
    Loss,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RewardStep {
    pub reward: Reward,
    /// Health to carry into the next step.
    pub state: HealthState,
    /// Health read from this frame. Differs from `state` after a looped round.
    pub measured: HealthState,
    pub terminal: bool,
    pub round: Option<RoundResult>,
}

impl RewardStep {
    pub fn bonus_applied(&self) -> bool {
        self.round.is_some()
    }
}

/// Turns the health bars of a grayscale frame into a shaped reward and a termination
/// decision. Holds no per-episode state: the previous health goes in, the new one comes out.
#[derive(Clone, Debug)]
pub struct RewardEngine {
    bars: HealthBars,
    config: RewardConfig,
    policy: RoundPolicy,
}

impl RewardEngine {
    /// Fails if the health regions are empty or don't fit frames of `frame` dimensions.
    pub fn new(
        bars: HealthBars,
        config: RewardConfig,
        policy: RoundPolicy,
        frame: Dimensions2D,
    ) -> RLResult<Self> {
        bars.validate(frame)?;
        Ok(Self {
            bars,
            config,
            policy,
        })
    }

    /// Damage dealt minus damage taken, scaled. Deltas are `previous - current`.
    pub fn shaping_term(&self, player_delta: f64, opponent_delta: f64) -> Reward {
        (opponent_delta - player_delta) * self.config.damage_scale
    }

    pub fn round_bonus(&self, result: RoundResult) -> Reward {
        match result {
            RoundResult::Win => self.config.round_bonus,
            RoundResult::Loss => -self.config.round_bonus,
        }
    }

    pub fn compute(
        &self,
        gray: &GrayscaleFrame,
        prev: HealthState,
        rounds_completed: u32,
    ) -> RLResult<RewardStep> {
        let measured = self.bars.measure(gray)?;
        let player_delta = prev.player - measured.player;
        let opponent_delta = prev.opponent - measured.opponent;

        let mut reward = self.shaping_term(player_delta, opponent_delta);
        if opponent_delta <= self.config.idle_epsilon {
            reward -= self.config.idle_penalty;
        }
        reward -= self.config.time_penalty;

        let mut state = measured;
        let mut terminal = false;
        let mut round = None;
        let knockout = self.config.knockout_epsilon;
        if state.player <= knockout || state.opponent <= knockout {
            // Ties go to the opponent.
            let result = if state.player > state.opponent {
                RoundResult::Win
            } else {
                RoundResult::Loss
            };
            reward += self.round_bonus(result);
            terminal = self.policy.ends_episode(rounds_completed + 1);
            if !terminal {
                state = HealthState::FULL;
            }
            info!(
                ?result,
                player = measured.player,
                opponent = measured.opponent,
                terminal,
                "round over"
            );
            round = Some(result);
        }
        debug!(
            player = measured.player,
            opponent = measured.opponent,
            reward,
            "health read"
        );

        Ok(RewardStep {
            reward,
            state,
            measured,
            terminal,
            round,
        })
    }
}
