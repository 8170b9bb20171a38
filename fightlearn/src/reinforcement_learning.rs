// reinforcement_learning.rs
pub mod environment;
pub mod fighter_env;
pub mod genesis_action;
pub mod health;
pub mod reward;
pub mod rl_error;
pub mod vec_env;

pub use environment::{Emulator, EmulatorStep, RLAction, RLEnvironment, RLState, Reward, Step};
pub use fighter_env::{ActionSource, EpisodeStats, FighterEnv, FighterEnvConfig, FighterStep};
pub use genesis_action::{GenesisAction, GenesisButton};
pub use health::{HealthBar, HealthBars, HealthState};
pub use reward::{RewardConfig, RewardEngine, RewardStep, RoundPolicy, RoundResult};
pub use rl_error::{RLError, RLResult};
pub use vec_env::VecFighterEnv;
