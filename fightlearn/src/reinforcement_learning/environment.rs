use crate::vision::{Dimensions3D, ObservationTensor, RawFrame};

use std::fmt::Debug;

use super::genesis_action::GenesisAction;
use super::rl_error::{RLError, RLResult};

// environment.rs
pub type Reward = f64;

pub trait RLAction:
    Clone + Debug + Copy + Into<u32> + TryFrom<u32, Error = RLError> + Sync + Send
{
    const SIZE: u32;
}

pub trait RLState: Clone + Debug + AsRef<[f32]> + Sync + Send {
    fn dimensions(&self) -> Dimensions3D;
}

impl RLState for ObservationTensor {
    fn dimensions(&self) -> Dimensions3D {
        ObservationTensor::dimensions(self)
    }
}

#[derive(Clone, Debug)]
pub struct Step<S, I> {
    pub observation: S,
    pub reward: Reward,
    pub terminal: bool,
    pub info: I,
}

pub trait RLEnvironment: Send {
    type State: RLState;
    type Action: RLAction;
    type Info: Send;

    fn reset(&mut self) -> RLResult<Self::State>;
    fn step(&mut self, action: &Self::Action) -> RLResult<Step<Self::State, Self::Info>>;
    fn dimensions(&self) -> Dimensions3D;
    fn cumulative_reward(&self) -> Reward;
}

/// What the wrapped emulator hands back for one step. The emulator's own reward and done
/// flag are carried along but not used for shaping.
#[derive(Clone, Debug)]
pub struct EmulatorStep<I> {
    pub frame: RawFrame,
    pub reward: f64,
    pub done: bool,
    pub info: I,
}

/// The game emulator being wrapped.
pub trait Emulator {
    type Info;

    fn reset(&mut self) -> RLResult<RawFrame>;
    fn step(&mut self, action: &GenesisAction) -> RLResult<EmulatorStep<Self::Info>>;
}
