use std::fmt;

use itertools::Itertools;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::environment::RLAction;
use super::rl_error::RLError;

/// Controller buttons in the order the emulator's multi-binary action space lists them.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenesisButton {
    B,
    A,
    Mode,
    Start,
    Up,
    Down,
    Left,
    Right,
    C,
    Y,
    X,
    Z,
}

impl GenesisButton {
    pub const ALL: [GenesisButton; 12] = [
        GenesisButton::B,
        GenesisButton::A,
        GenesisButton::Mode,
        GenesisButton::Start,
        GenesisButton::Up,
        GenesisButton::Down,
        GenesisButton::Left,
        GenesisButton::Right,
        GenesisButton::C,
        GenesisButton::Y,
        GenesisButton::X,
        GenesisButton::Z,
    ];

    pub fn bit(self) -> u16 {
        1 << (self as u16)
    }

    pub fn name(self) -> &'static str {
        match self {
            GenesisButton::B => "B",
            GenesisButton::A => "A",
            GenesisButton::Mode => "MODE",
            GenesisButton::Start => "START",
            GenesisButton::Up => "UP",
            GenesisButton::Down => "DOWN",
            GenesisButton::Left => "LEFT",
            GenesisButton::Right => "RIGHT",
            GenesisButton::C => "C",
            GenesisButton::Y => "Y",
            GenesisButton::X => "X",
            GenesisButton::Z => "Z",
        }
    }
}

/// A 12 button controller state, every button pressed or released independently.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
pub struct GenesisAction(u16);

impl GenesisAction {
    pub const BUTTONS: usize = 12;
    pub const NOOP: GenesisAction = GenesisAction(0);
    const MASK: u16 = (1 << Self::BUTTONS) - 1;

    pub fn from_buttons(buttons: &[GenesisButton]) -> Self {
        Self(buttons.iter().fold(0, |acc, button| acc | button.bit()))
    }

    pub fn is_pressed(&self, button: GenesisButton) -> bool {
        self.0 & button.bit() != 0
    }

    pub fn pressed(&self) -> impl Iterator<Item = GenesisButton> + '_ {
        GenesisButton::ALL
            .into_iter()
            .filter(|button| self.is_pressed(*button))
    }

    pub fn to_array(self) -> [bool; Self::BUTTONS] {
        GenesisButton::ALL.map(|button| self.is_pressed(button))
    }

    /// Uniform over the whole multi-binary space, like sampling each button with p = 0.5.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.gen_range(0..=Self::MASK))
    }
}

impl RLAction for GenesisAction {
    const SIZE: u32 = 1 << GenesisAction::BUTTONS;
}

impl From<[bool; GenesisAction::BUTTONS]> for GenesisAction {
    fn from(value: [bool; GenesisAction::BUTTONS]) -> Self {
        let bits = value
            .iter()
            .enumerate()
            .filter(|(_, pressed)| **pressed)
            .fold(0u16, |acc, (i, _)| acc | (1 << i));
        Self(bits)
    }
}

impl From<GenesisAction> for u32 {
    fn from(val: GenesisAction) -> Self {
        val.0 as u32
    }
}

impl TryFrom<u32> for GenesisAction {
    type Error = RLError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value >= Self::SIZE {
            return Err(RLError::ActionOutOfRange {
                value,
                max: Self::SIZE - 1,
            });
        }
        Ok(Self(value as u16))
    }
}

impl fmt::Display for GenesisAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "NOOP");
        }
        write!(f, "{}", self.pressed().map(GenesisButton::name).join("+"))
    }
}
