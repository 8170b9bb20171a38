use fightlearn::reinforcement_learning::GenesisAction;
use fightlearn::vision::ObservationTensor;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Picks the controller input for an observation.
pub trait Policy {
    fn act(&mut self, observation: &ObservationTensor) -> GenesisAction;
    fn name(&self) -> &'static str;
}

pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl Policy for RandomPolicy {
    fn act(&mut self, _observation: &ObservationTensor) -> GenesisAction {
        GenesisAction::sample(&mut self.rng)
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Never presses anything.
pub struct IdlePolicy;

impl Policy for IdlePolicy {
    fn act(&mut self, _observation: &ObservationTensor) -> GenesisAction {
        GenesisAction::NOOP
    }

    fn name(&self) -> &'static str {
        "idle"
    }
}

impl Policy for Box<dyn Policy> {
    fn act(&mut self, observation: &ObservationTensor) -> GenesisAction {
        (**self).act(observation)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
