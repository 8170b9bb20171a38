use rayon::prelude::*;
use tracing::debug;

use crate::vision::ObservationTensor;

use super::environment::Emulator;
use super::fighter_env::{EpisodeStats, FighterEnv, FighterStep};
use super::genesis_action::GenesisAction;
use super::rl_error::{RLError, RLResult};

/// Independent fighter environments stepped in parallel. Every environment keeps its own
/// health and grayscale frame, nothing is shared between them.
pub struct VecFighterEnv<E: Emulator> {
    environments: Vec<FighterEnv<E>>,
}

impl<E> VecFighterEnv<E>
where
    E: Emulator + Send,
    E::Info: Send,
{
    pub fn new(environments: Vec<FighterEnv<E>>) -> Self {
        Self { environments }
    }

    pub fn len(&self) -> usize {
        self.environments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }

    pub fn environments(&self) -> &[FighterEnv<E>] {
        &self.environments
    }

    pub fn reset_all(&mut self) -> RLResult<Vec<ObservationTensor>> {
        self.environments
            .par_iter_mut()
            .map(|env| env.reset())
            .collect()
    }

    /// One action per environment, in order. The first failing environment fails the
    /// whole batch.
    pub fn step_all(&mut self, actions: &[GenesisAction]) -> RLResult<Vec<FighterStep<E::Info>>> {
        if actions.len() != self.environments.len() {
            return Err(RLError::ActionCountMismatch {
                expected: self.environments.len(),
                received: actions.len(),
            });
        }
        self.environments
            .par_iter_mut()
            .zip(actions.par_iter())
            .map(|(env, action)| env.step(action))
            .collect()
    }

    /// Resets every finished environment and returns its index with the new observation.
    pub fn reset_finished(&mut self) -> RLResult<Vec<(usize, ObservationTensor)>> {
        let observations: Vec<(usize, ObservationTensor)> = self
            .environments
            .par_iter_mut()
            .enumerate()
            .filter(|(_, env)| env.is_finished())
            .map(|(i, env)| env.reset().map(|observation| (i, observation)))
            .collect::<RLResult<_>>()?;
        debug!(count = observations.len(), "reset finished environments");
        Ok(observations)
    }

    pub fn stats(&self) -> Vec<EpisodeStats> {
        self.environments.iter().map(FighterEnv::stats).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reinforcement_learning::fighter_env::tests::{raw_with_health, ScriptedEmulator};
    use crate::reinforcement_learning::fighter_env::FighterEnvConfig;
    use crate::reinforcement_learning::health::HealthState;

    fn vec_env(scripts: Vec<Vec<(usize, usize)>>) -> VecFighterEnv<ScriptedEmulator> {
        let environments = scripts
            .into_iter()
            .map(|script| {
                let frames = script
                    .into_iter()
                    .map(|(player, opponent)| raw_with_health(player, opponent))
                    .collect();
                FighterEnv::new(ScriptedEmulator::new(frames), FighterEnvConfig::default())
                    .unwrap()
            })
            .collect();
        VecFighterEnv::new(environments)
    }

    #[test]
    fn test_environments_keep_separate_health() {
        let mut envs = vec_env(vec![vec![(44, 88)], vec![(88, 44)], vec![(88, 88)]]);
        assert_eq!(envs.reset_all().unwrap().len(), 3);
        let steps = envs.step_all(&[GenesisAction::NOOP; 3]).unwrap();
        assert_eq!(steps[0].health, HealthState::new(0.5, 1.0));
        assert_eq!(steps[1].health, HealthState::new(1.0, 0.5));
        assert_eq!(steps[2].health, HealthState::FULL);
        assert!(steps[0].reward < 0.0 && steps[1].reward > 0.0);
    }

    #[test]
    fn test_action_count_is_checked() {
        let mut envs = vec_env(vec![vec![(88, 88)], vec![(88, 88)]]);
        envs.reset_all().unwrap();
        assert!(matches!(
            envs.step_all(&[GenesisAction::NOOP]),
            Err(RLError::ActionCountMismatch {
                expected: 2,
                received: 1
            })
        ));
    }

    #[test]
    fn test_only_finished_environments_are_reset() {
        let mut envs = vec_env(vec![vec![(0, 44)], vec![(88, 88)]]);
        envs.reset_all().unwrap();
        let steps = envs.step_all(&[GenesisAction::NOOP; 2]).unwrap();
        assert!(steps[0].terminal && !steps[1].terminal);
        let reset = envs.reset_finished().unwrap();
        assert_eq!(reset.len(), 1);
        assert_eq!(reset[0].0, 0);
        assert!(envs.environments().iter().all(|env| !env.is_finished()));
        assert_eq!(envs.stats()[1].steps, 1);
    }
}
