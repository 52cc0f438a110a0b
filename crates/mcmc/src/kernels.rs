//! Transition kernels moving a chain state one step forward.

use crate::distributions::LogDensity;
use ndarray::{Array1, ArrayView1};
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::StandardNormal;

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Current position of a chain with its cached log density value
#[derive(Clone, Debug, PartialEq)]
pub struct ChainState {
    /// Position in the parameters space
    pub position: Array1<f64>,
    /// Target log density at `position`
    pub log_prob: f64,
}

impl ChainState {
    /// Build the state at `position` evaluating the target log density
    pub fn new<T: LogDensity + ?Sized>(target: &T, position: Array1<f64>) -> Self {
        let log_prob = target.log_prob(&position.view());
        ChainState { position, log_prob }
    }
}

/// Result of one transition
#[derive(Clone, Debug)]
pub struct StepOutcome {
    /// State after the transition (the previous one when rejected)
    pub state: ChainState,
    /// Whether the proposal was accepted
    pub accepted: bool,
    /// Log of the Metropolis-Hastings acceptance ratio of the proposal
    pub log_accept_ratio: f64,
}

/// A Markov transition leaving the target density invariant
pub trait TransitionKernel {
    /// Propose then accept or reject a new state from `current`
    fn one_step<T: LogDensity + ?Sized, R: Rng>(
        &self,
        target: &T,
        current: &ChainState,
        rng: &mut R,
    ) -> StepOutcome;

    /// Current step size of the proposals
    fn step_size(&self) -> f64;

    /// Set the step size of the proposals
    fn set_step_size(&mut self, step_size: f64);
}

/// Metropolis rule: accept with probability `min(1, exp(log_ratio))`.
///
/// A `NaN` ratio is rejected. Leaving a zero probability state towards a
/// finite one is always accepted.
fn metropolis_accept<R: Rng>(current: f64, proposed: f64, rng: &mut R) -> (bool, f64) {
    if proposed.is_nan() || proposed == f64::NEG_INFINITY {
        return (false, f64::NEG_INFINITY);
    }
    if current == f64::NEG_INFINITY || current.is_nan() {
        return (true, f64::INFINITY);
    }
    let log_ratio = proposed - current;
    if log_ratio >= 0. {
        (true, log_ratio)
    } else {
        let u: f64 = rng.gen();
        (u.ln() < log_ratio, log_ratio)
    }
}

fn standard_normal_vector<R: Rng>(dim: usize, rng: &mut R) -> Array1<f64> {
    Array1::from_shape_fn(dim, |_| rng.sample::<f64, _>(StandardNormal))
}

/// Gaussian random walk Metropolis
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct RandomWalkMetropolis {
    scale: f64,
}

impl RandomWalkMetropolis {
    /// Constructor given the standard deviation of the proposal
    pub fn new(scale: f64) -> Self {
        RandomWalkMetropolis { scale }
    }
}

impl Default for RandomWalkMetropolis {
    fn default() -> Self {
        RandomWalkMetropolis { scale: 0.1 }
    }
}

impl TransitionKernel for RandomWalkMetropolis {
    fn one_step<T: LogDensity + ?Sized, R: Rng>(
        &self,
        target: &T,
        current: &ChainState,
        rng: &mut R,
    ) -> StepOutcome {
        let step = standard_normal_vector(current.position.len(), rng) * self.scale;
        let proposal = ChainState::new(target, &current.position + &step);
        let (accepted, log_accept_ratio) =
            metropolis_accept(current.log_prob, proposal.log_prob, rng);
        StepOutcome {
            state: if accepted { proposal } else { current.clone() },
            accepted,
            log_accept_ratio,
        }
    }

    fn step_size(&self) -> f64 {
        self.scale
    }

    fn set_step_size(&mut self, step_size: f64) {
        self.scale = step_size;
    }
}

/// Hamiltonian Monte Carlo with identity mass matrix and leapfrog integration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct HamiltonianMonteCarlo {
    step_size: f64,
    num_leapfrog_steps: usize,
}

impl HamiltonianMonteCarlo {
    /// Constructor
    pub fn new(step_size: f64, num_leapfrog_steps: usize) -> Self {
        HamiltonianMonteCarlo {
            step_size,
            num_leapfrog_steps: num_leapfrog_steps.max(1),
        }
    }

    /// Number of leapfrog steps per transition
    pub fn num_leapfrog_steps(&self) -> usize {
        self.num_leapfrog_steps
    }

    /// Integrate the hamiltonian dynamics from (position, momentum).
    /// Returns `None` as soon as a non finite value shows up.
    fn leapfrog<T: LogDensity + ?Sized>(
        &self,
        target: &T,
        position: &ArrayView1<f64>,
        momentum: &Array1<f64>,
    ) -> Option<(Array1<f64>, Array1<f64>)> {
        let eps = self.step_size;
        let mut q = position.to_owned();
        let mut p = momentum + &(target.grad_log_prob(&q.view()) * (0.5 * eps));
        for i in 0..self.num_leapfrog_steps {
            q.scaled_add(eps, &p);
            let grad = target.grad_log_prob(&q.view());
            if grad.iter().any(|g| !g.is_finite()) {
                return None;
            }
            let half = if i + 1 == self.num_leapfrog_steps {
                0.5
            } else {
                1.
            };
            p.scaled_add(half * eps, &grad);
        }
        Some((q, p))
    }
}

impl Default for HamiltonianMonteCarlo {
    fn default() -> Self {
        HamiltonianMonteCarlo::new(0.05, 10)
    }
}

impl TransitionKernel for HamiltonianMonteCarlo {
    fn one_step<T: LogDensity + ?Sized, R: Rng>(
        &self,
        target: &T,
        current: &ChainState,
        rng: &mut R,
    ) -> StepOutcome {
        let rejected = |log_accept_ratio| StepOutcome {
            state: current.clone(),
            accepted: false,
            log_accept_ratio,
        };
        let momentum = standard_normal_vector(current.position.len(), rng);
        let Some((q, p)) = self.leapfrog(target, &current.position.view(), &momentum) else {
            return rejected(f64::NEG_INFINITY);
        };
        let proposal = ChainState::new(target, q);
        if !proposal.log_prob.is_finite() {
            return rejected(f64::NEG_INFINITY);
        }
        // joint densities including kinetic energies
        let current_h = current.log_prob - 0.5 * momentum.dot(&momentum);
        let proposed_h = proposal.log_prob - 0.5 * p.dot(&p);
        let (accepted, log_accept_ratio) = metropolis_accept(current_h, proposed_h, rng);
        if accepted {
            StepOutcome {
                state: proposal,
                accepted,
                log_accept_ratio,
            }
        } else {
            rejected(log_accept_ratio)
        }
    }

    fn step_size(&self) -> f64 {
        self.step_size
    }

    fn set_step_size(&mut self, step_size: f64) {
        self.step_size = step_size;
    }
}

/// Available transition kernels
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum McmcKernel {
    /// Gaussian random walk Metropolis
    RandomWalk(RandomWalkMetropolis),
    /// Hamiltonian Monte Carlo
    Hamiltonian(HamiltonianMonteCarlo),
}

impl Default for McmcKernel {
    fn default() -> Self {
        McmcKernel::RandomWalk(RandomWalkMetropolis::default())
    }
}

impl std::fmt::Display for McmcKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            McmcKernel::RandomWalk(k) => write!(f, "RandomWalkMetropolis(scale={})", k.scale),
            McmcKernel::Hamiltonian(k) => write!(
                f,
                "HamiltonianMonteCarlo(step_size={}, num_leapfrog_steps={})",
                k.step_size, k.num_leapfrog_steps
            ),
        }
    }
}

impl TransitionKernel for McmcKernel {
    fn one_step<T: LogDensity + ?Sized, R: Rng>(
        &self,
        target: &T,
        current: &ChainState,
        rng: &mut R,
    ) -> StepOutcome {
        match self {
            McmcKernel::RandomWalk(k) => k.one_step(target, current, rng),
            McmcKernel::Hamiltonian(k) => k.one_step(target, current, rng),
        }
    }

    fn step_size(&self) -> f64 {
        match self {
            McmcKernel::RandomWalk(k) => k.step_size(),
            McmcKernel::Hamiltonian(k) => k.step_size(),
        }
    }

    fn set_step_size(&mut self, step_size: f64) {
        match self {
            McmcKernel::RandomWalk(k) => k.set_step_size(step_size),
            McmcKernel::Hamiltonian(k) => k.set_step_size(step_size),
        }
    }
}

/// Multiplicative step size adaptation applied during burn-in:
/// the step size grows by `1 + adaptation_rate` after an acceptance probability
/// above the target and shrinks by the same factor otherwise.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct SimpleStepSizeAdaptation {
    /// Number of burn-in steps during which the step size is adapted
    pub num_adaptation_steps: usize,
    /// Acceptance probability aimed at
    pub target_accept_prob: f64,
    /// Relative step size change
    pub adaptation_rate: f64,
}

impl SimpleStepSizeAdaptation {
    /// Constructor with default target probability (0.75) and rate (0.01)
    pub fn new(num_adaptation_steps: usize) -> Self {
        SimpleStepSizeAdaptation {
            num_adaptation_steps,
            target_accept_prob: 0.75,
            adaptation_rate: 0.01,
        }
    }

    /// Set the acceptance probability aimed at
    pub fn target_accept_prob(mut self, target_accept_prob: f64) -> Self {
        self.target_accept_prob = target_accept_prob;
        self
    }

    /// Set the relative step size change
    pub fn adaptation_rate(mut self, adaptation_rate: f64) -> Self {
        self.adaptation_rate = adaptation_rate;
        self
    }

    /// Step size update given the log acceptance ratio of the last transition
    pub fn adapt(&self, step_size: f64, log_accept_ratio: f64) -> f64 {
        let accept_prob = if log_accept_ratio.is_nan() {
            0.
        } else {
            log_accept_ratio.min(0.).exp()
        };
        if accept_prob > self.target_accept_prob {
            step_size * (1. + self.adaptation_rate)
        } else {
            step_size / (1. + self.adaptation_rate)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::{Normal, Uniform};
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use ndarray_rand::rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn test_metropolis_rule() {
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        assert!(metropolis_accept(-1., 0., &mut rng).0);
        assert!(!metropolis_accept(0., f64::NAN, &mut rng).0);
        assert!(!metropolis_accept(0., f64::NEG_INFINITY, &mut rng).0);
        assert!(metropolis_accept(f64::NEG_INFINITY, -1e6, &mut rng).0);
        assert!(!metropolis_accept(0., -1e3, &mut rng).0);
    }

    #[test]
    fn test_rwm_stays_in_support() {
        let prior = Uniform::new(array![0., 0.], array![1., 1.]).unwrap();
        let kernel = RandomWalkMetropolis::new(0.5);
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let mut state = ChainState::new(&prior, array![0.5, 0.5]);
        for _ in 0..200 {
            state = kernel.one_step(&prior, &state, &mut rng).state;
            assert!(prior.contains(&state.position.view()));
            assert_eq!(0., state.log_prob);
        }
    }

    #[test]
    fn test_hmc_step_on_normal() {
        let target = Normal::new(array![0., 0.], array![1., 1.]).unwrap();
        let kernel = HamiltonianMonteCarlo::new(0.2, 5);
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let mut state = ChainState::new(&target, array![3., -3.]);
        let mut n_accepted = 0;
        for _ in 0..100 {
            let outcome = kernel.one_step(&target, &state, &mut rng);
            if outcome.accepted {
                n_accepted += 1;
            }
            state = outcome.state;
        }
        // exact gradients keep the energy error small
        assert!(n_accepted > 80);
        assert!(state.position.iter().all(|v| v.abs() < 4.));
    }

    #[test]
    fn test_step_size_adaptation() {
        let adaptation = SimpleStepSizeAdaptation::new(10);
        assert_abs_diff_eq!(adaptation.adapt(1., 0.), 1.01, epsilon = 1e-12);
        assert_abs_diff_eq!(adaptation.adapt(1., -10.), 1. / 1.01, epsilon = 1e-12);
        assert_abs_diff_eq!(adaptation.adapt(1., f64::NAN), 1. / 1.01, epsilon = 1e-12);

        let mut kernel = McmcKernel::Hamiltonian(HamiltonianMonteCarlo::default());
        kernel.set_step_size(0.3);
        assert_eq!(0.3, kernel.step_size());
    }
}
