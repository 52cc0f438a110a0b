use crate::distributions::LogDensity;
use crate::errors::{McmcError, Result};
use crate::kernels::{ChainState, SimpleStepSizeAdaptation, TransitionKernel};
use ndarray::{Array1, Array2};
use ndarray_rand::rand::Rng;

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Parameters of a chain run
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct ChainParams {
    /// Number of states to collect
    pub num_results: usize,
    /// Number of transitions discarded before collecting states
    pub num_burnin_steps: usize,
    /// Number of transitions discarded between two collected states
    pub num_steps_between_results: usize,
    /// Step size adaptation during burn-in if any
    pub adaptation: Option<SimpleStepSizeAdaptation>,
}

impl ChainParams {
    /// Collect `num_results` states, no burn-in, no thinning, no adaptation
    pub fn new(num_results: usize) -> Self {
        ChainParams {
            num_results,
            num_burnin_steps: 0,
            num_steps_between_results: 0,
            adaptation: None,
        }
    }

    /// Set the number of burn-in transitions
    pub fn num_burnin_steps(mut self, num_burnin_steps: usize) -> Self {
        self.num_burnin_steps = num_burnin_steps;
        self
    }

    /// Set the thinning
    pub fn num_steps_between_results(mut self, num_steps_between_results: usize) -> Self {
        self.num_steps_between_results = num_steps_between_results;
        self
    }

    /// Set the step size adaptation
    pub fn adaptation(mut self, adaptation: Option<SimpleStepSizeAdaptation>) -> Self {
        self.adaptation = adaptation;
        self
    }
}

/// States collected along a chain
#[derive(Clone, Debug)]
pub struct Trace {
    /// (num_results, dim) collected states
    pub states: Array2<f64>,
    /// Target log density of the collected states
    pub log_probs: Array1<f64>,
    /// Whether the transition leading to each collected state was accepted
    pub is_accepted: Vec<bool>,
    /// Step size at the end of the run
    pub step_size: f64,
}

impl Trace {
    /// Ratio of accepted transitions among the collected ones
    pub fn acceptance_rate(&self) -> f64 {
        if self.is_accepted.is_empty() {
            0.
        } else {
            self.is_accepted.iter().filter(|a| **a).count() as f64 / self.is_accepted.len() as f64
        }
    }
}

/// Run a Markov chain on `target` starting from `initial_state`.
///
/// `num_burnin_steps` transitions are discarded (the kernel step size being tuned
/// by the adaptation if any) then `num_results` states are collected,
/// `num_steps_between_results` transitions being skipped between two of them.
pub fn sample_chain<T, K, R>(
    params: &ChainParams,
    kernel: &mut K,
    initial_state: &Array1<f64>,
    target: &T,
    rng: &mut R,
) -> Result<Trace>
where
    T: LogDensity + ?Sized,
    K: TransitionKernel,
    R: Rng,
{
    if initial_state.len() != target.dim() {
        return Err(McmcError::DimensionError {
            expected: target.dim(),
            got: initial_state.len(),
        });
    }
    let mut state = ChainState::new(target, initial_state.to_owned());
    if state.log_prob.is_nan() {
        return Err(McmcError::InvalidValueError(format!(
            "Target log density is NaN at initial state {initial_state}"
        )));
    }
    if state.log_prob == f64::NEG_INFINITY {
        log::warn!("Initial state {initial_state} has zero probability");
    }

    let mut n_burnin_accepted = 0;
    for i in 0..params.num_burnin_steps {
        let outcome = kernel.one_step(target, &state, rng);
        if outcome.accepted {
            n_burnin_accepted += 1;
        }
        if let Some(adaptation) = &params.adaptation {
            if i < adaptation.num_adaptation_steps {
                let step_size = adaptation.adapt(kernel.step_size(), outcome.log_accept_ratio);
                kernel.set_step_size(step_size);
            }
        }
        state = outcome.state;
    }
    if params.num_burnin_steps > 0 {
        log::debug!(
            "Burn-in done: {} steps, acceptance rate {:.3}, step size {}",
            params.num_burnin_steps,
            n_burnin_accepted as f64 / params.num_burnin_steps as f64,
            kernel.step_size()
        );
    }

    let dim = initial_state.len();
    let mut states = Array2::zeros((params.num_results, dim));
    let mut log_probs = Array1::zeros(params.num_results);
    let mut is_accepted = Vec::with_capacity(params.num_results);
    for i in 0..params.num_results {
        for _ in 0..params.num_steps_between_results {
            state = kernel.one_step(target, &state, rng).state;
        }
        let outcome = kernel.one_step(target, &state, rng);
        is_accepted.push(outcome.accepted);
        state = outcome.state;
        states.row_mut(i).assign(&state.position);
        log_probs[i] = state.log_prob;
    }

    let trace = Trace {
        states,
        log_probs,
        is_accepted,
        step_size: kernel.step_size(),
    };
    log::info!(
        "Chain sampled {} states, acceptance rate {:.3}",
        params.num_results,
        trace.acceptance_rate()
    );
    Ok(trace)
}
