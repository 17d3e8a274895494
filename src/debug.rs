/*
 * Debug Information Module
 *
 * This module defines the StepStats struct that summarizes one simulation
 * step for logging and for the viewer's diagnostics panel.
 *
 * Includes metrics for:
 * - Agents indexed and agents outside the grid
 * - Neighbor candidates handed to the flocking rules
 * - Obstacle probing and avoidance outcomes
 * - Wall-clock time spent in the step
 */

use std::time::Duration;

use crate::boid::Avoidance;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepStats {
    pub frame: u64,
    pub agents: usize,
    pub out_of_bounds: usize,
    pub candidate_pairs: usize,
    pub probing_agents: usize,
    pub escaping_agents: usize,
    pub boxed_in_agents: usize,
    pub elapsed: Duration,
}

impl StepStats {
    // Per-agent contribution from one steering pass
    pub(crate) fn for_agent(candidates: usize, avoidance: Avoidance) -> Self {
        Self {
            agents: 1,
            candidate_pairs: candidates,
            probing_agents: usize::from(avoidance != Avoidance::Skipped),
            escaping_agents: usize::from(avoidance == Avoidance::Escaped),
            boxed_in_agents: usize::from(avoidance == Avoidance::BoxedIn),
            ..Self::default()
        }
    }

    // Sum the counters of two partial tallies
    pub(crate) fn merge(self, other: Self) -> Self {
        Self {
            frame: self.frame.max(other.frame),
            agents: self.agents + other.agents,
            out_of_bounds: self.out_of_bounds + other.out_of_bounds,
            candidate_pairs: self.candidate_pairs + other.candidate_pairs,
            probing_agents: self.probing_agents + other.probing_agents,
            escaping_agents: self.escaping_agents + other.escaping_agents,
            boxed_in_agents: self.boxed_in_agents + other.boxed_in_agents,
            elapsed: self.elapsed + other.elapsed,
        }
    }

    pub fn avoiding_agents(&self) -> usize {
        self.escaping_agents + self.boxed_in_agents
    }

    pub fn mean_candidates(&self) -> f32 {
        if self.agents == 0 {
            0.0
        } else {
            self.candidate_pairs as f32 / self.agents as f32
        }
    }
}
