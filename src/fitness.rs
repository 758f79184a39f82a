//! Bounded program evaluation and target scoring.
//!
//! A candidate runs on a fresh machine for at most `max_steps` steps; a run
//! that exhausts the bound is treated as non-terminating and ranks last.
//! Distance to the target is the sum of absolute differences over the
//! overlapping positions plus the length delta, so 0 is a perfect match.
//!
//! Note: the one-call `fitness` wrapper is kept for callers that do not need
//! step accounting, even though the search drives `evaluate`/`score` itself.

#![allow(dead_code)]

use crate::machine::{Machine, Symbol};

/// Fitness assigned to programs that fail to halt within the step bound.
pub const WORST: u64 = u64::MAX;

/// Outcome of one bounded run: the output tape if the program halted, and
/// how many machine steps were consumed either way.
#[derive(Clone, Debug)]
pub struct EvalResult {
    pub output: Option<Vec<u8>>,
    pub steps: usize,
}

/// Run `program` on a fresh machine for at most `max_steps` steps.
///
/// The end-of-program symbol is appended here, so candidates never carry it
/// themselves. `seed` drives the machine's tape self-extension.
pub fn evaluate(program: &[Symbol], max_steps: usize, seed: u64) -> EvalResult {
    let mut code = Vec::with_capacity(program.len() + 1);
    code.extend_from_slice(program);
    code.push(Symbol::End);
    let mut machine = Machine::new(code, Vec::new(), seed);
    for step in 1..=max_steps {
        if !machine.step() {
            return EvalResult {
                output: Some(machine.into_output()),
                steps: step,
            };
        }
    }
    EvalResult {
        output: None,
        steps: max_steps,
    }
}

/// Distance between an output and the target; `WORST` when the program
/// never halted. An empty output from a halting program is a valid result
/// and scores the pure length penalty.
pub fn score(output: Option<&[u8]>, target: &[u8]) -> u64 {
    match output {
        Some(out) => {
            let overlap: u64 = out
                .iter()
                .zip(target)
                .map(|(&o, &t)| u64::from(o.abs_diff(t)))
                .sum();
            overlap + out.len().abs_diff(target.len()) as u64
        }
        None => WORST,
    }
}

/// Evaluate then score in one call.
pub fn fitness(program: &[Symbol], target: &[u8], max_steps: usize, seed: u64) -> u64 {
    let result = evaluate(program, max_steps, seed);
    score(result.output.as_deref(), target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::parse_program;

    #[test]
    fn test_empty_program_scores_target_length() {
        let result = evaluate(&[], 10, 0);
        assert_eq!(result.output, Some(Vec::new()), "empty program halts at once");
        assert_eq!(fitness(&[], &[0, 1, 2], 10, 0), 3);
    }

    #[test]
    fn test_count_up_program_is_perfect() {
        let program = parse_program("+.+.+.").unwrap();
        let result = evaluate(&program, 20, 0);
        assert_eq!(result.output, Some(vec![1, 2, 3]));
        assert!(result.steps <= 10, "must halt well inside a small bound");
        assert_eq!(fitness(&program, &[1, 2, 3], 20, 0), 0);
    }

    #[test]
    fn test_step_bound_exhaustion_ranks_worst() {
        let program = vec![Symbol::Inc; 50];
        let result = evaluate(&program, 10, 0);
        assert_eq!(result.output, None);
        assert_eq!(result.steps, 10);
        assert_eq!(fitness(&program, &[1], 10, 0), WORST);
    }

    #[test]
    fn test_score_sums_overlap_and_length_delta() {
        // Output [0] against target [5]: one overlapping position, no
        // length penalty.
        assert_eq!(score(Some(&[0]), &[5]), 5);
        // Output [0] against target [0, 1]: perfect overlap, one missing
        // position.
        assert_eq!(score(Some(&[0]), &[0, 1]), 1);
        // Extra output counts the same way.
        assert_eq!(score(Some(&[0, 1, 9]), &[0, 1]), 1);
        assert_eq!(score(Some(&[]), &[]), 0);
    }
}
