//! Darwinian operators over flat programs.
//!
//! Both operators are blind: they know the instruction alphabet but nothing
//! about program meaning or fitness. Neither ever emits the end-of-program
//! symbol, so any breeding chain keeps producing executable programs.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::machine::{Symbol, INSTRUCTIONS};

/// Per-position probabilities for the three point mutations.
///
/// At each position the checks run in a fixed order (delete, then insert,
/// then substitute), so at most one mutation applies per position per pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationRates {
    pub delete: f64,
    pub insert: f64,
    pub substitute: f64,
}

impl Default for MutationRates {
    fn default() -> Self {
        Self {
            delete: 0.1,
            insert: 0.1,
            substitute: 0.1,
        }
    }
}

/// Uniform draw from the eight non-halt instruction symbols.
pub fn random_instruction(rng: &mut StdRng) -> Symbol {
    INSTRUCTIONS[rng.random_range(0..INSTRUCTIONS.len())]
}

/// One mutation pass over `program`.
///
/// Scans every position plus one trailing slot, so material can be appended
/// as well as dropped or replaced; an insert does not consume the position,
/// which allows several inserts at the same site. The result can be longer
/// or shorter than the input without bound.
pub fn mutate(program: &[Symbol], rates: &MutationRates, rng: &mut StdRng) -> Vec<Symbol> {
    let mut child = Vec::with_capacity(program.len() + 4);
    let mut pos = 0;
    while pos <= program.len() {
        if rng.random::<f64>() < rates.delete {
            pos += 1;
        } else if rng.random::<f64>() < rates.insert {
            child.push(random_instruction(rng));
        } else if rng.random::<f64>() < rates.substitute {
            child.push(random_instruction(rng));
            pos += 1;
        } else {
            if pos < program.len() {
                child.push(program[pos]);
            }
            pos += 1;
        }
    }
    child
}

/// Two-point crossover: a prefix of `a`, a mid-section of `b`, a suffix of
/// `a`. An empty parent yields a copy of the other, so breeding never gets
/// stuck on degenerate inputs.
pub fn crossover(a: &[Symbol], b: &[Symbol], rng: &mut StdRng) -> Vec<Symbol> {
    if a.is_empty() {
        return b.to_vec();
    }
    if b.is_empty() {
        return a.to_vec();
    }
    let (a_start, a_end) = ordered_cuts(a.len(), rng);
    let (b_start, b_end) = ordered_cuts(b.len(), rng);
    let mut child = Vec::with_capacity(a_start + (b_end - b_start) + (a.len() - a_end));
    child.extend_from_slice(&a[..a_start]);
    child.extend_from_slice(&b[b_start..b_end]);
    child.extend_from_slice(&a[a_end..]);
    child
}

/// Two independent cut points in `0..len`, low one first.
fn ordered_cuts(len: usize, rng: &mut StdRng) -> (usize, usize) {
    let x = rng.random_range(0..len);
    let y = rng.random_range(0..len);
    (x.min(y), x.max(y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::parse_program;
    use rand::SeedableRng;

    #[test]
    fn test_crossover_with_empty_parents() {
        let mut rng = StdRng::seed_from_u64(0);
        let a = parse_program("+.+.").unwrap();
        assert_eq!(crossover(&[], &a, &mut rng), a);
        assert_eq!(crossover(&a, &[], &mut rng), a);
        assert_eq!(crossover(&[], &[], &mut rng), Vec::new());
    }

    #[test]
    fn test_crossover_draws_only_from_parents() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = parse_program(">>><<<").unwrap();
        let b = parse_program("+++---").unwrap();
        for _ in 0..100 {
            let child = crossover(&a, &b, &mut rng);
            for symbol in child {
                assert!(
                    a.contains(&symbol) || b.contains(&symbol),
                    "child symbol {:?} must come from a parent",
                    symbol
                );
            }
        }
    }

    #[test]
    fn test_mutate_with_zero_rates_is_identity() {
        let mut rng = StdRng::seed_from_u64(5);
        let rates = MutationRates {
            delete: 0.0,
            insert: 0.0,
            substitute: 0.0,
        };
        let program = parse_program("+[->.<]").unwrap();
        assert_eq!(mutate(&program, &rates, &mut rng), program);
    }

    #[test]
    fn test_mutate_with_certain_deletion_empties() {
        let mut rng = StdRng::seed_from_u64(5);
        let rates = MutationRates {
            delete: 1.0,
            insert: 0.0,
            substitute: 0.0,
        };
        let program = parse_program("+[->.<]").unwrap();
        assert!(mutate(&program, &rates, &mut rng).is_empty());
    }

    #[test]
    fn test_mutate_with_certain_substitution() {
        let mut rng = StdRng::seed_from_u64(11);
        let rates = MutationRates {
            delete: 0.0,
            insert: 0.0,
            substitute: 1.0,
        };
        let program = parse_program("++++").unwrap();
        let child = mutate(&program, &rates, &mut rng);
        // Every position is replaced, and the trailing slot contributes one
        // extra symbol.
        assert_eq!(child.len(), program.len() + 1);
        for symbol in child {
            assert!(INSTRUCTIONS.contains(&symbol));
        }
    }

    #[test]
    fn test_mutate_never_emits_end_marker() {
        let mut rng = StdRng::seed_from_u64(77);
        let rates = MutationRates::default();
        let mut program = parse_program("+.+.+.").unwrap();
        for _ in 0..200 {
            program = mutate(&program, &rates, &mut rng);
            assert!(
                !program.contains(&Symbol::End),
                "operators must stay inside the instruction alphabet"
            );
        }
    }
}
