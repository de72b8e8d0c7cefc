//! Depth-first concatenation search.
//!
//! A program is a concatenation of segments. Each segment is either an atom
//! (an expression over `input`) or a literal shared by every example. The
//! search state is the vector of offsets reached in each example's target;
//! states proven to be dead ends are memoized.
//!
//! At each state, candidate steps are tried in this order:
//!
//! 1. a literal run of punctuation or whitespace common to every remaining
//!    target, longest first;
//! 2. atoms that are a prefix of every remaining target, longest total match
//!    first, earlier (simpler) atoms first on ties;
//! 3. any other common literal prefix, shortest first.

use std::collections::HashSet;

use tabulax_model::ExampleSet;
use tracing::debug;

use crate::atoms::{algorithmic_atoms, string_atoms};
use crate::dialect::{Expr, Program};

/// Limits on the concatenation search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget {
    /// Search states expanded before giving up.
    pub max_expansions: usize,
    /// Longest literal segment considered.
    pub max_literal_len: usize,
    /// Largest token index and slice position generated.
    pub max_slice_position: usize,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_expansions: 50_000,
            max_literal_len: 32,
            max_slice_position: 16,
        }
    }
}

/// Which atoms the search may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomLibrary {
    /// String primitives only.
    String,
    /// String primitives plus closed-form procedures.
    Algorithmic,
}

/// Searches for a concatenation program reproducing every example.
pub fn search_program(
    examples: &ExampleSet,
    library: AtomLibrary,
    budget: &SearchBudget,
) -> Option<Program> {
    let sources: Vec<&str> = examples.sources().collect();
    let targets: Vec<&str> = examples.targets().collect();

    let mut candidates = string_atoms(&sources, &targets, budget);
    if library == AtomLibrary::Algorithmic {
        candidates.extend(algorithmic_atoms(&sources));
    }
    let target_chars: Vec<Vec<char>> = targets.iter().map(|t| t.chars().collect()).collect();
    let atoms = evaluate_atoms(candidates, &sources, &targets);

    let mut search = Search {
        targets: &target_chars,
        atoms: &atoms,
        budget,
        expansions: 0,
        exhausted: false,
        dead_ends: HashSet::new(),
    };
    let start = vec![0; target_chars.len()];
    let mut steps = Vec::new();
    let found = search.visit(&start, &mut steps);
    debug!(
        ?library,
        atoms = atoms.len(),
        expansions = search.expansions,
        exhausted = search.exhausted,
        found,
        "concatenation search finished"
    );
    if !found {
        return None;
    }

    let expr = assemble(&steps, &atoms);
    if examples.len() < 2 && matches!(expr, Expr::Text(_)) {
        debug!("constant program from a single example rejected");
        return None;
    }
    let program = Program::new(expr);
    program
        .reproduces(examples.iter().map(|e| (e.source.as_str(), e.target.as_str())))
        .then_some(program)
}

struct Atom {
    expr: Expr,
    outputs: Vec<Vec<char>>,
}

/// Evaluates every candidate on every source, keeping the first atom for
/// each distinct output vector.
///
/// Atoms that fail on any source, produce nothing, or produce text absent
/// from a target can never be a segment and are dropped.
fn evaluate_atoms(candidates: Vec<Expr>, sources: &[&str], targets: &[&str]) -> Vec<Atom> {
    let mut seen = HashSet::new();
    let mut atoms = Vec::new();
    for expr in candidates {
        let Ok(outputs) = sources
            .iter()
            .map(|source| expr.eval_text(source))
            .collect::<Result<Vec<String>, _>>()
        else {
            continue;
        };
        if outputs.iter().all(String::is_empty) {
            continue;
        }
        if outputs
            .iter()
            .zip(targets)
            .any(|(output, target)| !target.contains(output.as_str()))
        {
            continue;
        }
        if !seen.insert(outputs.clone()) {
            continue;
        }
        atoms.push(Atom {
            expr,
            outputs: outputs.iter().map(|o| o.chars().collect()).collect(),
        });
    }
    atoms
}

#[derive(Debug, Clone)]
enum Step {
    Atom(usize),
    Literal(String),
}

struct Search<'a> {
    targets: &'a [Vec<char>],
    atoms: &'a [Atom],
    budget: &'a SearchBudget,
    expansions: usize,
    exhausted: bool,
    dead_ends: HashSet<Vec<usize>>,
}

impl Search<'_> {
    fn visit(&mut self, offsets: &[usize], steps: &mut Vec<Step>) -> bool {
        if offsets
            .iter()
            .zip(self.targets)
            .all(|(&offset, target)| offset == target.len())
        {
            return true;
        }
        if self.exhausted || self.dead_ends.contains(offsets) {
            return false;
        }
        self.expansions += 1;
        if self.expansions > self.budget.max_expansions {
            self.exhausted = true;
            return false;
        }

        for (step, next) in self.candidate_steps(offsets) {
            steps.push(step);
            if self.visit(&next, steps) {
                return true;
            }
            steps.pop();
            if self.exhausted {
                return false;
            }
        }
        self.dead_ends.insert(offsets.to_vec());
        false
    }

    fn candidate_steps(&self, offsets: &[usize]) -> Vec<(Step, Vec<usize>)> {
        let common = self.common_prefix(offsets);
        let punctuation = common
            .iter()
            .take_while(|ch| !ch.is_alphanumeric())
            .count();

        let literal = |len: usize| {
            let text: String = common[..len].iter().collect();
            let next: Vec<usize> = offsets.iter().map(|offset| offset + len).collect();
            (Step::Literal(text), next)
        };

        let mut steps: Vec<(Step, Vec<usize>)> = (1..=punctuation).rev().map(literal).collect();

        let mut matches: Vec<(usize, usize, Vec<usize>)> = Vec::new();
        for (index, atom) in self.atoms.iter().enumerate() {
            if let Some(next) = self.advance(atom, offsets) {
                let gained: usize = next.iter().zip(offsets).map(|(n, o)| n - o).sum();
                if gained > 0 {
                    matches.push((gained, index, next));
                }
            }
        }
        matches.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        steps.extend(
            matches
                .into_iter()
                .map(|(_, index, next)| (Step::Atom(index), next)),
        );

        steps.extend(((punctuation + 1)..=common.len()).map(literal));
        steps
    }

    /// Offsets after appending the atom.
    ///
    /// Every unfinished example must advance by a non-empty prefix of its
    /// remaining target; finished examples must get empty output.
    fn advance(&self, atom: &Atom, offsets: &[usize]) -> Option<Vec<usize>> {
        offsets
            .iter()
            .zip(self.targets)
            .zip(&atom.outputs)
            .map(|((&offset, target), output)| {
                let rest = &target[offset..];
                let fits = if rest.is_empty() {
                    output.is_empty()
                } else {
                    !output.is_empty() && rest.starts_with(output)
                };
                fits.then_some(offset + output.len())
            })
            .collect()
    }

    /// Longest literal shared by the remaining part of every target, capped
    /// at the literal budget.
    fn common_prefix(&self, offsets: &[usize]) -> Vec<char> {
        let mut remaining = offsets
            .iter()
            .zip(self.targets)
            .map(|(&offset, target)| &target[offset..]);
        let Some(first) = remaining.next() else {
            return Vec::new();
        };
        let mut len = first.len().min(self.budget.max_literal_len);
        for rest in remaining {
            len = first[..len]
                .iter()
                .zip(rest)
                .take_while(|(a, b)| a == b)
                .count();
        }
        first[..len].to_vec()
    }
}

/// Builds the program expression, merging adjacent literals.
fn assemble(steps: &[Step], atoms: &[Atom]) -> Expr {
    let mut parts: Vec<Expr> = Vec::new();
    for step in steps {
        match step {
            Step::Atom(index) => parts.push(atoms[*index].expr.clone()),
            Step::Literal(text) => match parts.last_mut() {
                Some(Expr::Text(previous)) => previous.push_str(text),
                _ => parts.push(Expr::Text(text.clone())),
            },
        }
    }
    match parts.len() {
        0 => Expr::text(""),
        1 => parts.remove(0),
        _ => Expr::Concat(parts),
    }
}
