//! Transformation classification.
//!
//! Rules are tried in precedence order and the first one that produces a
//! verified program wins:
//!
//! 1. `Numerical`: every value parses and a fitted function reproduces every target
//! 2. `StringBased`: a concatenation of string primitives reproduces every target
//! 3. `Algorithmic`: the same search with closed-form procedures added
//! 4. `General`: fallback
//!
//! Classification never fails and is deterministic.

use tabulax_model::{ExampleSet, ModelError, TransformationCategory};
use tracing::debug;

use crate::dialect::Program;
use crate::numeric::fit_numeric;
use crate::search::{AtomLibrary, SearchBudget, search_program};

/// Category assigned to an example set, with the program that proves it.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: TransformationCategory,
    /// Present for every category except `General`.
    pub program: Option<Program>,
}

impl Classification {
    fn general() -> Self {
        Self {
            category: TransformationCategory::General,
            program: None,
        }
    }

    /// Program source text, if any.
    pub fn code(&self) -> Option<String> {
        self.program.as_ref().map(Program::code)
    }
}

/// Classifies example sets within a search budget.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    budget: SearchBudget,
}

impl Classifier {
    pub fn new(budget: SearchBudget) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> &SearchBudget {
        &self.budget
    }

    pub fn classify(&self, examples: &ExampleSet) -> TransformationCategory {
        self.classify_with_program(examples).category
    }

    /// Classifies and returns the verified program in one pass.
    pub fn classify_with_program(&self, examples: &ExampleSet) -> Classification {
        if let Some(program) = fit_numeric(examples) {
            return self.accept(TransformationCategory::Numerical, program);
        }
        debug!(examples = examples.len(), "numerical rule did not match");

        if let Some(program) = search_program(examples, AtomLibrary::String, &self.budget) {
            return self.accept(TransformationCategory::StringBased, program);
        }
        debug!(examples = examples.len(), "string rule did not match");

        if let Some(program) = search_program(examples, AtomLibrary::Algorithmic, &self.budget) {
            return self.accept(TransformationCategory::Algorithmic, program);
        }
        debug!(
            examples = examples.len(),
            "algorithmic rule did not match, falling back to General"
        );

        Classification::general()
    }

    /// Runs the synthesis step for one deterministic category.
    pub fn program_for(
        &self,
        category: TransformationCategory,
        examples: &ExampleSet,
    ) -> Option<Program> {
        match category {
            TransformationCategory::Numerical => fit_numeric(examples),
            TransformationCategory::StringBased => {
                search_program(examples, AtomLibrary::String, &self.budget)
            }
            TransformationCategory::Algorithmic => {
                search_program(examples, AtomLibrary::Algorithmic, &self.budget)
            }
            TransformationCategory::General => None,
        }
    }

    fn accept(&self, category: TransformationCategory, program: Program) -> Classification {
        debug!(%category, code = %program, "classification rule matched");
        Classification {
            category,
            program: Some(program),
        }
    }
}

/// Classifies two aligned value columns with the default budget.
///
/// Columns of different length, or empty columns, are caller errors.
pub fn classify<S, T>(
    source_values: Vec<S>,
    target_values: Vec<T>,
) -> Result<Classification, ModelError>
where
    S: Into<String>,
    T: Into<String>,
{
    let examples = ExampleSet::from_columns(source_values, target_values)?;
    Ok(Classifier::default().classify_with_program(&examples))
}
