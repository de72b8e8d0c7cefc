//! Learn-time orchestration: classify, synthesize, describe.

use chrono::Utc;
use tabulax_model::{ExampleSet, Transformation, TransformationCategory};
use tabulax_resolve::ValueResolver;
use tracing::{info, warn};

use crate::classify::{Classification, Classifier};
use crate::dialect::Program;
use crate::error::SynthesisError;

/// Output of synthesis for one category.
#[derive(Debug, Clone, PartialEq)]
pub enum Synthesized {
    /// Verified program for a deterministic category.
    Code(Program),
    /// Relationship description for `General`, absent if the resolver failed.
    Description(Option<String>),
}

/// Synthesizes logic for an already chosen category.
///
/// Deterministic categories yield a program reproducing every example, or
/// [`SynthesisError::NoProgram`]. `General` asks the resolver for a
/// description once over the full example set.
pub fn synthesize(
    classifier: &Classifier,
    category: TransformationCategory,
    examples: &ExampleSet,
    resolver: &dyn ValueResolver,
) -> Result<Synthesized, SynthesisError> {
    if category == TransformationCategory::General {
        return Ok(Synthesized::Description(describe(examples, resolver)));
    }
    classifier
        .program_for(category, examples)
        .map(Synthesized::Code)
        .ok_or(SynthesisError::NoProgram { category })
}

/// Asks the resolver to describe the examples.
///
/// Failures are logged and yield `None`; learning still succeeds.
pub fn describe(examples: &ExampleSet, resolver: &dyn ValueResolver) -> Option<String> {
    match resolver.describe(examples.as_slice()) {
        Ok(description) if !description.trim().is_empty() => Some(description.trim().to_string()),
        Ok(_) => {
            warn!("resolver returned an empty description");
            None
        }
        Err(err) => {
            warn!(error = %err, "could not describe General transformation, storing none");
            None
        }
    }
}

/// Everything learned from one example set.
#[derive(Debug, Clone, PartialEq)]
pub struct LearnedTransformation {
    pub category: TransformationCategory,
    pub code: Option<String>,
    pub description: Option<String>,
    pub examples: ExampleSet,
}

impl LearnedTransformation {
    /// Builds the persistable record.
    pub fn into_record(
        self,
        id: impl Into<String>,
        name: impl Into<String>,
        owner: Option<String>,
    ) -> Transformation {
        Transformation {
            id: id.into(),
            name: name.into(),
            description: self.description,
            category: self.category,
            code: self.code,
            source_examples: self.examples.sources().map(str::to_string).collect(),
            target_examples: self.examples.targets().map(str::to_string).collect(),
            owner,
            created_at: Some(Utc::now()),
        }
    }
}

/// Learns a transformation with the default search budget.
pub fn learn(examples: &ExampleSet, resolver: &dyn ValueResolver) -> LearnedTransformation {
    learn_with(&Classifier::default(), examples, resolver)
}

/// Classifies the examples and attaches code or a description.
///
/// When no deterministic program reproduces every example the result is
/// `General`; code is never kept unless it reproduces all of them.
pub fn learn_with(
    classifier: &Classifier,
    examples: &ExampleSet,
    resolver: &dyn ValueResolver,
) -> LearnedTransformation {
    let Classification { category, program } = classifier.classify_with_program(examples);
    let learned = match program {
        Some(program) => LearnedTransformation {
            category,
            code: Some(program.code()),
            description: None,
            examples: examples.clone(),
        },
        None => {
            warn!(
                examples = examples.len(),
                "no deterministic program reproduces the examples, using General"
            );
            LearnedTransformation {
                category: TransformationCategory::General,
                code: None,
                description: describe(examples, resolver),
                examples: examples.clone(),
            }
        }
    };
    info!(
        category = %learned.category,
        examples = examples.len(),
        has_code = learned.code.is_some(),
        has_description = learned.description.is_some(),
        "transformation learned"
    );
    learned
}
