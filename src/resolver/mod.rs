//! Compilation-order resolver.
//!
//! Runs every entity's generated source through a [`Verifier`], passing the
//! sources verified so far as context. The pending list is seeded with a
//! dependency-first order; when the verifier still rejects the head of the
//! list (reference cycles), the list is reshuffled and retried. More than N²
//! failed attempts, or a failure of the last pending entity, aborts the run.

pub mod graph;
pub mod verifier;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use crate::emit::GeneratedSource;
pub use graph::DependencyGraph;
pub use verifier::{CommandVerifier, StructuralVerifier, Verifier, VerifierKind, VerifyError};

use crate::schema::SchemaModel;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Generated source of '{entity}' failed verification: {message}")]
    VerificationFailed { entity: String, message: String },

    #[error("Gave up after {attempts} failed verification attempts (budget {budget})")]
    AttemptBudgetExhausted { attempts: usize, budget: usize },
}

/// How the pending list is seeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStrategy {
    /// Dependencies first, cycle members last
    #[default]
    Topological,
    /// Input order
    Shuffle,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub strategy: OrderStrategy,
    /// Seed for the reshuffle RNG. Entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Verified sources, in input order
    pub sources: Vec<GeneratedSource>,
    /// Entity names in the order they verified
    pub verification_order: Vec<String>,
    pub failed_attempts: usize,
}

pub struct CompilationOrderResolver {
    config: ResolverConfig,
}

impl CompilationOrderResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Verify `sources`, which must be the model's entities in input order.
    pub fn resolve<V: Verifier>(
        &self,
        model: &SchemaModel,
        sources: Vec<GeneratedSource>,
        verifier: &V,
    ) -> Result<Resolution, ResolveError> {
        let n = sources.len();
        let budget = n * n;
        let mut pending = self.seed(model, n);
        let mut verified: Vec<usize> = Vec::with_capacity(n);
        let mut failed_attempts = 0;
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        while let Some(&candidate) = pending.first() {
            let context: Vec<&GeneratedSource> = verified.iter().map(|&i| &sources[i]).collect();
            let entity = &sources[candidate].entity;

            match verifier.verify(&sources[candidate], &context) {
                Ok(()) => {
                    debug!(entity = %entity, context = context.len(), "verified");
                    pending.remove(0);
                    verified.push(candidate);
                }
                Err(err) => {
                    failed_attempts += 1;
                    debug!(entity = %entity, attempt = failed_attempts, error = %err, "verification failed");

                    if pending.len() == 1 {
                        return Err(ResolveError::VerificationFailed {
                            entity: entity.clone(),
                            message: err.message,
                        });
                    }
                    if failed_attempts > budget {
                        return Err(ResolveError::AttemptBudgetExhausted {
                            attempts: failed_attempts,
                            budget,
                        });
                    }
                    reshuffle(&mut pending, &mut rng);
                    debug!(head = %sources[pending[0]].entity, "reshuffled pending entities");
                }
            }
        }

        let verification_order = verified.iter().map(|&i| sources[i].entity.clone()).collect();
        Ok(Resolution {
            sources,
            verification_order,
            failed_attempts,
        })
    }

    fn seed(&self, model: &SchemaModel, n: usize) -> Vec<usize> {
        match self.config.strategy {
            OrderStrategy::Shuffle => (0..n).collect(),
            OrderStrategy::Topological => {
                let graph = DependencyGraph::from_model(model);
                let unordered = graph.unordered();
                if !unordered.is_empty() {
                    let names: Vec<&str> = unordered.iter().map(|&i| graph.name(i)).collect();
                    debug!(entities = ?names, "entities in reference cycles");
                }
                graph.topological_order()
            }
        }
    }
}

/// Shuffle until a different entity is at the head.
fn reshuffle(pending: &mut [usize], rng: &mut StdRng) {
    let head = pending[0];
    while pending[0] == head {
        pending.shuffle(rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::{ObjectSourceEmitter, SourceOptions, Template};
    use crate::schema::input::{EntityDescriptor, NormalizedSchema};
    use crate::schema::ModelOptions;
    use rstest::{fixture, rstest};
    use std::cell::RefCell;

    fn sources(input: &NormalizedSchema) -> (SchemaModel, Vec<GeneratedSource>) {
        let model = SchemaModel::build(input, &ModelOptions::default()).unwrap();
        let template = Template::default();
        let options = SourceOptions::default();
        let sources = ObjectSourceEmitter::new(&template, &options).emit_all(&model).unwrap();
        (model, sources)
    }

    /// A→B→C→A through scalar references.
    #[fixture]
    fn cycle() -> NormalizedSchema {
        NormalizedSchema::new("crate::models")
            .with_entity("A", EntityDescriptor::default().with_field("b", "B"))
            .with_entity("B", EntityDescriptor::default().with_field("c", "C"))
            .with_entity("C", EntityDescriptor::default().with_field("a", "A"))
    }

    #[fixture]
    fn chain() -> NormalizedSchema {
        NormalizedSchema::new("crate::models")
            .with_entity("Contact", EntityDescriptor::default().with_field("phone", "Phone"))
            .with_entity("Phone", EntityDescriptor::default().with_field("number", "string"))
    }

    fn resolver(strategy: OrderStrategy, seed: u64) -> CompilationOrderResolver {
        CompilationOrderResolver::new(ResolverConfig {
            strategy,
            seed: Some(seed),
        })
    }

    /// Rejects every attempt on one entity and records all attempts.
    struct RecordingVerifier {
        reject: Option<&'static str>,
        reject_first: bool,
        attempts: RefCell<Vec<String>>,
    }

    impl RecordingVerifier {
        fn new(reject: Option<&'static str>, reject_first: bool) -> Self {
            Self {
                reject,
                reject_first,
                attempts: RefCell::new(Vec::new()),
            }
        }
    }

    impl Verifier for RecordingVerifier {
        fn verify(
            &self,
            candidate: &GeneratedSource,
            _context: &[&GeneratedSource],
        ) -> Result<(), VerifyError> {
            let mut attempts = self.attempts.borrow_mut();
            attempts.push(candidate.entity.clone());
            if self.reject == Some(candidate.entity.as_str()) || (self.reject_first && attempts.len() == 1) {
                return Err(VerifyError::new("rejected"));
            }
            Ok(())
        }
    }

    #[rstest]
    fn test_mutual_references_resolve(cycle: NormalizedSchema) {
        let (model, sources) = sources(&cycle);
        let resolution = resolver(OrderStrategy::Topological, 7)
            .resolve(&model, sources, &StructuralVerifier::default())
            .unwrap();

        let names: Vec<&str> = resolution.sources.iter().map(|s| s.entity.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(resolution.failed_attempts, 0);
    }

    #[rstest]
    fn test_topological_seed_needs_no_retries(chain: NormalizedSchema) {
        let (model, sources) = sources(&chain);
        let resolution = resolver(OrderStrategy::Topological, 1)
            .resolve(&model, sources, &StructuralVerifier::new(true))
            .unwrap();

        assert_eq!(resolution.verification_order, vec!["Phone", "Contact"]);
        assert_eq!(resolution.failed_attempts, 0);
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(99)]
    fn test_shuffle_recovers_from_forward_reference(chain: NormalizedSchema, #[case] seed: u64) {
        let (model, sources) = sources(&chain);
        let resolution = resolver(OrderStrategy::Shuffle, seed)
            .resolve(&model, sources, &StructuralVerifier::new(true))
            .unwrap();

        assert_eq!(resolution.failed_attempts, 1);
        assert_eq!(resolution.verification_order, vec!["Phone", "Contact"]);
        let names: Vec<&str> = resolution.sources.iter().map(|s| s.entity.as_str()).collect();
        assert_eq!(names, vec!["Contact", "Phone"]);
    }

    #[rstest]
    fn test_output_independent_of_seed(cycle: NormalizedSchema) {
        let (model, sources) = sources(&cycle);
        let first = resolver(OrderStrategy::Shuffle, 3)
            .resolve(&model, sources.clone(), &StructuralVerifier::default())
            .unwrap();
        let second = resolver(OrderStrategy::Shuffle, 4)
            .resolve(&model, sources, &StructuralVerifier::default())
            .unwrap();
        assert_eq!(first.sources, second.sources);
    }

    #[rstest]
    fn test_unsatisfiable_cycle_exhausts_budget(cycle: NormalizedSchema) {
        let (model, sources) = sources(&cycle);
        let result = resolver(OrderStrategy::Topological, 5).resolve(&model, sources, &StructuralVerifier::new(true));

        assert_eq!(
            result.unwrap_err(),
            ResolveError::AttemptBudgetExhausted {
                attempts: 10,
                budget: 9
            }
        );
    }

    #[rstest]
    fn test_last_pending_failure_is_fatal() {
        let input = NormalizedSchema::new("crate::models")
            .with_entity("Bad", EntityDescriptor::default())
            .with_entity("Good", EntityDescriptor::default());
        let (model, sources) = sources(&input);
        let verifier = RecordingVerifier::new(Some("Bad"), false);

        let result = resolver(OrderStrategy::Topological, 0).resolve(&model, sources, &verifier);

        let Err(ResolveError::VerificationFailed { entity, message }) = result else {
            panic!("Expected VerificationFailed");
        };
        assert_eq!(entity, "Bad");
        assert_eq!(message, "rejected");
        assert_eq!(*verifier.attempts.borrow(), vec!["Bad", "Good", "Bad"]);
    }

    #[rstest]
    fn test_reshuffle_changes_head(cycle: NormalizedSchema) {
        let (model, sources) = sources(&cycle);
        let verifier = RecordingVerifier::new(None, true);

        let resolution = resolver(OrderStrategy::Shuffle, 11)
            .resolve(&model, sources, &verifier)
            .unwrap();

        let attempts = verifier.attempts.borrow();
        assert_eq!(attempts[0], "A");
        assert_ne!(attempts[1], "A");
        assert_eq!(attempts.len(), 4);
        assert_eq!(resolution.failed_attempts, 1);
    }

    #[rstest]
    fn test_single_entity_failure() {
        let input = NormalizedSchema::new("crate::models").with_entity("Solo", EntityDescriptor::default());
        let (model, sources) = sources(&input);
        let verifier = RecordingVerifier::new(Some("Solo"), false);

        let result = resolver(OrderStrategy::Topological, 0).resolve(&model, sources, &verifier);
        assert!(matches!(result, Err(ResolveError::VerificationFailed { .. })));
    }

    #[rstest]
    fn test_empty_batch() {
        let (model, sources) = sources(&NormalizedSchema::new("crate::models"));
        let resolution = CompilationOrderResolver::new(ResolverConfig::default())
            .resolve(&model, sources, &StructuralVerifier::default())
            .unwrap();
        assert!(resolution.sources.is_empty());
        assert_eq!(resolution.failed_attempts, 0);
    }

    #[rstest]
    fn test_config_from_json() {
        let config: ResolverConfig = serde_json::from_str(r#"{"strategy": "shuffle", "seed": 42}"#).unwrap();
        assert_eq!(config.strategy, OrderStrategy::Shuffle);
        assert_eq!(config.seed, Some(42));

        let config: ResolverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ResolverConfig::default());
    }
}
