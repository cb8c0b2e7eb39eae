use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::catalog::{CatalogError, CheckCatalog};
use super::domain::{CheckDefinition, ExecutionResult};
use super::orchestrator::{EvaluationEngine, EvaluationReport};
use super::thresholds::ThresholdSet;
use super::validation::{validate_definitions, RuleProblem};
use super::{ResultEvaluator, RuleEvaluator};
use crate::config::CatalogConfig;

/// Batch of collected results submitted for evaluation.
///
/// Definitions and thresholds default to the service's configured catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvaluationRequest {
    #[serde(default)]
    pub results: Vec<ExecutionResult>,
    #[serde(default)]
    pub definitions: Option<Vec<CheckDefinition>>,
    #[serde(default)]
    pub thresholds: Option<ThresholdSet>,
}

/// Rule sets submitted for validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValidationRequest {
    #[serde(default)]
    pub definitions: Option<Vec<CheckDefinition>>,
}

/// Validation outcome returned to rule authors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValidationReport {
    pub checked: usize,
    pub valid: bool,
    pub problems: Vec<RuleProblem>,
}

/// Service pairing the evaluation engine with a preloaded catalog.
pub struct EvaluationService<E = RuleEvaluator> {
    engine: Arc<EvaluationEngine<E>>,
    catalog: Arc<CheckCatalog>,
    thresholds: Arc<ThresholdSet>,
}

impl EvaluationService {
    pub fn new(catalog: CheckCatalog, thresholds: ThresholdSet) -> Self {
        Self::with_engine(EvaluationEngine::new(), catalog, thresholds)
    }

    /// Loads whichever catalog documents the configuration names.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let catalog = match &config.definitions_path {
            Some(path) => CheckCatalog::from_path(path)?,
            None => CheckCatalog::default(),
        };
        let thresholds = match &config.thresholds_path {
            Some(path) => ThresholdSet::from_path(path)?,
            None => ThresholdSet::default(),
        };

        info!(
            definitions = catalog.len(),
            thresholds = thresholds.len(),
            "check catalog loaded"
        );

        Ok(Self::new(catalog, thresholds))
    }
}

impl<E: ResultEvaluator> EvaluationService<E> {
    pub fn with_engine(
        engine: EvaluationEngine<E>,
        catalog: CheckCatalog,
        thresholds: ThresholdSet,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            catalog: Arc::new(catalog),
            thresholds: Arc::new(thresholds),
        }
    }

    pub fn catalog(&self) -> &CheckCatalog {
        &self.catalog
    }

    /// Evaluate a submitted batch against the request's or the configured catalog.
    pub fn evaluate(
        &self,
        request: EvaluationRequest,
    ) -> Result<EvaluationReport, EvaluationServiceError> {
        let definitions = request
            .definitions
            .as_deref()
            .unwrap_or_else(|| self.catalog.definitions());

        if definitions.is_empty() && !request.results.is_empty() {
            return Err(EvaluationServiceError::EmptyCatalog);
        }

        let thresholds = request
            .thresholds
            .as_ref()
            .unwrap_or_else(|| self.thresholds.as_ref());

        Ok(self
            .engine
            .evaluate_batch(&request.results, definitions, thresholds))
    }

    pub fn validate(&self, request: ValidationRequest) -> ValidationReport {
        let definitions = request
            .definitions
            .as_deref()
            .unwrap_or_else(|| self.catalog.definitions());

        let problems = validate_definitions(definitions);
        ValidationReport {
            checked: definitions.len(),
            valid: problems.is_empty(),
            problems,
        }
    }
}

/// Error raised by the evaluation service.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationServiceError {
    #[error("no check definitions were supplied or configured")]
    EmptyCatalog,
}
