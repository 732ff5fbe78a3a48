//! Compliancy Core Library
//!
//! The compliance gate engine for pipeline runs. A run is first enriched by
//! the [`RunResolver`] into a [`RunContext`], then the
//! [`ComplianceEvaluator`] gates it on its registered production stages and
//! evaluates the profile-selected rules against the run's pipeline and
//! everything it links to.

pub mod cancel;
pub mod classifier;
pub mod config;
pub mod deviation;
pub mod domain;
pub mod error;
pub mod evaluator;
pub mod obs;
pub mod production_gate;
pub mod profile;
pub mod report;
pub mod resolver;
pub mod rules;
pub mod source;
pub mod telemetry;

pub use cancel::CancelSignal;
pub use classifier::{classify_from_snapshot, classify_structure, parse_stage_names};
pub use config::{ExtensionScope, GateConfig};
pub use deviation::DeviationMatcher;
pub use domain::{
    Build, BuildDefinition, BuildProcess, ComplianceFinding, PipelineClassification, Project,
    Release, ReleaseDefinition, Repository, ResolvedPipeline, RunContext, RunRequest,
    StageDescriptor,
};
pub use error::{GateError, GateResult, SourceError, SourceResult};
pub use evaluator::ComplianceEvaluator;
pub use production_gate::{is_production_run, production_stage_ids, registrations_for_run};
pub use profile::{ProfileCatalog, RuleProfile};
pub use resolver::RunResolver;
pub use rules::{
    BuildPipelineRule, ClassicReleasePipelineRule, ProjectRule, RepositoryRule, Rule, RuleSet,
    YamlReleasePipelineRule,
};
pub use source::{DevOpsClient, LinkedResources};

pub use compliancy_state::{
    ClassificationSnapshot, ClassificationSnapshotStore, Deviation, DeviationRepository,
    PipelineKind, PipelineRegistration, RegistrationRepository,
};
