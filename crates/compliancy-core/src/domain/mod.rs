//! Domain model for the compliancy gate.

pub mod devops;
pub mod finding;
pub mod run;

pub use devops::{
    ArtifactSourceReference, Build, BuildDefinition, BuildProcess, BuildRepository,
    DefinitionReference, Project, ProjectReference, Release, ReleaseArtifact, ReleaseDefinition,
    ReleaseEnvironment, Repository, YAML_PROCESS_TYPE,
};
pub use finding::ComplianceFinding;
pub use run::{PipelineClassification, ResolvedPipeline, RunContext, RunRequest, StageDescriptor};
