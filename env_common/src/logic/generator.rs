use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use dbx_defs::{ArtifactKind, ConfigArtifacts, Environment, GenerationError, InfrastructureDecision};
use dbx_utils::write_artifacts;
use log::{debug, info, warn};
use tera::{Context, Tera};

const BUILTIN_TEMPLATES: [(ArtifactKind, &str); 5] = [
    (
        ArtifactKind::Provider,
        include_str!("../../templates/provider.tf.tera"),
    ),
    (
        ArtifactKind::Main,
        include_str!("../../templates/main.tf.tera"),
    ),
    (
        ArtifactKind::Variables,
        include_str!("../../templates/variables.tf.tera"),
    ),
    (
        ArtifactKind::Outputs,
        include_str!("../../templates/outputs.tf.tera"),
    ),
    (
        ArtifactKind::VariableValues,
        include_str!("../../templates/terraform.tfvars.tera"),
    ),
];

/// Renders an `InfrastructureDecision` into the five terraform files.
/// Pure with respect to its inputs: the same decision and tags always give
/// byte-identical artifacts.
pub struct ConfigGenerator {
    tera: Tera,
    source: String,
}

fn load_error(name: &str, e: tera::Error) -> GenerationError {
    GenerationError::GenerationFailed(format!("template {}: {}", name, render_chain(&e)))
}

fn render_chain(e: &tera::Error) -> String {
    let mut message = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        message.push_str(&format!(": {}", cause));
        source = std::error::Error::source(cause);
    }
    message
}

impl ConfigGenerator {
    /// Generator backed by the templates compiled into the binary.
    pub fn builtin() -> Result<Self, GenerationError> {
        let mut tera = Tera::default();
        for (kind, content) in BUILTIN_TEMPLATES {
            tera.add_raw_template(kind.template_name(), content)
                .map_err(|e| load_error(kind.template_name(), e))?;
        }
        Ok(ConfigGenerator {
            tera,
            source: "builtin".to_string(),
        })
    }

    /// Generator reading `<name>.tera` files from `dir`. Missing templates
    /// are tolerated here and reported by `validate_templates` and
    /// `generate`.
    pub fn from_directory(dir: &Path) -> Result<Self, GenerationError> {
        if !dir.is_dir() {
            return Err(GenerationError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("templates directory not found: {}", dir.display()),
            )));
        }

        let mut tera = Tera::default();
        for kind in ArtifactKind::ALL {
            let path = dir.join(kind.template_name());
            if !path.is_file() {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            tera.add_raw_template(kind.template_name(), &content)
                .map_err(|e| load_error(kind.template_name(), e))?;
        }
        info!(
            "ConfigGenerator initialized with templates from: {}",
            dir.display()
        );
        Ok(ConfigGenerator {
            tera,
            source: dir.display().to_string(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn has_template(&self, kind: ArtifactKind) -> bool {
        self.tera
            .get_template_names()
            .any(|name| name == kind.template_name())
    }

    /// Presence of every required template.
    pub fn validate_templates(&self) -> BTreeMap<ArtifactKind, bool> {
        ArtifactKind::ALL
            .into_iter()
            .map(|kind| {
                let present = self.has_template(kind);
                if present {
                    debug!("Template found: {}", kind.template_name());
                } else {
                    warn!("Template missing: {}", kind.template_name());
                }
                (kind, present)
            })
            .collect()
    }

    fn context(
        decision: &InfrastructureDecision,
        environment: Environment,
        workload_type: &str,
        team: &str,
    ) -> Context {
        let mut context = Context::new();
        context.insert("workspace_name", &decision.workspace_name);
        context.insert("resource_group_name", &decision.resource_group_name);
        context.insert("region", &decision.region);
        context.insert("databricks_sku", decision.sku.as_str());
        context.insert("tier", decision.tier.as_str());
        context.insert("min_workers", &decision.min_workers);
        context.insert("max_workers", &decision.max_workers);
        context.insert("driver_instance_type", &decision.driver_instance_type);
        context.insert("worker_instance_type", &decision.worker_instance_type);
        context.insert("spark_version", &decision.runtime_version);
        context.insert("autotermination_minutes", &decision.autotermination_minutes);
        context.insert("enable_gpu", &decision.enable_gpu);
        context.insert(
            "estimated_monthly_cost",
            &format!("{:.2}", decision.estimated_monthly_cost),
        );
        context.insert("environment", environment.as_str());
        context.insert("workload_type", workload_type);
        context.insert("team", team);
        context
    }

    /// Renders all five artifacts. Either every file renders or none is
    /// returned.
    pub fn generate(
        &self,
        decision: &InfrastructureDecision,
        environment: Environment,
        workload_type: &str,
        team: &str,
    ) -> Result<ConfigArtifacts, GenerationError> {
        info!(
            "Generating terraform files for workspace: {}",
            decision.workspace_name
        );

        if let Some(missing) = ArtifactKind::ALL
            .into_iter()
            .find(|kind| !self.has_template(*kind))
        {
            return Err(GenerationError::TemplateMissing(format!(
                "{} (templates: {})",
                missing.template_name(),
                self.source
            )));
        }

        let context = Self::context(decision, environment, workload_type, team);
        let render = |kind: ArtifactKind| -> Result<String, GenerationError> {
            debug!("Rendering template: {}", kind.template_name());
            self.tera
                .render(kind.template_name(), &context)
                .map_err(|e| load_error(kind.template_name(), e))
        };

        let artifacts = ConfigArtifacts {
            provider: render(ArtifactKind::Provider)?,
            main: render(ArtifactKind::Main)?,
            variables: render(ArtifactKind::Variables)?,
            outputs: render(ArtifactKind::Outputs)?,
            variable_values: render(ArtifactKind::VariableValues)?,
        };
        info!("Successfully generated all terraform files");
        Ok(artifacts)
    }

    /// Renders and writes the artifacts under `output_dir`, creating it if
    /// needed.
    pub fn generate_to_directory(
        &self,
        decision: &InfrastructureDecision,
        output_dir: &Path,
        environment: Environment,
        workload_type: &str,
        team: &str,
    ) -> Result<PathBuf, GenerationError> {
        let artifacts = self.generate(decision, environment, workload_type, team)?;
        write_artifacts(&artifacts, output_dir)?;
        info!(
            "Wrote {} terraform files to {}",
            ArtifactKind::ALL.len(),
            output_dir.display()
        );
        Ok(output_dir.to_path_buf())
    }
}
