use serde::{Deserialize, Serialize};

/// Name of the plan file written by `terraform plan` and consumed by apply.
pub const PLAN_FILE: &str = "tfplan";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Provider,
    Main,
    Variables,
    Outputs,
    VariableValues,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 5] = [
        ArtifactKind::Provider,
        ArtifactKind::Main,
        ArtifactKind::Variables,
        ArtifactKind::Outputs,
        ArtifactKind::VariableValues,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::Provider => "provider.tf",
            ArtifactKind::Main => "main.tf",
            ArtifactKind::Variables => "variables.tf",
            ArtifactKind::Outputs => "outputs.tf",
            ArtifactKind::VariableValues => "terraform.tfvars",
        }
    }

    pub fn template_name(&self) -> &'static str {
        match self {
            ArtifactKind::Provider => "provider.tf.tera",
            ArtifactKind::Main => "main.tf.tera",
            ArtifactKind::Variables => "variables.tf.tera",
            ArtifactKind::Outputs => "outputs.tf.tera",
            ArtifactKind::VariableValues => "terraform.tfvars.tera",
        }
    }
}

/// The complete set of files handed to terraform. All five are always
/// present; there is no partial artifact set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigArtifacts {
    pub provider: String,
    pub main: String,
    pub variables: String,
    pub outputs: String,
    pub variable_values: String,
}

impl ConfigArtifacts {
    pub fn get(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::Provider => &self.provider,
            ArtifactKind::Main => &self.main,
            ArtifactKind::Variables => &self.variables,
            ArtifactKind::Outputs => &self.outputs,
            ArtifactKind::VariableValues => &self.variable_values,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArtifactKind, &str)> + '_ {
        ArtifactKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_iter_yields_all_kinds_in_order() {
        let artifacts = ConfigArtifacts {
            provider: "p".to_string(),
            main: "m".to_string(),
            variables: "v".to_string(),
            outputs: "o".to_string(),
            variable_values: "vv".to_string(),
        };
        let files: Vec<(&str, &str)> = artifacts
            .iter()
            .map(|(kind, content)| (kind.file_name(), content))
            .collect();
        assert_eq!(
            files,
            vec![
                ("provider.tf", "p"),
                ("main.tf", "m"),
                ("variables.tf", "v"),
                ("outputs.tf", "o"),
                ("terraform.tfvars", "vv"),
            ]
        );
    }
}
