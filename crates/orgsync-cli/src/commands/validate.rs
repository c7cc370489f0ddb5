use std::fmt::Write as _;

use anyhow::Context;
use orgsync_config::DesiredState;
use orgsync_engine::Report;
use serde::Serialize;

use crate::cli::root_commands::ValidateArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ValidationSummary {
    valid: bool,
    name: String,
    version: String,
    organization_roles: usize,
    user_roles: usize,
    resources: usize,
    scopes: usize,
    permissions: usize,
    third_party_apps: usize,
    sign_in_experience: bool,
}

impl ValidationSummary {
    fn from_document(document: &DesiredState) -> Self {
        Self {
            valid: true,
            name: document.metadata.name.clone(),
            version: document.metadata.version.clone(),
            organization_roles: document.organization_roles().len(),
            user_roles: document.user_roles().len(),
            resources: document.hierarchy.resources.len(),
            scopes: document.scope_names().len(),
            permissions: document.all_permissions().len(),
            third_party_apps: document.third_party_apps.len(),
            sign_in_experience: document.sign_in_experience.is_some(),
        }
    }
}

impl Report for ValidationSummary {
    fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Configuration {} v{} is valid", self.name, self.version);
        let _ = writeln!(out, "  Organization roles: {}", self.organization_roles);
        let _ = writeln!(out, "  User roles:         {}", self.user_roles);
        let _ = writeln!(out, "  Resources:          {}", self.resources);
        let _ = writeln!(out, "  Scopes:             {}", self.scopes);
        let _ = writeln!(out, "  Permissions:        {}", self.permissions);
        let _ = writeln!(out, "  Third-party apps:   {}", self.third_party_apps);
        let sign_in = if self.sign_in_experience { "yes" } else { "no" };
        let _ = writeln!(out, "  Sign-in experience: {sign_in}");
        out
    }
}

/// Handle `orgsync validate`.
pub fn handle(args: &ValidateArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let document = DesiredState::from_path(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    document
        .validate()
        .with_context(|| format!("{} is not valid", args.config.display()))?;
    output(&ValidationSummary::from_document(&document), ctx.format)
}

#[cfg(test)]
mod tests {
    use orgsync_config::DesiredState;
    use orgsync_engine::{OutputFormat, Report};
    use pretty_assertions::assert_eq;

    use super::ValidationSummary;

    const DOC: &str = r"
metadata:
  name: acme-rbac
  version: 1.2.0
hierarchy:
  organization_roles:
    - id: distributor
      name: Distributor
      permissions:
        - id: read:systems
  user_roles:
    - id: support
      name: Support
      type: user
      permissions:
        - id: read:systems
        - id: manage:systems
  resources:
    - name: systems
      actions: [read, manage]
";

    #[test]
    fn summary_counts_document_sections() {
        let document = DesiredState::from_yaml_str(DOC).unwrap();
        document.validate().unwrap();
        let summary = ValidationSummary::from_document(&document);
        assert_eq!(summary.organization_roles, 1);
        assert_eq!(summary.user_roles, 1);
        assert_eq!(summary.resources, 1);
        assert_eq!(summary.scopes, 2);
        assert_eq!(summary.permissions, 2);
        assert!(!summary.sign_in_experience);
    }

    #[test]
    fn text_names_the_document() {
        let document = DesiredState::from_yaml_str(DOC).unwrap();
        let text = ValidationSummary::from_document(&document).to_text();
        assert!(text.starts_with("Configuration acme-rbac v1.2.0 is valid\n"));
        assert!(text.contains("Scopes:             2"));
    }

    #[test]
    fn json_is_machine_readable() {
        let document = DesiredState::from_yaml_str(DOC).unwrap();
        let rendered = ValidationSummary::from_document(&document)
            .render(OutputFormat::Json)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["valid"], true);
        assert_eq!(value["name"], "acme-rbac");
    }
}
