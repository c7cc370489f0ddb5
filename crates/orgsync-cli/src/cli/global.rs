use clap::ValueEnum;
use orgsync_core::enums::HierarchyKind;

/// Report format shared by every command.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

impl From<OutputFormat> for orgsync_engine::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Self::Text,
            OutputFormat::Json => Self::Json,
            OutputFormat::Yaml => Self::Yaml,
        }
    }
}

/// Hierarchy level accepted by `--kind`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum KindArg {
    Distributor,
    Reseller,
    Customer,
    User,
}

impl From<KindArg> for HierarchyKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Distributor => Self::Distributor,
            KindArg::Reseller => Self::Reseller,
            KindArg::Customer => Self::Customer,
            KindArg::User => Self::User,
        }
    }
}

/// Global flags available before or after subcommands.
#[derive(Clone, Debug)]
pub struct GlobalFlags {
    /// `None` defers to `general.default_format` from settings.
    pub format: Option<OutputFormat>,
}
