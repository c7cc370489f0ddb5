//! Entity structs for orgsync domain objects.
//!
//! Remote entities mirror the management API payloads (camelCase on the wire).
//! Hierarchy entities map to tables in the local libSQL store. All structs
//! derive `Serialize`, `Deserialize`, and `JsonSchema`.

mod hierarchy;
mod remote;
mod sign_in;

pub use hierarchy::{AffectedEntity, HierarchyAuditEntry, LocalUser, Organization};
pub use remote::{
    OidcClientMetadata, OrganizationRole, OrganizationScope, RemoteOrganization, RemoteResource,
    RemoteRole, RemoteScope, RemoteUser, ThirdPartyApplication,
};
pub use sign_in::{
    SignInBranding, SignInColor, SignInExperienceUpdate, SignInLanguageInfo, SignInMethod,
    SignInMethods, SignUpMethod,
};
