// lmprov-core: Declarative provisioning engine between lmprov-api and the CLI.

pub mod config;
pub mod error;
pub mod expr;
pub mod import;
pub mod model;
pub mod policy;
pub mod provisioner;
pub mod reconcile;
pub mod repetition;
pub mod roles;
pub mod scope;
pub mod service;
pub mod table;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::PortalConfig;
pub use error::CoreError;
pub use import::{ImportSummary, ItemImporter};
pub use model::{
    Blueprint, ItemSpec, ItemSpecType, Mode, Repetition, RepetitionType, RoleConfiguration,
    Structure,
};
pub use policy::{TypePolicy, TypePolicyRegistry};
pub use provisioner::{Provisioner, RowOutcome, RowReport, RunReport};
pub use reconcile::Reconciler;
pub use roles::RoleAssembler;
pub use scope::VariableScope;
pub use service::ResourceService;
pub use table::{CsvTableReader, Row, SheetLocator, TableReader};

// The API crate's vocabulary, re-exported for consumers.
pub use lmprov_api::GroupKind;
pub use lmprov_api::types::PrivilegeOperation;
