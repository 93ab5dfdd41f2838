//! OS-dependency resolution.
//!
//! An *osdep* is an abstract, OS-independent dependency name. Specs map
//! it to concrete package-manager entries per OS name and OS version;
//! the resolver answers "what does this OS have to install" as a pure
//! function of the spec and an explicit [`OsIdentity`].
//!
//! [`OsIdentity`]: crate::types::OsIdentity

pub mod entry;
pub mod manager;
pub mod resolver;

pub use entry::{
    Availability, DEFAULT_KEY, DEFAULT_MANAGER, ManagerOutcome, ManagerResult, OsDepEntry,
    PackageSpec,
};
pub use manager::{ManagerRegistry, PackageManager};
pub use resolver::{MergeWarning, OSDEP_REF_PREFIX, OsDepResolver, ResolveError};
