pub mod os;
pub mod package;

pub use os::OsIdentity;
pub use package::PackageName;
