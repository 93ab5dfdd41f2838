//! Operating-system identity as an explicit value.
//!
//! The identity of the machine the workspace runs on is passed into every
//! resolve/select call instead of living in process-wide state, so two
//! resolutions against different identities can never interfere.

/// The operating system a resolution runs against.
///
/// Both lists are ordered most-specific-first: `names` might be
/// `["ubuntu", "debian"]` and `versions` `["22.04", "jammy"]`. The
/// resolver tries candidates in that order and appends its own
/// `"default"` fallbacks, so callers never list `"default"` themselves.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OsIdentity {
    names: Vec<String>,
    versions: Vec<String>,
}

impl OsIdentity {
    /// Create an identity from ordered OS-name and OS-version candidates.
    pub fn new<S: Into<String>>(
        names: impl IntoIterator<Item = S>,
        versions: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            versions: versions.into_iter().map(Into::into).collect(),
        }
    }

    /// An identity for a machine whose OS could not be determined.
    ///
    /// Resolving against an unknown identity still matches `"default"`
    /// entries and globals, but a miss reports [`UnknownOs`] instead of
    /// [`WrongOs`].
    ///
    /// [`UnknownOs`]: crate::osdeps::Availability::UnknownOs
    /// [`WrongOs`]: crate::osdeps::Availability::WrongOs
    pub fn unknown() -> Self {
        Self {
            names: Vec::new(),
            versions: Vec::new(),
        }
    }

    /// Whether the OS identity could be determined at all.
    pub fn is_known(&self) -> bool {
        !self.names.is_empty()
    }

    /// Ordered OS-name candidates, most specific first.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Ordered OS-version candidates, most specific first.
    pub fn versions(&self) -> &[String] {
        &self.versions
    }
}
