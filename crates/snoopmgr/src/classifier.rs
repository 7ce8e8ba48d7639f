//! Port classification policies.
//!
//! The default [`SubstringPolicy`] looks for a trunk marker anywhere in the
//! status line, then for an access marker in the port name. Substring
//! matching can misclassify names that contain a marker incidentally
//! (`Gi-backup`); alternative policies plug in through [`ClassifierPolicy`].

use crate::types::{ClassifiedPort, PortRecord, Role};

/// Decides the snooping role of a port.
///
/// Implementations must be pure and total.
pub trait ClassifierPolicy: Send + Sync {
    /// Returns the role for a record.
    fn classify(&self, record: &PortRecord) -> Role;
}

/// Default trunk marker searched in the raw status line.
pub const DEFAULT_TRUNK_MARKER: &str = "trunk";

/// Default access markers searched in the port name.
pub const DEFAULT_ACCESS_MARKERS: &[&str] = &["Gi", "Fa"];

/// Case-sensitive substring classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstringPolicy {
    trunk_marker: String,
    access_markers: Vec<String>,
}

impl SubstringPolicy {
    /// Creates a policy with custom markers.
    pub fn new(trunk_marker: impl Into<String>, access_markers: Vec<String>) -> Self {
        Self {
            trunk_marker: trunk_marker.into(),
            access_markers,
        }
    }
}

impl Default for SubstringPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_TRUNK_MARKER,
            DEFAULT_ACCESS_MARKERS.iter().map(|m| m.to_string()).collect(),
        )
    }
}

impl ClassifierPolicy for SubstringPolicy {
    fn classify(&self, record: &PortRecord) -> Role {
        // Trunk wins even when the name also carries an access marker.
        if record.raw_line.contains(self.trunk_marker.as_str()) {
            Role::Trunk
        } else if self
            .access_markers
            .iter()
            .any(|m| record.name.contains(m.as_str()))
        {
            Role::Access
        } else {
            Role::Ignored
        }
    }
}

/// Assigns a role to every record, preserving order.
pub fn classify_all(
    policy: &dyn ClassifierPolicy,
    records: Vec<PortRecord>,
) -> Vec<ClassifiedPort> {
    records
        .into_iter()
        .map(|record| {
            let role = policy.classify(&record);
            ClassifiedPort { record, role }
        })
        .collect()
}
