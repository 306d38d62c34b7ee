//! Constraint identity and impact direction.

use std::fmt;

/// Names a constraint inside an optional package.
///
/// The full name (`package/name`, or `name` alone) is what weight overrides
/// and duplicate checks key on.
///
/// ```
/// use tupleflow_core::ConstraintRef;
///
/// assert_eq!(ConstraintRef::new("queens", "Row conflict").full_name(), "queens/Row conflict");
/// assert_eq!(ConstraintRef::new("", "Row conflict").to_string(), "Row conflict");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstraintRef {
    pub package: String,
    pub name: String,
}

impl ConstraintRef {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ConstraintRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}/{}", self.package, self.name)
        }
    }
}

/// Whether matches lower or raise the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImpactType {
    Penalty,
    Reward,
}

impl ImpactType {
    /// `-1` for penalties, `1` for rewards.
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            ImpactType::Penalty => -1,
            ImpactType::Reward => 1,
        }
    }
}
