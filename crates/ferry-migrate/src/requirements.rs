use ferry_config::CollisionPolicy;

use crate::DiVariable;

/// Result of recording one requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Added,
    /// Same name and type as an existing entry.
    Duplicate,
    /// Same name, different type; the new type replaced `previous`.
    Replaced { previous: DiVariable },
}

/// Two requirements share a variable name but not a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementConflict {
    pub name: String,
    pub first: String,
    pub second: String,
}

/// Injected collaborators of one file, keyed by variable name, in the order
/// they were first requested.
///
/// Requirements with different names but the same type are kept apart; the
/// constructor then receives two parameters of that type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiRequirements {
    entries: Vec<DiVariable>,
}

impl DiRequirements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        variable: DiVariable,
        policy: CollisionPolicy,
    ) -> Result<Recorded, RequirementConflict> {
        let Some(pos) = self.entries.iter().position(|e| e.name == variable.name) else {
            self.entries.push(variable);
            return Ok(Recorded::Added);
        };
        let existing = &mut self.entries[pos];
        if existing.ty == variable.ty {
            return Ok(Recorded::Duplicate);
        }
        match policy {
            CollisionPolicy::LastWins => {
                let previous = std::mem::replace(existing, variable);
                Ok(Recorded::Replaced { previous })
            }
            CollisionPolicy::Reject => Err(RequirementConflict {
                name: variable.name,
                first: existing.ty.clone(),
                second: variable.ty,
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&DiVariable> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiVariable> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[DiVariable] {
        &self.entries
    }
}

impl<'a> IntoIterator for &'a DiRequirements {
    type Item = &'a DiVariable;
    type IntoIter = std::slice::Iter<'a, DiVariable>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
