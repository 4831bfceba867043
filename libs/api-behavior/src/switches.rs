//! Compatibility switches
//!
//! A switch is a named boolean whose default is derived from the
//! [`CompatibilityVersion`] the policy was constructed with. Operators may
//! override any switch during configuration; the set of switches itself is
//! fixed once the owning policy has been built.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Behavior version a host application opts into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompatibilityVersion {
    #[default]
    #[serde(rename = "2.0")]
    Version2_0,
    #[serde(rename = "2.1")]
    Version2_1,
    #[serde(rename = "2.2")]
    Version2_2,
    #[serde(rename = "latest")]
    Latest,
}

impl fmt::Display for CompatibilityVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Version2_0 => "2.0",
            Self::Version2_1 => "2.1",
            Self::Version2_2 => "2.2",
            Self::Latest => "latest",
        };
        f.write_str(s)
    }
}

/// A single named toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilitySwitch {
    name: &'static str,
    default: bool,
    value: Option<bool>,
}

impl CompatibilitySwitch {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Effective value: the override when one was recorded, the default otherwise.
    #[must_use]
    pub fn value(&self) -> bool {
        self.value.unwrap_or(self.default)
    }

    #[must_use]
    pub fn default_value(&self) -> bool {
        self.default
    }

    #[must_use]
    pub fn is_value_set(&self) -> bool {
        self.value.is_some()
    }
}

/// Stable handle to a registered switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwitchId(usize);

/// Ordered registry of switches owned by a single policy instance.
#[derive(Debug, Clone)]
pub struct CompatibilitySwitches {
    version: CompatibilityVersion,
    switches: Vec<CompatibilitySwitch>,
}

impl CompatibilitySwitches {
    #[must_use]
    pub fn new(version: CompatibilityVersion) -> Self {
        Self {
            version,
            switches: Vec::new(),
        }
    }

    #[must_use]
    pub fn version(&self) -> CompatibilityVersion {
        self.version
    }

    /// Register a switch; its default is computed now, never at read time.
    ///
    /// Registering a name twice returns the existing handle.
    pub fn register(
        &mut self,
        name: &'static str,
        default: impl FnOnce(CompatibilityVersion) -> bool,
    ) -> SwitchId {
        if let Some(idx) = self.position(name) {
            return SwitchId(idx);
        }
        let default_value = default(self.version);
        tracing::trace!(
            switch = name,
            default = default_value,
            version = %self.version,
            "registered compatibility switch"
        );
        self.switches.push(CompatibilitySwitch {
            name,
            default: default_value,
            value: None,
        });
        SwitchId(self.switches.len() - 1)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<bool> {
        self.position(name).map(|idx| self.switches[idx].value())
    }

    /// Record an explicit override. Returns `false` for an unknown name.
    pub fn set(&mut self, name: &str, value: bool) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.set_value(SwitchId(idx), value)
            }
            None => {
                tracing::warn!(switch = name, "ignoring override for unknown compatibility switch");
                false
            }
        }
    }

    /// `None` when `id` was not issued by this registry.
    #[must_use]
    pub(crate) fn value(&self, id: SwitchId) -> Option<bool> {
        self.switches.get(id.0).map(CompatibilitySwitch::value)
    }

    pub(crate) fn set_value(&mut self, id: SwitchId, value: bool) -> bool {
        let Some(switch) = self.switches.get_mut(id.0) else {
            return false;
        };
        tracing::debug!(switch = switch.name, value, "compatibility switch overridden");
        switch.value = Some(value);
        true
    }

    /// Every switch in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, CompatibilitySwitch> {
        self.switches.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.switches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.switches.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.switches.iter().position(|s| s.name == name)
    }
}

impl<'a> IntoIterator for &'a CompatibilitySwitches {
    type Item = &'a CompatibilitySwitch;
    type IntoIter = std::slice::Iter<'a, CompatibilitySwitch>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
