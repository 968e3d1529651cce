//! Context configuration

/// How `add_input` records a new predecessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WiringMode {
    /// Append at the tail, keeping every prior input
    #[default]
    Append,
    /// First input becomes the head; every later one overwrites the
    /// second slot. Kept for graphs built against the old behaviour.
    Legacy,
}

/// Context configuration
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Input wiring behaviour
    pub wiring: WiringMode,
    /// Reject identities already used by a live node at the host boundary
    pub strict_identities: bool,
    /// Arena capacity to reserve up front
    pub capacity: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            wiring: WiringMode::Append,
            strict_identities: false,
            capacity: 0,
        }
    }
}

impl ContextConfig {
    /// Configuration reproducing the old overwrite-on-append wiring
    pub fn legacy() -> Self {
        Self {
            wiring: WiringMode::Legacy,
            ..Self::default()
        }
    }
}
