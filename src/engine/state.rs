use serde::{Deserialize, Serialize};

/// Lifecycle of a capture controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureState {
    Idle,
    /// Waiting on device permission / open
    Acquiring,
    Capturing {
        consultation_id: String,
        sample_rate: u32,
    },
    Failed {
        error_msg: String,
    },
}

impl CaptureState {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: &CaptureState) -> bool {
        use CaptureState::*;

        matches!(
            (self, target),
            // From Idle
            (Idle, Acquiring) |

            // From Acquiring
            (Acquiring, Capturing { .. }) |
            (Acquiring, Failed { .. }) |
            (Acquiring, Idle) |

            // From Capturing
            (Capturing { .. }, Failed { .. }) |
            (Capturing { .. }, Idle) |

            // From Failed
            (Failed { .. }, Idle) |
            (Failed { .. }, Acquiring)
        )
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, CaptureState::Capturing { .. })
    }

    /// Get human-readable state name
    pub fn name(&self) -> &str {
        match self {
            Self::Idle => "Idle",
            Self::Acquiring => "Acquiring",
            Self::Capturing { .. } => "Capturing",
            Self::Failed { .. } => "Failed",
        }
    }
}

impl Default for CaptureState {
    fn default() -> Self {
        Self::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        let idle = CaptureState::Idle;
        let acquiring = CaptureState::Acquiring;

        assert!(idle.can_transition_to(&acquiring));
        assert!(!acquiring.can_transition_to(&acquiring));
        assert!(!idle.can_transition_to(&CaptureState::Capturing {
            consultation_id: "c1".to_string(),
            sample_rate: 4000,
        }));
    }

    #[test]
    fn test_capturing_stops_to_idle() {
        let capturing = CaptureState::Capturing {
            consultation_id: "c1".to_string(),
            sample_rate: 4000,
        };

        assert!(capturing.is_capturing());
        assert!(capturing.can_transition_to(&CaptureState::Idle));
    }

    #[test]
    fn test_failure_is_recoverable_by_stop() {
        let failed = CaptureState::Failed {
            error_msg: "permission denied".to_string(),
        };

        assert!(failed.can_transition_to(&CaptureState::Idle));
        assert!(!failed.is_capturing());
    }
}
