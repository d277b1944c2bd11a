//! Page lifecycle state machine.
//!
//! Transitions outside the explicit table fail with
//! `DomainError::InvalidStateTransition`. `Deleted` is terminal;
//! `Archived` can be reactivated back to `Active`.

use serde::{Deserialize, Serialize};

use super::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    Discovered,
    Pending,
    Analyzing,
    Analyzed,
    VerifiedCommerce,
    NotCommerce,
    Active,
    Inactive,
    Error,
    Unreachable,
    Archived,
    Deleted,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageStatus::Discovered => "discovered",
            PageStatus::Pending => "pending",
            PageStatus::Analyzing => "analyzing",
            PageStatus::Analyzed => "analyzed",
            PageStatus::VerifiedCommerce => "verified_commerce",
            PageStatus::NotCommerce => "not_commerce",
            PageStatus::Active => "active",
            PageStatus::Inactive => "inactive",
            PageStatus::Error => "error",
            PageStatus::Unreachable => "unreachable",
            PageStatus::Archived => "archived",
            PageStatus::Deleted => "deleted",
        }
    }

    pub fn parse(value: &str) -> DomainResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "discovered" => Ok(PageStatus::Discovered),
            "pending" => Ok(PageStatus::Pending),
            "analyzing" => Ok(PageStatus::Analyzing),
            "analyzed" => Ok(PageStatus::Analyzed),
            "verified_commerce" => Ok(PageStatus::VerifiedCommerce),
            "not_commerce" => Ok(PageStatus::NotCommerce),
            "active" => Ok(PageStatus::Active),
            "inactive" => Ok(PageStatus::Inactive),
            "error" => Ok(PageStatus::Error),
            "unreachable" => Ok(PageStatus::Unreachable),
            "archived" => Ok(PageStatus::Archived),
            "deleted" => Ok(PageStatus::Deleted),
            other => Err(DomainError::InvalidStateTransition(format!(
                "unknown page state '{}'",
                other
            ))),
        }
    }

    /// Allowed target states from this state.
    fn allowed_transitions(&self) -> &'static [PageStatus] {
        use PageStatus::*;
        match self {
            Discovered => &[Pending, Error, Deleted],
            Pending => &[Analyzing, Error, Deleted],
            Analyzing => &[Analyzed, Error, Unreachable],
            Analyzed => &[VerifiedCommerce, NotCommerce, Error],
            VerifiedCommerce => &[Active, Inactive, Error, Unreachable],
            NotCommerce => &[Archived, Deleted],
            Active => &[Inactive, Error, Unreachable, Archived],
            Inactive => &[Active, Archived, Deleted],
            Error => &[Pending, Archived, Deleted],
            Unreachable => &[Pending, Archived, Deleted],
            Archived => &[Deleted, Active],
            Deleted => &[],
        }
    }

    pub fn can_transition_to(&self, target: PageStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn transition_to(&self, target: PageStatus) -> DomainResult<PageStatus> {
        if !self.can_transition_to(target) {
            return Err(DomainError::InvalidStateTransition(format!(
                "cannot transition from {} to {}",
                self.as_str(),
                target.as_str()
            )));
        }
        Ok(target)
    }

    pub fn is_terminal(&self) -> bool {
        *self == PageStatus::Deleted
    }

    pub fn is_error(&self) -> bool {
        matches!(self, PageStatus::Error | PageStatus::Unreachable)
    }

    pub fn requires_analysis(&self) -> bool {
        matches!(self, PageStatus::Discovered | PageStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_discovery_path_is_legal() {
        let mut state = PageStatus::Discovered;
        for next in [
            PageStatus::Pending,
            PageStatus::Analyzing,
            PageStatus::Analyzed,
            PageStatus::VerifiedCommerce,
            PageStatus::Active,
            PageStatus::Archived,
        ] {
            state = state.transition_to(next).unwrap();
        }
        assert_eq!(state, PageStatus::Archived);
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        assert!(PageStatus::Discovered
            .transition_to(PageStatus::Active)
            .is_err());
        assert!(PageStatus::NotCommerce
            .transition_to(PageStatus::Active)
            .is_err());
        assert!(PageStatus::Analyzed
            .transition_to(PageStatus::Archived)
            .is_err());
    }

    #[test]
    fn deleted_is_terminal() {
        for target in [
            PageStatus::Pending,
            PageStatus::Active,
            PageStatus::Archived,
        ] {
            assert!(PageStatus::Deleted.transition_to(target).is_err());
        }
        assert!(PageStatus::Deleted.is_terminal());
    }

    #[test]
    fn archived_can_be_reactivated() {
        assert_eq!(
            PageStatus::Archived.transition_to(PageStatus::Active).unwrap(),
            PageStatus::Active
        );
    }

    #[test]
    fn error_states_recover_to_pending() {
        assert!(PageStatus::Error.can_transition_to(PageStatus::Pending));
        assert!(PageStatus::Unreachable.can_transition_to(PageStatus::Pending));
    }

    #[test]
    fn parse_round_trips() {
        for status in [
            PageStatus::Discovered,
            PageStatus::VerifiedCommerce,
            PageStatus::NotCommerce,
            PageStatus::Deleted,
        ] {
            assert_eq!(PageStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(PageStatus::parse("weird").is_err());
    }
}
