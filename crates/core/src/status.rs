//! Canonical status enums and their transition tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` lookup table. Transitions not listed
//! in an enum's [`StatusTransitions`] table are rejected.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($entity:literal) {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Entity name used in error messages.
            pub const ENTITY: &'static str = $entity;

            /// Every variant, in seed order.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Resolve a database status ID back into the enum.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// The canonical lowercase label.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )+
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

define_status_enum! {
    /// Lost item report lifecycle.
    LostItemStatus ("LostItem") {
        Active = 1 => "active",
        HasMatches = 2 => "has_matches",
        Resolved = 3 => "resolved",
        Expired = 4 => "expired",
    }
}

define_status_enum! {
    /// Found item report lifecycle.
    FoundItemStatus ("FoundItem") {
        Available = 1 => "available",
        PendingClaim = 2 => "pending_claim",
        Claimed = 3 => "claimed",
        Expired = 4 => "expired",
    }
}

define_status_enum! {
    /// Match lifecycle.
    MatchStatus ("Match") {
        Pending = 1 => "pending",
        Claimed = 2 => "claimed",
        Approved = 3 => "approved",
        Rejected = 4 => "rejected",
        Expired = 5 => "expired",
    }
}

define_status_enum! {
    /// Claim lifecycle. Cancellation deletes the row, so it has no status.
    ClaimStatus ("Claim") {
        Pending = 1 => "pending",
        Approved = 2 => "approved",
        Rejected = 3 => "rejected",
    }
}

/// An explicit state table for a status enum.
pub trait StatusTransitions: Copy + PartialEq + Sized + 'static {
    /// Entity name for error messages.
    fn entity() -> &'static str;

    /// Label for error messages.
    fn label(self) -> &'static str;

    /// Resolve a database status ID.
    fn from_status_id(id: StatusId) -> Option<Self>;

    /// Whether `self -> next` is an enumerated transition.
    fn can_transition_to(self, next: Self) -> bool;

    /// Whether no transition leaves this state.
    fn is_terminal(self) -> bool;

    /// Validate `self -> next`, returning `next` on success.
    fn transition(self, next: Self) -> Result<Self, CoreError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition {
                entity: Self::entity(),
                from: self.label(),
                to: next.label(),
            })
        }
    }
}

impl StatusTransitions for LostItemStatus {
    fn entity() -> &'static str {
        Self::ENTITY
    }

    fn label(self) -> &'static str {
        self.as_str()
    }

    fn from_status_id(id: StatusId) -> Option<Self> {
        Self::from_id(id)
    }

    fn can_transition_to(self, next: Self) -> bool {
        use LostItemStatus::*;
        matches!(
            (self, next),
            (Active, HasMatches | Resolved | Expired) | (HasMatches, Resolved | Expired)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, LostItemStatus::Resolved | LostItemStatus::Expired)
    }
}

impl StatusTransitions for FoundItemStatus {
    fn entity() -> &'static str {
        Self::ENTITY
    }

    fn label(self) -> &'static str {
        self.as_str()
    }

    fn from_status_id(id: StatusId) -> Option<Self> {
        Self::from_id(id)
    }

    fn can_transition_to(self, next: Self) -> bool {
        use FoundItemStatus::*;
        matches!(
            (self, next),
            (Available, PendingClaim | Expired) | (PendingClaim, Available | Claimed | Expired)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, FoundItemStatus::Claimed | FoundItemStatus::Expired)
    }
}

impl StatusTransitions for MatchStatus {
    fn entity() -> &'static str {
        Self::ENTITY
    }

    fn label(self) -> &'static str {
        self.as_str()
    }

    fn from_status_id(id: StatusId) -> Option<Self> {
        Self::from_id(id)
    }

    fn can_transition_to(self, next: Self) -> bool {
        use MatchStatus::*;
        matches!(
            (self, next),
            (Pending, Claimed | Approved | Rejected | Expired)
                | (Claimed, Pending | Approved | Rejected)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(
            self,
            MatchStatus::Approved | MatchStatus::Rejected | MatchStatus::Expired
        )
    }
}

impl StatusTransitions for ClaimStatus {
    fn entity() -> &'static str {
        Self::ENTITY
    }

    fn label(self) -> &'static str {
        self.as_str()
    }

    fn from_status_id(id: StatusId) -> Option<Self> {
        Self::from_id(id)
    }

    fn can_transition_to(self, next: Self) -> bool {
        use ClaimStatus::*;
        matches!((self, next), (Pending, Approved | Rejected))
    }

    fn is_terminal(self) -> bool {
        !matches!(self, ClaimStatus::Pending)
    }
}

/// Decode a status column, mapping unknown IDs to an internal error.
pub fn decode_status<S: StatusTransitions>(id: StatusId) -> Result<S, CoreError> {
    S::from_status_id(id).ok_or_else(|| {
        CoreError::Internal(format!("Unknown {} status id {id}", S::entity()))
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn status_ids_match_seed_data() {
        assert_eq!(LostItemStatus::Active.id(), 1);
        assert_eq!(LostItemStatus::Expired.id(), 4);
        assert_eq!(FoundItemStatus::PendingClaim.id(), 2);
        assert_eq!(MatchStatus::Expired.id(), 5);
        assert_eq!(ClaimStatus::Rejected.id(), 3);
    }

    #[test]
    fn from_id_round_trips_every_variant() {
        for status in MatchStatus::ALL {
            assert_eq!(MatchStatus::from_id(status.id()), Some(*status));
        }
        assert_eq!(ClaimStatus::from_id(0), None);
        assert_eq!(FoundItemStatus::from_id(9), None);
    }

    #[test]
    fn labels_match_serde_names() {
        let json = serde_json::to_string(&FoundItemStatus::PendingClaim).unwrap();
        assert_eq!(json, "\"pending_claim\"");
        assert_eq!(FoundItemStatus::PendingClaim.as_str(), "pending_claim");
        assert_eq!(LostItemStatus::HasMatches.to_string(), "has_matches");
    }

    #[test]
    fn claim_leaves_pending_only() {
        assert!(ClaimStatus::Pending.can_transition_to(ClaimStatus::Approved));
        assert!(ClaimStatus::Pending.can_transition_to(ClaimStatus::Rejected));
        assert!(!ClaimStatus::Approved.can_transition_to(ClaimStatus::Rejected));
        assert!(!ClaimStatus::Rejected.can_transition_to(ClaimStatus::Pending));
        assert!(ClaimStatus::Approved.is_terminal());
    }

    #[test]
    fn rejected_transition_reports_both_ends() {
        let err = ClaimStatus::Approved
            .transition(ClaimStatus::Pending)
            .unwrap_err();
        assert_matches!(
            err,
            CoreError::InvalidTransition {
                entity: "Claim",
                from: "approved",
                to: "pending"
            }
        );
    }

    #[test]
    fn found_item_can_revert_pending_claim() {
        assert!(FoundItemStatus::PendingClaim.can_transition_to(FoundItemStatus::Available));
        assert!(!FoundItemStatus::Claimed.can_transition_to(FoundItemStatus::Available));
        assert!(!FoundItemStatus::Available.can_transition_to(FoundItemStatus::Claimed));
    }

    #[test]
    fn lost_item_cannot_leave_resolved() {
        for next in LostItemStatus::ALL {
            assert!(!LostItemStatus::Resolved.can_transition_to(*next));
        }
        assert!(LostItemStatus::HasMatches.can_transition_to(LostItemStatus::Resolved));
    }

    #[test]
    fn match_never_regresses_to_pending_after_approval() {
        assert!(!MatchStatus::Approved.can_transition_to(MatchStatus::Pending));
        assert!(MatchStatus::Claimed.can_transition_to(MatchStatus::Pending));
        assert!(!MatchStatus::Expired.can_transition_to(MatchStatus::Pending));
    }

    #[test]
    fn decode_status_rejects_unknown_ids() {
        assert_eq!(
            decode_status::<ClaimStatus>(2).unwrap(),
            ClaimStatus::Approved
        );
        assert_matches!(
            decode_status::<ClaimStatus>(42),
            Err(CoreError::Internal(_))
        );
    }
}
