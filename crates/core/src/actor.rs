//! The authenticated caller of a core operation.

use docplus_uuid::RecordId;

/// Who is performing an operation. Built by the API layer from a verified session token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Actor {
    Patient(RecordId),
    Doctor(RecordId),
    Admin,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin)
    }

    pub fn is_patient(&self, id: &RecordId) -> bool {
        matches!(self, Actor::Patient(p) if p == id)
    }

    pub fn is_doctor(&self, id: &RecordId) -> bool {
        matches!(self, Actor::Doctor(d) if d == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_identity_checks() {
        let id = RecordId::new();
        let other = RecordId::new();

        assert!(Actor::Patient(id).is_patient(&id));
        assert!(!Actor::Patient(id).is_patient(&other));
        assert!(!Actor::Patient(id).is_doctor(&id));
        assert!(Actor::Doctor(id).is_doctor(&id));
        assert!(Actor::Admin.is_admin());
        assert!(!Actor::Doctor(id).is_admin());
    }
}
