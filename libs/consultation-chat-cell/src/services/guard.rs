use uuid::Uuid;

use shared_models::auth::Participant;

use crate::error::ChatError;
use crate::models::ConsultationRoom;

/// Room-level authorization. Identity always comes from the verified
/// credential; the guard only decides whether that identity may touch the
/// room.
pub struct AccessGuard;

impl AccessGuard {
    /// Confirms the participant is one of the room's two parties and returns
    /// their id.
    pub fn authorize_party(
        room: &ConsultationRoom,
        participant: &Participant,
    ) -> Result<Uuid, ChatError> {
        let user_id = Self::identity(participant)?;
        if room.is_party(user_id) {
            Ok(user_id)
        } else {
            Err(ChatError::Unauthorized)
        }
    }

    /// Confirms the participant is the room's clinician.
    pub fn authorize_clinician(
        room: &ConsultationRoom,
        participant: &Participant,
    ) -> Result<Uuid, ChatError> {
        let user_id = Self::identity(participant)?;
        if room.clinician_id == user_id {
            Ok(user_id)
        } else {
            Err(ChatError::Unauthorized)
        }
    }

    /// Confirms the participant is the room's patient.
    pub fn authorize_patient(
        room: &ConsultationRoom,
        participant: &Participant,
    ) -> Result<Uuid, ChatError> {
        let user_id = Self::identity(participant)?;
        if room.patient_id == user_id {
            Ok(user_id)
        } else {
            Err(ChatError::Unauthorized)
        }
    }

    /// The verified identity as a room-comparable id. A subject that is not
    /// a UUID can never be a room party.
    pub fn identity(participant: &Participant) -> Result<Uuid, ChatError> {
        Uuid::parse_str(participant.id()).map_err(|_| ChatError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoomState;
    use shared_models::auth::{CredentialKind, User};

    fn participant(id: Uuid, kind: CredentialKind) -> Participant {
        Participant {
            user: User {
                id: id.to_string(),
                email: None,
                role: None,
                created_at: None,
            },
            kind,
        }
    }

    fn room(patient_id: Uuid, clinician_id: Uuid) -> ConsultationRoom {
        ConsultationRoom {
            id: Uuid::new_v4(),
            patient_id,
            clinician_id,
            state: RoomState::Open,
        }
    }

    #[test]
    fn party_check_accepts_both_parties() {
        let patient_id = Uuid::new_v4();
        let clinician_id = Uuid::new_v4();
        let room = room(patient_id, clinician_id);

        assert!(AccessGuard::authorize_party(
            &room,
            &participant(patient_id, CredentialKind::Patient)
        )
        .is_ok());
        assert!(AccessGuard::authorize_party(
            &room,
            &participant(clinician_id, CredentialKind::Clinician)
        )
        .is_ok());
    }

    #[test]
    fn party_check_rejects_outsiders() {
        let room = room(Uuid::new_v4(), Uuid::new_v4());
        let outsider = participant(Uuid::new_v4(), CredentialKind::Patient);

        assert!(matches!(
            AccessGuard::authorize_party(&room, &outsider),
            Err(ChatError::Unauthorized)
        ));
    }

    #[test]
    fn role_checks_compare_identity_not_credential_kind() {
        let patient_id = Uuid::new_v4();
        let clinician_id = Uuid::new_v4();
        let room = room(patient_id, clinician_id);

        // A clinician-kind credential for the wrong identity is still refused.
        let wrong_clinician = participant(patient_id, CredentialKind::Clinician);
        assert!(matches!(
            AccessGuard::authorize_clinician(&room, &wrong_clinician),
            Err(ChatError::Unauthorized)
        ));

        let right_clinician = participant(clinician_id, CredentialKind::Clinician);
        assert_eq!(
            AccessGuard::authorize_clinician(&room, &right_clinician).unwrap(),
            clinician_id
        );
    }

    #[test]
    fn non_uuid_subject_is_unauthorized() {
        let room = room(Uuid::new_v4(), Uuid::new_v4());
        let odd = Participant {
            user: User {
                id: "not-a-uuid".to_string(),
                email: None,
                role: None,
                created_at: None,
            },
            kind: CredentialKind::Patient,
        };

        assert!(matches!(
            AccessGuard::authorize_party(&room, &odd),
            Err(ChatError::Unauthorized)
        ));
    }
}
