// crates/vigil-core/src/subject_key.rs
//
// Packed share identifiers.
//
// Each subject owns two share identifiers, one for active and one for
// inactive shares. The identifier is derived as
//
//   SHA-256(type || id) << 9  |  status_bit << 8  |  type
//
// so the low byte carries the subject type and bit 8 flags active shares.
// The ledger keys its maps on `(Subject, ShareKind)`; these identifiers are
// only handles for events, logs, and display.

use std::fmt;

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::crypto::hash_parts;
use crate::error::VigilError;
use crate::subject::{ShareKind, Subject, SubjectType};

/// A 256-bit packed share identifier (big-endian).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShareId(pub [u8; 32]);

/// Byte holding bit 8 (the active flag) in big-endian layout.
const STATUS_BYTE: usize = 30;
/// Byte holding the subject type code.
const TYPE_BYTE: usize = 31;

impl ShareId {
    /// True if this identifier refers to active shares.
    pub fn is_active(&self) -> bool {
        self.0[STATUS_BYTE] & 1 == 1
    }

    /// The subject type encoded in the low byte.
    pub fn subject_type(&self) -> Result<SubjectType, VigilError> {
        SubjectType::try_from(self.0[TYPE_BYTE])
    }

    /// The share kind encoded in the status bit.
    pub fn kind(&self) -> ShareKind {
        if self.is_active() {
            ShareKind::Active
        } else {
            ShareKind::Inactive
        }
    }

    /// Map an active identifier to its inactive sibling. Idempotent.
    pub fn to_inactive(&self) -> ShareId {
        let mut bytes = self.0;
        bytes[STATUS_BYTE] &= !1;
        ShareId(bytes)
    }

    /// Map an inactive identifier to its active sibling. Idempotent.
    pub fn to_active(&self) -> ShareId {
        let mut bytes = self.0;
        bytes[STATUS_BYTE] |= 1;
        ShareId(bytes)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for ShareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}..", hex::encode(&self.0[..6]))
    }
}

impl fmt::Debug for ShareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShareId({})", self.to_hex())
    }
}

/// Derive the packed share identifier for a subject and share kind.
pub fn share_id(subject: &Subject, kind: ShareKind) -> ShareId {
    let code = subject.subject_type.code();
    let digest = hash_parts(&[&[code], subject.subject_id.as_bytes()]);
    let shifted = U256::from_big_endian(&digest) << 9u32;
    let mut bytes = [0u8; 32];
    shifted.to_big_endian(&mut bytes);
    bytes[TYPE_BYTE] = code;
    if kind == ShareKind::Active {
        bytes[STATUS_BYTE] |= 1;
    }
    ShareId(bytes)
}

/// Identifier of a subject's active shares.
pub fn active_share_id(subject: &Subject) -> ShareId {
    share_id(subject, ShareKind::Active)
}

/// Identifier of a subject's inactive shares.
pub fn inactive_share_id(subject: &Subject) -> ShareId {
    share_id(subject, ShareKind::Inactive)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner(id: u64) -> Subject {
        Subject::new(SubjectType::Scanner, id)
    }

    #[test]
    fn test_active_and_inactive_ids_differ() {
        let subject = scanner(1);
        let active = active_share_id(&subject);
        let inactive = inactive_share_id(&subject);
        assert_ne!(active, inactive);
        assert!(active.is_active());
        assert!(!inactive.is_active());
    }

    #[test]
    fn test_siblings_map_to_each_other() {
        let subject = Subject::new(SubjectType::Agent, 99);
        let active = active_share_id(&subject);
        let inactive = inactive_share_id(&subject);
        assert_eq!(active.to_inactive(), inactive);
        assert_eq!(inactive.to_active(), active);
        assert_eq!(active.to_active(), active);
        assert_eq!(inactive.to_inactive(), inactive);
    }

    #[test]
    fn test_type_recoverable_from_low_byte() {
        for ty in SubjectType::ALL {
            let subject = Subject::new(ty, 5);
            assert_eq!(active_share_id(&subject).subject_type().unwrap(), ty);
            assert_eq!(inactive_share_id(&subject).subject_type().unwrap(), ty);
        }
    }

    #[test]
    fn test_distinct_subjects_get_distinct_ids() {
        assert_ne!(active_share_id(&scanner(1)), active_share_id(&scanner(2)));
        let agent = Subject::new(SubjectType::Agent, 1);
        assert_ne!(active_share_id(&scanner(1)), active_share_id(&agent));
    }

    #[test]
    fn test_low_nine_bits_carry_only_status_and_type() {
        let id = active_share_id(&scanner(3));
        assert_eq!(id.0[STATUS_BYTE] & 1, 1);
        assert_eq!(id.0[TYPE_BYTE], SubjectType::Scanner.code());
        assert_eq!(id.kind(), ShareKind::Active);
    }

    #[test]
    fn test_digest_shifted_above_low_nine_bits() {
        let subject = scanner(7);
        let digest = hash_parts(&[&[subject.subject_type.code()], subject.subject_id.as_bytes()]);
        let expected = U256::from_big_endian(&digest) << 9u32;

        let id = inactive_share_id(&subject);
        let packed = U256::from_big_endian(&id.0);
        let low_bits = U256::from(0x1ffu32);
        assert_eq!(packed & !low_bits, expected);
        assert_eq!((packed & low_bits).low_u64(), SubjectType::Scanner.code() as u64);
    }
}
