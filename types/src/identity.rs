//! The registrant identity record.
//!
//! Field names on the wire follow the ledger's contract (`aadharCardNumber`,
//! `faceId`), so a record serialized here can be replayed byte-for-byte into
//! `/user/add`, `/user/update` and the intake queue payload.

use serde::{Deserialize, Serialize};

/// A registrant as stored in the ledger and staged in the intake queue.
///
/// The email is the unique key. Vote state is owned exclusively by the
/// ledger and never appears on this record client-side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
    pub address: String,

    /// National identity number.
    #[serde(rename = "aadharCardNumber")]
    pub national_id: String,

    /// Opaque base64 face template captured at registration. Compared
    /// against a live capture by the face-match oracle at vote time.
    #[serde(rename = "faceId")]
    pub face_template: String,
}

impl Identity {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        address: impl Into<String>,
        national_id: impl Into<String>,
        face_template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            address: address.into(),
            national_id: national_id.into(),
            face_template: face_template.into(),
        }
    }
}
