//! Authenticated identity carried through each request.
//!
//! The session guard verifies the token once and inserts an [`Identity`] into
//! the request extensions; handlers receive it as a typed extension instead of
//! re-deriving it from headers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identity and role resolved at login time and embedded in the session token.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Identity {
    pub id_dipendente: i32,
    pub nome: String,
    pub email: String,
    pub ruolo: String,
    pub is_admin: bool,
}

#[cfg(test)]
mod tests {
    use super::Identity;

    #[test]
    fn identity_serializes_with_wire_names() -> anyhow::Result<()> {
        let identity = Identity {
            id_dipendente: 7,
            nome: "Mario Rossi".to_string(),
            email: "mario.rossi@company.com".to_string(),
            ruolo: "dipendente".to_string(),
            is_admin: false,
        };
        let value = serde_json::to_value(&identity)?;
        assert_eq!(value["id_dipendente"], 7);
        assert_eq!(value["nome"], "Mario Rossi");
        assert_eq!(value["ruolo"], "dipendente");
        assert_eq!(value["is_admin"], false);
        Ok(())
    }
}
