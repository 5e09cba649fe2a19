//! The signed-in shopper.

use serde::{Deserialize, Serialize};

use crate::types::{Email, UserId};

/// Who is signed in. The cart only reads this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: Email,
}
