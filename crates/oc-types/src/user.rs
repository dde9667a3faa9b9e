use serde::{Deserialize, Serialize};

use crate::item::BucketItem;
use crate::kind::{ActorKind, Bucket};

/// Wallet material generated by an external key service.
///
/// Stored verbatim; this crate never interprets it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EthWallet {
    pub encrypted_private_key: String,
    pub public_key: String,
    pub address: String,
}

/// A platform user linked to the actor they represent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub index: u64,
    pub username: String,
    pub email: String,
    pub pwhash: String,
    /// Actor tag of the linked entity ("company", "city", ...).
    pub entity_type: String,
    pub entity_id: u64,
    /// Whether the user is a verified member of the linked entity.
    pub verified: bool,
    /// Whether the user administers the linked entity.
    pub admin: bool,
    pub ethereum_wallet: EthWallet,
}

impl BucketItem for User {
    const BUCKET: Bucket = Bucket::User;

    fn id(&self) -> u64 {
        self.index
    }

    fn set_id(&mut self, id: u64) {
        self.index = id;
    }
}

/// A user's request to be connected to an actor they do not yet represent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub index: u64,
    pub user_id: u64,
    pub actor_kind: ActorKind,
    pub actor_id: u64,
    pub approved: bool,
}

impl ConnectRequest {
    pub fn new(user_id: u64, actor_kind: ActorKind, actor_id: u64) -> Self {
        Self {
            index: 0,
            user_id,
            actor_kind,
            actor_id,
            approved: false,
        }
    }
}

impl BucketItem for ConnectRequest {
    const BUCKET: Bucket = Bucket::Request;

    fn id(&self) -> u64 {
        self.index
    }

    fn set_id(&mut self, id: u64) {
        self.index = id;
    }
}
