use std::collections::BTreeSet;
use std::fmt;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq)]
pub enum ChatError {
    #[error("channel {0} does not exist")]
    ChannelNotFound(String),

    #[error("{member} is not a member of {channel}")]
    NotAMember { channel: String, member: String },

    #[error("chat backend unavailable: {0}")]
    Unavailable(String),
}

/// `order-<order id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelId(String);

impl ChannelId {
    pub fn for_order(order_id: Uuid) -> Self {
        Self(format!("order-{order_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `client-<user id>` for senders and recipients, `driver-<user id>` for drivers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(String);

impl MemberId {
    pub fn client(user_id: Uuid) -> Self {
        Self(format!("client-{user_id}"))
    }

    pub fn driver(user_id: Uuid) -> Self {
        Self(format!("driver-{user_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Order chat channels. Notify-only from the engine's point of view.
pub trait ChatService: Send + Sync {
    fn create_channel(&self, channel: &ChannelId, creator: &MemberId) -> Result<(), ChatError>;

    fn add_member(&self, channel: &ChannelId, member: &MemberId) -> Result<(), ChatError>;

    fn remove_member(&self, channel: &ChannelId, member: &MemberId) -> Result<(), ChatError>;
}

/// Keeps channel membership in process. Used when no chat backend is wired.
#[derive(Default)]
pub struct InMemoryChat {
    channels: DashMap<ChannelId, BTreeSet<MemberId>>,
}

impl InMemoryChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn members(&self, channel: &ChannelId) -> Vec<MemberId> {
        self.channels
            .get(channel)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_channel(&self, channel: &ChannelId) -> bool {
        self.channels.contains_key(channel)
    }
}

impl ChatService for InMemoryChat {
    fn create_channel(&self, channel: &ChannelId, creator: &MemberId) -> Result<(), ChatError> {
        match self.channels.entry(channel.clone()) {
            Entry::Occupied(mut members) => {
                members.get_mut().insert(creator.clone());
            }
            Entry::Vacant(slot) => {
                slot.insert(BTreeSet::from([creator.clone()]));
            }
        }
        Ok(())
    }

    fn add_member(&self, channel: &ChannelId, member: &MemberId) -> Result<(), ChatError> {
        let mut members = self
            .channels
            .get_mut(channel)
            .ok_or_else(|| ChatError::ChannelNotFound(channel.to_string()))?;
        members.insert(member.clone());
        Ok(())
    }

    fn remove_member(&self, channel: &ChannelId, member: &MemberId) -> Result<(), ChatError> {
        let mut members = self
            .channels
            .get_mut(channel)
            .ok_or_else(|| ChatError::ChannelNotFound(channel.to_string()))?;

        if members.remove(member) {
            Ok(())
        } else {
            Err(ChatError::NotAMember {
                channel: channel.to_string(),
                member: member.to_string(),
            })
        }
    }
}
