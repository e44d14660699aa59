use std::sync::Arc;

use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::Serialize;
use uuid::Uuid;

use crate::models::invitation::InvitationStatus;
use crate::models::join_request::JoinRequestStatus;

const ROSTER_CHANNEL: &str = "ctfarena:roster:events";

/// Roster lifecycle events published for the notification/email dispatcher
/// and any live UI listening on the channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RosterEvent {
    TeamCreated {
        team_id: Uuid,
        team_name: String,
        leader_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    TeamDisbanded {
        team_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    MemberAdded {
        team_id: Uuid,
        user_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    MemberRemoved {
        team_id: Uuid,
        user_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    LeaderChanged {
        team_id: Uuid,
        demoted: Uuid,
        promoted: Uuid,
        timestamp: DateTime<Utc>,
    },
    JoinRequestSubmitted {
        request_id: Uuid,
        team_id: Uuid,
        requested_by: Uuid,
        timestamp: DateTime<Utc>,
    },
    JoinRequestSettled {
        request_id: Uuid,
        team_id: Uuid,
        status: JoinRequestStatus,
        timestamp: DateTime<Utc>,
    },
    InvitationSent {
        invitation_id: Uuid,
        team_id: Uuid,
        invited_user_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    InvitationSettled {
        invitation_id: Uuid,
        team_id: Uuid,
        status: InvitationStatus,
        timestamp: DateTime<Utc>,
    },
}

/// Best-effort dispatch over Redis pub/sub. A failure to notify is logged
/// and never rolls back the state transition it reports.
#[derive(Clone)]
pub struct Notifier {
    redis_client: Option<Arc<redis::Client>>,
}

impl Notifier {
    pub fn new(redis_client: Option<Arc<redis::Client>>) -> Self {
        Self { redis_client }
    }

    pub async fn publish(&self, event: RosterEvent) {
        let Some(client) = &self.redis_client else {
            tracing::debug!("Notification dispatch disabled, dropping {:?}", event);
            return;
        };

        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to serialize roster event: {}", e);
                return;
            }
        };

        match client.get_async_connection().await {
            Ok(mut conn) => {
                let result: Result<i32, redis::RedisError> =
                    conn.publish(ROSTER_CHANNEL, payload).await;
                if let Err(e) = result {
                    tracing::warn!("Failed to publish roster event: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis for notification: {}", e);
            }
        }
    }
}
