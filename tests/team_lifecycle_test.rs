use reqwest::Client;
use serde_json::json;
use uuid::Uuid;

use ctfarena_backend::models::invitation::InvitationStatus;
use ctfarena_backend::models::join_request::JoinRequestStatus;
use ctfarena_backend::models::membership::MemberStatus;
use ctfarena_backend::store::RosterStore;

mod common;
use common::utils::spawn_app;

#[tokio::test]
async fn create_team_collapses_a_duplicated_captain_into_one_membership() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let event = test_app.seed_event("qualifiers").await;
    let alice = test_app.seed_player(event.id, "alice").await;
    let bob = test_app.seed_player(event.id, "bob").await;

    let team_data = json!({
        "team_name": "Null Dereference",
        "event_id": event.id,
        "min_size": 1,
        "max_size": 4,
        "members": [
            { "user_id": alice.id },
            { "user_id": bob.id },
            { "user_id": alice.id }
        ]
    });

    let response = client
        .post(format!("{}/roster/teams", test_app.address))
        .header("Authorization", format!("Bearer {}", test_app.token_for(&alice)))
        .json(&team_data)
        .send()
        .await
        .expect("Failed to execute team creation request");
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["member_count"], 2);
    let members = body["data"]["members"].as_array().unwrap();
    let leaders: Vec<_> = members.iter().filter(|m| m["role"] == "leader").collect();
    assert_eq!(leaders.len(), 1);
    assert_eq!(leaders[0]["username"], "alice");
}

#[tokio::test]
async fn create_team_rejects_inverted_size_bounds() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let event = test_app.seed_event("qualifiers").await;
    let alice = test_app.seed_player(event.id, "alice").await;

    let team_data = json!({
        "team_name": "Bad Bounds",
        "event_id": event.id,
        "min_size": 3,
        "max_size": 2
    });

    let response = client
        .post(format!("{}/roster/teams", test_app.address))
        .header("Authorization", format!("Bearer {}", test_app.token_for(&alice)))
        .json(&team_data)
        .send()
        .await
        .expect("Failed to execute team creation request");
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn a_user_on_a_team_is_no_longer_an_eligible_captain() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let event = test_app.seed_event("qualifiers").await;
    let alice = test_app.seed_player(event.id, "alice").await;
    let token = test_app.token_for(&alice);

    let first = json!({
        "team_name": "First Blood",
        "event_id": event.id,
        "min_size": 1,
        "max_size": 4
    });
    let response = client
        .post(format!("{}/roster/teams", test_app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&first)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let second = json!({
        "team_name": "Second Wind",
        "event_id": event.id,
        "min_size": 1,
        "max_size": 4
    });
    let response = client
        .post(format!("{}/roster/teams", test_app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&second)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn max_size_cannot_shrink_below_the_current_roster() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let event = test_app.seed_event("qualifiers").await;
    let alice = test_app.seed_player(event.id, "alice").await;
    let bob = test_app.seed_player(event.id, "bob").await;
    let token = test_app.token_for(&alice);

    let team_data = json!({
        "team_name": "Tight Fit",
        "event_id": event.id,
        "min_size": 1,
        "max_size": 4,
        "members": [ { "user_id": bob.id } ]
    });
    let response = client
        .post(format!("{}/roster/teams", test_app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&team_data)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    let team_id = body["data"]["team"]["id"].as_str().unwrap().to_string();

    let response = client
        .put(format!("{}/roster/teams/{}", test_app.address, team_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "max_size": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn only_the_leader_or_an_admin_may_edit_a_team() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let event = test_app.seed_event("qualifiers").await;
    let alice = test_app.seed_player(event.id, "alice").await;
    let bob = test_app.seed_player(event.id, "bob").await;

    let team_data = json!({
        "team_name": "Locked Down",
        "event_id": event.id,
        "min_size": 1,
        "max_size": 4
    });
    let response = client
        .post(format!("{}/roster/teams", test_app.address))
        .header("Authorization", format!("Bearer {}", test_app.token_for(&alice)))
        .json(&team_data)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    let team_id = body["data"]["team"]["id"].as_str().unwrap().to_string();

    let response = client
        .put(format!("{}/roster/teams/{}", test_app.address, team_id))
        .header("Authorization", format!("Bearer {}", test_app.token_for(&bob)))
        .json(&json!({ "team_name": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn disbanding_cascades_to_memberships_requests_and_invitations() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let event = test_app.seed_event("qualifiers").await;
    let alice = test_app.seed_player(event.id, "alice").await;
    let bob = test_app.seed_player(event.id, "bob").await;
    let carol = test_app.seed_player(event.id, "carol").await;
    let dave = test_app.seed_player(event.id, "dave").await;
    let leader_token = test_app.token_for(&alice);

    let team_data = json!({
        "team_name": "Short Lived",
        "event_id": event.id,
        "min_size": 1,
        "max_size": 4,
        "members": [ { "user_id": bob.id } ]
    });
    let response = client
        .post(format!("{}/roster/teams", test_app.address))
        .header("Authorization", format!("Bearer {}", leader_token))
        .json(&team_data)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    let team_id = body["data"]["team"]["id"].as_str().unwrap().to_string();

    // A pending petition from Carol and a pending invitation to Dave.
    let response = client
        .post(format!(
            "{}/roster/teams/{}/join_requests",
            test_app.address, team_id
        ))
        .header("Authorization", format!("Bearer {}", test_app.token_for(&carol)))
        .json(&json!({ "message": "let me in" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let request_body: serde_json::Value = response.json().await.unwrap();
    let request_id: Uuid = request_body["data"]["id"].as_str().unwrap().parse().unwrap();

    let response = client
        .post(format!(
            "{}/roster/teams/{}/invitations",
            test_app.address, team_id
        ))
        .header("Authorization", format!("Bearer {}", leader_token))
        .json(&json!({
            "invitee_email": dave.email,
            "expires_at": chrono::Utc::now() + chrono::Duration::hours(6)
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let invitation_body: serde_json::Value = response.json().await.unwrap();
    let invitation_id: Uuid = invitation_body["data"]["id"].as_str().unwrap().parse().unwrap();

    let response = client
        .delete(format!("{}/roster/teams/{}", test_app.address, team_id))
        .header("Authorization", format!("Bearer {}", leader_token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let outcome: serde_json::Value = response.json().await.unwrap();
    assert_eq!(outcome["data"]["members_deactivated"], 2);
    assert_eq!(outcome["data"]["requests_rejected"], 1);
    assert_eq!(outcome["data"]["invitations_cancelled"], 1);

    // Cascade is visible through storage.
    let team_uuid: Uuid = team_id.parse().unwrap();
    let members = test_app.store.active_members(team_uuid).await.unwrap();
    assert!(members.is_empty());
    let request = test_app
        .store
        .get_join_request(request_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(request.status, JoinRequestStatus::Rejected);
    let invitation = test_app
        .store
        .get_invitation(invitation_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(invitation.status, InvitationStatus::Cancelled);

    // Members freed by the disband are eligible candidates again.
    let response = client
        .get(format!(
            "{}/roster/events/{}/candidates",
            test_app.address, event.id
        ))
        .header("Authorization", format!("Bearer {}", leader_token))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["total_count"], 4);
}

#[tokio::test]
async fn the_leader_leaves_only_after_a_handoff() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let event = test_app.seed_event("qualifiers").await;
    let alice = test_app.seed_player(event.id, "alice").await;
    let bob = test_app.seed_player(event.id, "bob").await;
    let token = test_app.token_for(&alice);

    let team_data = json!({
        "team_name": "Handoff Crew",
        "event_id": event.id,
        "min_size": 1,
        "max_size": 4,
        "members": [ { "user_id": bob.id } ]
    });
    let response = client
        .post(format!("{}/roster/teams", test_app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&team_data)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    let team_id = body["data"]["team"]["id"].as_str().unwrap().to_string();

    // Leaving while leader is rejected.
    let response = client
        .delete(format!(
            "{}/roster/teams/{}/members/{}",
            test_app.address, team_id, alice.id
        ))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // Hand leadership to Bob, then leave.
    let response = client
        .put(format!("{}/roster/teams/{}/leader", test_app.address, team_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "new_leader_user_id": bob.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .delete(format!(
            "{}/roster/teams/{}/members/{}",
            test_app.address, team_id, alice.id
        ))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let team_uuid: Uuid = team_id.parse().unwrap();
    let members = test_app.store.active_members(team_uuid).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, bob.id);
    assert_eq!(members[0].status, MemberStatus::Active);
}

#[tokio::test]
async fn an_invite_only_team_admits_by_code_and_refuses_petitions() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let event = test_app.seed_event("qualifiers").await;
    let alice = test_app.seed_player(event.id, "alice").await;
    let carol = test_app.seed_player(event.id, "carol").await;

    let team_data = json!({
        "team_name": "Secret Society",
        "event_id": event.id,
        "min_size": 1,
        "max_size": 4,
        "is_invite_only": true
    });
    let response = client
        .post(format!("{}/roster/teams", test_app.address))
        .header("Authorization", format!("Bearer {}", test_app.token_for(&alice)))
        .json(&team_data)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    let team_id = body["data"]["team"]["id"].as_str().unwrap().to_string();
    let invite_code = body["data"]["team"]["invite_code"].as_str().unwrap().to_string();

    // Petitions are refused outright.
    let carol_token = test_app.token_for(&carol);
    let response = client
        .post(format!(
            "{}/roster/teams/{}/join_requests",
            test_app.address, team_id
        ))
        .header("Authorization", format!("Bearer {}", carol_token))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    // The code grants membership directly.
    let response = client
        .post(format!("{}/roster/teams/join_by_code", test_app.address))
        .header("Authorization", format!("Bearer {}", carol_token))
        .json(&json!({ "invite_code": invite_code }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["member_count"], 2);
}

#[tokio::test]
async fn admin_routes_are_gated_by_role() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let event = test_app.seed_event("qualifiers").await;
    let alice = test_app.seed_player(event.id, "alice").await;
    let admin = test_app.seed_admin("root").await;

    let response = client
        .get(format!(
            "{}/admin/events/{}/teams",
            test_app.address, event.id
        ))
        .header("Authorization", format!("Bearer {}", test_app.token_for(&alice)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = client
        .get(format!(
            "{}/admin/events/{}/teams",
            test_app.address, event.id
        ))
        .header("Authorization", format!("Bearer {}", test_app.token_for(&admin)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn roster_routes_require_a_token() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/roster/invitations", test_app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}
