use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::json;
use uuid::Uuid;

use ctfarena_backend::models::invitation::{Invitation, InvitationStatus};
use ctfarena_backend::models::user::User;
use ctfarena_backend::store::RosterStore;

mod common;
use common::utils::{spawn_app, TestApp};

async fn create_team(
    test_app: &TestApp,
    client: &Client,
    leader: &User,
    event_id: Uuid,
    max_size: i32,
) -> String {
    let team_data = json!({
        "team_name": format!("Team {}", leader.username),
        "event_id": event_id,
        "min_size": 1,
        "max_size": max_size
    });
    let response = client
        .post(format!("{}/roster/teams", test_app.address))
        .header(
            "Authorization",
            format!("Bearer {}", test_app.token_for(leader)),
        )
        .json(&team_data)
        .send()
        .await
        .expect("Failed to execute team creation request");
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    body["data"]["team"]["id"].as_str().unwrap().to_string()
}

async fn send_invitation(
    test_app: &TestApp,
    client: &Client,
    team_id: &str,
    leader: &User,
    invitee_email: &str,
) -> Uuid {
    let response = client
        .post(format!(
            "{}/roster/teams/{}/invitations",
            test_app.address, team_id
        ))
        .header(
            "Authorization",
            format!("Bearer {}", test_app.token_for(leader)),
        )
        .json(&json!({
            "invitee_email": invitee_email,
            "message": "join us",
            "expires_at": Utc::now() + Duration::hours(6)
        }))
        .send()
        .await
        .expect("Failed to execute invitation request");
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    body["data"]["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn an_accepted_invitation_seats_the_invitee() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let event = test_app.seed_event("qualifiers").await;
    let alice = test_app.seed_player(event.id, "alice").await;
    let bob = test_app.seed_player(event.id, "bob").await;

    let team_id = create_team(&test_app, &client, &alice, event.id, 4).await;
    let invitation_id = send_invitation(&test_app, &client, &team_id, &alice, &bob.email).await;

    let response = client
        .post(format!(
            "{}/roster/invitations/{}/respond",
            test_app.address, invitation_id
        ))
        .header(
            "Authorization",
            format!("Bearer {}", test_app.token_for(&bob)),
        )
        .json(&json!({ "accept": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let team_uuid: Uuid = team_id.parse().unwrap();
    let members = test_app.store.active_members(team_uuid).await.unwrap();
    assert!(members.iter().any(|m| m.user_id == bob.id));
}

#[tokio::test]
async fn an_invitation_with_a_past_expiry_is_never_persisted() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let event = test_app.seed_event("qualifiers").await;
    let alice = test_app.seed_player(event.id, "alice").await;
    let bob = test_app.seed_player(event.id, "bob").await;

    let team_id = create_team(&test_app, &client, &alice, event.id, 4).await;

    let response = client
        .post(format!(
            "{}/roster/teams/{}/invitations",
            test_app.address, team_id
        ))
        .header(
            "Authorization",
            format!("Bearer {}", test_app.token_for(&alice)),
        )
        .json(&json!({
            "invitee_email": bob.email,
            "expires_at": Utc::now() - Duration::seconds(1)
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let invitations = test_app.store.invitations_for_user(bob.id).await.unwrap();
    assert!(invitations.is_empty());
}

#[tokio::test]
async fn inviting_an_unregistered_email_fails() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let event = test_app.seed_event("qualifiers").await;
    let alice = test_app.seed_player(event.id, "alice").await;

    let team_id = create_team(&test_app, &client, &alice, event.id, 4).await;

    let response = client
        .post(format!(
            "{}/roster/teams/{}/invitations",
            test_app.address, team_id
        ))
        .header(
            "Authorization",
            format!("Bearer {}", test_app.token_for(&alice)),
        )
        .json(&json!({
            "invitee_email": "ghost@example.com",
            "expires_at": Utc::now() + Duration::hours(6)
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn a_second_live_invitation_for_the_same_user_is_a_conflict() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let event = test_app.seed_event("qualifiers").await;
    let alice = test_app.seed_player(event.id, "alice").await;
    let bob = test_app.seed_player(event.id, "bob").await;

    let team_id = create_team(&test_app, &client, &alice, event.id, 4).await;
    send_invitation(&test_app, &client, &team_id, &alice, &bob.email).await;

    let response = client
        .post(format!(
            "{}/roster/teams/{}/invitations",
            test_app.address, team_id
        ))
        .header(
            "Authorization",
            format!("Bearer {}", test_app.token_for(&alice)),
        )
        .json(&json!({
            "invitee_email": bob.email,
            "expires_at": Utc::now() + Duration::hours(6)
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn only_the_invitee_may_respond() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let event = test_app.seed_event("qualifiers").await;
    let alice = test_app.seed_player(event.id, "alice").await;
    let bob = test_app.seed_player(event.id, "bob").await;
    let mallory = test_app.seed_player(event.id, "mallory").await;

    let team_id = create_team(&test_app, &client, &alice, event.id, 4).await;
    let invitation_id = send_invitation(&test_app, &client, &team_id, &alice, &bob.email).await;

    let response = client
        .post(format!(
            "{}/roster/invitations/{}/respond",
            test_app.address, invitation_id
        ))
        .header(
            "Authorization",
            format!("Bearer {}", test_app.token_for(&mallory)),
        )
        .json(&json!({ "accept": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn a_lapsed_invitation_expires_on_response_whatever_the_decision() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let event = test_app.seed_event("qualifiers").await;
    let alice = test_app.seed_player(event.id, "alice").await;
    let bob = test_app.seed_player(event.id, "bob").await;

    let team_id = create_team(&test_app, &client, &alice, event.id, 4).await;
    let team_uuid: Uuid = team_id.parse().unwrap();

    // Seed a lapsed pending invitation directly; sending refuses to create one.
    let lapsed = Invitation::new(
        team_uuid,
        bob.id,
        alice.id,
        None,
        Utc::now() - Duration::seconds(5),
    );
    let lapsed = test_app.store.insert_invitation(lapsed).await.unwrap();

    let response = client
        .post(format!(
            "{}/roster/invitations/{}/respond",
            test_app.address, lapsed.id
        ))
        .header(
            "Authorization",
            format!("Bearer {}", test_app.token_for(&bob)),
        )
        .json(&json!({ "accept": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 410);

    let stored = test_app
        .store
        .get_invitation(lapsed.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, InvitationStatus::Expired);

    // No membership was created.
    let members = test_app.store.active_members(team_uuid).await.unwrap();
    assert_eq!(members.len(), 1);
}

#[tokio::test]
async fn listing_my_invitations_normalizes_lapsed_ones() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let event = test_app.seed_event("qualifiers").await;
    let alice = test_app.seed_player(event.id, "alice").await;
    let bob = test_app.seed_player(event.id, "bob").await;

    let team_id = create_team(&test_app, &client, &alice, event.id, 4).await;
    let team_uuid: Uuid = team_id.parse().unwrap();

    let lapsed = Invitation::new(
        team_uuid,
        bob.id,
        alice.id,
        None,
        Utc::now() - Duration::seconds(5),
    );
    test_app.store.insert_invitation(lapsed).await.unwrap();

    let response = client
        .get(format!("{}/roster/invitations", test_app.address))
        .header(
            "Authorization",
            format!("Bearer {}", test_app.token_for(&bob)),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["total_count"], 1);
    assert_eq!(body["data"]["invitations"][0]["status"], "expired");
}

#[tokio::test]
async fn a_cancelled_invitation_cannot_be_accepted() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let event = test_app.seed_event("qualifiers").await;
    let alice = test_app.seed_player(event.id, "alice").await;
    let bob = test_app.seed_player(event.id, "bob").await;

    let team_id = create_team(&test_app, &client, &alice, event.id, 4).await;
    let invitation_id = send_invitation(&test_app, &client, &team_id, &alice, &bob.email).await;

    let response = client
        .post(format!(
            "{}/roster/invitations/{}/cancel",
            test_app.address, invitation_id
        ))
        .header(
            "Authorization",
            format!("Bearer {}", test_app.token_for(&alice)),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .post(format!(
            "{}/roster/invitations/{}/respond",
            test_app.address, invitation_id
        ))
        .header(
            "Authorization",
            format!("Bearer {}", test_app.token_for(&bob)),
        )
        .json(&json!({ "accept": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn acceptance_re_checks_capacity_at_commitment_time() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let event = test_app.seed_event("qualifiers").await;
    let alice = test_app.seed_player(event.id, "alice").await;
    let bob = test_app.seed_player(event.id, "bob").await;
    let carol = test_app.seed_player(event.id, "carol").await;
    let leader_token = test_app.token_for(&alice);

    // One free slot.
    let team_id = create_team(&test_app, &client, &alice, event.id, 2).await;
    let invitation_id = send_invitation(&test_app, &client, &team_id, &alice, &bob.email).await;

    // Carol takes the last slot while Bob's invitation sits pending.
    let response = client
        .post(format!("{}/roster/teams/{}/members", test_app.address, team_id))
        .header("Authorization", format!("Bearer {}", leader_token))
        .json(&json!({ "user_id": carol.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    // The stale acceptance fails and the invitation settles as declined.
    let response = client
        .post(format!(
            "{}/roster/invitations/{}/respond",
            test_app.address, invitation_id
        ))
        .header(
            "Authorization",
            format!("Bearer {}", test_app.token_for(&bob)),
        )
        .json(&json!({ "accept": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let invitation = test_app
        .store
        .get_invitation(invitation_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(invitation.status, InvitationStatus::Declined);
    assert!(invitation
        .resolution_note
        .unwrap()
        .contains("acceptance could not be honored"));
}
