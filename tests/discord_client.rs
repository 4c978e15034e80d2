// tests/discord_client.rs
use free_games_notifier::chat::discord::DiscordClient;
use free_games_notifier::chat::{
    ChannelId, ChatPlatform, Embed, GuildId, OutgoingMessage, PlatformError, RoleId, UserId,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> DiscordClient {
    DiscordClient::new("tok".into())
        .with_base_url(server.uri())
        .with_retries(2)
}

#[tokio::test]
async fn send_message_posts_embed_with_bot_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/channels/10/messages"))
        .and(header("authorization", "Bot tok"))
        .and(body_partial_json(json!({
            "content": "hi <@&1>",
            "embeds": [{"title": "Portal", "description": "d"}],
            "allowed_mentions": {"parse": ["roles", "users"]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1"})))
        .expect(1)
        .mount(&server)
        .await;

    let msg = OutgoingMessage {
        content: "hi <@&1>".into(),
        embed: Some(Embed {
            title: "Portal".into(),
            description: "d".into(),
            ..Embed::default()
        }),
    };
    client(&server)
        .send_message(ChannelId(10), &msg)
        .await
        .expect("sent");
}

#[tokio::test]
async fn roles_are_looked_up_by_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/guilds/20/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "1", "name": "@everyone"},
            {"id": "77", "name": "Free Games"}
        ])))
        .mount(&server)
        .await;

    let c = client(&server);
    let role = c.get_role(GuildId(20), "Free Games").await.unwrap().unwrap();
    assert_eq!(role.id, RoleId(77));
    assert!(c.get_role(GuildId(20), "Nope").await.unwrap().is_none());
}

#[tokio::test]
async fn member_roles_and_add_role() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/guilds/20/members/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"roles": ["77", "78"]})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/guilds/20/members/5/roles/77"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server);
    let roles = c.user_roles(GuildId(20), UserId(5)).await.unwrap();
    assert_eq!(roles, vec![RoleId(77), RoleId(78)]);
    c.add_role(GuildId(20), UserId(5), RoleId(77)).await.unwrap();
}

#[tokio::test]
async fn unknown_channel_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels/10"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/channels/11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "11", "guild_id": "20"})))
        .mount(&server)
        .await;

    let c = client(&server);
    assert_eq!(c.channel_guild(ChannelId(10)).await.unwrap(), None);
    assert_eq!(c.channel_guild(ChannelId(11)).await.unwrap(), Some(GuildId(20)));
}

#[tokio::test]
async fn server_errors_are_retried_then_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/guilds/20/roles"))
        .respond_with(ResponseTemplate::new(502))
        .expect(2)
        .mount(&server)
        .await;

    let err = client(&server)
        .create_role(GuildId(20), "Free Games")
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Status { status: 502, .. }));
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/guilds/20/members/5/roles/77"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Missing Permissions"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .add_role(GuildId(20), UserId(5), RoleId(77))
        .await
        .unwrap_err();
    match err {
        PlatformError::Status { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("Missing Permissions"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn rate_limit_waits_for_retry_after_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/channels/10/messages"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0.05"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/channels/10/messages"))
        .and(header(
            "user-agent",
            concat!("DiscordBot (free-games-notifier, ", env!("CARGO_PKG_VERSION"), ")"),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1"})))
        .expect(1)
        .mount(&server)
        .await;

    let msg = OutgoingMessage {
        content: "hi".into(),
        embed: None,
    };
    let started = std::time::Instant::now();
    client(&server)
        .send_message(ChannelId(10), &msg)
        .await
        .expect("sent after rate limit");
    assert!(started.elapsed() < std::time::Duration::from_millis(450));
}
