use std::{
    sync::Arc,
    time::Duration,
};

use babbel2anki::{
    anki::AnkiClient,
    bridge::Bridge,
    core::DebugLog,
    persistence::{
        ConnectionStatus,
        SettingsStore,
    },
    websocket::{
        ClientRegistry,
        WebSocketServer,
    },
};
use futures_util::{
    SinkExt,
    StreamExt,
};
use serde_json::{
    json,
    Value,
};
use tokio::{
    net::TcpStream,
    time::timeout,
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::Message,
    MaybeTlsStream,
    WebSocketStream,
};

mod common;

use common::{
    add_notes_payload,
    FakeAnkiConnect,
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_bridge(fake: &FakeAnkiConnect, reachable: bool) -> (Socket, SettingsStore, String) {
    let settings = SettingsStore::in_memory();
    settings.set_connection_status(&ConnectionStatus::now(reachable));

    let debug_log = DebugLog::attach(&settings);
    let clients = Arc::new(ClientRegistry::default());
    let anki = Arc::new(AnkiClient::new(fake.url.clone(), debug_log.clone()));
    let bridge = Arc::new(Bridge::new(anki, settings.clone(), debug_log));

    let server = WebSocketServer::bind("127.0.0.1:0".parse().unwrap(), clients, bridge)
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());

    let url = format!("ws://{}", addr);
    let (socket, _) = connect_async(url.as_str()).await.unwrap();
    (socket, settings, url)
}

async fn send(socket: &mut Socket, frame: Value) {
    socket.send(Message::text(frame.to_string())).await.unwrap();
}

async fn next_frame(socket: &mut Socket) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for a frame")
            .unwrap()
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Collects frames until the reply to `message_id` arrives, returning it with the notifications seen.
async fn reply_to(socket: &mut Socket, message_id: &str) -> (Value, Vec<Value>) {
    let mut notifications = Vec::new();
    loop {
        let frame = next_frame(socket).await;
        match frame["command"].as_str() {
            Some("response") if frame["messageId"] == message_id => return (frame, notifications),
            Some("notification") => notifications.push(frame),
            _ => {}
        }
    }
}

#[tokio::test]
async fn test_add_notes_round_trip() {
    let fake = FakeAnkiConnect::healthy(json!([true, false]), json!([555])).await;
    let (mut socket, _, _) = start_bridge(&fake, true).await;

    let mut frame = add_notes_payload(&["hola", "adiós"]);
    frame["messageId"] = json!("req-1");
    frame["action"] = json!("addNotes");
    send(&mut socket, frame).await;

    let (reply, notifications) = reply_to(&mut socket, "req-1").await;

    assert_eq!(
        reply["body"],
        json!({
            "notesIds": [555],
            "addedNotes": 1,
            "totalNotes": 2,
            "duplicates": 1,
            "error": null
        })
    );
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["body"]["title"], "Added 1 new words");
    assert_eq!(notifications[0]["body"]["message"], "\nTotal words: 2\nDuplicates skipped: 1");
}

#[tokio::test]
async fn test_notification_goes_only_to_requesting_client() {
    let fake = FakeAnkiConnect::healthy(json!([true]), json!([9])).await;
    let (mut requester, _, url) = start_bridge(&fake, true).await;
    let (mut bystander, _) = connect_async(url.as_str()).await.unwrap();

    let mut frame = add_notes_payload(&["gato"]);
    frame["messageId"] = json!("req-a");
    frame["action"] = json!("addNotes");
    send(&mut requester, frame).await;

    let (reply, notifications) = reply_to(&mut requester, "req-a").await;
    assert_eq!(reply["body"]["addedNotes"], 1);
    assert_eq!(notifications.len(), 1);

    // Anything queued for the bystander would arrive ahead of its PONG.
    bystander.send(Message::text("PING".to_string())).await.unwrap();
    let first = timeout(Duration::from_secs(5), bystander.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(first, Message::text("PONG".to_string()));
}

#[tokio::test]
async fn test_unreachable_anki_skips_all_calls() {
    let fake = FakeAnkiConnect::healthy(json!([true]), json!([1])).await;
    let (mut socket, _, _) = start_bridge(&fake, false).await;

    let mut frame = add_notes_payload(&["hola"]);
    frame["messageId"] = json!("req-2");
    frame["action"] = json!("addNotes");
    send(&mut socket, frame).await;

    let (reply, notifications) = reply_to(&mut socket, "req-2").await;

    assert_eq!(
        reply["body"],
        json!({ "addedNotes": -1, "totalNotes": -1, "error": "Anki is not reachable" })
    );
    assert_eq!(notifications[0]["body"]["title"], "Failed to add words");
    assert!(fake.requests().is_empty());
}

#[tokio::test]
async fn test_settings_actions_and_ping() {
    let fake = FakeAnkiConnect::healthy(json!([]), json!([])).await;
    let (mut socket, settings, _) = start_bridge(&fake, true).await;

    socket.send(Message::text("PING".to_string())).await.unwrap();
    let pong = timeout(Duration::from_secs(5), socket.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(pong, Message::text("PONG".to_string()));

    // Unknown actions get no reply; the next answered frame is the status request.
    send(&mut socket, json!({ "messageId": "x", "action": "openOptions" })).await;
    send(&mut socket, json!({ "messageId": "s", "action": "connectionStatus" })).await;
    let (status, _) = reply_to(&mut socket, "s").await;
    assert_eq!(status["body"]["ok"], true);

    send(&mut socket, json!({ "messageId": "d", "action": "setDebugLog", "enabled": true })).await;
    let (reply, _) = reply_to(&mut socket, "d").await;
    assert_eq!(reply["body"], json!({ "debugLog": true }));
    assert!(settings.debug_log());
}
