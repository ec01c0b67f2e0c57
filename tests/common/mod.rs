#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{
    json,
    Value,
};
use tokio::{
    io::{
        AsyncReadExt,
        AsyncWriteExt,
    },
    net::{
        TcpListener,
        TcpStream,
    },
    task::JoinHandle,
};

type Responder = dyn Fn(&str, &Value) -> (u16, String) + Send + Sync;

/// Minimal stand-in for AnkiConnect: records each request body and answers
/// with whatever the responder returns for its action.
pub struct FakeAnkiConnect {
    pub url: String,
    requests: Arc<Mutex<Vec<Value>>>,
    handle: JoinHandle<()>,
}

impl FakeAnkiConnect {
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&str, &Value) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let responder: Arc<Responder> = Arc::new(responder);

        let recorded = requests.clone();
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let recorded = recorded.clone();
                let responder = responder.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, recorded, responder).await;
                });
            }
        });

        Self { url, requests, handle }
    }

    /// Answers every action with a well-formed reply, using the given mask and ids.
    pub async fn healthy(mask: Value, ids: Value) -> Self {
        Self::start(move |action, _| {
            let body = match action {
                "version" => json!({ "result": 6, "error": null }),
                "createDeck" => json!({ "result": 1, "error": null }),
                "createModel" => json!({ "result": null, "error": "Model name already exists" }),
                "canAddNotes" => json!({ "result": mask, "error": null }),
                "addNotes" => json!({ "result": ids, "error": null }),
                _ => json!({ "result": null, "error": "unsupported action" }),
            };
            (200, body.to_string())
        })
        .await
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r["action"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn request_for(&self, action: &str) -> Option<Value> {
        self.requests().into_iter().find(|r| r["action"] == action)
    }
}

impl Drop for FakeAnkiConnect {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(
    mut stream: TcpStream,
    recorded: Arc<Mutex<Vec<Value>>>,
    responder: Arc<Responder>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body: Value = serde_json::from_slice(&buf[header_end..]).unwrap_or(Value::Null);
    let action = body["action"].as_str().unwrap_or_default().to_string();
    recorded.lock().push(body.clone());

    let (status, reply) = responder(&action, &body);
    let response = format!(
        "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reply.len(),
        reply
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

pub fn add_notes_payload(words: &[&str]) -> Value {
    json!({
        "deckName": "Babbel",
        "modelName": "Babbel Word",
        "tagString": "babbel, spanish",
        "learnedItems": words
            .iter()
            .map(|w| json!({
                "learnLanguageText": w,
                "displayLanguageText": format!("{} (en)", w),
                "image": { "id": format!("img-{}", w) },
                "sound": { "id": format!("snd-{}", w) }
            }))
            .collect::<Vec<_>>()
    })
}
