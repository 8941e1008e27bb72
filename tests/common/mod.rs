#![allow(dead_code)]
use image::{ImageFormat, Rgb, RgbImage};
use image_relevance::{ImageUpload, RankerConfig};
use serde_json::Value;
use std::io::{Cursor, Read};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

pub struct Captured {
    pub authorization: Option<String>,
    pub body: Value,
}

/// Local stand-in for the chat-completions endpoint.
pub struct MockServer {
    pub url: String,
    pub requests: Receiver<Captured>,
}

impl MockServer {
    /// `respond` gets the request index and JSON body and returns a status and a response body.
    pub fn spawn<F>(respond: F) -> Self
    where
        F: Fn(usize, &Value) -> (u16, String) + Send + 'static,
    {
        let server = Server::http("127.0.0.1:0").expect("Failed to bind mock server");
        let addr = server
            .server_addr()
            .to_ip()
            .expect("Mock server is not listening on TCP");
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for (i, mut request) in server.incoming_requests().enumerate() {
                let mut raw = String::new();
                if request.as_reader().read_to_string(&mut raw).is_err() {
                    continue;
                }
                let body: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);
                let authorization = request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("Authorization"))
                    .map(|h| h.value.as_str().to_string());

                let (status, reply) = respond(i, &body);
                let _ = tx.send(Captured {
                    authorization,
                    body,
                });
                let header: Header = "Content-Type: application/json"
                    .parse()
                    .expect("Invalid header");
                let _ = request.respond(
                    Response::from_string(reply)
                        .with_status_code(status)
                        .with_header(header),
                );
            }
        });

        Self {
            url: format!("http://{addr}/v1/chat/completions"),
            requests: rx,
        }
    }

    pub fn config(&self) -> RankerConfig {
        let mut config = RankerConfig::new("sk-test");
        config.base_url.clone_from(&self.url);
        config.timeout = Duration::from_secs(5);
        config.max_retries = 2;
        config.retry_base = 0.0;
        config.retry_max = 0.0;
        config
    }

    pub fn drain(&self) -> Vec<Captured> {
        self.requests.try_iter().collect()
    }
}

pub fn completion(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

/// Text of the first user message, whether plain or split into parts.
pub fn prompt_text(body: &Value) -> String {
    let content = &body["messages"][0]["content"];
    match content {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|p| p["text"].as_str())
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    }
}

/// URL of the `image_url` part of the first user message, if any.
pub fn image_url(body: &Value) -> Option<String> {
    body["messages"][0]["content"]
        .as_array()?
        .iter()
        .find_map(|p| p["image_url"]["url"].as_str().map(ToOwned::to_owned))
}

pub fn solid_png(name: &str, color: [u8; 3]) -> ImageUpload {
    let img = RgbImage::from_pixel(8, 8, Rgb(color));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("Failed to encode test image");
    ImageUpload::from_bytes(name, out.into_inner()).expect("Failed to load test image")
}
