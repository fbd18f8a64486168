//! Shared test utilities for integration tests
//!
//! Bundled template locations, a completion client that answers per field, and a
//! minimal HTTP server standing in for the model provider.

use async_trait::async_trait;
use issuegen::error::ProviderError;
use issuegen::prompts::{GenerationDescriptor, PromptCatalog, Strategy};
use issuegen::provider::CompletionClient;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;

pub fn bundled_templates_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates")
}

pub fn bundled_prompts_file() -> PathBuf {
    bundled_templates_dir().join("prompts.json")
}

pub fn bundled_prompts() -> PromptCatalog {
    PromptCatalog::load(&bundled_prompts_file()).expect("bundled prompts.json should load")
}

/// The bundled catalog without one placeholder's descriptor.
pub fn prompts_without(placeholder: &str) -> PromptCatalog {
    let full = bundled_prompts();
    let kept: Vec<GenerationDescriptor> = full
        .placeholder_names()
        .filter(|name| *name != placeholder)
        .filter_map(|name| full.descriptor(name).cloned())
        .collect();
    PromptCatalog::new(full.system_prompt(), kept)
}

/// Field name a user prompt was built for.
pub fn field_of(user_prompt: &str) -> Option<String> {
    let start = user_prompt.find("fills the '")? + "fills the '".len();
    let len = user_prompt[start..].find('\'')?;
    Some(user_prompt[start..start + len].to_string())
}

/// A plausible, slightly untidy model answer for a field. Answers mention the
/// field name so each rendered value is unique within a document.
pub fn canned_answer(field: &str, descriptor: &GenerationDescriptor) -> String {
    match &descriptor.strategy {
        Strategy::Header(_) => format!("Title: \"Email login {}.\"", field.replace('_', " ")),
        Strategy::Sentence(_) => format!(
            "Returning users sign in with email for {}. The legacy username flow is retired.",
            field
        ),
        Strategy::Bullets(_) => format!(
            "Here is the list:\n- {} first point\n- {} second point\n- {} third point",
            field, field, field
        ),
        Strategy::Numbered(_) => format!(
            "1. Open the {} page\n2. Enter the details\n3. Submit the form",
            field
        ),
        Strategy::Selection(params) => format!("'{}'", params.options[0]),
        Strategy::Table(params) => {
            let columns = params.headers.len();
            let mut out = String::from("```\n");
            for table in 1..=params.table_limit {
                out.push_str(&format!("**T{}: {} scenario {}**\n", table, field, table));
                for step in 1..=3 {
                    let cells: Vec<String> = (0..columns)
                        .map(|column| {
                            if column == 0 {
                                format!("{}.", step)
                            } else {
                                format!("{} r{}c{}", field, step, column)
                            }
                        })
                        .collect();
                    out.push_str(&format!("| {} |\n", cells.join(" | ")));
                }
            }
            out.push_str("```");
            out
        }
    }
}

/// Completion client answering from `canned_answer`, optionally failing on the n-th call.
pub struct FieldClient {
    catalog: PromptCatalog,
    fail_on_call: Option<usize>,
    calls: Mutex<Vec<String>>,
}

impl FieldClient {
    pub fn new(catalog: PromptCatalog) -> Self {
        Self {
            catalog,
            fail_on_call: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail with a transport error on the given 1-based call.
    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for FieldClient {
    async fn complete(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _model: &str,
    ) -> Result<String, ProviderError> {
        let field = field_of(user_prompt).unwrap_or_default();
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(field.clone());
            calls.len()
        };
        if self.fail_on_call == Some(call) {
            return Err(ProviderError::Transport("connection reset by peer".to_string()));
        }
        match self.catalog.descriptor(&field) {
            Some(descriptor) => Ok(canned_answer(&field, descriptor)),
            None => Err(ProviderError::EmptyResponse),
        }
    }

    fn provider_name(&self) -> &str {
        "field-client"
    }
}

/// One request seen by the fake provider.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }

    /// Field named in the user message of a chat-completions request.
    pub fn field(&self) -> Option<String> {
        let body = self.json();
        let user = body["messages"][1]["content"].as_str()?;
        field_of(user)
    }
}

/// Blocking HTTP/1.1 server on a background thread. The responder gets the
/// 0-based request index and returns (status, JSON body).
pub struct FakeProvider {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeProvider {
    pub fn start<F>(responder: F) -> Self
    where
        F: Fn(usize, &RecordedRequest) -> (u16, String) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let Some(request) = read_request(&stream) else {
                    continue;
                };
                let index = recorded.lock().unwrap().len();
                let (status, body) = responder(index, &request);
                recorded.lock().unwrap().push(request);
                write_response(&mut stream, status, &body);
            }
        });

        Self {
            base_url: format!("http://{}", address),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn chat_response(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

fn read_request(stream: &TcpStream) -> Option<RecordedRequest> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            headers.push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).ok()?;

    Some(RecordedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    })
}

fn write_response(stream: &mut TcpStream, status: u16, body: &str) {
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
