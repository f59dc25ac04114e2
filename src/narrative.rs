//! Generative-AI route choice and narrative.
//!
//! Two independent invocations of the text-generation endpoint: a
//! classification call that picks the most scenic route among the fetched
//! alternatives, and a streamed free-text call that produces the drive
//! narrative. The choice call is memoized per distinct route set. The
//! narrative arrives as a finite, non-restartable sequence of text chunks;
//! the consumer concatenates them in arrival order, and a chunk-level
//! failure closes the sequence early instead of aborting the run.

use std::collections::HashMap;
use std::time::Duration;

use futures::{Stream, StreamExt};
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use crate::error::{AiError, ConfigError};
use crate::Route;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const MODEL: &str = "gemini-1.5-flash-latest";

/// Client for the generative-text endpoint.
pub struct NarrativeClient {
    client: Client,
    api_key: String,
    choice_cache: Mutex<HashMap<String, Option<usize>>>,
}

impl NarrativeClient {
    /// Create the client from the AI credential.
    ///
    /// A missing or blank credential is a configuration error the caller
    /// surfaces once at startup; the pipeline then runs without AI features.
    pub fn new(api_key: Option<String>) -> Result<Self, ConfigError> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingCredential("GEMINI_API_KEY"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_key,
            choice_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Ask the model which route is the most scenic.
    ///
    /// Returns the 1-based route number, validated against the candidate
    /// count. Parse failures, out-of-range answers, and transport failures
    /// are all "inconclusive" (`None`); the orchestrator's fallback applies.
    /// Memoized per distinct route set.
    pub async fn choose_route(&self, routes: &[Route]) -> Option<usize> {
        let prompt = choice_prompt(routes);
        if let Some(&hit) = self.choice_cache.lock().await.get(&prompt) {
            return hit;
        }

        let choice = match self.generate(&prompt).await {
            Ok(text) => {
                let choice = parse_choice(&text, routes.len());
                if choice.is_none() {
                    warn!("route choice inconclusive, model said {text:?}");
                }
                choice
            }
            Err(e) => {
                warn!("route choice degraded to inconclusive: {e}");
                None
            }
        };

        self.choice_cache.lock().await.insert(prompt, choice);
        choice
    }

    /// Stream the drive narrative for the chosen route.
    ///
    /// The returned sequence yields text chunks in arrival order. An error
    /// establishing the call is returned here; an error mid-stream closes
    /// the sequence early with whatever arrived so far.
    pub async fn narrative_stream(
        &self,
        route: &Route,
    ) -> Result<impl Stream<Item = String>, AiError> {
        let prompt = narrative_prompt(route);
        let resp = self
            .client
            .post(format!("{API_BASE}/models/{MODEL}:streamGenerateContent"))
            .query(&[("alt", "sse"), ("key", self.api_key.as_str())])
            .json(&request_body(&prompt))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AiError::Status(status));
        }

        debug!("narrative stream established");
        Ok(sse_text_stream(Box::pin(resp.bytes_stream())))
    }

    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let resp = self
            .client
            .post(format!("{API_BASE}/models/{MODEL}:generateContent"))
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body(prompt))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AiError::Status(status));
        }

        let bytes = resp.bytes().await?;
        let payload: GenerateResponse =
            serde_json::from_slice(&bytes).map_err(|_| AiError::Parse)?;
        let text = payload_text(&payload);
        if text.is_empty() {
            return Err(AiError::Parse);
        }
        Ok(text)
    }
}

// ============================================================================
// Prompts and parsing
// ============================================================================

fn request_body(prompt: &str) -> serde_json::Value {
    json!({ "contents": [{ "parts": [{ "text": prompt }] }] })
}

/// Prompt enumerating every candidate with its scenic-spot count.
fn choice_prompt(routes: &[Route]) -> String {
    let mut prompt = String::from(
        "Analyze the following driving route options and determine which is the most scenic. \
         Respond with only the number of your chosen route (e.g., '1', '2', '3').\n\n",
    );
    for (i, route) in routes.iter().enumerate() {
        let scenic_summary = if route.scenic_spots.is_empty() {
            "Direct route.".to_string()
        } else {
            format!("{} scenic spots found.", route.scenic_spots.len())
        };
        prompt.push_str(&format!(
            "**Option {}**: via {}. Details: {}\n",
            i + 1,
            route.summary,
            scenic_summary
        ));
    }
    prompt
}

fn narrative_prompt(route: &Route) -> String {
    let sights = if route.scenic_spots.is_empty() {
        "None specified".to_string()
    } else {
        route
            .scenic_spots
            .iter()
            .take(3)
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "You are an Expert Drive Curator, blending the passion of a driving enthusiast with \
         the precision of a route analyst. Your goal is to create a compelling, informative, \
         and concise summary of the following scenic drive.\n\n\
         **Route Data:**\n\
         - **Primary Roads:** {summary}\n\
         - **Detected Key Sights:** {sights}\n\n\
         **Instructions:**\n\
         Write an engaging narrative (2-3 short paragraphs). Start with a strong opening that \
         captures the essence of the drive. Then, describe the road itself—mentioning specific \
         highways, the terrain (urban, ghats, coastal), and the driving feel (winding, open, \
         etc.). Weave in a description of one or two of the most significant Key Sights by \
         name. Conclude with a summary of what makes this drive special and who it's perfect \
         for. Your tone should be knowledgeable and exciting, but grounded in the facts \
         provided.",
        summary = route.summary,
    )
}

/// Extract the digit characters of the model's answer and validate the
/// number against the candidate count. Out-of-range answers are
/// inconclusive, the same as unparsable ones.
fn parse_choice(text: &str, route_count: usize) -> Option<usize> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    let number: usize = digits.parse().ok()?;
    (1..=route_count).contains(&number).then_some(number)
}

// ============================================================================
// Wire shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

fn payload_text(payload: &GenerateResponse) -> String {
    payload
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .map(|p| p.text.as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}

// ============================================================================
// Server-sent-event consumption
// ============================================================================

/// Turn the raw SSE byte stream into a sequence of text chunks.
///
/// Bytes are buffered until a full line is available, so multi-byte
/// characters split across network chunks stay intact. Lines that are not
/// parseable events (keep-alives, malformed payloads) are skipped. A
/// transport error mid-stream ends the sequence.
fn sse_text_stream<S, B>(body: S) -> impl Stream<Item = String>
where
    S: Stream<Item = Result<B, reqwest::Error>> + Unpin,
    B: AsRef<[u8]>,
{
    futures::stream::unfold(
        (body, Vec::<u8>::new(), false),
        |(mut body, mut buffer, mut done)| async move {
            loop {
                if let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    if let Some(text) = parse_sse_line(&line) {
                        return Some((text, (body, buffer, done)));
                    }
                    continue;
                }
                if done {
                    // A final event may arrive without a trailing newline.
                    if buffer.is_empty() {
                        return None;
                    }
                    let line = std::mem::take(&mut buffer);
                    match parse_sse_line(&line) {
                        Some(text) => return Some((text, (body, buffer, done))),
                        None => return None,
                    }
                }
                match body.next().await {
                    Some(Ok(chunk)) => buffer.extend_from_slice(chunk.as_ref()),
                    Some(Err(e)) => {
                        warn!("narrative stream closed early: {e}");
                        done = true;
                    }
                    None => done = true,
                }
            }
        },
    )
}

/// Non-empty text carried by one SSE line, if it is a parseable event.
fn parse_sse_line(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let payload = line.trim().strip_prefix("data:")?;
    let text = event_text(payload.trim())?;
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Text carried by one SSE event payload, if it parses.
fn event_text(payload: &str) -> Option<String> {
    let parsed: GenerateResponse = serde_json::from_str(payload).ok()?;
    Some(payload_text(&parsed))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScenicSpot;

    fn route(id: &str, summary: &str, spot_count: usize) -> Route {
        Route {
            id: id.into(),
            summary: summary.into(),
            distance_text: "100 km".into(),
            duration_text: "2 hours".into(),
            polyline: String::new(),
            scenic_spots: (0..spot_count)
                .map(|i| ScenicSpot {
                    place_id: format!("{id}-{i}"),
                    name: format!("Spot {i}"),
                    photo_reference: "ph".into(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_parse_choice_plain_number() {
        assert_eq!(parse_choice("2", 3), Some(2));
    }

    #[test]
    fn test_parse_choice_prose_answer() {
        assert_eq!(parse_choice("I would pick route 3.", 3), Some(3));
    }

    #[test]
    fn test_parse_choice_no_digits() {
        assert_eq!(parse_choice("the coastal one", 3), None);
    }

    #[test]
    fn test_parse_choice_out_of_range() {
        assert_eq!(parse_choice("7", 3), None);
        assert_eq!(parse_choice("0", 3), None);
    }

    #[test]
    fn test_choice_prompt_lists_all_options() {
        let prompt = choice_prompt(&[route("Route 1", "NH 48", 3), route("Route 2", "NH 60", 0)]);
        assert!(prompt.contains("**Option 1**: via NH 48. Details: 3 scenic spots found."));
        assert!(prompt.contains("**Option 2**: via NH 60. Details: Direct route."));
    }

    #[test]
    fn test_narrative_prompt_caps_sights_at_three() {
        let prompt = narrative_prompt(&route("Route 1", "NH 48", 5));
        assert!(prompt.contains("Spot 0, Spot 1, Spot 2"));
        assert!(!prompt.contains("Spot 3"));
    }

    #[test]
    fn test_narrative_prompt_without_sights() {
        let prompt = narrative_prompt(&route("Route 1", "NH 48", 0));
        assert!(prompt.contains("None specified"));
    }

    #[test]
    fn test_event_text_extracts_parts() {
        let payload =
            r#"{"candidates":[{"content":{"parts":[{"text":"The "},{"text":"ghats"}]}}]}"#;
        assert_eq!(event_text(payload), Some("The ghats".to_string()));
    }

    #[test]
    fn test_event_text_skips_malformed() {
        assert_eq!(event_text("not json"), None);
    }

    #[tokio::test]
    async fn test_sse_stream_concatenates_in_arrival_order() {
        let chunks: Vec<Result<Vec<u8>, reqwest::Error>> = vec![
            Ok(b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"A winding \"}]}}]}\n\n"
                .to_vec()),
            Ok(b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"coastal road.\"}]}}]}\n"
                .to_vec()),
        ];
        let body = futures::stream::iter(chunks);
        let text: String = sse_text_stream(Box::pin(body)).collect().await;
        assert_eq!(text, "A winding coastal road.");
    }

    #[tokio::test]
    async fn test_sse_stream_final_event_without_newline() {
        let chunks: Vec<Result<Vec<u8>, reqwest::Error>> = vec![Ok(
            b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"tail\"}]}}]}".to_vec(),
        )];
        let body = futures::stream::iter(chunks);
        let text: String = sse_text_stream(Box::pin(body)).collect().await;
        assert_eq!(text, "tail");
    }

    #[tokio::test]
    async fn test_sse_stream_handles_split_events() {
        // One event split across two network chunks, plus a keep-alive line.
        let chunks: Vec<Result<Vec<u8>, reqwest::Error>> = vec![
            Ok(b"data: {\"candidates\":[{\"content\":{\"par".to_vec()),
            Ok(b"ts\":[{\"text\":\"hello\"}]}}]}\n: keep-alive\n".to_vec()),
        ];
        let body = futures::stream::iter(chunks);
        let text: String = sse_text_stream(Box::pin(body)).collect().await;
        assert_eq!(text, "hello");
    }
}
