//! Incremental decoder for the generative service's server-sent event stream.
//!
//! Bytes arrive in arbitrary network chunks; a `data:` line is only decoded once
//! its terminating newline has been seen.

use serde::Deserialize;

use super::NarrativeError;

#[derive(Debug, Default, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one network chunk and returns the text fragments completed by it.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, NarrativeError> {
        self.pending.extend_from_slice(bytes);

        let mut fragments = Vec::new();
        while let Some(newline) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            if let Some(text) = decode_line(&line)? {
                fragments.push(text);
            }
        }
        Ok(fragments)
    }

    /// Decodes a trailing line left without a newline when the stream ends.
    pub fn finish(&mut self) -> Result<Option<String>, NarrativeError> {
        let line = std::mem::take(&mut self.pending);
        decode_line(&line)
    }
}

fn decode_line(raw: &[u8]) -> Result<Option<String>, NarrativeError> {
    let line = std::str::from_utf8(raw)
        .map_err(|e| NarrativeError::Decode(format!("stream is not valid UTF-8: {e}")))?;
    let line = line.trim_end_matches(['\n', '\r']);

    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let payload = payload.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return Ok(None);
    }

    let chunk: StreamChunk = serde_json::from_str(payload)
        .map_err(|e| NarrativeError::Decode(format!("invalid stream event: {e}")))?;
    let text: String = chunk
        .candidates
        .into_iter()
        .take(1)
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .filter_map(|part| part.text)
        .collect();

    Ok((!text.is_empty()).then_some(text))
}
