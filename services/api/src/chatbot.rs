//! FAQ chatbot: a local keyword table answers the common questions, the
//! rest go to the configured upstream model.

use anyhow::{Result, anyhow};

use crate::config::ChatConfig;

/// Reply used when the upstream model cannot be reached
pub const UNAVAILABLE_REPLY: &str = "AI service is temporarily unavailable.";

/// Reply used when the upstream model returns nothing usable
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't find that information.";

struct FaqEntry {
    keywords: &'static [&'static str],
    answer: &'static str,
}

const FAQ: &[FaqEntry] = &[
    FaqEntry {
        keywords: &["admission", "apply", "entrance"],
        answer: "NERIST admissions are done through JEE Main and NERIST Entrance Exam depending on the course.",
    },
    FaqEntry {
        keywords: &["library", "timing"],
        answer: "NERIST central library is open from 9 AM to 8 PM on working days.",
    },
    FaqEntry {
        keywords: &["hostel"],
        answer: "NERIST has separate boys and girls hostels inside the campus.",
    },
    FaqEntry {
        keywords: &["physics lab"],
        answer: "Physics lab is located in the Physics Building, South Campus.",
    },
];

/// Answer from the local FAQ table, if any keyword matches
pub fn local_answer(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();

    FAQ.iter()
        .find(|entry| entry.keywords.iter().any(|keyword| lower.contains(keyword)))
        .map(|entry| entry.answer)
}

/// Ask the configured OpenAI-compatible endpoint for an answer
pub async fn upstream_answer(
    client: &reqwest::Client,
    config: &ChatConfig,
    message: &str,
) -> Result<String> {
    let api_key = config
        .api_key
        .as_deref()
        .ok_or_else(|| anyhow!("no upstream API key configured"))?;

    let body = serde_json::json!({
        "model": config.model,
        "messages": [
            {
                "role": "system",
                "content": "You are a chatbot that answers NERIST-related questions. Answer politely even if unsure."
            },
            {
                "role": "user",
                "content": message
            }
        ]
    });

    let response = client
        .post(&config.endpoint)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await?
        .error_for_status()?;

    let payload: serde_json::Value = response.json().await?;
    let reply = payload["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_REPLY.to_string());

    Ok(reply)
}
