//! Canned chatbot replies.
//!
//! Matching is a case-insensitive substring test, first rule wins.

pub const PLAIN_REPLY: &str = "Got it! (psst... switch to AI Mode for a smarter reply)";
pub const FALLBACK_REPLY: &str = "💬 Processing... your message is under deep space analysis.";
pub const REDIRECT_MESSAGE: &str = "⚠️ Emotional anomaly detected. Redirecting to Mood Space...";

const AI_RULES: &[(&str, &str)] = &[
    (
        "hello",
        "👾 Greetings, traveler. How may the OmniBot assist your journey?",
    ),
    (
        "study",
        "📡 Initiating learning protocol... try the Pomodoro technique to optimize data absorption.",
    ),
    (
        "help",
        "🧠 I possess adaptive knowledge modules. Ask anything, I shall respond.",
    ),
    ("bye", "🌌 Logging out from this timeline. Stay stellar."),
];

const SAD_WORDS: &[&str] = &["sad", "tired", "lonely", "depressed", "hopeless", "down"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectedMood {
    Sad,
    Neutral,
}

pub fn reply_for(input: &str, ai_mode: bool) -> &'static str {
    if !ai_mode {
        return PLAIN_REPLY;
    }
    let input = input.to_lowercase();
    AI_RULES
        .iter()
        .find(|(keyword, _)| input.contains(keyword))
        .map_or(FALLBACK_REPLY, |(_, reply)| reply)
}

pub fn detect_mood(input: &str) -> DetectedMood {
    let input = input.to_lowercase();
    if SAD_WORDS.iter().any(|word| input.contains(word)) {
        DetectedMood::Sad
    } else {
        DetectedMood::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_mode_ignores_keywords() {
        assert_eq!(reply_for("hello", false), PLAIN_REPLY);
    }

    #[test]
    fn test_ai_mode_matches_first_rule() {
        assert!(reply_for("Hello, help me", true).starts_with("👾"));
        assert!(reply_for("STUDY tips", true).starts_with("📡"));
        assert_eq!(reply_for("what's up", true), FALLBACK_REPLY);
    }

    #[test]
    fn test_detect_mood() {
        assert_eq!(detect_mood("I feel so Lonely"), DetectedMood::Sad);
        assert_eq!(detect_mood("feeling down today"), DetectedMood::Sad);
        assert_eq!(detect_mood("great day"), DetectedMood::Neutral);
    }
}
