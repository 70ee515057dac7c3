pub mod groq;
pub mod tts;
