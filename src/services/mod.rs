pub mod ads;
pub mod gemini;
pub mod prompts;
pub mod website;
