//! These models represent the objects passed around by the agent
//!
//! The provider backends each speak their own wire format (openai style chat completions,
//! ollama chat with an emulated tool protocol). We convert those formats into these
//! internal structs at the provider boundary so the agent loop only ever sees one shape.
pub mod message;
pub mod role;
pub mod tool;
