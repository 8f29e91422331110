//! Narrative generation: the chat-completion adapter and the synthesizer that
//! drives it across the configured model chain.

pub mod ai_adapter;
pub mod synthesis;

pub use ai_adapter::{build_chat_client, ChatClient, ChatMessage, DynChatClient, MockChatClient};
pub use synthesis::{render_articles, synthesize, SynthesisRequest, SynthesisResult};
