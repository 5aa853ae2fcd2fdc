use crate::error::AdvisorError;
use crate::selection::SelectionEntry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub mod client;

pub use client::{CompletionService, HttpCompletionClient};

pub const SYSTEM_PROMPT: &str = "You are a professional beauty advisor. You only respond to questions related to skincare, haircare, makeup, fragrance, and product routines. Do not answer questions outside these topics. Be concise, friendly, and helpful. Keep your responses straight to the point and relevant to the user's query.";

const ROUTINE_PREAMBLE: &str = "ONLY use the products listed below. Do not suggest anything else. Please generate a step-by-step routine using only these:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Append-only log whose first element is always the system instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::new(Role::System, system_prompt)],
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::new(Role::User, content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::new(Role::Assistant, content));
    }

    #[cfg(test)]
    pub fn system(&self) -> &Message {
        &self.messages[0]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

/// Renders the synthetic request used to ask for a routine built only from
/// the given products.
pub fn routine_prompt(entries: &[SelectionEntry]) -> Result<String, AdvisorError> {
    if entries.is_empty() {
        return Err(AdvisorError::EmptySelection);
    }

    let summaries = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let category = if entry.category.is_empty() {
                "N/A"
            } else {
                entry.category.as_str()
            };
            let description = if entry.description.is_empty() {
                "No description"
            } else {
                entry.description.as_str()
            };
            format!(
                "Product {}:\n- Name: {}\n- Brand: {}\n- Category: {}\n- Description: {}",
                index + 1,
                entry.name,
                entry.brand,
                category,
                description
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(format!("{ROUTINE_PREAMBLE}\n\n{summaries}"))
}

pub struct ChatSession {
    history: ConversationHistory,
    service: Arc<dyn CompletionService>,
}

impl ChatSession {
    pub fn new(service: Arc<dyn CompletionService>, system_prompt: impl Into<String>) -> Self {
        Self {
            history: ConversationHistory::new(system_prompt),
            service,
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// On failure the user turn stays in the history; no assistant turn is
    /// recorded.
    pub async fn ask(&mut self, user_text: &str) -> Result<String, AdvisorError> {
        self.history.push_user(user_text);
        let reply = self.service.complete(self.history.messages()).await?;
        self.history.push_assistant(reply.clone());
        Ok(reply)
    }

    pub async fn generate_routine(
        &mut self,
        entries: &[SelectionEntry],
    ) -> Result<String, AdvisorError> {
        let prompt = routine_prompt(entries)?;
        self.ask(&prompt).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::sample_product;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays canned outcomes and records every conversation it was sent.
    #[derive(Default)]
    pub(crate) struct ScriptedService {
        outcomes: Mutex<Vec<Result<String, AdvisorError>>>,
        pub(crate) calls: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedService {
        pub(crate) fn new(outcomes: Vec<Result<String, AdvisorError>>) -> Arc<Self> {
            let mut outcomes = outcomes;
            outcomes.reverse();
            Arc::new(Self {
                outcomes: Mutex::new(outcomes),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().expect("calls lock").len()
        }
    }

    #[async_trait]
    impl CompletionService for ScriptedService {
        async fn complete(&self, messages: &[Message]) -> Result<String, AdvisorError> {
            self.calls.lock().expect("calls lock").push(messages.to_vec());
            self.outcomes
                .lock()
                .expect("outcomes lock")
                .pop()
                .unwrap_or_else(|| Err(AdvisorError::remote(None, "no scripted outcome")))
        }
    }

    fn entry(name: &str, category: &str, description: &str) -> SelectionEntry {
        let mut product = sample_product(name, category);
        product.description = description.to_string();
        SelectionEntry::from(&product)
    }

    #[tokio::test]
    async fn ask_appends_user_and_assistant_turns() {
        let service = ScriptedService::new(vec![Ok("Try a ceramide moisturizer.".to_string())]);
        let mut session = ChatSession::new(service.clone(), SYSTEM_PROMPT);

        let reply = session
            .ask("What's good for dry skin?")
            .await
            .expect("ask should succeed");

        assert_eq!(reply, "Try a ceramide moisturizer.");
        let messages = session.history().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], Message::new(Role::User, "What's good for dry skin?"));
        assert_eq!(
            messages[2],
            Message::new(Role::Assistant, "Try a ceramide moisturizer.")
        );
        assert_eq!(service.calls.lock().expect("calls lock")[0].len(), 2);
    }

    #[tokio::test]
    async fn failed_ask_keeps_user_turn_without_assistant_turn() {
        let service = ScriptedService::new(vec![Err(AdvisorError::remote(Some(500), "boom"))]);
        let mut session = ChatSession::new(service, SYSTEM_PROMPT);

        let error = session.ask("hello?").await.expect_err("ask should fail");
        assert!(matches!(error, AdvisorError::RemoteService { status: Some(500), .. }));

        let messages = session.history().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::User);
    }

    #[tokio::test]
    async fn every_turn_resends_the_full_history() {
        let service = ScriptedService::new(vec![
            Ok("first".to_string()),
            Err(AdvisorError::Fetch("offline".to_string())),
            Ok("third".to_string()),
        ]);
        let mut session = ChatSession::new(service.clone(), SYSTEM_PROMPT);

        session.ask("one").await.expect("first turn");
        session.ask("two").await.expect_err("second turn fails");
        session.ask("three").await.expect("third turn");

        let calls = service.calls.lock().expect("calls lock");
        let sizes: Vec<usize> = calls.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 4, 5]);
        let roles: Vec<Role> = session.history().messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::User,
                Role::User,
                Role::Assistant
            ]
        );
    }

    #[tokio::test]
    async fn system_message_never_changes() {
        let service = ScriptedService::new(vec![
            Ok("a".to_string()),
            Ok("b".to_string()),
            Err(AdvisorError::remote(Some(502), "bad gateway")),
        ]);
        let mut session = ChatSession::new(service, SYSTEM_PROMPT);
        let system = session.history().system().clone();

        let _ = session.ask("q1").await;
        let _ = session
            .generate_routine(&[entry("Serum A", "skincare", "Hydrating")])
            .await;
        let _ = session.ask("q3").await;
        let _ = session.generate_routine(&[]).await;

        assert_eq!(session.history().system(), &system);
        assert_eq!(system.role, Role::System);
        assert_eq!(system.content, SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn empty_routine_request_makes_no_call() {
        let service = ScriptedService::new(vec![Ok("unused".to_string())]);
        let mut session = ChatSession::new(service.clone(), SYSTEM_PROMPT);

        let error = session
            .generate_routine(&[])
            .await
            .expect_err("empty selection should fail");

        assert_eq!(error, AdvisorError::EmptySelection);
        assert_eq!(service.call_count(), 0);
        assert_eq!(session.history().messages().len(), 1);
    }

    #[tokio::test]
    async fn routine_request_lists_selected_products() {
        let service = ScriptedService::new(vec![Ok("1. Cleanse\n2. Moisturize".to_string())]);
        let mut session = ChatSession::new(service, SYSTEM_PROMPT);

        let reply = session
            .generate_routine(&[
                entry("Cleanser C", "skincare", "Gentle"),
                entry("Serum A", "skincare", "Hydrating"),
            ])
            .await
            .expect("routine should succeed");

        assert_eq!(reply, "1. Cleanse\n2. Moisturize");
        let prompt = &session.history().messages()[1].content;
        assert!(prompt.starts_with("ONLY use the products listed below."));
        assert!(prompt.contains("Product 1:\n- Name: Cleanser C\n- Brand: CeraVe"));
        assert!(prompt.contains("Product 2:\n- Name: Serum A"));
    }

    #[test]
    fn routine_prompt_fills_in_missing_fields() {
        let prompt = routine_prompt(&[entry("Mystery", "", "")]).expect("prompt should render");
        assert_eq!(
            prompt,
            "ONLY use the products listed below. Do not suggest anything else. Please generate a step-by-step routine using only these:\n\n\
             Product 1:\n- Name: Mystery\n- Brand: CeraVe\n- Category: N/A\n- Description: No description"
        );
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&Message::new(Role::Assistant, "hi")).expect("serialize");
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
