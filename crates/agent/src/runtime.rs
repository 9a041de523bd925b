use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tourbook_core::catalog::Catalog;
use tourbook_core::config::LlmConfig;
use tourbook_core::domain::chat::{session_id_or_default, ChatRole};
use tourbook_core::domain::preferences::Preferences;
use tourbook_core::domain::tour::Tour;
use tourbook_db::{ChatSessionRepository, RepositoryError};
use tracing::{debug, info, warn};

use crate::conversation::{Intent, MessageAnalysis, PreferenceExtractor};
use crate::features::compare_tours;
use crate::llm::{ChatMessage, CompletionRequest, LlmClient, LlmError, OpenAiCompatibleClient, ToolCall};
use crate::render::{recommendations_for, Recommendation, RenderError, ReplyRenderer};
use crate::search::{search_tours, SearchOutcome, MAX_RESULTS};
use crate::tools::{ToolContext, ToolError, ToolRegistry};

/// Completions that may answer with tool calls; one more completion without
/// tools follows to force a text answer.
pub const MAX_TOOL_ROUNDS: usize = 3;
/// Earlier turns replayed to the model.
const HISTORY_TURNS: u32 = 6;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("session store failed: {0}")]
    Repository(#[from] RepositoryError),
    #[error("completion client could not be built: {0}")]
    Llm(#[from] LlmError),
}

/// Why the model path was abandoned for a request.
#[derive(Debug, Error)]
enum DelegationError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("model kept calling tools after {0} rounds")]
    RoundsExhausted(usize),
    #[error("model returned an empty reply")]
    EmptyReply,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyMode {
    Llm,
    Rules,
}

impl ReplyMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::Rules => "rules",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatContext {
    pub user_preferences: Preferences,
    pub session_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatReply {
    pub message: String,
    pub tours: Vec<Tour>,
    pub recommendations: Vec<Recommendation>,
    pub mode: ReplyMode,
    pub context: ChatContext,
}

struct Delegated {
    message: String,
    tours: Vec<Tour>,
    fallback: bool,
}

/// Tours collected from tool calls during one delegated turn.
#[derive(Default)]
struct Surfaced {
    tours: Vec<Tour>,
    matched: bool,
    fallback: bool,
}

impl Surfaced {
    fn record(&mut self, tours: Vec<Tour>, fallback: bool) {
        if tours.is_empty() {
            return;
        }
        if fallback {
            self.fallback = true;
        } else {
            self.matched = true;
        }
        self.tours.extend(tours);
    }

    fn into_delegated(self, message: String) -> Delegated {
        // Any real match outranks default picks from another call.
        let fallback = self.fallback && !self.matched;
        Delegated { message, tours: distinct_tours(self.tours), fallback }
    }
}

pub struct AgentRuntime {
    catalog: Catalog,
    extractor: PreferenceExtractor,
    renderer: ReplyRenderer,
    sessions: Arc<dyn ChatSessionRepository>,
    tools: ToolRegistry,
    llm: Option<Arc<dyn LlmClient>>,
    model: String,
}

impl AgentRuntime {
    /// Rule-based runtime; the model path is attached with [`AgentRuntime::with_llm`].
    pub fn new(
        catalog: Catalog,
        sessions: Arc<dyn ChatSessionRepository>,
    ) -> Result<Self, AgentError> {
        Ok(Self {
            tools: ToolRegistry::travel(catalog.clone(), Arc::clone(&sessions)),
            catalog,
            extractor: PreferenceExtractor::new(),
            renderer: ReplyRenderer::new()?,
            sessions,
            llm: None,
            model: String::new(),
        })
    }

    /// Attaches an OpenAI-compatible client when the config enables one.
    pub fn from_config(
        catalog: Catalog,
        sessions: Arc<dyn ChatSessionRepository>,
        config: &LlmConfig,
    ) -> Result<Self, AgentError> {
        let runtime = Self::new(catalog, sessions)?;
        if !config.is_enabled() {
            return Ok(runtime);
        }

        let client = OpenAiCompatibleClient::from_config(config)?;
        info!(
            event_name = "agent.llm.enabled",
            provider = ?config.provider,
            model = %config.model,
            api_url = client.api_url(),
            "chat assistant delegates to completion api"
        );
        Ok(runtime.with_llm(Arc::new(client), config.model.clone()))
    }

    pub fn with_llm(mut self, client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        self.llm = Some(client);
        self.model = model.into();
        self
    }

    pub fn mode(&self) -> ReplyMode {
        if self.llm.is_some() {
            ReplyMode::Llm
        } else {
            ReplyMode::Rules
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn handle_chat(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<ChatReply, AgentError> {
        let session_id = session_id_or_default(session_id);
        let analysis = self.extractor.extract(message);
        // Filtering only looks at what this message asked for.
        let outcome = search_tours(self.catalog.tours(), &analysis.preferences);

        let delegated = match &self.llm {
            Some(llm) => {
                match self.delegate(llm.as_ref(), message, &session_id, &analysis).await {
                    Ok(delegated) => Some(delegated),
                    Err(error) => {
                        warn!(
                            event_name = "agent.llm.fallback",
                            session_id = %session_id,
                            error = %error,
                            "completion api failed, answering with rules"
                        );
                        None
                    }
                }
            }
            None => None,
        };

        let (reply_message, tours, fallback, mode) = match delegated {
            Some(Delegated { message: text, tours, .. }) if tours.is_empty() => {
                (text, outcome.tours, outcome.fallback, ReplyMode::Llm)
            }
            Some(Delegated { message: text, tours, fallback }) => {
                (text, tours, fallback, ReplyMode::Llm)
            }
            None => {
                let text = self.rules_reply(&analysis, &outcome)?;
                (text, outcome.tours, outcome.fallback, ReplyMode::Rules)
            }
        };

        let session = self
            .sessions
            .record_exchange(&session_id, &analysis.preferences, message, &reply_message)
            .await?;

        debug!(
            event_name = "agent.chat.answered",
            session_id = %session_id,
            mode = mode.as_str(),
            tour_count = tours.len(),
            fallback,
            "chat message answered"
        );

        Ok(ChatReply {
            message: reply_message,
            recommendations: recommendations_for(&tours, &analysis.preferences, fallback),
            tours,
            mode,
            context: ChatContext { user_preferences: session.preferences, session_id: session.id },
        })
    }

    fn rules_reply(
        &self,
        analysis: &MessageAnalysis,
        outcome: &SearchOutcome,
    ) -> Result<String, RenderError> {
        if analysis.intent == Intent::Compare && outcome.tours.len() >= 2 {
            if let Ok(comparison) = compare_tours(&outcome.tours) {
                return self.renderer.comparison_reply(&comparison);
            }
        }
        self.renderer.search_reply(outcome)
    }

    async fn delegate(
        &self,
        llm: &dyn LlmClient,
        message: &str,
        session_id: &str,
        analysis: &MessageAnalysis,
    ) -> Result<Delegated, DelegationError> {
        let stored = self.sessions.load(session_id).await?.map(|session| session.preferences);
        let known = stored.unwrap_or_default().merged(&analysis.preferences);

        let mut messages = vec![ChatMessage::system(self.renderer.system_prompt(&self.catalog, &known)?)];
        for turn in self.sessions.history(session_id, HISTORY_TURNS).await? {
            messages.push(match turn.role {
                ChatRole::User => ChatMessage::user(turn.message),
                ChatRole::Assistant => ChatMessage::assistant(turn.message),
            });
        }
        messages.push(ChatMessage::user(message));

        let context = ToolContext { session_id: session_id.to_owned(), preferences: known };
        let mut surfaced = Surfaced::default();

        for round in 0..=MAX_TOOL_ROUNDS {
            let tools = if round < MAX_TOOL_ROUNDS { self.tools.definitions() } else { Vec::new() };
            let request = CompletionRequest { model: self.model.clone(), messages: messages.clone(), tools };
            let reply = llm.complete(&request).await?.into_message()?;

            if reply.tool_calls.is_empty() {
                let text = reply
                    .content
                    .map(|content| content.trim().to_owned())
                    .filter(|content| !content.is_empty())
                    .ok_or(DelegationError::EmptyReply)?;
                return Ok(surfaced.into_delegated(text));
            }

            let calls = reply.tool_calls.clone();
            messages.push(reply);
            for call in &calls {
                let result = self.run_tool(call, &context, &mut surfaced).await?;
                messages.push(ChatMessage::tool_result(call.id.clone(), result));
            }
        }

        Err(DelegationError::RoundsExhausted(MAX_TOOL_ROUNDS))
    }

    async fn run_tool(
        &self,
        call: &ToolCall,
        context: &ToolContext,
        surfaced: &mut Surfaced,
    ) -> Result<String, DelegationError> {
        let name = call.function.name.as_str();
        let arguments = if call.function.arguments.trim().is_empty() {
            Ok(Value::Null)
        } else {
            serde_json::from_str::<Value>(&call.function.arguments)
                .map_err(|e| ToolError::InvalidArguments(e.to_string()))
        };

        let result = match arguments {
            Ok(arguments) => self.tools.execute(name, arguments, context).await,
            Err(error) => Err(error),
        };

        match result {
            Ok(output) => {
                debug!(event_name = "agent.tool.executed", tool = name, tours = output.tours.len());
                surfaced.record(output.tours, output.fallback);
                Ok(output.payload.to_string())
            }
            Err(error) if error.is_reportable() => {
                debug!(event_name = "agent.tool.rejected", tool = name, error = %error);
                Ok(json!({ "error": error.to_string() }).to_string())
            }
            Err(error) => Err(error.into()),
        }
    }
}

fn distinct_tours(tours: Vec<Tour>) -> Vec<Tour> {
    let mut seen = HashSet::new();
    tours.into_iter().filter(|tour| seen.insert(tour.id)).take(MAX_RESULTS).collect()
}
