//! Agent loop for tool-based code quality analysis.
//!
//! Each iteration makes one model call. If the model requests tools, only
//! the first request is executed; the call and its result are appended to
//! the transcript and the loop continues. A reply without tool calls is the
//! final answer. After `max_iterations` calls the run stops with
//! [`RunOutcome::MaxIterationsReached`].
//!
//! Model and transport errors are not caught here; they end the run.

use crate::agent::client::{ChatModel, ChatRequest};
use crate::agent::tools::{get_tool_definitions, ToolExecutor};
use crate::models::{ChatMessage, RunOutcome, ToolCallRecord};
use anyhow::Result;
use tracing::{debug, info, warn};

/// Configuration for the agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model_name: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_iterations: usize,
    pub system_prompt: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model_name: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.5,
            max_tokens: 4096,
            max_iterations: 10,
            system_prompt: AGENT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Result of one run.
#[derive(Debug)]
pub struct AgentRun {
    pub outcome: RunOutcome,
    /// Model round-trips performed.
    pub iterations: usize,
    pub tool_calls: Vec<ToolCallRecord>,
    pub transcript: Vec<ChatMessage>,
}

/// The code quality agent.
pub struct CodeQualityAgent<M: ChatModel> {
    config: AgentConfig,
    model: M,
    tool_executor: ToolExecutor,
}

impl<M: ChatModel> CodeQualityAgent<M> {
    pub fn new(config: AgentConfig, model: M, tool_executor: ToolExecutor) -> Self {
        info!(
            "Initializing agent with model {} via {}",
            config.model_name,
            model.name()
        );

        Self {
            config,
            model,
            tool_executor,
        }
    }

    pub fn tool_executor(&self) -> &ToolExecutor {
        &self.tool_executor
    }

    /// Run the agent on a user request.
    pub async fn run(&mut self, user_message: &str) -> Result<AgentRun> {
        let mut transcript = vec![
            ChatMessage::user(user_message),
            ChatMessage::system(self.config.system_prompt.clone()),
        ];
        let mut tool_calls = Vec::new();

        info!("Starting agent run: {}", user_message);

        for iteration in 1..=self.config.max_iterations {
            info!("Iteration {}/{}", iteration, self.config.max_iterations);

            let request = self.build_request(&transcript);
            let reply = self.model.complete(&request).await?;
            debug!("Model reply: {:?}", reply);

            let requested = reply.requested_calls();
            let Some(call) = requested.first() else {
                let answer = reply.content.clone().unwrap_or_default();
                info!("Agent finished after {} iterations", iteration);
                return Ok(AgentRun {
                    outcome: RunOutcome::Completed { answer },
                    iterations: iteration,
                    tool_calls,
                    transcript,
                });
            };

            if requested.len() > 1 {
                let dropped: Vec<&str> = requested[1..]
                    .iter()
                    .map(|c| c.function.name.as_str())
                    .collect();
                warn!(
                    "Model requested {} tool calls; executing only {} and dropping {:?}",
                    requested.len(),
                    call.function.name,
                    dropped
                );
            }

            let call = call.clone();
            info!(
                "Tool call: {} with arguments {}",
                call.function.name, call.function.arguments
            );

            let result = self
                .tool_executor
                .dispatch(&call.function.name, &call.function.arguments)
                .await?;
            let result_value = result.to_value();
            info!("Tool result: {}", result_value);

            tool_calls.push(ToolCallRecord {
                iteration,
                call_id: call.id.clone(),
                name: call.function.name.clone(),
                arguments: call.function.arguments.clone(),
                result: result_value.clone(),
                is_error: result.is_error(),
            });

            let call_id = call.id.clone();
            transcript.push(ChatMessage::assistant_tool_call(call));
            transcript.push(ChatMessage::tool_result(call_id, result_value.to_string()));
            debug!("Transcript now has {} messages", transcript.len());
        }

        warn!(
            "Max iterations ({}) reached without a final answer",
            self.config.max_iterations
        );

        Ok(AgentRun {
            outcome: RunOutcome::MaxIterationsReached,
            iterations: self.config.max_iterations,
            tool_calls,
            transcript,
        })
    }

    fn build_request(&self, transcript: &[ChatMessage]) -> ChatRequest {
        ChatRequest {
            model: self.config.model_name.clone(),
            messages: transcript.to_vec(),
            tools: get_tool_definitions(),
            tool_choice: "auto".to_string(),
            parallel_tool_calls: false,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }
}

/// System prompt for the agent.
pub const AGENT_SYSTEM_PROMPT: &str = "You are a code quality analysis agent. Use the tools to fetch and analyze code from GitHub repositories. Call one tool at a time.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::client::AssistantReply;
    use crate::github::{FetchOptions, GithubFetcher};
    use crate::models::{Role, ToolCallMessage};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Replays canned replies and records every request it receives.
    struct ScriptedModel {
        replies: Mutex<VecDeque<AssistantReply>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedModel {
        fn new(replies: impl IntoIterator<Item = AssistantReply>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl<'a> ChatModel for &'a ScriptedModel {
        async fn complete(&self, request: &ChatRequest) -> Result<AssistantReply> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("script exhausted"))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn fetch_call(id: &str, file_path: &str) -> ToolCallMessage {
        ToolCallMessage::new(
            id,
            "fetch_github_file",
            format!(
                r#"{{"owner":"jquery","repo":"jquery","file_path":"{}"}}"#,
                file_path
            ),
        )
    }

    fn analyze_call(id: &str, file_path: &str) -> ToolCallMessage {
        ToolCallMessage::new(
            id,
            "analyze_code_quality",
            format!(r#"{{"file_path":"{}"}}"#, file_path),
        )
    }

    fn executor_for(server: &MockServer) -> ToolExecutor {
        ToolExecutor::new(
            GithubFetcher::new(FetchOptions {
                raw_base_url: server.uri(),
                ..FetchOptions::default()
            })
            .unwrap(),
        )
    }

    async fn jquery_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jquery/jquery/main/src/core.js"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("// core\nvar jQuery = function () {};\nconst version = 3;"),
            )
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_agent_config_default() {
        let config = AgentConfig::default();
        assert_eq!(config.model_name, "llama-3.3-70b-versatile");
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.max_tokens, 4096);
        assert!(config.system_prompt.contains("one tool at a time"));
    }

    #[tokio::test]
    async fn test_fetch_analyze_answer() {
        let server = jquery_server().await;
        let model = ScriptedModel::new([
            AssistantReply::with_tool_calls(vec![fetch_call("call_1", "src/core.js")]),
            AssistantReply::with_tool_calls(vec![analyze_call("call_2", "src/core.js")]),
            AssistantReply::text("Quality score: 6/10"),
        ]);

        let mut agent =
            CodeQualityAgent::new(AgentConfig::default(), &model, executor_for(&server));
        let run = agent.run("Analyze src/core.js").await.unwrap();

        assert_eq!(
            run.outcome,
            RunOutcome::Completed {
                answer: "Quality score: 6/10".to_string()
            }
        );
        assert_eq!(run.iterations, 3);
        assert_eq!(model.request_count(), 3);
        assert_eq!(run.tool_calls.len(), 2);
        assert_eq!(run.tool_calls[1].result["code_lines"], 2);
        assert_eq!(run.tool_calls[1].result["estimated_functions"], 2);
        assert!(agent.tool_executor().cache().get("src/core.js").is_some());

        // user, system, then an assistant/tool pair per executed call
        let roles: Vec<Role> = run.transcript.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::User,
                Role::System,
                Role::Assistant,
                Role::Tool,
                Role::Assistant,
                Role::Tool
            ]
        );
        assert_eq!(run.transcript[3].tool_call_id.as_deref(), Some("call_1"));
    }

    #[tokio::test]
    async fn test_only_first_tool_call_is_executed() {
        let server = jquery_server().await;
        let first = fetch_call("call_1", "src/core.js");
        let model = ScriptedModel::new([
            AssistantReply::with_tool_calls(vec![
                first.clone(),
                analyze_call("call_2", "src/core.js"),
                fetch_call("call_3", "src/ajax.js"),
            ]),
            AssistantReply::text("done"),
        ]);

        let mut agent =
            CodeQualityAgent::new(AgentConfig::default(), &model, executor_for(&server));
        let run = agent.run("Analyze").await.unwrap();

        assert_eq!(run.tool_calls.len(), 1);
        assert_eq!(run.tool_calls[0].call_id, "call_1");

        let assistant = &run.transcript[2];
        assert_eq!(assistant.tool_calls.as_deref(), Some(&[first][..]));
        assert_eq!(run.transcript.len(), 4);

        // second request carries the recorded pair back to the model
        let requests = model.requests.lock().unwrap();
        assert_eq!(requests[1].messages.len(), 4);
    }

    #[tokio::test]
    async fn test_stops_at_max_iterations() {
        let server = MockServer::start().await;
        let replies = (0..10).map(|i| {
            AssistantReply::with_tool_calls(vec![analyze_call(&format!("call_{}", i), "x.js")])
        });
        let model = ScriptedModel::new(replies);

        let mut agent =
            CodeQualityAgent::new(AgentConfig::default(), &model, executor_for(&server));
        let run = agent.run("Loop forever").await.unwrap();

        assert_eq!(run.outcome, RunOutcome::MaxIterationsReached);
        assert_eq!(run.outcome.final_text(), "Max iterations reached");
        assert_eq!(run.iterations, 10);
        assert_eq!(model.request_count(), 10);
        assert!(run.tool_calls.iter().all(|c| c.is_error));
    }

    #[tokio::test]
    async fn test_custom_iteration_cap() {
        let server = MockServer::start().await;
        let model = ScriptedModel::new([
            AssistantReply::with_tool_calls(vec![analyze_call("a", "x.js")]),
            AssistantReply::with_tool_calls(vec![analyze_call("b", "x.js")]),
            AssistantReply::text("never reached"),
        ]);
        let config = AgentConfig {
            max_iterations: 2,
            ..AgentConfig::default()
        };

        let mut agent = CodeQualityAgent::new(config, &model, executor_for(&server));
        let run = agent.run("Analyze").await.unwrap();

        assert_eq!(run.outcome, RunOutcome::MaxIterationsReached);
        assert_eq!(model.request_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_reported_to_model() {
        let server = MockServer::start().await;
        let model = ScriptedModel::new([
            AssistantReply::with_tool_calls(vec![ToolCallMessage::new(
                "bad",
                "fetch_github_file",
                r#"{"owner":"jquery"}"#,
            )]),
            AssistantReply::text("gave up"),
        ]);

        let mut agent =
            CodeQualityAgent::new(AgentConfig::default(), &model, executor_for(&server));
        let run = agent.run("Analyze").await.unwrap();

        assert_eq!(run.outcome.final_text(), "gave up");
        assert!(run.tool_calls[0].is_error);

        let tool_message = &run.transcript[3];
        assert_eq!(tool_message.role, Role::Tool);
        assert!(tool_message
            .content
            .as_deref()
            .unwrap()
            .contains("Invalid arguments for fetch_github_file"));
        // the raw arguments are kept verbatim
        assert_eq!(
            run.transcript[2].tool_calls.as_ref().unwrap()[0]
                .function
                .arguments,
            r#"{"owner":"jquery"}"#
        );
    }

    #[tokio::test]
    async fn test_model_error_aborts_run() {
        let server = MockServer::start().await;
        let model = ScriptedModel::new([]);

        let mut agent =
            CodeQualityAgent::new(AgentConfig::default(), &model, executor_for(&server));
        let err = agent.run("Analyze").await.unwrap_err();

        assert!(err.to_string().contains("script exhausted"));
    }

    #[tokio::test]
    async fn test_fetch_transport_error_aborts_run() {
        let model = ScriptedModel::new([
            AssistantReply::with_tool_calls(vec![fetch_call("call_1", "src/core.js")]),
            AssistantReply::text("never reached"),
        ]);
        let executor = ToolExecutor::new(
            GithubFetcher::new(FetchOptions {
                raw_base_url: "http://127.0.0.1:1".to_string(),
                ..FetchOptions::default()
            })
            .unwrap(),
        );

        let mut agent = CodeQualityAgent::new(AgentConfig::default(), &model, executor);
        let result = agent.run("Analyze src/core.js").await;

        assert!(result.is_err());
        assert_eq!(model.request_count(), 1);
        assert_eq!(agent.tool_executor().cache().len(), 0);
    }

    #[tokio::test]
    async fn test_request_carries_tool_policy() {
        let server = MockServer::start().await;
        let model = ScriptedModel::new([AssistantReply::text("hi")]);

        let mut agent =
            CodeQualityAgent::new(AgentConfig::default(), &model, executor_for(&server));
        agent.run("Hello").await.unwrap();

        let requests = model.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.tool_choice, "auto");
        assert!(!request.parallel_tool_calls);
        assert_eq!(request.tools.len(), 2);
        assert_eq!(request.messages[0].role, Role::User);
        assert_eq!(request.messages[1].role, Role::System);
    }
}
