use crate::agent::{Context, MessageSink, ToolRegistry, TracingSink};
use crate::error::{AssistantError, AssistantResult};
use crate::traits::{ChatRequest, Message, Provider, Tool};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct AssistantOptions {
    pub model: String,
    pub tools: Vec<Arc<dyn Tool>>,
    pub debug: bool,
    /// `None` lets the loop run until the backend stops asking for tools.
    pub max_rounds: Option<usize>,
}

impl AssistantOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            tools: vec![],
            debug: false,
            max_rounds: None,
        }
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_max_rounds(mut self, max: usize) -> Self {
        self.max_rounds = Some(max);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AskResponse {
    pub response: String,
    /// Assistant and tool messages produced by the call. Only set in debug mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<Message>>,
}

/// Drives a single conversation: one context, one registry, one backend.
pub struct Assistant {
    provider: Arc<dyn Provider>,
    context: Context,
    tools: Arc<ToolRegistry>,
    sink: Arc<dyn MessageSink>,
    model: String,
    debug: bool,
    max_rounds: Option<usize>,
}

impl Assistant {
    pub fn new(provider: Arc<dyn Provider>, options: AssistantOptions) -> Self {
        Self::with_registry(provider, options, Arc::new(ToolRegistry::new()))
    }

    /// Builds an assistant on top of an existing registry. Tools from
    /// `options` are added to a private copy, the shared one is left as is.
    pub fn with_registry(
        provider: Arc<dyn Provider>,
        options: AssistantOptions,
        registry: Arc<ToolRegistry>,
    ) -> Self {
        let mut assistant = Self {
            provider,
            context: Context::new(),
            tools: registry,
            sink: Arc::new(TracingSink),
            model: options.model,
            debug: options.debug,
            max_rounds: options.max_rounds,
        };
        for tool in options.tools {
            assistant.register_tool(tool);
        }
        assistant
    }

    pub fn with_sink(mut self, sink: Arc<dyn MessageSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) {
        Arc::make_mut(&mut self.tools).register(tool);
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn add_message(&mut self, message: Message) {
        if self.debug {
            self.sink.on_message(&message);
        }
        self.context.push(message);
    }

    /// Replays the whole context through the sink, debug mode or not.
    pub fn log_context(&self) {
        for message in &self.context {
            self.sink.on_message(message);
        }
    }

    fn record(&mut self, message: Message, steps: &mut Option<Vec<Message>>) {
        if let Some(steps) = steps.as_mut() {
            steps.push(message.clone());
        }
        self.add_message(message);
    }

    /// Sends `prompt` and keeps dispatching tool calls until the backend
    /// answers without any.
    pub async fn ask(&mut self, prompt: &str) -> AssistantResult<AskResponse> {
        self.add_message(Message::user(prompt));

        let specs = self.tools.specs();
        let mut steps = self.debug.then(Vec::new);
        let mut rounds = 0usize;

        loop {
            if let Some(limit) = self.max_rounds
                && rounds >= limit.max(1)
            {
                warn!(rounds, "tool-call round limit reached");
                return Err(AssistantError::MaxRoundsExceeded { rounds });
            }
            rounds += 1;

            debug!(
                round = rounds,
                messages = self.context.len(),
                tools = specs.len(),
                "calling backend"
            );
            let request = ChatRequest {
                model: &self.model,
                messages: self.context.messages(),
                tools: &specs,
            };
            let reply = self
                .provider
                .chat(request)
                .await
                .map_err(AssistantError::Backend)?;

            let calls = if reply.requests_tools() {
                reply.tool_calls.clone().unwrap_or_default()
            } else {
                vec![]
            };
            self.record(reply, &mut steps);

            if calls.is_empty() {
                break;
            }

            for call in calls {
                let tool = self
                    .tools
                    .get(call.name())
                    .ok_or_else(|| AssistantError::tool_not_found(call.name()))?;

                info!(tool = tool.name(), "Executing tool");
                let output = tool
                    .execute(call.function.arguments)
                    .await
                    .map_err(|source| AssistantError::ToolExecution {
                        name: call.function.name.clone(),
                        source,
                    })?;

                let content = output.to_content()?;
                self.record(Message::tool_result(call.function.name, content), &mut steps);
            }
        }

        let response = self
            .context
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        Ok(AskResponse { response, steps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ScriptedProvider;
    use crate::traits::{Role, ToolCall, ToolOutput};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records `start:<name>` / `end:<name>` into a shared journal.
    struct JournalTool {
        name: &'static str,
        journal: Arc<Mutex<Vec<String>>>,
        calls: AtomicUsize,
        output: ToolOutput,
    }

    impl JournalTool {
        fn new(name: &'static str, journal: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                journal,
                calls: AtomicUsize::new(0),
                output: ToolOutput::from(json!({"tool": name})),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Tool for JournalTool {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "journals its invocations"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, _args: serde_json::Value) -> anyhow::Result<ToolOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.journal.lock().unwrap().push(format!("start:{}", self.name));
            tokio::task::yield_now().await;
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            self.journal.lock().unwrap().push(format!("end:{}", self.name));
            Ok(self.output.clone())
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "always fails"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({})
        }

        async fn execute(&self, _args: serde_json::Value) -> anyhow::Result<ToolOutput> {
            Err(anyhow::anyhow!("upstream unavailable"))
        }
    }

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "returns its text argument"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }

        async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolOutput> {
            let text = args.get("text").and_then(|v| v.as_str()).unwrap_or_default();
            Ok(ToolOutput::text(text))
        }
    }

    #[derive(Default)]
    struct CollectingSink(Mutex<Vec<String>>);

    impl MessageSink for CollectingSink {
        fn on_message(&self, message: &Message) {
            self.0.lock().unwrap().push(crate::agent::format_message(message));
        }
    }

    fn call(name: &str) -> ToolCall {
        ToolCall::new(name, json!({}))
    }

    fn journal() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(vec![]))
    }

    #[tokio::test]
    async fn plain_reply_finishes_in_one_call() {
        let provider = Arc::new(ScriptedProvider::new().reply_text("Hello there"));
        let mut assistant = Assistant::new(provider.clone(), AssistantOptions::new("llama3.2"));

        let result = assistant.ask("hi").await.unwrap();

        assert_eq!(result.response, "Hello there");
        assert!(result.steps.is_none());
        assert_eq!(provider.call_count(), 1);
        assert_eq!(assistant.context().len(), 2);
        assert_eq!(provider.requests()[0].model, "llama3.2");
    }

    #[tokio::test]
    async fn tool_round_then_answer() {
        let log = journal();
        let tool_a = JournalTool::new("A", log.clone());
        let provider = Arc::new(
            ScriptedProvider::new()
                .reply(Message::assistant_with_tool_calls("", vec![call("A")]))
                .reply_text("done"),
        );
        let mut assistant = Assistant::new(
            provider.clone(),
            AssistantOptions::new("m").with_tool(tool_a.clone()),
        );

        let result = assistant.ask("use A").await.unwrap();

        assert_eq!(result.response, "done");
        assert_eq!(provider.call_count(), 2);
        assert_eq!(tool_a.calls(), 1);

        let roles: Vec<_> = assistant.context().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            [Role::User, Role::Assistant, Role::Tool, Role::Assistant]
        );
        let tool_msg = &assistant.context().messages()[2];
        assert_eq!(tool_msg.name.as_deref(), Some("A"));
        assert_eq!(tool_msg.content, r#"{"tool":"A"}"#);
        assert!(assistant.context().messages()[1].requests_tools());

        // second backend call sees the tool result
        let requests = provider.requests();
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(requests[1].tools, ["A"]);
    }

    #[tokio::test]
    async fn unknown_tool_aborts_without_executing() {
        let log = journal();
        let tool_a = JournalTool::new("A", log.clone());
        let provider = Arc::new(ScriptedProvider::new().reply(
            Message::assistant_with_tool_calls("", vec![call("missing"), call("A")]),
        ));
        let mut assistant = Assistant::new(
            provider.clone(),
            AssistantOptions::new("m").with_tool(tool_a.clone()),
        );

        let err = assistant.ask("go").await.unwrap_err();

        assert!(err.is_tool_not_found());
        assert_eq!(err.tool_name(), Some("missing"));
        assert_eq!(tool_a.calls(), 0);
        assert!(log.lock().unwrap().is_empty());
        // user + assistant stay
        assert_eq!(assistant.context().len(), 2);
    }

    #[tokio::test]
    async fn tools_run_sequentially_in_request_order() {
        let log = journal();
        let x = JournalTool::new("X", log.clone());
        let y = JournalTool::new("Y", log.clone());
        let provider = Arc::new(
            ScriptedProvider::new()
                .reply(Message::assistant_with_tool_calls(
                    "",
                    vec![call("X"), call("Y")],
                ))
                .reply_text("ok"),
        );
        let mut assistant = Assistant::new(
            provider,
            AssistantOptions::new("m").with_tools([y as Arc<dyn Tool>, x as Arc<dyn Tool>]),
        );

        assistant.ask("both").await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            ["start:X", "end:X", "start:Y", "end:Y"]
        );
        let names: Vec<_> = assistant
            .context()
            .iter()
            .filter(|m| m.role == Role::Tool)
            .map(|m| m.name.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(names, ["X", "Y"]);
    }

    #[tokio::test]
    async fn debug_mode_returns_steps_and_mirrors() {
        let sink = Arc::new(CollectingSink::default());
        let provider = Arc::new(
            ScriptedProvider::new()
                .reply(Message::assistant_with_tool_calls(
                    "checking",
                    vec![ToolCall::new("echo", json!({"text": "pong"}))],
                ))
                .reply_text("pong"),
        );
        let mut assistant = Assistant::new(
            provider,
            AssistantOptions::new("m")
                .with_tool(Arc::new(EchoTool))
                .with_debug(true),
        )
        .with_sink(sink.clone());

        assistant.add_message(Message::system("be terse"));
        let result = assistant.ask("ping").await.unwrap();

        let steps = result.steps.expect("steps in debug mode");
        let roles: Vec<_> = steps.iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::Assistant, Role::Tool, Role::Assistant]);
        assert_eq!(steps[1].content, "\"pong\"");
        assert_eq!(result.response, "pong");

        let lines = sink.0.lock().unwrap();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "system: be terse");
        assert_eq!(lines[1], "user: ping");
        assert!(lines[2].contains("Tool calls:"));
    }

    #[tokio::test]
    async fn sink_is_silent_outside_debug_mode() {
        let sink = Arc::new(CollectingSink::default());
        let provider = Arc::new(ScriptedProvider::new().reply_text("hi"));
        let mut assistant =
            Assistant::new(provider, AssistantOptions::new("m")).with_sink(sink.clone());

        assistant.ask("hello").await.unwrap();
        assert!(sink.0.lock().unwrap().is_empty());

        assistant.log_context();
        assert_eq!(*sink.0.lock().unwrap(), ["user: hello", "assistant: hi"]);
    }

    #[tokio::test]
    async fn backend_error_propagates_verbatim() {
        let provider = Arc::new(ScriptedProvider::new().fail("connection refused"));
        let mut assistant = Assistant::new(provider, AssistantOptions::new("m"));

        let err = assistant.ask("hi").await.unwrap_err();

        assert!(matches!(err, AssistantError::Backend(_)));
        assert_eq!(err.to_string(), "connection refused");
        assert_eq!(assistant.context().len(), 1);
    }

    #[tokio::test]
    async fn tool_error_keeps_partial_progress() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .reply(Message::assistant_with_tool_calls("", vec![call("broken")]))
                .reply_text("unreachable"),
        );
        let mut assistant = Assistant::new(
            provider.clone(),
            AssistantOptions::new("m").with_tool(Arc::new(FailingTool)),
        );

        let err = assistant.ask("try").await.unwrap_err();

        assert_eq!(err.tool_name(), Some("broken"));
        assert_eq!(err.to_string(), "upstream unavailable");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(assistant.context().len(), 2);
    }

    #[tokio::test]
    async fn round_limit_is_opt_in() {
        let script = || {
            ScriptedProvider::new()
                .reply(Message::assistant_with_tool_calls("", vec![call("echo")]))
                .reply(Message::assistant_with_tool_calls("", vec![call("echo")]))
                .reply_text("finally")
        };

        let mut unbounded = Assistant::new(
            Arc::new(script()),
            AssistantOptions::new("m").with_tool(Arc::new(EchoTool)),
        );
        assert_eq!(unbounded.ask("loop").await.unwrap().response, "finally");

        let provider = Arc::new(script());
        let mut bounded = Assistant::new(
            provider.clone(),
            AssistantOptions::new("m")
                .with_tool(Arc::new(EchoTool))
                .with_max_rounds(2),
        );
        let err = bounded.ask("loop").await.unwrap_err();
        assert!(matches!(err, AssistantError::MaxRoundsExceeded { rounds: 2 }));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn context_accumulates_across_asks() {
        let provider = Arc::new(ScriptedProvider::new().reply_text("one").reply_text("two"));
        let mut assistant = Assistant::new(provider.clone(), AssistantOptions::new("m"));

        assistant.ask("first").await.unwrap();
        let second = assistant.ask("second").await.unwrap();

        assert_eq!(second.response, "two");
        assert_eq!(assistant.context().len(), 4);
        assert_eq!(provider.requests()[1].messages.len(), 3);
    }

    #[tokio::test]
    async fn shared_registry_is_not_mutated() {
        let shared: Arc<ToolRegistry> =
            Arc::new([Arc::new(EchoTool) as Arc<dyn Tool>].into_iter().collect());
        let provider = Arc::new(ScriptedProvider::new());

        let assistant = Assistant::with_registry(
            provider,
            AssistantOptions::new("m").with_tool(Arc::new(FailingTool)),
            shared.clone(),
        );

        assert_eq!(shared.len(), 1);
        assert_eq!(assistant.registry().len(), 2);
        assert!(assistant.registry().contains("broken"));
    }
}
