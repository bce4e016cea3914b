//! Injected capabilities bundle, replacing the original's global
//! `app.DATABASE` / `app.BROWSER_MANAGER` singletons with one value threaded
//! explicitly through construction.

use std::sync::Arc;

use crate::config::EngineSettings;
use crate::engine::{ArtifactSink, PromptBuilder, Responder, StepExecutor, StepPolicy, StepRecorder, TaskDriver};
use crate::ports::{ActionHandler, AnalyticsSink, ArtifactManager, BrowserManager, Database, LlmHandler, PromptEngine, Scraper, WebhookSender};

pub struct EngineContext {
    pub database: Arc<dyn Database>,
    pub browser_manager: Arc<dyn BrowserManager>,
    pub artifact_manager: Arc<dyn ArtifactManager>,
    pub llm: Arc<dyn LlmHandler>,
    pub scraper: Arc<dyn Scraper>,
    pub prompt_engine: Arc<dyn PromptEngine>,
    pub action_handler: Arc<dyn ActionHandler>,
    pub webhook_sender: Arc<dyn WebhookSender>,
    pub analytics: Arc<dyn AnalyticsSink>,
    pub settings: EngineSettings,
}

impl EngineContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        database: Arc<dyn Database>,
        browser_manager: Arc<dyn BrowserManager>,
        artifact_manager: Arc<dyn ArtifactManager>,
        llm: Arc<dyn LlmHandler>,
        scraper: Arc<dyn Scraper>,
        prompt_engine: Arc<dyn PromptEngine>,
        action_handler: Arc<dyn ActionHandler>,
        webhook_sender: Arc<dyn WebhookSender>,
        analytics: Arc<dyn AnalyticsSink>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            database,
            browser_manager,
            artifact_manager,
            llm,
            scraper,
            prompt_engine,
            action_handler,
            webhook_sender,
            analytics,
            settings,
        }
    }

    /// Wires every engine component from the injected collaborators.
    pub fn build_driver(&self) -> TaskDriver {
        let recorder = Arc::new(StepRecorder::new(self.database.clone()));
        let artifact_sink = Arc::new(ArtifactSink::new(self.artifact_manager.clone()));

        let prompt_builder = Arc::new(PromptBuilder::new(
            self.scraper.clone(),
            self.prompt_engine.clone(),
            self.database.clone(),
            artifact_sink.clone(),
            self.settings.prompt_action_history_window,
        ));

        let executor = Arc::new(StepExecutor::new(
            prompt_builder,
            self.llm.clone(),
            self.action_handler.clone(),
            artifact_sink.clone(),
            self.browser_manager.clone(),
            recorder.clone(),
        ));

        let policy = Arc::new(StepPolicy::new(
            self.database.clone(),
            recorder.clone(),
            self.settings.max_retries_per_step,
            self.settings.max_steps_per_run,
            self.settings.long_running_task_warning_ratio,
        ));

        let responder = Arc::new(Responder::new(
            self.database.clone(),
            self.browser_manager.clone(),
            artifact_sink.clone(),
            self.analytics.clone(),
            self.webhook_sender.clone(),
        ));

        TaskDriver::new(
            self.database.clone(),
            self.browser_manager.clone(),
            artifact_sink,
            recorder,
            executor,
            policy,
            responder,
            self.settings.execute_all_steps,
        )
    }
}
