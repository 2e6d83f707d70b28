#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use docqa::config::Config;
use docqa::llm::{
    GenerationParams, PromptTemplate, Provider, ProviderFailoverRouter, RouteTarget,
};
use docqa::retrieval::EmbeddingProvider;
use docqa::DocQaService;

/// Provider that replays a fixed script of results and records each prompt.
/// Once the script runs out the last entry repeats.
pub struct ScriptedProvider {
    name: &'static str,
    script: Mutex<VecDeque<Result<String, String>>>,
    last: Mutex<Option<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl ScriptedProvider {
    pub fn new(
        name: &'static str,
        script: Vec<Result<&str, &str>>,
        log: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|r| r.map(ToString::to_string).map_err(ToString::to_string))
                    .collect(),
            ),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
            log: Arc::clone(log),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompt(&self, index: usize) -> String {
        self.prompts.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate(
        &self,
        prompt: &str,
        _model: &str,
        _params: &GenerationParams,
    ) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.log.lock().unwrap().push(self.name);
        let next = self.script.lock().unwrap().pop_front();
        let result = match next {
            Some(result) => {
                *self.last.lock().unwrap() = Some(result.clone());
                result
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err("script exhausted".to_string())),
        };
        result.map_err(|e| anyhow::anyhow!(e))
    }
}

/// Bag-of-words embedding over a small fixed vocabulary.
pub struct KeywordEmbedding;

pub const VOCAB: [&str; 8] = [
    "paris", "capital", "france", "berlin", "germany", "river", "seine", "population",
];

#[async_trait]
impl EmbeddingProvider for KeywordEmbedding {
    fn name(&self) -> &str {
        "keyword"
    }

    fn model(&self) -> &str {
        "keyword-v1"
    }

    async fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                VOCAB
                    .iter()
                    .map(|word| if lower.contains(word) { 1.0 } else { 0.0 })
                    .collect()
            })
            .collect())
    }
}

pub struct Workspace {
    pub dir: TempDir,
    pub document: PathBuf,
}

impl Workspace {
    pub async fn with_document(name: &str, body: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let document = dir.path().join(name);
        tokio::fs::write(&document, body).await.unwrap();
        Self { dir, document }
    }

    pub fn config(&self) -> Config {
        Config {
            document_path: Some(self.document.clone()),
            store_path: Some(self.dir.path().join("store")),
            ..Config::default()
        }
    }
}

pub fn router(
    primary: &Arc<ScriptedProvider>,
    fallback: Option<&Arc<ScriptedProvider>>,
) -> ProviderFailoverRouter {
    ProviderFailoverRouter::new(
        RouteTarget::new(Arc::clone(primary) as Arc<dyn Provider>, "primary-model"),
        fallback.map(|f| RouteTarget::new(Arc::clone(f) as Arc<dyn Provider>, "fallback-model")),
        PromptTemplate::new().unwrap(),
        GenerationParams::default(),
    )
}

pub fn service(config: Config, router: ProviderFailoverRouter) -> DocQaService {
    DocQaService::assemble(config, Arc::new(KeywordEmbedding), router).unwrap()
}

pub const ATLAS: &str = "\
Berlin is the capital of Germany and its largest city.

Paris is the capital of France. The river Seine flows through Paris.

The population of Germany is about 84 million.
";
