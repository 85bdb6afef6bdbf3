use std::path::Path;
use std::sync::Arc;

use crate::cache::ResponseCache;
use crate::config::Config;
use crate::embeddings::{EmbeddingProvider, RerankerProvider};
use crate::error::{Result, SolaceError};
use crate::generation::{templates, ResponseGenerator};
use crate::index::{ChunkPoint, IndexStats, VectorIndex};
use crate::ingestion::{supported_extension, DataLoader};
use crate::llm::LlmProvider;
use crate::models::{
    ChunkMetadata, Document, IngestedFile, IngestionStats, QueryAnswer, RetrievalResult,
    RoutedResponse, UserContext,
};
use crate::processing::DocumentChunker;
use crate::query::{lexicon, QueryProcessor};
use crate::router::{
    next_state, personal_query_boost, AgentState, AnonymousProfiles, EscalationPipeline,
    RouterState, UserProfileSource, WebSearchResponder, CRISIS_CONFIDENCE, CRISIS_RESPONSE,
};

/// The support engine: owns every pipeline component and orchestrates one
/// response per turn.
///
/// Components are constructed once and shared across concurrent turns.
/// Provider construction failures degrade the affected stage to its
/// fallback path rather than failing the engine.
pub struct SupportEngine {
    config: Config,
    chunker: DocumentChunker,
    query_processor: QueryProcessor,
    index: Arc<VectorIndex>,
    embeddings: Option<EmbeddingProvider>,
    reranker: Option<RerankerProvider>,
    generator: ResponseGenerator,
    cache: ResponseCache,
    escalation: EscalationPipeline,
    web_search: WebSearchResponder,
    loader: DataLoader,
}

impl SupportEngine {
    /// Build the engine from configuration, loading real models.
    pub async fn new(config: Config) -> Result<Self> {
        let embeddings = match EmbeddingProvider::new(&config.embeddings) {
            Ok(provider) => Some(provider),
            Err(e) => {
                tracing::warn!("Embedding model unavailable, retrieval degraded: {e}");
                None
            }
        };

        let reranker = match &config.reranker {
            Some(reranker_config) => match RerankerProvider::new_async(reranker_config).await {
                Ok(provider) if provider.is_enabled() => Some(provider),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("Reranker unavailable, using retrieval order: {e}");
                    None
                }
            },
            None => None,
        };

        let llm = LlmProvider::new(config.llm.as_ref());
        if !llm.is_available() {
            tracing::warn!("LLM unavailable - generation and escalation will use templates");
        }

        Self::with_providers(config, embeddings, reranker, llm, Arc::new(AnonymousProfiles))
    }

    /// Dependency-injected constructor shared by [`Self::new`] and tests.
    pub fn with_providers(
        config: Config,
        embeddings: Option<EmbeddingProvider>,
        reranker: Option<RerankerProvider>,
        llm: LlmProvider,
        profiles: Arc<dyn UserProfileSource>,
    ) -> Result<Self> {
        config.retrieval.validate()?;

        let chunker = DocumentChunker::new(&config.retrieval)?;
        let query_processor = QueryProcessor::new()?;

        let index = Arc::new(VectorIndex::new(
            &config.retrieval.collection_name,
            config.retrieval.distance_metric,
        ));
        if let Some(ref provider) = embeddings {
            index.ensure_collection(provider.dimensions())?;
        }

        let generator = ResponseGenerator::new(llm.clone());
        let cache = ResponseCache::new(&config.cache);
        let escalation = EscalationPipeline::new(llm, profiles);

        Ok(Self {
            config,
            chunker,
            query_processor,
            index,
            embeddings,
            reranker,
            generator,
            cache,
            escalation,
            web_search: WebSearchResponder::new(),
            loader: DataLoader::new(),
        })
    }

    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Release per-session state. Model handles drop with the engine.
    pub fn shutdown(&self) {
        self.cache.clear();
        tracing::info!("Support engine shut down");
    }

    /// Ingest every supported file in a folder. Per-file failures are
    /// recorded in the stats, never fatal.
    pub async fn ingest_folder(&self, folder: &Path) -> Result<IngestionStats> {
        if !folder.exists() {
            return Err(SolaceError::Ingestion(format!(
                "Knowledge folder not found: {}",
                folder.display()
            )));
        }

        let mut files: Vec<_> = std::fs::read_dir(folder)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && supported_extension(path))
            .collect();
        files.sort();

        let mut stats = IngestionStats {
            total_files: files.len(),
            ..IngestionStats::default()
        };

        if files.is_empty() {
            tracing::warn!("No supported files found in {}", folder.display());
            return Ok(stats);
        }

        tracing::info!("Found {} files to ingest", files.len());

        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());

            let outcome = match self.loader.load_file(&path) {
                Ok(documents) if documents.is_empty() => {
                    Err(SolaceError::Ingestion("No content extracted".to_string()))
                }
                Ok(documents) => self.ingest_documents(documents).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(chunk_count) => {
                    stats.successful += 1;
                    stats.total_chunks += chunk_count;
                    stats.files.push(IngestedFile {
                        name,
                        status: "success".to_string(),
                        chunks: Some(chunk_count),
                        error: None,
                    });
                }
                Err(e) => {
                    tracing::error!("Error ingesting {name}: {e}");
                    stats.failed += 1;
                    stats.files.push(IngestedFile {
                        name,
                        status: "error".to_string(),
                        chunks: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        tracing::info!(
            "Ingestion complete: {}/{} files processed, {} chunks",
            stats.successful,
            stats.total_files,
            stats.total_chunks
        );
        Ok(stats)
    }

    /// Chunk, embed and index a batch of documents. Returns the number of
    /// chunks stored.
    pub async fn ingest_documents(&self, documents: Vec<Document>) -> Result<usize> {
        let embeddings = self.embeddings.as_ref().ok_or_else(|| {
            SolaceError::Embedding("Embedding model unavailable for ingestion".to_string())
        })?;

        let mut points = Vec::new();

        for document in &documents {
            let doc_type = self.chunker.detect_document_type(&document.content);
            let specialty = document
                .metadata
                .get("specialty")
                .cloned()
                .unwrap_or_default();

            let chunks = self.chunker.chunk(&document.content);
            let total_chunks = chunks.len();
            tracing::debug!(
                source = document.source(),
                doc_type,
                total_chunks,
                "Chunked document"
            );

            let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
            let vectors = embeddings.embed_passages(texts).await?;

            for (number, (chunk, vector)) in chunks.into_iter().zip(vectors).enumerate() {
                let medical_entities = self.query_processor.extract_entities(&chunk.content);
                points.push(ChunkPoint {
                    id: chunk.id.clone(),
                    vector,
                    content: chunk.content,
                    metadata: ChunkMetadata {
                        source: document.source().to_string(),
                        specialty: specialty.clone(),
                        section: chunk.section,
                        chunk_number: number,
                        total_chunks,
                        medical_entities,
                    },
                });
            }
        }

        self.index.upsert(points)
    }

    /// The fast retrieval tier: query understanding, vector retrieval,
    /// reranking and structured generation. Never errors; every stage
    /// failure degrades to its fallback.
    pub async fn process_query(&self, query: &str, user: &UserContext) -> QueryAnswer {
        let query_context = self.query_processor.process(query);

        let retrieved = match &self.embeddings {
            Some(embeddings) => match embeddings.embed_query(&query_context.expanded_text).await {
                Ok(vector) => {
                    self.index
                        .retrieve(&vector, self.config.retrieval.top_k, None)
                }
                Err(e) => {
                    tracing::warn!("Query embedding failed, retrieval skipped: {e}");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        tracing::debug!(retrieved = retrieved.len(), "Retrieved documents");

        let reranked = self.rerank_or_truncate(query, retrieved).await;

        let generated = self
            .generator
            .generate(
                query,
                &reranked,
                &user.emotion,
                &user.mental_health_status,
                user.message_count,
            )
            .await;

        QueryAnswer {
            response: generated.response,
            confidence: generated.confidence,
            sources: generated.sources,
            method: "retrieval".to_string(),
        }
    }

    /// Rerank with the cross-encoder when available; on failure or absence
    /// keep the first reranker_top_k of the original order.
    async fn rerank_or_truncate(
        &self,
        query: &str,
        mut retrieved: Vec<RetrievalResult>,
    ) -> Vec<RetrievalResult> {
        let top_k = self.config.retrieval.reranker_top_k;

        if let Some(reranker) = &self.reranker {
            if !retrieved.is_empty() {
                let documents: Vec<String> =
                    retrieved.iter().map(|r| r.content.clone()).collect();
                match reranker.rerank(query, documents, top_k).await {
                    Ok(results) => {
                        return results
                            .into_iter()
                            .filter_map(|result| retrieved.get(result.index).cloned())
                            .collect();
                    }
                    Err(e) => {
                        tracing::warn!("Reranking failed, keeping retrieval order: {e}");
                    }
                }
            }
        }

        retrieved.truncate(top_k);
        retrieved
    }

    /// Route one turn through the state machine and emit exactly one
    /// response.
    pub async fn route(&self, query: &str, user: &UserContext) -> RoutedResponse {
        let mut agent = AgentState::new(query);
        let mut state = RouterState::Retrieve;
        let threshold = self.config.retrieval.min_retrieval_confidence;
        let escalation_available = self.escalation.is_available();

        loop {
            match state {
                RouterState::Retrieve => {
                    agent.crisis_detected = lexicon::contains_crisis_language(query);
                    if !agent.crisis_detected {
                        self.run_retrieval_stage(&mut agent, query, user).await;
                    }
                }
                RouterState::Escalate => {
                    tracing::info!(
                        confidence = agent.retrieval_confidence,
                        threshold,
                        crisis = agent.crisis_detected,
                        "Escalating"
                    );
                }
                RouterState::Crisis => {
                    agent.output = Some(CRISIS_RESPONSE.to_string());
                    agent.agent_name = Some("crisis".to_string());
                    agent.retrieval_confidence = CRISIS_CONFIDENCE;
                    agent.condition_classified = Some("crisis".to_string());
                }
                RouterState::ConditionPipeline => {
                    match self.escalation.run(query, user).await {
                        Ok(outcome) => {
                            agent.output = Some(outcome.response);
                            agent.agent_name = Some("escalation".to_string());
                            agent.condition_classified = Some(outcome.condition);
                            agent.escalation_used = true;
                            agent.retrieval_confidence = agent.retrieval_confidence.max(0.85);
                        }
                        Err(e) => {
                            tracing::warn!("Escalation failed, dropping to web search: {e}");
                            state = RouterState::WebSearch;
                            continue;
                        }
                    }
                }
                RouterState::WebSearch => {
                    agent.output = Some(self.web_search.respond(query, user));
                    agent.agent_name = Some("web_search".to_string());
                }
                RouterState::Finalize => break,
            }

            state = next_state(state, &agent, escalation_available, threshold);
        }

        // The terminal guarantee: never an empty reply.
        let response = match agent.output.take() {
            Some(output) if !output.trim().is_empty() => output,
            _ => templates::build_structured_response(
                query,
                &user.emotion,
                &user.mental_health_status,
            ),
        };
        agent.messages.push(response.clone());

        tracing::info!(
            agent = agent.agent_name.as_deref().unwrap_or("retrieval"),
            confidence = agent.retrieval_confidence,
            "Finalized response"
        );

        RoutedResponse {
            response,
            agent_name: agent
                .agent_name
                .unwrap_or_else(|| "retrieval".to_string()),
            confidence: agent.retrieval_confidence,
            escalation_used: agent.escalation_used,
            crisis_detected: agent.crisis_detected,
            condition: agent.condition_classified,
        }
    }

    async fn run_retrieval_stage(&self, agent: &mut AgentState, query: &str, user: &UserContext) {
        let answer = match self.cache.lookup(query, user) {
            Some(cached) => {
                agent.agent_name = Some("retrieval_cached".to_string());
                cached
            }
            None => {
                let answer = self.process_query(query, user).await;
                self.cache.store(query, user, answer.clone());
                agent.agent_name = Some("retrieval".to_string());
                answer
            }
        };

        agent.retrieval_confidence =
            personal_query_boost(answer.confidence, query, &user.emotion);
        agent.output = Some(answer.response);
    }
}
