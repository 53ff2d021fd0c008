//! Pipeline configuration and the end-to-end run.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::annotate::{AnnotationSummary, TopicAnnotator, TopicRegistry};
use crate::clean::CleaningPolicy;
use crate::error::{GeocovError, Result};
use crate::input::{Parser, ParserConfig};
use crate::prune::{BatchSource, CheckpointStore, CorpusPruner, PruneReport};
use crate::schema::{SchemaNormalizer, validate_keys};

/// Configuration for a pipeline run, usually loaded from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding the pruned checkpoints.
    pub checkpoint_dir: PathBuf,
    /// Directory for annotated output (default: the checkpoint directory).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotated_dir: Option<PathBuf>,
    /// Run the prune stage.
    #[serde(default = "default_true")]
    pub do_prune: bool,
    /// Run the annotation stage over every checkpoint.
    #[serde(default = "default_true")]
    pub do_annotate: bool,
    /// Write annotated batches to disk.
    #[serde(default = "default_true")]
    pub persist_annotations: bool,
    #[serde(default)]
    pub cleaning: CleaningPolicy,
    /// Topics to label, in column order.
    #[serde(default = "default_topics")]
    pub topics: Vec<String>,
    /// Extra topics: identifier to regular expression.
    #[serde(default)]
    pub custom_topics: IndexMap<String, String>,
    /// Maximum rows read from each raw file (None = all).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<usize>,
    /// Raw batches to prune, in processing order.
    #[serde(default)]
    pub batches: Vec<BatchSource>,
}

fn default_true() -> bool {
    true
}

fn default_topics() -> Vec<String> {
    vec!["five_g".to_string(), "microchip".to_string()]
}

impl PipelineConfig {
    /// Configuration with default stages and topics and no batches.
    pub fn new(checkpoint_dir: impl Into<PathBuf>) -> Self {
        Self {
            checkpoint_dir: checkpoint_dir.into(),
            annotated_dir: None,
            do_prune: true,
            do_annotate: true,
            persist_annotations: true,
            cleaning: CleaningPolicy::default(),
            topics: default_topics(),
            custom_topics: IndexMap::new(),
            max_rows: None,
            batches: Vec::new(),
        }
    }

    /// Load and validate a configuration file.
    ///
    /// Relative batch paths and directories are resolved against the
    /// directory containing the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| GeocovError::io(path, e))?;
        let mut config: PipelineConfig = serde_json::from_reader(BufReader::new(file))?;

        if let Some(base) = path.parent() {
            config.resolve_relative(base);
        }
        config.validate()?;
        Ok(config)
    }

    fn resolve_relative(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.checkpoint_dir);
        if let Some(dir) = self.annotated_dir.as_mut() {
            resolve(dir);
        }
        for batch in &mut self.batches {
            resolve(&mut batch.path);
        }
    }

    /// Check everything that can be checked without touching the data.
    pub fn validate(&self) -> Result<()> {
        if self.checkpoint_dir.as_os_str().is_empty() {
            return Err(GeocovError::Config("checkpoint_dir must be set".to_string()));
        }
        if self.do_prune {
            validate_keys(self.batches.iter().map(|b| b.key.as_str()))?;
        }
        if self.do_annotate {
            if self.topics.is_empty() {
                return Err(GeocovError::Config(
                    "annotation needs at least one topic".to_string(),
                ));
            }
            let registry = self.registry()?;
            registry.resolve(&self.topics)?;
        }
        Ok(())
    }

    /// Where annotated batches are written.
    pub fn annotated_dir(&self) -> &Path {
        self.annotated_dir.as_deref().unwrap_or(&self.checkpoint_dir)
    }

    /// Built-in topics plus the configured custom ones.
    pub fn registry(&self) -> Result<TopicRegistry> {
        let mut registry = TopicRegistry::builtin();
        for (name, pattern) in &self.custom_topics {
            registry.register(name, pattern)?;
        }
        Ok(registry)
    }
}

/// Outcome of `Pipeline::run`; a stage that did not run is `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub prune: Option<PruneReport>,
    pub annotation: Option<AnnotationSummary>,
}

/// Runs the prune and annotate stages as configured.
pub struct Pipeline {
    config: PipelineConfig,
    pruner: CorpusPruner,
    annotator: TopicAnnotator,
}

impl Pipeline {
    /// Build a pipeline, compiling the configured custom topics.
    pub fn with_config(config: PipelineConfig) -> Result<Self> {
        let parser = Parser::with_config(ParserConfig {
            max_rows: config.max_rows,
            ..ParserConfig::default()
        });
        let pruner = CorpusPruner::new(config.cleaning)
            .with_normalizer(SchemaNormalizer::with_parser(parser));
        let annotator = TopicAnnotator::new(config.registry()?);

        Ok(Self {
            config,
            pruner,
            annotator,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Prune the configured batches, then annotate every checkpoint.
    ///
    /// Topics are resolved before the prune stage starts, so an unknown
    /// topic fails the run before any file is written.
    pub fn run(&self) -> Result<RunReport> {
        let config = &self.config;
        if config.do_annotate {
            self.annotator.registry().resolve(&config.topics)?;
        }

        let prune = if config.do_prune {
            info!(batches = config.batches.len(), "prune stage started");
            Some(
                self.pruner
                    .prune_all(&config.batches, &config.checkpoint_dir)?,
            )
        } else {
            None
        };

        let annotation = if config.do_annotate {
            info!(topics = ?config.topics, "annotation stage started");
            let store = CheckpointStore::new(&config.checkpoint_dir);
            let output = config.persist_annotations.then(|| config.annotated_dir());
            let mut summary = AnnotationSummary::new();
            self.annotator
                .annotate_checkpoints(&store, &config.topics, output, &mut summary)?;
            Some(summary)
        } else {
            None
        };

        Ok(RunReport { prune, annotation })
    }
}
