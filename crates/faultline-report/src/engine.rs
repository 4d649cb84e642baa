//! The engine facade.
//!
//! One `Engine` owns the catalog, classifier, scanner, template store,
//! and caches. It is constructed once at startup and shared by
//! reference; there is no process-global state.

use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Map;
use tracing::warn;

use faultline_analysis::{
    extract_with_matches, Classifier, MatchEnhancer, NoopEnhancer, PatternCatalog, PatternSpec,
    ScanOptions, ScanOutcome, Scanner,
};
use faultline_core::{
    EngineConfig, ErrorCategory, ErrorMatch, ExtractedInfo, PatternError, RenderError, ScanError,
    TemplateError,
};

use crate::cache::TemplateCache;
use crate::render::{self, CompiledReport, GENERAL_NAME};
use crate::store::{TemplateStore, TemplateSummary};

pub struct Engine {
    config: EngineConfig,
    classifier: Classifier,
    scanner: Scanner,
    store: RwLock<TemplateStore>,
    cache: TemplateCache,
    enhancer: Box<dyn MatchEnhancer>,
}

impl Engine {
    /// Build an engine with the builtin pattern catalog and the template
    /// directories named in `config`.
    pub fn new(config: EngineConfig) -> Result<Self, PatternError> {
        Self::with_patterns(config, &[])
    }

    /// Build an engine whose catalog is extended with user pattern specs.
    pub fn with_patterns(
        config: EngineConfig,
        custom: &[PatternSpec],
    ) -> Result<Self, PatternError> {
        let catalog = Arc::new(PatternCatalog::builtin_with(custom)?);
        let store = TemplateStore::load_all(
            &config.template_dirs,
            config.user_template_dir.as_deref(),
        );
        Ok(Self {
            classifier: Classifier::new(Arc::clone(&catalog), config.classify_cache_capacity),
            scanner: Scanner::new(catalog),
            store: RwLock::new(store),
            cache: TemplateCache::new(config.template_cache_capacity, config.template_ttl()),
            enhancer: Box::new(NoopEnhancer),
            config,
        })
    }

    /// Replace the no-op enhancer.
    pub fn with_enhancer(mut self, enhancer: Box<dyn MatchEnhancer>) -> Self {
        self.enhancer = enhancer;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Classify plus independent structural extraction. Never fails:
    /// unclassifiable input yields an empty match list and whatever facts
    /// the extractors found.
    pub fn classify_and_extract(
        &self,
        text: &str,
        threshold: f64,
    ) -> (Vec<ErrorMatch>, ExtractedInfo) {
        let mut matches = self.classifier.classify(text, threshold);
        let mut info = extract_with_matches(text, &matches);
        self.enhancer.enhance(text, &mut matches, &mut info);
        (matches, info)
    }

    /// Scan a file, streaming or parallel by size.
    pub fn scan_file(&self, path: &Path, options: &ScanOptions) -> Result<ScanOutcome, ScanError> {
        self.scanner.scan_path(path, options)
    }

    /// Resolve, compile, and render the named template against `context`.
    ///
    /// A missing template or one that fails to compile falls back to the
    /// built-in general report with a note; only rendering itself can
    /// fail.
    pub fn render_report(
        &self,
        name: &str,
        context: &Map<String, serde_json::Value>,
    ) -> Result<String, RenderError> {
        let compiled = self.compiled_for(name)?;
        compiled.render(context)
    }

    fn compiled_for(&self, name: &str) -> Result<Arc<CompiledReport>, RenderError> {
        let store = self.read_store();
        let Some(version) = store.get(name).map(|t| t.version) else {
            warn!(name, "template not found, using general fallback");
            return self
                .fallback(format!("template '{name}' not found; used general fallback"))
                .map_err(RenderError::from);
        };

        if let Some(compiled) = self.cache.get_compiled(name, version) {
            return Ok(compiled);
        }

        let resolved = match self.cache.get_resolved(name, version) {
            Some(resolved) => resolved,
            None => {
                let mut resolved = render::resolve(&store, name)?;
                // Cycle notes recorded at load time ride along so verbose
                // renders can surface them.
                resolved
                    .notes
                    .extend(store.diagnostics().iter().cloned());
                let resolved = Arc::new(resolved);
                self.cache
                    .put_resolved(name, version, Arc::clone(&resolved));
                resolved
            }
        };
        drop(store);

        match render::compile(&resolved) {
            Ok(compiled) => {
                let compiled = Arc::new(compiled);
                self.cache.put_compiled(name, version, Arc::clone(&compiled));
                Ok(compiled)
            }
            Err(e @ TemplateError::Syntax { .. }) => {
                warn!(name, error = %e, "template failed to compile, using general fallback");
                self.fallback(format!(
                    "template '{name}' failed to compile; used general fallback"
                ))
                .map_err(RenderError::from)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn fallback(&self, note: String) -> Result<Arc<CompiledReport>, TemplateError> {
        let mut resolved = render::general_resolved();
        resolved.notes.push(note);
        Ok(Arc::new(render::compile(&resolved)?))
    }

    /// Re-parse one template file and drop every cached derivative in its
    /// dependents closure. Returns the invalidated names.
    pub fn reload_template(&self, path: &Path) -> Result<Vec<String>, TemplateError> {
        let stale = self.write_store().reload(path)?;
        self.cache.invalidate_all(&stale);
        Ok(stale)
    }

    /// Pick the template for a classification result: the top category's
    /// name when such a template exists, otherwise the general fallback.
    pub fn select_template(&self, matches: &[ErrorMatch]) -> String {
        let store = self.read_store();
        matches
            .first()
            .map(|m| m.category.name())
            .filter(|name| store.contains(name))
            .map(str::to_string)
            .unwrap_or_else(|| GENERAL_NAME.to_string())
    }

    /// Default specialist agent per category.
    pub fn default_agent(category: ErrorCategory) -> &'static str {
        use ErrorCategory::*;
        match category {
            TypeScript | JavaScript | Build => "debug-specialist",
            Python | Memory | Network | Docker | Django | FastApi | Database => {
                "backend-system-architect"
            }
            React | Vue | Angular => "frontend-system-builder",
            Cicd | Security | Async | General => "general-purpose",
        }
    }

    /// Sorted template summaries, optionally filtered by category.
    pub fn list_templates(&self, category: Option<&str>) -> Vec<TemplateSummary> {
        self.read_store().list(category)
    }

    /// Structural checks plus a compile attempt. Empty means valid.
    pub fn validate_template(&self, name: &str) -> Vec<String> {
        let store = self.read_store();
        let mut errors = store.validate(name);
        if errors.is_empty() {
            match render::resolve(&store, name) {
                Ok(resolved) => {
                    if let Err(e) = render::compile(&resolved) {
                        errors.push(e.to_string());
                    }
                }
                Err(e) => errors.push(e.to_string()),
            }
        }
        errors
    }

    /// Cycle diagnostics recorded by the store.
    pub fn template_diagnostics(&self) -> Vec<String> {
        self.read_store().diagnostics().to_vec()
    }

    // Readers never block indefinitely; a poisoned lock (a panicked
    // writer) degrades to the last consistent store rather than
    // propagating the panic.
    fn read_store(&self) -> RwLockReadGuard<'_, TemplateStore> {
        match self.store.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_store(&self) -> RwLockWriteGuard<'_, TemplateStore> {
        match self.store.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
