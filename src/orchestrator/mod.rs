//! Scan orchestration
//!
//! Drives one run over a scan root, one file at a time:
//! discovery → cache check → classify → static checks → context → oracle →
//! extract → optional fix → store. Results of a failed oracle call are
//! reported but not stored. Dependency manifests are then checked
//! against the advisory feed and everything is folded into a `ScanReport`.

pub mod options;

pub use options::{FileOutcome, FileState, ScanOptions};

use crate::advisory::{parse_manifest, AdvisoryFeed};
use crate::cache::ContentAddressedCache;
use crate::config::ConfigError;
use crate::context::RuleContextProvider;
use crate::extractor::ResultExtractor;
use crate::fix::FixApplicator;
use crate::models::{CostLedger, Issue, ScanReport, ScanResult};
use crate::oracle::{build_scan_prompt, Oracle, PromptRequest};
use crate::scanner::discovery::relative_path;
use crate::scanner::{
    discover, discover_manifests, run_static_checks, CandidateFile, FileClassifier, Language,
};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

pub struct ScanOrchestrator {
    options: ScanOptions,
    cache: ContentAddressedCache,
    oracle: Box<dyn Oracle>,
    context: Option<RuleContextProvider>,
    advisory: Option<Box<dyn AdvisoryFeed>>,
    extractor: ResultExtractor,
}

impl ScanOrchestrator {
    pub fn new(options: ScanOptions, cache: ContentAddressedCache, oracle: Box<dyn Oracle>) -> Self {
        Self {
            options,
            cache,
            oracle,
            context: None,
            advisory: None,
            extractor: ResultExtractor::new(),
        }
    }

    pub fn with_context(mut self, provider: RuleContextProvider) -> Self {
        self.context = Some(provider);
        self
    }

    pub fn with_advisory(mut self, feed: Box<dyn AdvisoryFeed>) -> Self {
        self.advisory = Some(feed);
        self
    }

    pub fn cache(&self) -> &ContentAddressedCache {
        &self.cache
    }

    pub fn ledger(&self) -> CostLedger {
        self.oracle.ledger()
    }

    /// Scan every candidate file under `root` and build the report
    ///
    /// # Arguments
    /// * `root` - Directory to scan; fixes are confined to it
    ///
    /// # Returns
    /// The aggregated report. Per-file failures are logged and never abort
    /// the run.
    ///
    /// # Errors
    /// Returns error if mandatory context is enabled without a provider, or
    /// the root is not a directory
    pub async fn run(&mut self, root: &Path) -> Result<ScanReport, ConfigError> {
        if self.options.require_context && self.context.is_none() {
            return Err(ConfigError::ContextProviderMissing);
        }
        if !root.is_dir() {
            return Err(ConfigError::InvalidRoot(root.display().to_string()));
        }

        let applicator = if self.options.auto_fix {
            let applicator = FixApplicator::new(root)
                .map_err(|_| ConfigError::InvalidRoot(root.display().to_string()))?;
            Some(applicator)
        } else {
            None
        };

        let candidates = discover(root, self.options.discovery);
        info!(root = %root.display(), files = candidates.len(), auto_fix = self.options.auto_fix, "starting scan");

        let mut report = ScanReport::new(self.oracle.model_id());
        for candidate in &candidates {
            let outcome = self.scan_file(candidate, applicator.as_ref()).await;
            match (outcome.state, outcome.result) {
                (FileState::ContextMissing, _) => report.record_context_skip(),
                (FileState::Unreadable, _) | (_, None) => {}
                (state, Some(result)) => report.record_result(result, state == FileState::CacheHit),
            }
            self.cache.persist_local();
        }

        self.check_manifests(root, &mut report).await;

        self.cache.persist().await;
        report.finish(self.oracle.ledger());

        info!(
            files = report.files_scanned,
            cache_hits = report.cache_hits,
            issues = report.total_issues,
            fixed = report.fixed,
            ai_calls = report.ai_calls,
            cost = report.cost,
            "scan complete"
        );
        Ok(report)
    }

    /// Run one file through the pipeline
    pub async fn scan_file(
        &mut self,
        candidate: &CandidateFile,
        applicator: Option<&FixApplicator>,
    ) -> FileOutcome {
        let file = candidate.relative.as_str();

        let bytes = match fs::read(&candidate.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(file, error = %e, "failed to read file");
                return FileOutcome::unreadable(file);
            }
        };

        let digest = ContentAddressedCache::hash(&bytes);
        if let Some(cached) = self.cache.lookup_digest(file, &digest) {
            if self.options.auto_fix && cached.has_unfixed_issues() {
                debug!(file, "cached result still has unfixed issues, rescanning");
            } else {
                debug!(file, "cache hit");
                return FileOutcome::new(file, FileState::CacheHit, cached.clone());
            }
        }

        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(_) => {
                warn!(file, "file is not valid UTF-8, skipping");
                return FileOutcome::unreadable(file);
            }
        };

        let (language, framework) = FileClassifier::classify(&candidate.path, &content);
        let static_issues = run_static_checks(&content);

        let context = match &self.context {
            Some(provider) => {
                provider
                    .fetch(&context_query(language, framework.as_deref(), &content))
                    .await
            }
            None => None,
        };
        if self.options.require_context && context.is_none() {
            warn!(file, "no compliance context available, skipping file");
            return FileOutcome::context_missing(file);
        }

        let prompt = build_scan_prompt(&PromptRequest {
            filepath: file,
            language,
            framework: framework.as_deref(),
            content: &content,
            context: context.as_deref(),
            include_fix: self.options.auto_fix,
        });
        let response = self.oracle.invoke(&prompt).await;
        let oracle_failed = response.is_none();
        let raw = response.unwrap_or_default();

        let extraction = self.extractor.extract(&raw, file, &content);
        let issues = merge_static_issues(extraction.issues, static_issues);

        let mut result = ScanResult::new(file, language, framework).with_issues(issues);
        result.strategy = Some(extraction.strategy);

        let mut state = FileState::NoChange;
        let mut stored_digest = digest;
        if extraction.accepted {
            if let Some(applicator) = applicator {
                match applicator.apply_fix(file, &extraction.fixed_content) {
                    Ok(_) => {
                        info!(file, strategy = extraction.strategy.as_str(), changes = extraction.changes.len(), "fix applied");
                        result.fixed = true;
                        result.changes = extraction.changes;
                        result.remaining_issues = run_static_checks(&extraction.fixed_content);
                        if !result.remaining_issues.is_empty() {
                            warn!(file, remaining = result.remaining_issues.len(), "fix left findings in place");
                        }
                        stored_digest = ContentAddressedCache::hash(extraction.fixed_content.as_bytes());
                        state = FileState::AcceptedFix;
                    }
                    Err(e) => warn!(file, error = %e, "failed to apply fix"),
                }
            }
        }

        debug!(file, issues = result.issues.len(), strategy = extraction.strategy.as_str(), "file scanned");
        // Failed calls are retried next run
        if oracle_failed {
            warn!(file, "oracle call failed, result not cached");
        } else {
            self.cache.store(file, &stored_digest, result.clone());
        }
        FileOutcome::new(file, state, result)
    }

    async fn check_manifests(&self, root: &Path, report: &mut ScanReport) {
        let Some(feed) = &self.advisory else {
            return;
        };

        for path in discover_manifests(root) {
            let relative = relative_path(root, &path);
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(manifest = %relative, error = %e, "failed to read manifest");
                    continue;
                }
            };
            let dependencies = match parse_manifest(&relative, &content) {
                Ok(dependencies) => dependencies,
                Err(e) => {
                    warn!(manifest = %relative, error = %e, "failed to parse manifest");
                    continue;
                }
            };

            debug!(manifest = %relative, dependencies = dependencies.len(), "checking dependencies");
            for dependency in &dependencies {
                // Public advisory APIs are shared; space the requests out
                tokio::time::sleep(self.options.advisory_delay).await;
                report.record_vulnerabilities(feed.lookup(dependency).await);
            }
        }
    }
}

/// Query sent to the knowledge base for one file
pub fn context_query(language: Language, framework: Option<&str>, content: &str) -> String {
    let subject = match framework {
        Some(framework) => format!("{} {}", language, framework),
        None => language.to_string(),
    };
    format!("Compliance requirements for {} code:\n{}", subject, content)
}

/// Oracle issues plus static issues on lines the oracle did not report, by line
pub fn merge_static_issues(mut issues: Vec<Issue>, static_issues: Vec<Issue>) -> Vec<Issue> {
    let reported: Vec<u32> = issues.iter().map(|i| i.line).collect();
    issues.extend(
        static_issues
            .into_iter()
            .filter(|issue| !reported.contains(&issue.line)),
    );
    issues.sort_by_key(|issue| issue.line);
    issues
}
