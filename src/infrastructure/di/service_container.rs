//! Service container for dependency injection
//!
//! Wires settings, filesystem and loader into an evaluation service.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::services::EvaluationService;
use crate::application::ApplicationError;
use crate::config::Settings;
use crate::domain::{SiteTree, TreeBuilder};
use crate::infrastructure::loader::DocumentLoader;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraResult;

/// Container holding settings and I/O implementations.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    loader: DocumentLoader,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let settings = Arc::new(settings);
        let loader = DocumentLoader::new(Arc::clone(&fs));

        Self {
            settings,
            fs,
            loader,
        }
    }

    /// Resolve the document path: explicit argument first, then `data_file` from settings.
    pub fn resolve_data_file(&self, file: Option<&Path>) -> InfraResult<PathBuf> {
        file.map(Path::to_path_buf)
            .or_else(|| self.settings.data_file.clone())
            .ok_or_else(|| {
                ApplicationError::Config {
                    message: "no site document given and no data_file configured".into(),
                }
                .into()
            })
    }

    /// Load and build the site tree from `path`.
    #[instrument(level = "debug", skip(self))]
    pub fn load_tree(&self, path: &Path) -> InfraResult<SiteTree> {
        let document = self.loader.load(path)?;
        let tree = TreeBuilder::new(self.settings.root_name.clone())
            .with_duplicate_policy(self.settings.duplicate_names)
            .build(&document)?;
        debug!("loaded {} sites from {}", tree.len(), path.display());
        Ok(tree)
    }

    /// Load the tree and run the initial evaluation with the configured view and rule.
    pub fn evaluation_service(&self, path: &Path) -> InfraResult<EvaluationService> {
        let tree = self.load_tree(path)?;
        Ok(
            EvaluationService::new(tree, self.settings.view, self.settings.blocking_rule)
                .with_duplicate_policy(self.settings.duplicate_names),
        )
    }
}
