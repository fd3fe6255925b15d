//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{PrecheckService, ReviewService};
use crate::config::Settings;
use crate::domain::Comparator;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    pub precheck: PrecheckService,
    pub review: ReviewService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let settings = Arc::new(settings);
        let comparator = Comparator::new(settings.error_bound_suffix.clone());
        let precheck = PrecheckService::new(fs.clone(), comparator);
        let review = ReviewService::new(fs.clone());

        Self {
            settings,
            fs,
            precheck,
            review,
        }
    }
}
