use axum::Router;
use std::sync::Arc;
use tempfile::TempDir;

use sessiongate::{
    build_router, AppConfig, AppState, ImageStore, InMemoryUserRepository, PasswordService,
    TokenService,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestSetup {
    pub router: Router,
    pub state: AppState,
    pub upload_dir: TempDir,
}

pub struct TestSetupBuilder {
    settings: Vec<(&'static str, String)>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            settings: vec![
                ("JWT_KEY", TEST_SECRET.to_string()),
                // Cheap hashing keeps the suite fast
                ("PASSWORD_HASH_MEMORY_KIB", "256".to_string()),
                ("PASSWORD_HASH_ITERATIONS", "1".to_string()),
                ("PASSWORD_HASH_PARALLELISM", "1".to_string()),
            ],
        }
    }

    pub fn with_setting(mut self, key: &'static str, value: impl ToString) -> Self {
        self.settings.retain(|(existing, _)| *existing != key);
        self.settings.push((key, value.to_string()));
        self
    }

    pub fn with_per_page(self, per_page: usize) -> Self {
        self.with_setting("DEFAULT_PER_PAGE", per_page)
    }

    pub fn build(self) -> TestSetup {
        let upload_dir = tempfile::tempdir().unwrap();
        let settings = self
            .with_setting("UPLOAD_DIR", upload_dir.path().display())
            .settings;

        let config = AppConfig::from_lookup(|key: &str| {
            settings
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.clone())
        })
        .unwrap();

        let state = AppState::new(
            Arc::new(InMemoryUserRepository::new()),
            PasswordService::new(config.hash_params).unwrap(),
            TokenService::new(config.jwt_secret()).unwrap(),
            ImageStore::new(config.upload_dir.clone()),
            Arc::new(config),
        );

        TestSetup {
            router: build_router(state.clone()),
            state,
            upload_dir,
        }
    }
}

impl Default for TestSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}
