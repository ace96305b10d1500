use async_trait::async_trait;
use axum::Router;

/// What a bookshelf module sees while the app boots and before it serves.
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// One SQL step in a module's schema.
///
/// The runner records `(module name, id)` in `schema_migrations` and never
/// replays a recorded pair, so an applied `up` must not be edited in place.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// A feature area of the bookshelf app (e.g. `books`).
///
/// Boot order is register, migrate, `init`, `start`. Shutdown calls `stop`
/// in reverse registration order once the server has drained.
#[async_trait]
pub trait Module: Sync + Send {
    /// Registry key and URL segment: routes live under `/api/{name}`.
    fn name(&self) -> &'static str;

    /// Runs after this module's tables exist; may read from them.
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Handlers relative to the module mount; `/` is the bare `/api/{name}`.
    fn routes(&self) -> Router {
        Router::new()
    }

    /// `paths` and `components` to fold into `/docs/openapi.json`.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Schema steps, applied sorted by id.
    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Checked by `/healthz`; any error makes it answer 503.
    async fn health(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
