//! Declarative access pipeline.
//!
//! A route declares the stages it needs once; [`PipelineBuilder::build`]
//! orders them by [`Phase`] so the call site cannot get the order wrong, and
//! a single dispatcher runs them. Each stage either lets the request through
//! (optionally leaving an [`AfterHook`] for the response) or answers it
//! outright, in which case nothing further runs, the handler included.
//!
//! ```ignore
//! let pipeline = PipelineBuilder::new()
//!     .with_request_logging()
//!     .with_error_handler()
//!     .with_cors(state.cors_config.clone())
//!     .with_rate_limit("general", state.rate_limit_config.general)
//!     .with_roles(&[Role::SuperAdmin, Role::Moderator])
//!     .build();
//!
//! Router::new().route("/", get(list.layer(pipeline.layer(&state))));
//! ```

use std::{
    convert::Infallible,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    body::Body,
    extract::{MatchedPath, Request},
    http::{HeaderMap, header::VARY},
    response::{IntoResponse, Response},
};
use carenet_auth::{Action, Resource};
use carenet_config::{CorsConfig, WindowLimit};
use carenet_core::Role;
use carenet_observability::RequestLog;
use futures::future::BoxFuture;
use tower::{Layer, Service};

use crate::middleware::{auth, authorize, cors, rate_limit, recover};
use crate::state::AppState;

/// Execution precedence. Stages run in ascending phase order; stages sharing
/// a phase keep their registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Observe,
    Recover,
    Cors,
    ThrottleIp,
    Authenticate,
    ThrottleIdentity,
    Authorize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    RequestLogging,
    ErrorHandler,
    Cors(CorsConfig),
    /// Fixed-window limit keyed by client IP.
    RateLimit {
        scope: &'static str,
        limit: WindowLimit,
    },
    Authenticate,
    /// Attaches the principal when a valid credential is present; anonymous
    /// requests continue.
    OptionalAuthenticate,
    /// Fixed-window limit keyed by principal id.
    IdentityRateLimit {
        scope: &'static str,
        limit: WindowLimit,
    },
    Roles(Vec<Role>),
    Resource {
        resource: Resource,
        action: Action,
    },
    /// Record-level check; the record id is the path parameter `param`.
    OwnResource {
        resource: Resource,
        action: Action,
        param: &'static str,
    },
}

impl Stage {
    pub fn phase(&self) -> Phase {
        match self {
            Stage::RequestLogging => Phase::Observe,
            Stage::ErrorHandler => Phase::Recover,
            Stage::Cors(_) => Phase::Cors,
            Stage::RateLimit { .. } => Phase::ThrottleIp,
            Stage::Authenticate | Stage::OptionalAuthenticate => Phase::Authenticate,
            Stage::IdentityRateLimit { .. } => Phase::ThrottleIdentity,
            Stage::Roles(_) | Stage::Resource { .. } | Stage::OwnResource { .. } => {
                Phase::Authorize
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::RequestLogging => "request_logging",
            Stage::ErrorHandler => "error_handler",
            Stage::Cors(_) => "cors",
            Stage::RateLimit { .. } => "rate_limit",
            Stage::Authenticate => "auth",
            Stage::OptionalAuthenticate => "optional_auth",
            Stage::IdentityRateLimit { .. } => "identity_rate_limit",
            Stage::Roles(_) => "roles",
            Stage::Resource { .. } => "resource_auth",
            Stage::OwnResource { .. } => "own_resource_auth",
        }
    }

    fn needs_principal(&self) -> bool {
        matches!(self.phase(), Phase::ThrottleIdentity | Phase::Authorize)
    }

    /// Stages that make no sense twice in one pipeline.
    fn is_singleton(&self) -> bool {
        matches!(
            self,
            Stage::RequestLogging
                | Stage::ErrorHandler
                | Stage::Authenticate
                | Stage::OptionalAuthenticate
        )
    }
}

/// Outcome of one stage's before-step.
pub enum Flow {
    Continue(Option<AfterHook>),
    Respond(Response),
}

impl Flow {
    pub fn next() -> Self {
        Flow::Continue(None)
    }
}

/// Work a stage leaves for the way out. Hooks run in reverse stage order.
pub enum AfterHook {
    Log(RequestLog),
    Headers(HeaderMap),
}

impl AfterHook {
    fn apply(self, response: &mut Response) {
        match self {
            AfterHook::Log(log) => log.finish(response.status()),
            AfterHook::Headers(headers) => {
                let target = response.headers_mut();
                for (name, value) in &headers {
                    if name == VARY {
                        target.append(name.clone(), value.clone());
                    } else {
                        target.insert(name.clone(), value.clone());
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    stages: Vec<Stage>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn with_request_logging(self) -> Self {
        self.stage(Stage::RequestLogging)
    }

    pub fn with_error_handler(self) -> Self {
        self.stage(Stage::ErrorHandler)
    }

    pub fn with_cors(self, policy: CorsConfig) -> Self {
        self.stage(Stage::Cors(policy))
    }

    pub fn with_rate_limit(self, scope: &'static str, limit: WindowLimit) -> Self {
        self.stage(Stage::RateLimit { scope, limit })
    }

    pub fn with_auth(self) -> Self {
        self.stage(Stage::Authenticate)
    }

    pub fn with_optional_auth(self) -> Self {
        self.stage(Stage::OptionalAuthenticate)
    }

    pub fn with_identity_rate_limit(self, scope: &'static str, limit: WindowLimit) -> Self {
        self.stage(Stage::IdentityRateLimit { scope, limit })
    }

    pub fn with_roles(self, roles: &[Role]) -> Self {
        self.stage(Stage::Roles(roles.to_vec()))
    }

    pub fn with_resource_auth(self, resource: Resource, action: Action) -> Self {
        self.stage(Stage::Resource { resource, action })
    }

    pub fn with_own_resource_auth(
        self,
        resource: Resource,
        action: Action,
        param: &'static str,
    ) -> Self {
        self.stage(Stage::OwnResource {
            resource,
            action,
            param,
        })
    }

    /// Orders the stages by phase, drops repeated singleton stages, and adds
    /// authentication when a later stage needs a principal. Required
    /// authentication replaces optional authentication.
    pub fn build(self) -> Pipeline {
        let mut stages: Vec<Stage> = Vec::with_capacity(self.stages.len() + 1);
        for stage in self.stages {
            if stage.is_singleton() && stages.contains(&stage) {
                continue;
            }
            stages.push(stage);
        }

        let needs_auth = stages.iter().any(Stage::needs_principal);
        if needs_auth && !stages.contains(&Stage::Authenticate) {
            stages.push(Stage::Authenticate);
        }
        if stages.contains(&Stage::Authenticate) {
            stages.retain(|stage| *stage != Stage::OptionalAuthenticate);
        }

        // Stable: same-phase stages keep registration order.
        stages.sort_by_key(Stage::phase);

        Pipeline {
            stages: stages.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Arc<[Stage]>,
}

impl Pipeline {
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(Stage::name).collect()
    }

    pub fn layer(&self, state: &AppState) -> PipelineLayer {
        PipelineLayer {
            stages: self.stages.clone(),
            state: state.clone(),
        }
    }
}

/// Tower layer wrapping one handler in a pipeline.
#[derive(Clone)]
pub struct PipelineLayer {
    stages: Arc<[Stage]>,
    state: AppState,
}

impl<S> Layer<S> for PipelineLayer {
    type Service = PipelineService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PipelineService {
            inner,
            stages: self.stages.clone(),
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct PipelineService<S> {
    inner: S,
    stages: Arc<[Stage]>,
    state: AppState,
}

impl<S> Service<Request<Body>> for PipelineService<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let dispatch = Dispatch {
            stages: self.stages.clone(),
            state: self.state.clone(),
        };
        // The service polled ready is the one that gets called.
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move { Ok(dispatch.run(0, request, inner).await) })
    }
}

struct Dispatch {
    stages: Arc<[Stage]>,
    state: AppState,
}

impl Dispatch {
    /// Runs the stages from `index` on, then the handler, then the hooks the
    /// stages left behind. The error handler stage runs everything after it
    /// inside a panic boundary.
    fn run<'a, S>(
        &'a self,
        index: usize,
        mut request: Request,
        mut inner: S,
    ) -> BoxFuture<'a, Response>
    where
        S: Service<Request<Body>, Response = Response, Error = Infallible> + Send + 'static,
        S::Future: Send,
    {
        Box::pin(async move {
            let mut hooks: Vec<AfterHook> = Vec::new();
            let mut index = index;

            let mut response = loop {
                let Some(stage) = self.stages.get(index) else {
                    break inner.call(request).await.unwrap_or_else(|never| match never {});
                };
                index += 1;

                let flow = match stage {
                    Stage::ErrorHandler => {
                        break recover::catch_panic(self.run(index, request, inner)).await;
                    }
                    Stage::RequestLogging => {
                        let path = request
                            .extensions()
                            .get::<MatchedPath>()
                            .map(|p| p.as_str().to_owned())
                            .unwrap_or_else(|| request.uri().path().to_owned());
                        Flow::Continue(Some(AfterHook::Log(RequestLog::begin(
                            request.method(),
                            path,
                        ))))
                    }
                    Stage::Cors(policy) => cors::apply(policy, &request),
                    Stage::RateLimit { scope, limit } => {
                        let key =
                            rate_limit::ip_key(scope, &request, &self.state.rate_limit_config);
                        rate_limit::throttle(&self.state, scope, *limit, &key).await
                    }
                    Stage::Authenticate => {
                        auth::authenticate_request(&self.state, &mut request).await
                    }
                    Stage::OptionalAuthenticate => {
                        auth::authenticate_optional(&self.state, &mut request).await
                    }
                    Stage::IdentityRateLimit { scope, limit } => {
                        match rate_limit::identity_key(scope, &request) {
                            Ok(key) => rate_limit::throttle(&self.state, scope, *limit, &key).await,
                            Err(err) => Flow::Respond(err.into_response()),
                        }
                    }
                    Stage::Roles(roles) => authorize::roles(&request, roles),
                    Stage::Resource { resource, action } => {
                        authorize::resource(&request, *resource, *action)
                    }
                    Stage::OwnResource {
                        resource,
                        action,
                        param,
                    } => {
                        authorize::own_resource(&self.state, &mut request, *resource, *action, param)
                            .await
                    }
                };

                match flow {
                    Flow::Continue(Some(hook)) => hooks.push(hook),
                    Flow::Continue(None) => {}
                    Flow::Respond(response) => break response,
                }
            };

            for hook in hooks.into_iter().rev() {
                hook.apply(&mut response);
            }
            response
        })
    }
}
