//! The lifecycle orchestrator.
//!
//! [`App`] owns the ordered feature list and drives it through
//! initialize → starting → running → exit-requested → shutdown:
//!
//! | Phase | Dispatch | Cancellable |
//! |---|---|---|
//! | initialize | concurrent, first error aborts | no |
//! | starting | sequential, load order | yes, aborts startup |
//! | running | concurrent | no |
//! | exit_requested | concurrent | yes, keeps the app running |
//! | shutdown | concurrent, always completes | no |

mod feature;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use futures::future::{join_all, try_join_all};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

pub use feature::Feature;

use crate::config::HostConfig;
use crate::error::ShellError;
use crate::host::{CapabilityBindings, CapabilityRegistrar, Host, LocalizedResources};
use crate::models::{ExitRequest, LaunchOutcome, LifecycleState};
use crate::views::ViewRegistry;

pub struct App {
    host: Host,
    features: Vec<Arc<dyn Feature>>,
    /// Set once shutdown begins, so it never runs twice.
    exiting: AtomicBool,
}

impl App {
    pub fn new(config: HostConfig) -> Self {
        Self::with_host(Host::new(config))
    }

    pub fn with_host(host: Host) -> Self {
        Self {
            host,
            features: Vec::new(),
            exiting: AtomicBool::new(false),
        }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn features(&self) -> &[Arc<dyn Feature>] {
        &self.features
    }

    pub fn state(&self) -> LifecycleState {
        self.host.lifecycle_state()
    }

    // ============================================================
    // Loading
    // ============================================================

    /// Takes ownership of `features` in the given order, builds the capability
    /// bindings and the published-view registry, then resolves every
    /// feature's dependencies.
    pub fn load(&mut self, features: Vec<Arc<dyn Feature>>) -> Result<(), ShellError> {
        if self.state() != LifecycleState::Created {
            return Err(ShellError::AlreadyLoaded);
        }

        let mut names = Vec::with_capacity(features.len());
        let mut bindings = CapabilityBindings::new();
        let mut views = ViewRegistry::new();
        let mut resources: Vec<(&'static str, Vec<LocalizedResources>)> = Vec::new();

        for feature in &features {
            let name = feature.name();
            names.push(name.to_string());

            feature
                .clone()
                .provide(&mut CapabilityRegistrar::new(name, &mut bindings));

            for view in feature.clone().published_views() {
                views.publish(name, view)?;
            }

            resources.push((name, feature.localized_resources()));
        }

        self.host.install_features(names, bindings, views);
        for (name, resources) in resources {
            self.host.add_localization(name, resources);
        }

        for feature in &features {
            self.host
                .resolve_dependencies(feature.name(), &feature.dependencies());
        }

        tracing::info!("Loaded {} features", features.len());
        self.features = features;
        self.host.set_state(LifecycleState::Loaded);
        Ok(())
    }

    // ============================================================
    // Lifecycle phases
    // ============================================================

    /// Loads persisted settings, then runs initialize, starting and running.
    pub async fn launch(&self, args: &[String]) -> Result<LaunchOutcome> {
        self.host.load_settings();

        self.initialize().await?;
        if !self.starting().await? {
            return Ok(LaunchOutcome::StartupCancelled);
        }
        self.running(args).await?;

        Ok(LaunchOutcome::Running)
    }

    pub async fn initialize(&self) -> Result<()> {
        self.expect_state(LifecycleState::Loaded)?;
        tracing::info!("Features: initialize");

        try_join_all(self.features.iter().map(|f| f.initialize(&self.host))).await?;

        self.host.set_state(LifecycleState::Initialized);
        Ok(())
    }

    /// Visits features one at a time in load order. Returns `false` when a
    /// feature cancelled, in which case the app has already been shut down.
    pub async fn starting(&self) -> Result<bool> {
        self.expect_state(LifecycleState::Initialized)?;
        self.host.set_state(LifecycleState::Starting);
        tracing::info!("Features: starting");

        let cancel = CancellationToken::new();
        let mut cancelled_by = None;
        for feature in &self.features {
            feature.starting(&self.host, &cancel).await?;
            if cancelled_by.is_none() && cancel.is_cancelled() {
                cancelled_by = Some(feature.name());
            }
        }

        if let Some(name) = cancelled_by {
            tracing::warn!("Startup cancelled by {}; shutting down", name);
            self.exit(true).await?;
            return Ok(false);
        }

        Ok(true)
    }

    pub async fn running(&self, args: &[String]) -> Result<()> {
        self.expect_state(LifecycleState::Starting)?;
        self.host.set_state(LifecycleState::Running);
        tracing::info!("Features: running");

        try_join_all(self.features.iter().map(|f| f.running(&self.host, args))).await?;
        Ok(())
    }

    /// Asks every feature whether the app may close. Returns `true` when it
    /// shut down (or already had), `false` when a feature vetoed and the app
    /// keeps running.
    pub async fn request_exit(&self) -> Result<bool> {
        if self.exiting.load(Ordering::SeqCst) {
            tracing::debug!("Exit requested after shutdown began");
            return Ok(true);
        }
        self.expect_state(LifecycleState::Running)?;
        self.host.set_state(LifecycleState::ExitRequested);
        tracing::info!("Features: exit requested");

        let cancel = CancellationToken::new();
        try_join_all(
            self.features
                .iter()
                .map(|f| f.exit_requested(&self.host, &cancel)),
        )
        .await?;

        if cancel.is_cancelled() {
            tracing::info!("Exit cancelled by a feature");
            self.host.set_state(LifecycleState::Running);
            return Ok(false);
        }

        self.shutdown().await
    }

    /// Closes the app. `force` skips the exit-request veto.
    pub async fn exit(&self, force: bool) -> Result<bool> {
        if force {
            self.shutdown().await
        } else {
            self.request_exit().await
        }
    }

    /// Keeps the app running until an exit request goes through.
    ///
    /// A request is either `interrupt` completing (Ctrl-C for the binary) or
    /// an [`ExitRequest`] sent on the host messenger. A vetoed request goes
    /// back to waiting.
    pub async fn run_until_exit<F, Fut>(&self, mut interrupt: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::io::Result<()>>,
    {
        let requested = Arc::new(Notify::new());
        let _subscription = {
            let requested = requested.clone();
            self.host
                .messenger()
                .subscribe(move |_: &ExitRequest| requested.notify_one())
        };

        loop {
            tokio::select! {
                result = interrupt() => result?,
                _ = requested.notified() => tracing::debug!("Exit requested by a view"),
            }
            if self.exit(false).await? {
                return Ok(());
            }
            tracing::info!("Exit was cancelled; still running");
        }
    }

    /// Runs every shutdown hook to completion, then saves settings.
    ///
    /// Returns `false` without doing anything if shutdown already ran. The
    /// first hook error is returned after settings are saved.
    async fn shutdown(&self) -> Result<bool> {
        if self.exiting.swap(true, Ordering::SeqCst) {
            tracing::debug!("Shutdown already in progress");
            return Ok(false);
        }

        self.host.set_state(LifecycleState::ShuttingDown);
        tracing::info!("Features: shutdown");

        let results = join_all(self.features.iter().map(|f| f.shutdown(&self.host))).await;

        self.host.save_settings();
        self.host.set_state(LifecycleState::Terminated);

        for result in results {
            result?;
        }
        Ok(true)
    }

    fn expect_state(&self, expected: LifecycleState) -> Result<(), ShellError> {
        let actual = self.state();
        if actual != expected {
            return Err(ShellError::InvalidState { expected, actual });
        }
        Ok(())
    }
}
