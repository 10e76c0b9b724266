use std::any::type_name;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::host::{CapabilityRegistrar, DependencySlot, Host, LocalizedResources};
use crate::views::PublishedView;

/// An autonomous application module driven through the shared lifecycle.
///
/// Declarations (`provide`, `published_views`, `localized_resources`,
/// `dependencies`) are read once while the app loads features. The async
/// hooks are then called in phase order; see [`App`](crate::app::App) for
/// which phases fan out and which run sequentially.
#[async_trait]
pub trait Feature: Send + Sync + 'static {
    /// Name used in logs, diagnostics and as the localization scope.
    fn name(&self) -> &'static str {
        short_type_name(type_name::<Self>())
    }

    /// Binds the capabilities this feature provides, usually itself as a trait object.
    fn provide(self: Arc<Self>, _registrar: &mut CapabilityRegistrar<'_>) {}

    fn published_views(self: Arc<Self>) -> Vec<PublishedView> {
        Vec::new()
    }

    fn localized_resources(&self) -> Vec<LocalizedResources> {
        Vec::new()
    }

    /// Slots filled by the host right after all features are loaded.
    fn dependencies(&self) -> Vec<&dyn DependencySlot> {
        Vec::new()
    }

    /// First phase; runs for every feature concurrently. Load settings and data here.
    async fn initialize(&self, _host: &Host) -> Result<()> {
        Ok(())
    }

    /// Runs for one feature at a time, in load order. Publish settings and
    /// services for later features here. Cancelling `cancel` aborts startup
    /// and shuts the app down instead of running it.
    async fn starting(&self, _host: &Host, _cancel: &CancellationToken) -> Result<()> {
        Ok(())
    }

    /// Every feature has started. `args` are the process arguments without
    /// the executable name.
    async fn running(&self, _host: &Host, _args: &[String]) -> Result<()> {
        Ok(())
    }

    /// The user asked to close the app. Cancelling `cancel` keeps it running.
    /// Do not release resources here; that belongs in [`shutdown`](Self::shutdown).
    async fn exit_requested(&self, _host: &Host, _cancel: &CancellationToken) -> Result<()> {
        Ok(())
    }

    /// The app is closing; stop background work and flush state.
    async fn shutdown(&self, _host: &Host) -> Result<()> {
        Ok(())
    }
}

/// `feature_shell::features::shell::ShellFeature` -> `ShellFeature`.
fn short_type_name(full: &'static str) -> &'static str {
    let path = full.split('<').next().unwrap_or(full);
    match path.rfind("::") {
        Some(index) => &full[index + 2..],
        None => full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::HostConfig;
    use tokio_test::assert_ok;

    struct Quiet;

    #[async_trait]
    impl Feature for Quiet {}

    #[test]
    fn test_default_hooks() {
        let host = Host::new(HostConfig::new("test", std::env::temp_dir()));
        let quiet = Quiet;
        let cancel = CancellationToken::new();

        assert_eq!(quiet.name(), "Quiet");
        assert!(quiet.dependencies().is_empty());
        tokio_test::block_on(async {
            assert_ok!(quiet.initialize(&host).await);
            assert_ok!(quiet.starting(&host, &cancel).await);
            assert_ok!(quiet.exit_requested(&host, &cancel).await);
            assert_ok!(quiet.shutdown(&host).await);
        });
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::ShellFeature"), "ShellFeature");
        assert_eq!(short_type_name("Plain"), "Plain");
        assert_eq!(short_type_name("a::Wrapper<b::Inner>"), "Wrapper<b::Inner>");
    }
}
