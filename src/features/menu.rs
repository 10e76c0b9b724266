use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::app::Feature;
use crate::host::{Dependency, DependencySlot, LocalizedResources, Messenger};
use crate::models::ExitRequest;
use crate::views::{PublishedView, ViewModel};

#[derive(Default)]
pub struct MenuFeature;

impl MenuFeature {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Feature for MenuFeature {
    fn name(&self) -> &'static str {
        "Menu"
    }

    fn published_views(self: Arc<Self>) -> Vec<PublishedView> {
        vec![PublishedView::new("IDE.MainMenu", "MenuView", |_| {
            let view_model: Arc<dyn ViewModel> = Arc::new(MenuViewModel::default());
            Ok(Some(view_model))
        })
        .with_description("The main menu for the main window.")]
    }

    fn localized_resources(&self) -> Vec<LocalizedResources> {
        vec![
            LocalizedResources::new("en-us").with("Menu.Exit", "Exit"),
            LocalizedResources::new("fi-fi").with("Menu.Exit", "Lopeta"),
        ]
    }
}

#[derive(Default)]
pub struct MenuViewModel {
    messenger: Dependency<Messenger>,
}

impl MenuViewModel {
    /// Asks the running app to close. Features may still veto.
    ///
    /// Returns `false` when nothing is listening, i.e. the app is not inside
    /// [`App::run_until_exit`](crate::app::App::run_until_exit).
    pub fn exit(&self) -> bool {
        let Some(messenger) = self.messenger.get() else {
            tracing::error!("MenuViewModel: required dependency Messenger could not be resolved");
            return false;
        };

        let delivered = messenger.send(&ExitRequest) > 0;
        if !delivered {
            tracing::warn!("Exit requested but the app is not waiting for one");
        }
        delivered
    }
}

impl ViewModel for MenuViewModel {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dependencies(&self) -> Vec<&dyn DependencySlot> {
        vec![&self.messenger as &dyn DependencySlot]
    }
}
