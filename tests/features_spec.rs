//! End-to-end tests for the stock features running inside a real app.
//!
//! Each test gets its own temporary data directory so persisted settings
//! never leak between tests.

use std::sync::Arc;

use feature_shell::app::{App, Feature};
use feature_shell::config::HostConfig;
use feature_shell::features::app_settings::{AppSettings, SetOutcome, SettingValue};
use feature_shell::features::home_screen::HomeScreenViewModel;
use feature_shell::features::menu::MenuViewModel;
use feature_shell::features::project::{ProjectFactory, ProjectViewModel, DEFAULT_TITLE_KEY};
use feature_shell::features::shell::{LanguageChanged, ShellViewModel, SHELL_REGIONS};
use feature_shell::features::status_bar::StatusBarViewModel;
use feature_shell::features::view_selector::NavContent;
use feature_shell::features::{
    builtin, AppSettingsFeature, HomeScreenFeature, NavItem, ProjectFeature, Shell, ShellFeature,
    StatusBarFeature, Theme, ViewSelector, ViewSelectorFeature,
};
use feature_shell::models::{ExitRequest, LaunchOutcome, LifecycleState};
use feature_shell::views::ViewParameter;
use parking_lot::Mutex;
use tempfile::TempDir;

/// Handles on the concrete stock features, for assertions the capability traits do not expose.
struct Stock {
    selector: Arc<ViewSelectorFeature>,
}

fn stock_features(with_home_screen: bool) -> (Stock, Vec<Arc<dyn Feature>>) {
    let selector = Arc::new(ViewSelectorFeature::new());
    let mut features: Vec<Arc<dyn Feature>> = vec![
        Arc::new(ShellFeature::new()) as Arc<dyn Feature>,
        selector.clone(),
        Arc::new(StatusBarFeature::new()),
    ];
    if with_home_screen {
        features.push(Arc::new(HomeScreenFeature::new()));
    }
    features.push(Arc::new(AppSettingsFeature::new()));
    features.push(Arc::new(ProjectFeature::new()));
    (Stock { selector }, features)
}

fn new_app(dir: &TempDir) -> App {
    App::new(HostConfig::new("features-test", dir.path()))
}

async fn launch_builtin(dir: &TempDir, args: &[String]) -> App {
    let mut app = new_app(dir);
    app.load(builtin()).expect("Failed to load features");
    let outcome = app.launch(args).await.expect("Launch failed");
    assert_eq!(outcome, LaunchOutcome::Running);
    app
}

async fn launch_stock(dir: &TempDir, with_home_screen: bool, args: &[String]) -> (App, Stock) {
    let (stock, features) = stock_features(with_home_screen);
    let mut app = new_app(dir);
    app.load(features).expect("Failed to load features");
    app.launch(args).await.expect("Launch failed");
    (app, stock)
}

fn shell(app: &App) -> Arc<dyn Shell> {
    app.host().get_instance::<dyn Shell>().expect("Shell not provided")
}

fn app_settings(app: &App) -> Arc<dyn AppSettings> {
    app.host()
        .get_instance::<dyn AppSettings>()
        .expect("AppSettings not provided")
}

// ============================================================
// Startup
// ============================================================

mod startup {
    use super::*;

    #[tokio::test]
    async fn builtin_features_load_and_run() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let app = launch_builtin(&dir, &[]).await;

        assert_eq!(app.state(), LifecycleState::Running);
        assert_eq!(
            app.host().feature_names(),
            vec![
                "Shell",
                "Menu",
                "ViewSelector",
                "StatusBar",
                "HomeScreen",
                "AppSettings",
                "Project"
            ]
        );
        for name in [
            "IDE.Shell",
            "IDE.MainMenu",
            "IDE.ViewSelector",
            "IDE.StatusBar",
            "IDE.HomeScreen",
            "IDE.AppSettings",
            "PROJECT.Main",
        ] {
            assert!(app.host().published_view(name).is_some(), "{} not published", name);
        }
    }

    #[tokio::test]
    async fn shell_view_hosts_its_regions_and_opens_home() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let app = launch_builtin(&dir, &[]).await;

        let view = app.host().create_view("IDE.Shell", None).expect("Shell view refused");
        let model = view.data_context::<ShellViewModel>().expect("Wrong view-model");
        assert_eq!(model.regions(), SHELL_REGIONS.to_vec());

        view.attach();

        let selector = app
            .host()
            .get_instance::<dyn ViewSelector>()
            .expect("ViewSelector not provided");
        assert_eq!(selector.current(), Some(NavItem::Home));
        // Shell, its three regions and the home screen.
        assert_eq!(app.host().active_view_count(), 5);

        view.detach();
        assert_eq!(app.host().active_view_count(), 1);
    }

    #[tokio::test]
    async fn status_bar_summarizes_diagnostics() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let app = launch_builtin(&dir, &[]).await;

        let view = app.host().create_view("IDE.StatusBar", None).expect("View refused");
        let model = view.data_context::<StatusBarViewModel>().expect("Wrong view-model");

        let summary = model.summary().expect("No host injected");
        assert!(summary.starts_with("7 features"), "{}", summary);
        assert!(summary.ends_with("running"), "{}", summary);
    }
}

// ============================================================
// Shell
// ============================================================

mod shell_settings {
    use super::*;

    #[tokio::test]
    async fn appearance_is_persisted_across_launches() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let app = launch_builtin(&dir, &[]).await;
        shell(&app).set_theme(Theme::Dark);
        shell(&app).set_accent_color("#112233");
        shell(&app).set_language("fi-FI");
        assert!(app.exit(true).await.expect("Exit failed"));

        let app = launch_builtin(&dir, &[]).await;
        assert_eq!(shell(&app).theme(), Theme::Dark);
        assert_eq!(shell(&app).accent_color(), "#FF112233");
        assert_eq!(shell(&app).language(), "fi-fi");
        assert_eq!(app.host().language(), "fi-fi");
    }

    #[tokio::test]
    async fn invalid_accent_color_becomes_transparent() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let app = launch_builtin(&dir, &[]).await;

        shell(&app).set_accent_color("blue");

        assert_eq!(shell(&app).accent_color(), "#00000000");
    }

    #[tokio::test]
    async fn home_screen_switches_the_language() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let app = launch_builtin(&dir, &[]).await;
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = changes.clone();
        let _sub = app
            .host()
            .messenger()
            .subscribe(move |m: &LanguageChanged| sink.lock().push(m.to.clone()));

        let view = app.host().create_view("IDE.HomeScreen", None).expect("View refused");
        let model = view.data_context::<HomeScreenViewModel>().expect("Wrong view-model");
        assert_eq!(model.selected_language().as_deref(), Some("en-us"));
        assert!(!model.select_language("xx-xx"));

        assert!(model.select_language("fi-fi"));

        assert_eq!(app.host().language(), "fi-fi");
        assert_eq!(app.host().localized_text("ViewSelector.Home").as_deref(), Some("Koti"));
        assert_eq!(*changes.lock(), vec!["fi-fi".to_string()]);
    }
}

// ============================================================
// Projects
// ============================================================

mod projects {
    use super::*;

    #[tokio::test]
    async fn default_title_setting_names_new_projects() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let app = launch_builtin(&dir, &[]).await;
        let setting = app_settings(&app)
            .find_setting(DEFAULT_TITLE_KEY)
            .expect("Default title not registered");

        assert_eq!(
            setting.set_value(SettingValue::String("   ".to_string())),
            SetOutcome::Rejected
        );
        assert_eq!(
            setting.set_value(SettingValue::String("Experiments".to_string())),
            SetOutcome::Changed
        );

        let factory = app
            .host()
            .get_instance::<dyn ProjectFactory>()
            .expect("ProjectFactory not provided");
        let item = factory.create_project();
        assert_eq!(item.title, "Experiments");
        assert!(item
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("__unnamed_")));
    }

    #[tokio::test]
    async fn settings_are_exported_on_shutdown_and_imported_on_registration() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let app = launch_builtin(&dir, &[]).await;
        let setting = app_settings(&app)
            .find_setting(DEFAULT_TITLE_KEY)
            .expect("Default title not registered");
        setting.set_value(SettingValue::String("Kept".to_string()));
        app.exit(true).await.expect("Exit failed");

        let app = launch_builtin(&dir, &[]).await;
        let setting = app_settings(&app)
            .find_setting(DEFAULT_TITLE_KEY)
            .expect("Default title not registered");
        assert_eq!(setting.value(), SettingValue::String("Kept".to_string()));
    }

    #[tokio::test]
    async fn main_view_refuses_anything_but_a_project() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let app = launch_builtin(&dir, &[]).await;

        let parameter: ViewParameter = Arc::new(42u32);
        assert!(app.host().create_view("PROJECT.Main", Some(parameter)).is_none());
        assert!(app.host().create_view("PROJECT.Main", None).is_none());
    }
}

// ============================================================
// View selector
// ============================================================

mod view_selector {
    use super::*;

    fn project_content(stock: &Stock, id: uuid::Uuid) -> Arc<NavContent> {
        stock
            .selector
            .content(NavItem::Project(id))
            .expect("Project was never opened")
    }

    #[tokio::test]
    async fn opens_command_line_arguments_as_projects() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("alpha");
        let (_app, stock) =
            launch_stock(&dir, true, &[path.to_string_lossy().into_owned()]).await;

        let projects = stock.selector.projects();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].title, "alpha");
        assert_eq!(stock.selector.current(), Some(NavItem::Project(projects[0].id)));

        match project_content(&stock, projects[0].id).as_ref() {
            NavContent::View(view) => {
                assert_eq!(view.name(), "PROJECT.Main");
                assert!(view.is_attached());
            }
            NavContent::NotFound(message) => panic!("Project view missing: {}", message),
        }
    }

    #[tokio::test]
    async fn shows_a_message_for_a_missing_view() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let (_app, stock) = launch_stock(&dir, false, &[]).await;

        stock.selector.activate_home();

        match stock.selector.content(NavItem::Home).as_deref() {
            Some(NavContent::NotFound(message)) => {
                assert_eq!(message, "View 'IDE.HomeScreen' was not found");
            }
            other => panic!("Expected a not-found message, got {:?}", other),
        }
        assert_eq!(stock.selector.current(), Some(NavItem::Home));
    }

    #[tokio::test]
    async fn adding_a_project_twice_is_refused() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let (app, stock) = launch_stock(&dir, true, &[]).await;
        let factory = app
            .host()
            .get_instance::<dyn ProjectFactory>()
            .expect("ProjectFactory not provided");

        let item = factory.create_project();
        assert!(stock.selector.add_project(item.clone()));
        assert!(!stock.selector.add_project(item.clone()));

        stock.selector.activate_project(&item);
        assert!(stock.selector.remove_project(item.id));
        assert_eq!(stock.selector.current(), Some(NavItem::Home));
        assert!(!stock.selector.remove_project(item.id));
    }

    #[tokio::test]
    async fn unsaved_projects_veto_exit_until_saved() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("draft");
        let (app, stock) = launch_stock(&dir, true, &[path.to_string_lossy().into_owned()]).await;
        let id = stock.selector.projects()[0].id;

        let content = project_content(&stock, id);
        let NavContent::View(view) = content.as_ref() else {
            panic!("Project view missing");
        };
        let model = view.data_context::<ProjectViewModel>().expect("Wrong view-model");
        model.set_content("unsaved text");
        assert!(model.is_dirty());

        assert!(!app.request_exit().await.expect("Exit request failed"));
        assert_eq!(app.state(), LifecycleState::Running);

        model.save();
        assert!(app.request_exit().await.expect("Exit request failed"));
        assert_eq!(app.state(), LifecycleState::Terminated);
    }
}

// ============================================================
// Menu
// ============================================================

mod menu {
    use super::*;

    #[tokio::test]
    async fn exit_command_closes_a_running_app() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let app = launch_builtin(&dir, &[]).await;
        let view = app.host().create_view("IDE.MainMenu", None).expect("Menu view refused");
        let model = view.data_context::<MenuViewModel>().expect("Wrong view-model");
        let messenger = app.host().messenger().clone();

        let click = async {
            while messenger.subscriber_count::<ExitRequest>(None) == 0 {
                tokio::task::yield_now().await;
            }
            assert!(model.exit());
        };
        let (result, ()) = tokio::join!(
            app.run_until_exit(std::future::pending::<std::io::Result<()>>),
            click
        );

        result.expect("Run failed");
        assert_eq!(app.state(), LifecycleState::Terminated);
        assert_eq!(messenger.subscriber_count::<ExitRequest>(None), 0);
    }

    #[tokio::test]
    async fn exit_command_is_ignored_outside_the_run_loop() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let app = launch_builtin(&dir, &[]).await;
        let view = app.host().create_view("IDE.MainMenu", None).expect("Menu view refused");
        let model = view.data_context::<MenuViewModel>().expect("Wrong view-model");

        assert!(!model.exit());
        assert_eq!(app.state(), LifecycleState::Running);
        assert_eq!(view.text("Menu.Exit").as_deref(), Some("Exit"));
    }
}
