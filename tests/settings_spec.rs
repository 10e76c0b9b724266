use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use feature_shell::features::app_settings::{
    CommonCategories, ErasedSetting, SetOutcome, SettingValue, SettingsTree,
};
use feature_shell::ShellError;
use speculate2::speculate;

fn counter() -> (Arc<AtomicUsize>, impl Fn(&i32) + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let handle = count.clone();
    (count, move |_: &i32| {
        handle.fetch_add(1, Ordering::SeqCst);
    })
}

speculate! {
    before {
        let tree = SettingsTree::new();
    }

    describe "categories" {
        it "registers a category idempotently" {
            let first = tree.register_category("Category.Editor", None).expect("Failed to register");
            let second = tree.register_category("Category.Editor", None).expect("Failed to register");

            assert!(Arc::ptr_eq(&first, &second));
            assert_eq!(tree.categories().len(), 1);
        }

        it "registers the same key under different parents separately" {
            let a = tree.register_category("A", None).expect("Failed to register");
            let b = tree.register_category("B", None).expect("Failed to register");
            let under_a = tree.register_category("Child", Some(&a)).expect("Failed to register");
            let under_b = tree.register_category("Child", Some(&b)).expect("Failed to register");
            let again = tree.register_category("Child", Some(&a)).expect("Failed to register");

            assert!(!Arc::ptr_eq(&under_a, &under_b));
            assert!(Arc::ptr_eq(&under_a, &again));
            assert_eq!(a.categories().len(), 1);
            assert_eq!(under_a.level(), 1);
        }

        it "rejects a blank key" {
            assert!(matches!(tree.register_category(" ", None), Err(ShellError::EmptyKey)));
        }

        it "moves a category between parents" {
            let a = tree.register_category("A", None).expect("Failed to register");
            let b = tree.register_category("B", None).expect("Failed to register");
            let child = tree.register_category("Child", Some(&a)).expect("Failed to register");

            assert!(tree.move_category(&child, Some(&b)));

            assert!(a.categories().is_empty());
            assert_eq!(b.categories().len(), 1);
            assert!(Arc::ptr_eq(&child.parent().expect("No parent"), &b));
        }

        it "moves a root category under a parent and back" {
            let a = tree.register_category("A", None).expect("Failed to register");
            let b = tree.register_category("B", None).expect("Failed to register");

            assert!(tree.move_category(&b, Some(&a)));
            assert_eq!(tree.categories().len(), 1);

            assert!(tree.move_category(&b, None));
            assert_eq!(tree.categories().len(), 2);
            assert!(b.parent().is_none());
            assert!(a.categories().is_empty());
        }

        it "refuses to move a category under its own descendant" {
            let a = tree.register_category("A", None).expect("Failed to register");
            let child = tree.register_category("Child", Some(&a)).expect("Failed to register");

            assert!(!tree.move_category(&a, Some(&child)));
            assert!(!tree.move_category(&a, Some(&a)));
            assert!(child.parent().is_some());
        }
    }

    describe "setting registration" {
        it "puts settings without a path under General" {
            let setting = tree.register_setting("count", &[], 1, None).expect("Failed to register");

            let parent = setting.parent().expect("No parent");
            assert_eq!(parent.key(), CommonCategories::GENERAL);
            assert_eq!(parent.settings().len(), 1);
        }

        it "creates the category chain and maps blank segments to a dot" {
            tree.register_setting("flag", &["Editor", "", "Fonts"], false, None).expect("Failed to register");

            let editor = tree.find_category("Editor").expect("Missing Editor");
            let dot = editor.child(".").expect("Missing blank segment");
            assert!(dot.child("Fonts").is_some());
            assert_eq!(tree.all_categories().len(), 3);
        }

        it "reuses existing categories on the path" {
            tree.register_setting("a", &["Editor"], 1, None).expect("Failed to register");
            tree.register_setting("b", &["Editor"], 2, None).expect("Failed to register");

            assert_eq!(tree.categories().len(), 1);
            assert_eq!(tree.all_settings().len(), 2);
        }

        it "rejects a blank setting key" {
            assert!(matches!(
                tree.register_setting("", &[], 0, None),
                Err(ShellError::EmptyKey)
            ));
        }
    }

    describe "setting values" {
        it "distinguishes rejected, unchanged and changed assignments" {
            let setting = tree
                .register_setting("even", &[], 2, Some(Box::new(|v: &i32| v % 2 == 0)))
                .expect("Failed to register");
            let (count, handler) = counter();
            setting.on_changed(handler);

            assert_eq!(setting.set(3), SetOutcome::Rejected);
            assert_eq!(setting.value(), 2);
            assert!(setting.has_error());

            assert_eq!(setting.set(2), SetOutcome::Unchanged);
            assert!(!setting.has_error());

            assert_eq!(setting.set(4), SetOutcome::Changed);
            assert_eq!(setting.value(), 4);
            assert_eq!(count.load(Ordering::SeqCst), 1);
        }

        it "round-trips every kind through export and import" {
            let integer = tree.register_setting("i", &[], 0, None).expect("Failed to register");
            let boolean = tree.register_setting("b", &[], false, None).expect("Failed to register");
            let string = tree.register_setting("s", &[], String::new(), None).expect("Failed to register");

            integer.set(-17);
            boolean.set(true);
            string.set("héllo, world".to_string());

            let exported = (integer.export(), boolean.export(), string.export());
            assert_eq!(exported.1, "True");

            integer.set(0);
            boolean.set(false);
            string.set(String::new());

            integer.import(&exported.0);
            boolean.import(&exported.1);
            string.import(&exported.2);

            assert_eq!(integer.value(), -17);
            assert!(boolean.value());
            assert_eq!(string.value(), "héllo, world");
        }

        it "falls back to the default on malformed input" {
            let setting = tree.register_setting("n", &[], 5, None).expect("Failed to register");
            setting.set(9);

            assert_eq!(setting.import("nine"), SetOutcome::Changed);
            assert_eq!(setting.value(), 5);
        }

        it "rejects values of another kind through the erased interface" {
            let setting = tree.register_setting("n", &[], 5, None).expect("Failed to register");
            let erased: Arc<dyn ErasedSetting> = setting.clone();

            assert_eq!(erased.set_value(SettingValue::Boolean(true)), SetOutcome::Rejected);
            assert_eq!(erased.set_value(SettingValue::Integer(6)), SetOutcome::Changed);
            assert_eq!(erased.value(), SettingValue::Integer(6));
            assert_eq!(erased.kind(), "integer");
        }
    }

    describe "reset_all" {
        it "restores defaults and notifies only for settings that differ" {
            let changed = tree.register_setting("changed", &["A"], 1, None).expect("Failed to register");
            let untouched = tree.register_setting("untouched", &["A", "B"], 2, None).expect("Failed to register");
            let (changed_count, changed_handler) = counter();
            let (untouched_count, untouched_handler) = counter();
            changed.on_changed(changed_handler);
            untouched.on_changed(untouched_handler);
            changed.set(10);

            assert_eq!(tree.reset_all(), 1);

            assert_eq!(changed.value(), 1);
            assert_eq!(changed_count.load(Ordering::SeqCst), 2);
            assert_eq!(untouched_count.load(Ordering::SeqCst), 0);
        }
    }
}
