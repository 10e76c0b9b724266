use std::fs;

use feature_shell::store::SettingsStore;
use feature_shell::ShellError;
use speculate2::speculate;

speculate! {
    before {
        let store = SettingsStore::open_memory();
    }

    describe "typed values" {
        it "returns the default for a missing key" {
            let value: i32 = store.get_value("missing", 7).expect("Lookup failed");
            assert_eq!(value, 7);
        }

        it "round-trips a value through JSON text" {
            store.set_value("APP.Theme", "Dark").expect("Failed to set");

            let value: String = store.get_value("APP.Theme", String::new()).expect("Lookup failed");
            assert_eq!(value, "Dark");
            assert_eq!(store.get_raw("APP.Theme"), Some("\"Dark\"".to_string()));
        }

        it "returns the default when the stored text has another type" {
            store.set_raw("count", "not a number").expect("Failed to set");

            let value: i32 = store.get_value("count", 3).expect("Lookup failed");
            assert_eq!(value, 3);
            assert!(store.try_get_value::<i32>("count").expect("Lookup failed").is_none());
        }

        it "clears a value" {
            store.set_value("key", &true).expect("Failed to set");

            assert!(store.clear_value("key").expect("Clear failed"));
            assert!(!store.clear_value("key").expect("Clear failed"));
            assert!(store.is_empty());
        }

        it "rejects empty keys" {
            assert!(matches!(store.set_value("  ", &1), Err(ShellError::EmptyKey)));
            assert!(matches!(store.get_value("", 1), Err(ShellError::EmptyKey)));
            assert!(matches!(store.clear_value(""), Err(ShellError::EmptyKey)));
        }
    }

    describe "persistence" {
        it "treats a missing file as no saved settings" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let loaded = store
                .load_file(&dir.path().join("settings.json"))
                .expect("Load failed");

            assert_eq!(loaded, 0);
        }

        it "saves and reloads a flat string map" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("Settings").join("settings.json");

            store.set_raw("A", "True").expect("Failed to set");
            store.set_raw("B", "42").expect("Failed to set");
            store.save_file(&path).expect("Save failed");

            let reloaded = SettingsStore::open_memory();
            assert_eq!(reloaded.load_file(&path).expect("Load failed"), 2);
            assert_eq!(reloaded.get_raw("A"), Some("True".to_string()));
            assert_eq!(reloaded.get_raw("B"), Some("42".to_string()));
        }

        it "fails to load a malformed file without touching the store" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("settings.json");
            fs::write(&path, "[1, 2, 3]").expect("Failed to write");
            store.set_raw("kept", "yes").expect("Failed to set");

            assert!(store.load_file(&path).is_err());
            store.load_or_default(&path);
            assert_eq!(store.len(), 1);
        }

        it "shares values between clones" {
            let clone = store.clone();
            clone.set_raw("shared", "1").expect("Failed to set");

            assert_eq!(store.get_raw("shared"), Some("1".to_string()));
        }
    }
}
