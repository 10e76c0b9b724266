use std::sync::Arc;

use feature_shell::host::Messenger;
use parking_lot::Mutex;
use speculate2::speculate;

#[derive(Debug, Clone, PartialEq)]
struct Saved(u32);

#[derive(Debug, Clone, PartialEq)]
struct Closed;

speculate! {
    before {
        let messenger = Messenger::new();
        let received: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    }

    describe "send" {
        it "delivers to subscribers of the message type in subscription order" {
            let first = received.clone();
            let second = received.clone();
            let _a = messenger.subscribe(move |m: &Saved| first.lock().push(format!("a{}", m.0)));
            let _b = messenger.subscribe(move |m: &Saved| second.lock().push(format!("b{}", m.0)));

            assert_eq!(messenger.send(&Saved(1)), 2);
            assert_eq!(*received.lock(), vec!["a1", "b1"]);
        }

        it "does not deliver other message types" {
            let sink = received.clone();
            let _sub = messenger.subscribe(move |_: &Closed| sink.lock().push("closed".into()));

            assert_eq!(messenger.send(&Saved(1)), 0);
            assert!(received.lock().is_empty());
        }

        it "partitions delivery by channel" {
            let on_one = received.clone();
            let unchannelled = received.clone();
            let _one = messenger.subscribe_on(1, move |m: &Saved| on_one.lock().push(format!("1:{}", m.0)));
            let _any = messenger.subscribe(move |m: &Saved| unchannelled.lock().push(format!("-:{}", m.0)));

            assert_eq!(messenger.send_on(&Saved(5), 1), 1);
            assert_eq!(messenger.send_on(&Saved(6), 2), 0);
            assert_eq!(messenger.send(&Saved(7)), 1);
            assert_eq!(*received.lock(), vec!["1:5", "-:7"]);
        }
    }

    describe "subscriptions" {
        it "unsubscribes when the subscription is dropped" {
            let sink = received.clone();
            let sub = messenger.subscribe(move |_: &Closed| sink.lock().push("closed".into()));
            assert_eq!(messenger.subscriber_count::<Closed>(None), 1);

            drop(sub);

            assert_eq!(messenger.subscriber_count::<Closed>(None), 0);
            assert_eq!(messenger.send(&Closed), 0);
            assert!(received.lock().is_empty());
        }

        it "unsubscribes explicitly" {
            let sub = messenger.subscribe(|_: &Closed| {});
            sub.unsubscribe();

            assert_eq!(messenger.subscriber_count::<Closed>(None), 0);
        }

        it "lets a handler subscribe while a message is being delivered" {
            let inner = messenger.clone();
            let nested = Arc::new(Mutex::new(Vec::new()));
            let store = nested.clone();
            let _sub = messenger.subscribe(move |_: &Saved| {
                store.lock().push(inner.subscribe(|_: &Closed| {}));
            });

            messenger.send(&Saved(1));

            assert_eq!(messenger.subscriber_count::<Closed>(None), 1);
            assert_eq!(nested.lock().len(), 1);
        }

        it "survives the messenger being dropped first" {
            let sub = {
                let short_lived = Messenger::new();
                short_lived.subscribe(|_: &Saved| {})
            };

            drop(sub);
        }
    }
}
