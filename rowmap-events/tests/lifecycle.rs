use rowmap_events::{EventKind, LifecycleEvent, ListenerRegistry};
use rowmap_core::{Document, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct User {
    name: String,
}

struct Order;

fn record(log: &Arc<Mutex<Vec<String>>>, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

#[test]
fn test_dispatch_in_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let l1 = log.clone();
    let l2 = log.clone();
    let registry = ListenerRegistry::builder()
        .on_before_save::<User>(move |user, _doc| {
            record(&l1, format!("first:{}", user.name));
            Ok(())
        })
        .on_before_save::<User>(move |user, _doc| {
            record(&l2, format!("second:{}", user.name));
            Ok(())
        })
        .build();

    let user = User {
        name: "alice".to_string(),
    };
    let doc = Document::new();
    registry
        .publish(&LifecycleEvent::before_save(&user, &doc))
        .unwrap();
    assert_eq!(
        *log.lock().unwrap(),
        vec!["first:alice".to_string(), "second:alice".to_string()]
    );
}

#[test]
fn test_no_cross_type_dispatch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    let registry = ListenerRegistry::builder()
        .on_before_convert::<User>(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .build();

    registry
        .publish(&LifecycleEvent::before_convert(&Order))
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let user = User {
        name: "bob".to_string(),
    };
    registry
        .publish(&LifecycleEvent::before_convert(&user))
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_no_cross_kind_dispatch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    let registry = ListenerRegistry::builder()
        .on_after_save::<User>(move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .build();

    let user = User {
        name: "bob".to_string(),
    };
    let doc = Document::new();
    registry
        .publish(&LifecycleEvent::before_save(&user, &doc))
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_listener_error_aborts_remaining() {
    let calls = Arc::new(AtomicUsize::new(0));
    let first = calls.clone();
    let third = calls.clone();
    let registry = ListenerRegistry::builder()
        .on_before_convert::<User>(move |_| {
            first.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .on_before_convert::<User>(|_| Err("listener rejected the entity".into()))
        .on_before_convert::<User>(move |_| {
            third.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .build();

    let user = User {
        name: "carol".to_string(),
    };
    let err = registry
        .publish(&LifecycleEvent::before_convert(&user))
        .unwrap_err();
    assert_eq!(err.to_string(), "listener rejected the entity");
    // First listener ran, third never did.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_after_load_matches_declared_target_type() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    let registry = ListenerRegistry::builder()
        .on_after_load::<User>(move |doc| {
            record(&s, doc.get("name").and_then(Value::as_str).unwrap_or("?"));
            Ok(())
        })
        .build();

    let mut doc = Document::new();
    doc.insert("name", "dave");
    registry
        .publish(&LifecycleEvent::after_load::<User>(&doc))
        .unwrap();
    registry
        .publish(&LifecycleEvent::after_load::<Order>(&doc))
        .unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["dave".to_string()]);
}

#[test]
fn test_delete_events_carry_id() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let before = seen.clone();
    let after = seen.clone();
    let registry = ListenerRegistry::builder()
        .on_before_delete::<User>(move |id| {
            record(&before, format!("before:{id}"));
            Ok(())
        })
        .on_after_delete::<User>(move |id| {
            record(&after, format!("after:{id}"));
            Ok(())
        })
        .build();

    let id = Value::from("u-1");
    registry
        .publish(&LifecycleEvent::before_delete::<User>(&id))
        .unwrap();
    registry
        .publish(&LifecycleEvent::after_delete::<User>(&id))
        .unwrap();
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["before:u-1".to_string(), "after:u-1".to_string()]
    );
}

#[test]
fn test_empty_registry_is_noop() {
    let registry = ListenerRegistry::empty();
    assert!(registry.is_empty());
    let user = User {
        name: "x".to_string(),
    };
    registry
        .publish(&LifecycleEvent::before_convert(&user))
        .unwrap();
}

#[test]
fn test_raw_registration_sees_event_metadata() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    let registry = ListenerRegistry::builder()
        .on::<User>(EventKind::BeforeConvert, move |event| {
            record(&s, event.kind().as_str());
            Ok(())
        })
        .build();
    assert_eq!(registry.len(), 1);

    let user = User {
        name: "y".to_string(),
    };
    registry
        .publish(&LifecycleEvent::before_convert(&user))
        .unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["before-convert".to_string()]);
}
