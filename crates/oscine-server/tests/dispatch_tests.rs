//! Dispatcher tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use oscine_core::{Bundle, Message, Packet, Timetag};
use oscine_server::{Dispatcher, ServerError};
use tokio::sync::watch;

fn counted(counter: Arc<AtomicUsize>) -> impl Fn(&Message) -> oscine_server::HandlerResult {
    move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_register_rejects_metacharacters() {
    let mut d = Dispatcher::new();
    for bad in [
        "/a*", "/a?", "/a,b", "/a[0]", "/a]", "/a{x}", "/a}", "/a#b", "/a b", "no/slash",
    ] {
        let result = d.register(bad, |_| Ok(()));
        assert!(
            matches!(result, Err(ServerError::Core(oscine_core::Error::InvalidAddress(_)))),
            "{bad:?} should be rejected"
        );
    }
    assert!(d.is_empty());
}

#[test]
fn test_register_rejects_duplicates() {
    let mut d = Dispatcher::new();
    d.register("/once", |_| Ok(())).unwrap();
    match d.register("/once", |_| Ok(())) {
        Err(ServerError::DuplicateAddress(addr)) => assert_eq!(addr, "/once"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(d.len(), 1);
}

#[test]
fn test_invoke_exact_and_pattern_addresses() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut d = Dispatcher::new();
    d.register("/mixer/ch/1/gain", counted(hits.clone())).unwrap();

    d.invoke(&Message::new("/mixer/ch/1/gain")).unwrap();
    d.invoke(&Message::new("/mixer/ch/?/gain")).unwrap();
    d.invoke(&Message::new("/mixer/*/1/gain")).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[test]
fn test_invoke_unmatched_is_silently_dropped() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut d = Dispatcher::new();
    d.register("/known", counted(hits.clone())).unwrap();

    d.invoke(&Message::new("/unknown")).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn test_first_registered_match_wins() {
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let mut d = Dispatcher::new();
    d.register("/out/a", counted(first.clone())).unwrap();
    d.register("/out/b", counted(second.clone())).unwrap();

    // The pattern matches both registered addresses.
    d.invoke(&Message::new("/out/?")).unwrap();
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 0);
}

#[test]
fn test_handler_error_names_address() {
    let mut d = Dispatcher::new();
    d.register("/fails", |_| Err("boom".into())).unwrap();

    match d.invoke(&Message::new("/fails")) {
        Err(ServerError::Handler { address, .. }) => assert_eq!(address, "/fails"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_past_timetag_dispatches_without_delay() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut d = Dispatcher::new();
    d.register("/x", counted(hits.clone())).unwrap();

    let bundle = Bundle::at(SystemTime::now() - Duration::from_secs(1))
        .with(Message::new("/x"))
        .with(Message::new("/x"));

    let started = Instant::now();
    d.dispatch_packet(&Packet::Bundle(bundle)).await.unwrap();
    assert!(started.elapsed() < Duration::from_millis(50));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_future_timetag_delays_dispatch() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut d = Dispatcher::new();
    d.register("/x", counted(hits.clone())).unwrap();

    let bundle = Bundle::at(SystemTime::now() + Duration::from_millis(100))
        .with(Message::new("/x"));

    let started = Instant::now();
    d.dispatch_packet(&Packet::Bundle(bundle)).await.unwrap();
    assert!(
        started.elapsed() >= Duration::from_millis(80),
        "dispatched after {:?}",
        started.elapsed()
    );
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_nested_bundle_timetags_are_honored_independently() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut d = Dispatcher::new();
    d.register("/x", counted(hits.clone())).unwrap();

    let nested = Bundle::at(SystemTime::now() + Duration::from_millis(80))
        .with(Message::new("/x"));
    let outer = Bundle::immediate().with(nested);

    let started = Instant::now();
    d.dispatch_packet(&Packet::Bundle(outer)).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(60));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_early_nested_timetag_is_an_error() {
    let mut d = Dispatcher::new();
    d.register("/x", |_| Ok(())).unwrap();

    // The nested tag (immediate, value 1) precedes the parent's.
    let outer = Bundle::new(Timetag::from_time(SystemTime::now() - Duration::from_secs(1)))
        .with(Bundle::immediate().with(Message::new("/x")));

    match d.dispatch_packet(&Packet::Bundle(outer)).await {
        Err(ServerError::Core(oscine_core::Error::EarlyTimetag)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_bundle_packets_invoked_in_encoded_order() {
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));
    let mut d = Dispatcher::new();
    for name in ["/a", "/b", "/c"] {
        let order = order.clone();
        d.register(name, move |msg: &Message| {
            order.lock().unwrap().push(msg.address.clone());
            Ok(())
        })
        .unwrap();
    }

    let bundle = Bundle::immediate()
        .with(Message::new("/c"))
        .with(Message::new("/a"))
        .with(Message::new("/b"));
    d.dispatch_packet(&Packet::Bundle(bundle)).await.unwrap();

    assert_eq!(*order.lock().unwrap(), vec!["/c", "/a", "/b"]);
}

#[tokio::test]
async fn test_handler_errors_aggregate_across_bundle() {
    let mut d = Dispatcher::new();
    d.register("/bad/one", |_| Err("first".into())).unwrap();
    d.register("/bad/two", |_| Err("second".into())).unwrap();
    let survived = Arc::new(AtomicUsize::new(0));
    d.register("/good", counted(survived.clone())).unwrap();

    let bundle = Bundle::immediate()
        .with(Message::new("/bad/one"))
        .with(Message::new("/good"))
        .with(Message::new("/bad/two"));

    match d.dispatch_packet(&Packet::Bundle(bundle)).await {
        Err(ServerError::Aggregate(errors)) => assert_eq!(errors.len(), 2),
        other => panic!("unexpected result: {other:?}"),
    }
    // Later packets still ran despite the earlier failure.
    assert_eq!(survived.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_shutdown_interrupts_timetag_delay() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut d = Dispatcher::new();
    d.register("/x", counted(hits.clone())).unwrap();

    let bundle = Packet::Bundle(
        Bundle::at(SystemTime::now() + Duration::from_secs(30)).with(Message::new("/x")),
    );

    let (tx, mut rx) = watch::channel(false);
    let started = Instant::now();
    let dispatch = d.dispatch(&bundle, &mut rx);
    tokio::pin!(dispatch);

    tokio::select! {
        _ = &mut dispatch => panic!("dispatch finished before shutdown"),
        _ = tokio::time::sleep(Duration::from_millis(50)) => {}
    }
    tx.send(true).unwrap();

    match dispatch.await {
        Err(ServerError::ShuttingDown) => {}
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}
