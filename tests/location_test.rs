//! Tests for the location probe against a fake location service

use async_trait::async_trait;
use doorknock::error::{DoorknockError, Result};
use doorknock::location::{Coordinate, LocationProbe, LocationService, LocationStatus, PermissionStatus};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};

/// Geocodes latitude `n` to "`n` Grid St"; negative latitudes fail.
/// Queued replies, when present, are used first and wait for the test.
struct FakeLocationService {
    permission: Mutex<PermissionStatus>,
    updates: Mutex<Option<mpsc::Receiver<Coordinate>>>,
    gated: Mutex<VecDeque<oneshot::Receiver<Result<String>>>>,
    geocode_calls: AtomicUsize,
}

impl FakeLocationService {
    fn new(permission: PermissionStatus) -> Arc<Self> {
        Arc::new(Self {
            permission: Mutex::new(permission),
            updates: Mutex::new(None),
            gated: Mutex::new(VecDeque::new()),
            geocode_calls: AtomicUsize::new(0),
        })
    }

    fn feed(&self) -> mpsc::Sender<Coordinate> {
        let (tx, rx) = mpsc::channel(8);
        *self.updates.lock().unwrap() = Some(rx);
        tx
    }

    fn gate(&self) -> oneshot::Sender<Result<String>> {
        let (tx, rx) = oneshot::channel();
        self.gated.lock().unwrap().push_back(rx);
        tx
    }

    fn grant(&self) {
        *self.permission.lock().unwrap() = PermissionStatus::Granted;
    }

    async fn wait_for_geocodes(&self, count: usize) {
        while self.geocode_calls.load(Ordering::SeqCst) < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl LocationService for FakeLocationService {
    async fn request_permission(&self) -> PermissionStatus {
        *self.permission.lock().unwrap()
    }

    async fn start_updates(&self) -> Result<mpsc::Receiver<Coordinate>> {
        self.updates
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| DoorknockError::Other("updates already started".to_string()))
    }

    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<String> {
        let gated = self.gated.lock().unwrap().pop_front();
        self.geocode_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(rx) = gated {
            return rx
                .await
                .unwrap_or_else(|_| Err(DoorknockError::Geocoding("dropped".to_string())));
        }
        if coordinate.latitude < 0.0 {
            return Err(DoorknockError::Geocoding("no result".to_string()));
        }
        #[allow(clippy::cast_possible_truncation)]
        let number = coordinate.latitude as i64;
        Ok(format!(" {number} Grid St "))
    }
}

fn at(latitude: f64) -> Coordinate {
    Coordinate {
        latitude,
        longitude: -93.2,
    }
}

#[tokio::test]
async fn test_permission_denied_blocks_updates() {
    let service = FakeLocationService::new(PermissionStatus::Denied);
    let probe = LocationProbe::new(service.clone());
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    assert_eq!(probe.request_permission().await, PermissionStatus::Denied);
    assert_eq!(probe.status(), LocationStatus::PermissionDenied);

    let err = probe.run(shutdown_rx).await.unwrap_err();
    assert!(matches!(err, DoorknockError::LocationPermissionDenied));
    assert_eq!(probe.status(), LocationStatus::PermissionDenied);
}

#[tokio::test]
async fn test_denied_permission_blocks_resolve() {
    let service = FakeLocationService::new(PermissionStatus::Denied);
    let probe = LocationProbe::new(service.clone());
    probe.request_permission().await;

    let err = probe.resolve(at(12.0)).await.unwrap_err();

    assert!(matches!(err, DoorknockError::LocationPermissionDenied));
    assert_eq!(probe.status(), LocationStatus::PermissionDenied);
    assert!(probe.current_address().is_none());
    assert_eq!(service.geocode_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_granting_permission_clears_denied_status() {
    let service = FakeLocationService::new(PermissionStatus::Denied);
    let probe = LocationProbe::new(service.clone());
    probe.request_permission().await;

    service.grant();
    assert_eq!(probe.request_permission().await, PermissionStatus::Granted);
    assert_eq!(probe.status(), LocationStatus::Idle);
}

#[tokio::test]
async fn test_run_follows_updates_until_stream_ends() {
    let service = FakeLocationService::new(PermissionStatus::Granted);
    let tx = service.feed();
    let probe = LocationProbe::new(service.clone());
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    tx.send(at(12.0)).await.unwrap();
    tx.send(at(40.0)).await.unwrap();
    drop(tx);

    probe.run(shutdown_rx).await.unwrap();

    assert_eq!(probe.current_address().as_deref(), Some("40 Grid St"));
    assert_eq!(probe.current_coordinate(), Some(at(40.0)));
    assert_eq!(probe.status(), LocationStatus::Resolved);
}

#[tokio::test]
async fn test_geocode_failure_keeps_previous_address() {
    let service = FakeLocationService::new(PermissionStatus::Granted);
    let tx = service.feed();
    let probe = LocationProbe::new(service.clone());
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    tx.send(at(7.0)).await.unwrap();
    tx.send(at(-1.0)).await.unwrap();
    drop(tx);

    probe.run(shutdown_rx).await.unwrap();

    assert_eq!(probe.current_address().as_deref(), Some("7 Grid St"));
    assert!(matches!(probe.status(), LocationStatus::GeocodeFailed(ref msg) if msg.contains("no result")));
}

#[tokio::test]
async fn test_first_geocode_failure_leaves_address_unset() {
    let service = FakeLocationService::new(PermissionStatus::Granted);
    let probe = LocationProbe::new(service);

    let err = probe.resolve(at(-5.0)).await.unwrap_err();

    assert!(matches!(err, DoorknockError::Geocoding(_)));
    assert!(probe.current_address().is_none());
}

#[tokio::test]
async fn test_stale_geocode_response_is_discarded() {
    let service = FakeLocationService::new(PermissionStatus::Granted);
    let older_tx = service.gate();
    let newer_tx = service.gate();
    let probe = LocationProbe::new(service.clone());

    let (older, newer, ()) = tokio::join!(probe.resolve(at(1.0)), probe.resolve(at(2.0)), async {
        service.wait_for_geocodes(2).await;
        newer_tx.send(Ok("2 Newer Rd".to_string())).unwrap();
        tokio::task::yield_now().await;
        older_tx.send(Ok("1 Older Rd".to_string())).unwrap();
    });

    assert!(matches!(older, Err(DoorknockError::Superseded(_))));
    assert_eq!(newer.unwrap(), "2 Newer Rd");
    assert_eq!(probe.current_address().as_deref(), Some("2 Newer Rd"));
    assert_eq!(probe.current_coordinate(), Some(at(2.0)));
}

#[tokio::test]
async fn test_shutdown_stops_run() {
    let service = FakeLocationService::new(PermissionStatus::Granted);
    let tx = service.feed();
    let probe = LocationProbe::new(service.clone());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let ((), result) = tokio::join!(
        async {
            tx.send(at(3.0)).await.unwrap();
            service.wait_for_geocodes(1).await;
            shutdown_tx.send(true).unwrap();
        },
        probe.run(shutdown_rx)
    );

    result.unwrap();
    assert_eq!(probe.current_address().as_deref(), Some("3 Grid St"));
    // The loop ended on shutdown with the update stream still open
    drop(tx);
}

#[tokio::test]
async fn test_shutdown_interrupts_unanswered_geocode() {
    let service = FakeLocationService::new(PermissionStatus::Granted);
    let tx = service.feed();
    // Held open and never answered
    let _unanswered = service.gate();
    let probe = LocationProbe::new(service.clone());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let ((), result) = tokio::join!(
        async {
            tx.send(at(9.0)).await.unwrap();
            service.wait_for_geocodes(1).await;
            shutdown_tx.send(true).unwrap();
        },
        tokio::time::timeout(Duration::from_secs(2), probe.run(shutdown_rx))
    );

    result.expect("run should return after shutdown").unwrap();
    assert!(probe.current_address().is_none());
}
