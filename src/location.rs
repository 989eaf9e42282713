//! Location probe.
//!
//! Wraps the device location and reverse-geocoding service and keeps the
//! latest street address. Geocode requests carry a generation number so a
//! slow response cannot overwrite the answer to a newer coordinate.

use crate::error::{DoorknockError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// A position fix from the device, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Answer to the location permission prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionStatus {
    Granted,
    Denied,
    NotDetermined,
}

/// What the probe is currently showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationStatus {
    Idle,
    Locating,
    Resolved,
    /// Persists until permission is granted
    PermissionDenied,
    /// Cleared by the next successful geocode
    GeocodeFailed(String),
}

/// Device location and geocoding service
#[async_trait]
pub trait LocationService: Send + Sync {
    async fn request_permission(&self) -> PermissionStatus;
    /// Begin delivering coordinates; the stream ends when the sender is dropped
    async fn start_updates(&self) -> Result<mpsc::Receiver<Coordinate>>;
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<String>;
}

#[derive(Debug)]
struct ProbeState {
    address: Option<String>,
    coordinate: Option<Coordinate>,
    status: LocationStatus,
    permission: PermissionStatus,
    generation: u64,
}

/// Tracks the device position and the street address it geocodes to
pub struct LocationProbe {
    service: Arc<dyn LocationService>,
    state: Mutex<ProbeState>,
}

impl LocationProbe {
    /// Start idle, with permission not yet asked
    pub fn new(service: Arc<dyn LocationService>) -> Self {
        Self {
            service,
            state: Mutex::new(ProbeState {
                address: None,
                coordinate: None,
                status: LocationStatus::Idle,
                permission: PermissionStatus::NotDetermined,
                generation: 0,
            }),
        }
    }

    /// Latest resolved street address
    #[must_use]
    pub fn current_address(&self) -> Option<String> {
        self.lock().address.clone()
    }

    #[must_use]
    pub fn current_coordinate(&self) -> Option<Coordinate> {
        self.lock().coordinate
    }

    #[must_use]
    pub fn status(&self) -> LocationStatus {
        self.lock().status.clone()
    }

    pub async fn request_permission(&self) -> PermissionStatus {
        let permission = self.service.request_permission().await;
        let mut state = self.lock();
        state.permission = permission;
        match permission {
            PermissionStatus::Denied => {
                warn!("Location permission denied");
                state.status = LocationStatus::PermissionDenied;
            }
            PermissionStatus::Granted if state.status == LocationStatus::PermissionDenied => {
                state.status = LocationStatus::Idle;
            }
            _ => {}
        }
        permission
    }

    /// Reverse-geocode `coordinate` and store the address.
    ///
    /// Returns `Superseded` if another resolve started while this one was
    /// waiting on the service. Nothing is geocoded while permission is denied.
    pub async fn resolve(&self, coordinate: Coordinate) -> Result<String> {
        let generation = {
            let mut state = self.lock();
            if state.permission == PermissionStatus::Denied {
                debug!("Skipping geocode, location permission denied");
                return Err(DoorknockError::LocationPermissionDenied);
            }
            state.generation += 1;
            state.status = LocationStatus::Locating;
            state.generation
        };

        let result = self.service.reverse_geocode(coordinate).await;

        let mut state = self.lock();
        if state.generation != generation {
            debug!(generation, "Dropping superseded geocode response");
            return Err(DoorknockError::Superseded("reverse_geocode"));
        }

        match result {
            Ok(address) => {
                let address = address.trim().to_string();
                debug!(address = %address, "Resolved address");
                state.address = Some(address.clone());
                state.coordinate = Some(coordinate);
                state.status = LocationStatus::Resolved;
                Ok(address)
            }
            Err(e) => {
                let message = e.to_string();
                warn!(error = %message, "Reverse geocoding failed");
                state.status = LocationStatus::GeocodeFailed(message.clone());
                Err(match e {
                    DoorknockError::Geocoding(_) => e,
                    _ => DoorknockError::Geocoding(message),
                })
            }
        }
    }

    /// Follow location updates until the stream ends or `shutdown` fires.
    ///
    /// Geocoding failures are recorded in the status and do not stop the loop.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let permission = self.lock().permission;
        if permission != PermissionStatus::Granted && self.request_permission().await != PermissionStatus::Granted {
            return Err(DoorknockError::LocationPermissionDenied);
        }

        let mut updates = self.service.start_updates().await?;
        info!("Location updates started");

        loop {
            let coordinate = tokio::select! {
                () = shutdown_requested(&mut shutdown) => break,
                update = updates.recv() => match update {
                    Some(coordinate) => coordinate,
                    None => break,
                },
            };

            // Shutdown also interrupts a geocode still in flight
            tokio::select! {
                () = shutdown_requested(&mut shutdown) => break,
                resolved = self.resolve(coordinate) => match resolved {
                    Ok(_) | Err(DoorknockError::Superseded(_) | DoorknockError::Geocoding(_)) => {}
                    Err(e) => return Err(e),
                },
            }
        }

        info!("Location updates stopped");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, ProbeState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Resolves once `shutdown` reads true or its sender is gone
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
