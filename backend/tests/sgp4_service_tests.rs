//! SGP4-backed propagation service against real element sets.

mod support;

use chrono::Duration;
use orbitrack::config::{AnalysisSettings, EngineConfig};
use orbitrack::engine::{AnalysisRequest, Engine, EngineState, EventSink, WorkerRole};
use orbitrack::models::{Observer, TimeFields};
use orbitrack::propagation::{PropagationService, ServiceError, ServiceObserver, Sgp4Service};
use orbitrack::runtime::{EngineHandle, ServiceLoader};
use support::{catalog_text, iss_2008_epoch, renumbered_iss, ISS_2008_LINE1, ISS_2008_LINE2};

fn iss_catalog() -> String {
    catalog_text(&[("ISS (ZARYA)", ISS_2008_LINE1, ISS_2008_LINE2)])
}

fn loaded_service() -> Sgp4Service {
    let mut service = Sgp4Service::default();
    assert_eq!(service.load(&iss_catalog()).unwrap(), 1);
    service
}

fn at_epoch() -> TimeFields {
    TimeFields::from_datetime(&iss_2008_epoch())
}

#[test]
fn test_tick_at_epoch_without_observer() {
    let mut service = loaded_service();
    let output = service.tick(&at_epoch()).unwrap();

    assert_eq!(output.objects.len(), 1);
    let sample = &output.objects[0];
    assert_eq!(sample.satnum, "25544");
    assert!(sample.is_valid());
    assert!(sample.latitude.abs() <= 52.0, "latitude {}", sample.latitude);
    assert!((-180.0..=180.0).contains(&sample.longitude));
    // roughly 350 km, in Earth radii
    assert!(sample.height > 0.045 && sample.height < 0.065, "height {}", sample.height);
    assert!(!sample.overfly && !sample.sunlit && !sample.visible);

    // Close to the September equinox the subsolar point sits near the equator.
    assert!(output.sun_latitude.abs() < 2.0, "sun latitude {}", output.sun_latitude);
}

#[test]
fn test_observer_under_the_satellite_sees_an_overfly() {
    let mut service = loaded_service();
    let time = at_epoch();
    let sample = service.tick(&time).unwrap().objects.remove(0);

    let observer = ServiceObserver {
        longitude: sample.longitude,
        latitude: sample.latitude,
        height: 0.0,
        min_elevation: 20.0,
    };
    assert!(service.set_observer(&observer));

    let sample = service.tick(&time).unwrap().objects.remove(0);
    assert!(sample.overfly);
    assert!(sample.status().code() >= 1001);
}

#[test]
fn test_objects_keep_catalog_order() {
    let (l1, l2) = renumbered_iss(25545);
    let text = catalog_text(&[
        ("ISS (ZARYA)", ISS_2008_LINE1, ISS_2008_LINE2),
        ("ISS TWIN", l1.as_str(), l2.as_str()),
    ]);
    let mut service = Sgp4Service::default();
    assert_eq!(service.load(&text).unwrap(), 2);

    let output = service.tick(&at_epoch()).unwrap();
    let satnums: Vec<&str> = output.objects.iter().map(|s| s.satnum.as_str()).collect();
    assert_eq!(satnums, vec!["25544", "25545"]);
}

#[test]
fn test_bad_catalogs_are_rejected() {
    let mut service = Sgp4Service::default();

    assert_eq!(service.load(""), Err(ServiceError::EmptyCatalog));
    assert!(matches!(
        service.load(&format!("ISS\n{}\n", ISS_2008_LINE1)),
        Err(ServiceError::MalformedCatalog(_))
    ));
    assert!(matches!(
        service.load("1 not an element line\n2 neither is this\n"),
        Err(ServiceError::MalformedCatalog(_))
    ));
    assert_eq!(service.object_count(), 0);
}

#[test]
fn test_observer_validation_and_recording_rules() {
    let mut service = loaded_service();
    assert!(!service.start_recording());

    let bad = ServiceObserver {
        longitude: 0.0,
        latitude: 95.0,
        height: 0.0,
        min_elevation: 20.0,
    };
    assert!(!service.set_observer(&bad));
    assert!(service.observer().is_none());

    let good = ServiceObserver { latitude: 45.0, ..bad };
    assert!(service.set_observer(&good));
    assert!(service.start_recording());
    assert!(!service.start_recording());
    service.stop_recording();
    assert!(!service.is_recording());

    // Reloading the catalog forgets the observer.
    service.load(&iss_catalog()).unwrap();
    assert!(service.observer().is_none());
}

#[test]
fn test_analysis_records_one_transit_overhead() {
    let mut scout = loaded_service();
    let sample = scout.tick(&at_epoch()).unwrap().objects.remove(0);
    let observer = Observer::new("Under ISS", sample.latitude, sample.longitude, 0.0, 20.0);

    let mut engine = Engine::with_service(
        WorkerRole::Analysis,
        EventSink::disabled(),
        AnalysisSettings::default(),
        Sgp4Service::default(),
    );
    engine.initialize_catalog(&iss_catalog()).unwrap();

    let epoch = iss_2008_epoch();
    let request = AnalysisRequest::new(
        observer,
        epoch - Duration::seconds(60),
        epoch + Duration::seconds(60),
    )
    .with_step_ms(10_000);
    let result = engine.run_analysis(&request).unwrap();

    assert_eq!(result.histogram.len(), 13);
    assert!(result.histogram.iter().all(|b| b.overfly_count == 1));

    assert_eq!(result.count, 1);
    let row = &result.rows[0];
    assert_eq!(row.id, "25544:0");
    assert_eq!(row.transit_count, 1);
    assert_eq!(row.detailed.len(), 13);
    assert!(row.max_elevation > 80.0, "max elevation {}", row.max_elevation);
    assert!((0.0..=1.0).contains(&row.sunlit_ratio));
    assert!(row.starting_event <= row.ending_event);
    assert_eq!(engine.state(), EngineState::Initiated);
}

#[tokio::test]
async fn test_handle_ticks_real_catalog() {
    let mut config = EngineConfig::default();
    config.catalog.name_prefixes = vec!["ISS".to_string()];
    let handle = EngineHandle::spawn(&config, |_| {
        ServiceLoader::blocking(|| Ok(Sgp4Service::default()))
    });
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while handle.state().realtime != EngineState::Loaded
            || handle.state().analysis != EngineState::Loaded
        {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    let (l1, l2) = renumbered_iss(25545);
    let text = catalog_text(&[
        ("ISS (ZARYA)", ISS_2008_LINE1, ISS_2008_LINE2),
        ("STARLINK-1007", l1.as_str(), l2.as_str()),
    ]);
    assert_eq!(handle.initialize_catalog(&text).await.unwrap(), 1);

    let buffer = handle.tick(iss_2008_epoch()).await.unwrap();
    assert_eq!(buffer.len(), 12);
    assert_eq!(buffer.header()[0], 2008.0);
    // September is month 8 on the wire
    assert_eq!(buffer.header()[1], 8.0);
    let object = buffer.objects().next().unwrap();
    assert_eq!(object.status, 0.0);
}
