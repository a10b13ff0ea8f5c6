//! End-to-end lifecycle tests against a fake transport client

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use gnss_api::{
    AidingData, AssistDataRequest, ControlRequest, DataConnOpenStatus, EventMask, EventSink,
    LocationClient, LockMode, NmeaReport, PositionMode, PositionReport, RawEvent, Result,
    SatelliteReport, ServerRequest, SessionHandle, SessionStatus, StatusReport, SvInfo,
    ENGINE_STATE_OFF, ENGINE_STATE_ON, SV_SYSTEM_GPS,
};
use gnss_engine::{
    AgpsCallbacks, AgpsSessionStatus, AgpsType, EngineConfig, EngineError, EngineStatus,
    GnssCallbacks, LocEngine, Location, SatelliteStatus,
};

const WAIT: Duration = Duration::from_secs(2);

/// Transport double: records every control request and hands out the sink
/// so tests can deliver events like the real transport would
#[derive(Default)]
struct FakeClient {
    requests: Mutex<Vec<ControlRequest>>,
    sink: Mutex<Option<Arc<dyn EventSink>>>,
    sessions_opened: Mutex<u64>,
    sessions_closed: Mutex<Vec<SessionHandle>>,
}

impl FakeClient {
    fn requests(&self) -> Vec<ControlRequest> {
        self.requests.lock().clone()
    }

    fn deliver(&self, event: RawEvent) {
        let sink = self.sink.lock().clone().expect("no session open");
        sink.deliver(event);
    }
}

impl LocationClient for FakeClient {
    fn open_session(&self, _events: EventMask, sink: Arc<dyn EventSink>) -> Result<SessionHandle> {
        *self.sink.lock() = Some(sink);
        let mut opened = self.sessions_opened.lock();
        *opened += 1;
        Ok(SessionHandle(*opened))
    }

    fn close_session(&self, handle: SessionHandle) -> Result<()> {
        self.sessions_closed.lock().push(handle);
        Ok(())
    }

    fn start_fix(&self, _handle: SessionHandle) -> Result<()> {
        Ok(())
    }

    fn stop_fix(&self, _handle: SessionHandle) -> Result<()> {
        Ok(())
    }

    fn control(
        &self,
        _handle: SessionHandle,
        request: ControlRequest,
        _timeout: Duration,
    ) -> Result<()> {
        self.requests.lock().push(request);
        Ok(())
    }
}

#[derive(Debug)]
enum Call {
    Location(Location),
    SvStatus(SatelliteStatus),
    EngineStatus(EngineStatus),
    Nmea(String),
}

struct Recorder {
    calls: mpsc::Sender<Call>,
}

impl Recorder {
    fn channel() -> (Arc<Recorder>, mpsc::Receiver<Call>) {
        let (calls, receiver) = mpsc::channel();
        (Arc::new(Recorder { calls }), receiver)
    }
}

impl GnssCallbacks for Recorder {
    fn on_location(&self, location: &Location) {
        let _ = self.calls.send(Call::Location(location.clone()));
    }

    fn on_sv_status(&self, status: &SatelliteStatus) {
        let _ = self.calls.send(Call::SvStatus(status.clone()));
    }

    fn on_engine_status(&self, status: EngineStatus) {
        let _ = self.calls.send(Call::EngineStatus(status));
    }

    fn on_nmea(&self, _timestamp_ms: i64, sentence: &str) {
        let _ = self.calls.send(Call::Nmea(sentence.to_string()));
    }
}

struct AgpsRecorder {
    calls: mpsc::Sender<(AgpsSessionStatus, AgpsType)>,
}

impl AgpsRecorder {
    fn channel() -> (Arc<AgpsRecorder>, mpsc::Receiver<(AgpsSessionStatus, AgpsType)>) {
        let (calls, receiver) = mpsc::channel();
        (Arc::new(AgpsRecorder { calls }), receiver)
    }
}

impl AgpsCallbacks for AgpsRecorder {
    fn on_status(&self, status: AgpsSessionStatus, kind: AgpsType) {
        let _ = self.calls.send((status, kind));
    }
}

fn test_config() -> EngineConfig {
    EngineConfig {
        agps_handshake_delay: Duration::ZERO,
        ..EngineConfig::default()
    }
}

fn wait_for_status(engine: &LocEngine, wanted: EngineStatus) {
    let deadline = Instant::now() + WAIT;
    while engine.status() != wanted {
        assert!(Instant::now() < deadline, "timed out waiting for {wanted:?}");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn init_opens_session_and_releases_engine_lock() {
    let client = Arc::new(FakeClient::default());
    let mut engine = LocEngine::with_config(client.clone(), test_config());
    let (recorder, _calls) = Recorder::channel();

    engine.init(recorder).unwrap();
    assert_eq!(engine.status(), EngineStatus::EngineOn);
    assert_eq!(
        client.requests(),
        vec![ControlRequest::SetEngineLock(LockMode::None)]
    );

    engine.cleanup();
    assert_eq!(engine.status(), EngineStatus::EngineOff);
    assert_eq!(*client.sessions_closed.lock(), vec![SessionHandle(1)]);
}

#[test]
fn second_init_without_cleanup_is_rejected() {
    let client = Arc::new(FakeClient::default());
    let mut engine = LocEngine::with_config(client, test_config());

    let (recorder, _calls) = Recorder::channel();
    engine.init(recorder).unwrap();

    let (recorder, _calls) = Recorder::channel();
    assert!(matches!(
        engine.init(recorder),
        Err(EngineError::AlreadyActive)
    ));

    engine.cleanup();
}

#[test]
fn engine_can_be_reinitialized_after_cleanup() {
    let client = Arc::new(FakeClient::default());
    let mut engine = LocEngine::with_config(client.clone(), test_config());

    let (recorder, _calls) = Recorder::channel();
    engine.init(recorder).unwrap();
    engine.cleanup();

    let (recorder, calls) = Recorder::channel();
    engine.init(recorder).unwrap();
    assert_eq!(*client.sessions_opened.lock(), 2);

    client.deliver(RawEvent::Nmea(NmeaReport {
        sentence: "$GPRMC".to_string(),
    }));
    match calls.recv_timeout(WAIT).unwrap() {
        Call::Nmea(sentence) => assert_eq!(sentence, "$GPRMC"),
        other => panic!("unexpected call {other:?}"),
    }

    engine.cleanup();
}

#[test]
fn events_are_processed_in_delivery_order() {
    let client = Arc::new(FakeClient::default());
    let mut engine = LocEngine::with_config(client.clone(), test_config());
    let (recorder, calls) = Recorder::channel();
    engine.init(recorder).unwrap();

    for i in 0..20 {
        client.deliver(RawEvent::Nmea(NmeaReport {
            sentence: format!("$GP{i:02}"),
        }));
    }

    for i in 0..20 {
        match calls.recv_timeout(WAIT).unwrap() {
            Call::Nmea(sentence) => assert_eq!(sentence, format!("$GP{i:02}")),
            other => panic!("unexpected call {other:?}"),
        }
    }

    engine.cleanup();
}

/// Callbacks that block inside the first invocation until released, so the
/// queue backs up behind it
struct BlockingCallbacks {
    entered: mpsc::Sender<()>,
    release: Mutex<Option<mpsc::Receiver<()>>>,
    after: mpsc::Sender<String>,
}

impl GnssCallbacks for BlockingCallbacks {
    fn on_nmea(&self, _timestamp_ms: i64, sentence: &str) {
        if let Some(release) = self.release.lock().take() {
            let _ = self.entered.send(());
            let _ = release.recv_timeout(WAIT);
        }
        let _ = self.after.send(sentence.to_string());
    }
}

#[test]
fn cleanup_discards_events_still_in_the_queue() {
    let client = Arc::new(FakeClient::default());
    let mut engine = LocEngine::with_config(client.clone(), test_config());

    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let (after_tx, after_rx) = mpsc::channel();
    engine
        .init(Arc::new(BlockingCallbacks {
            entered: entered_tx,
            release: Mutex::new(Some(release_rx)),
            after: after_tx,
        }))
        .unwrap();

    client.deliver(RawEvent::Nmea(NmeaReport {
        sentence: "$FIRST".to_string(),
    }));
    entered_rx.recv_timeout(WAIT).unwrap();

    // worker is stuck in the first callback; these pile up behind it
    for i in 0..5 {
        client.deliver(RawEvent::Nmea(NmeaReport {
            sentence: format!("$LATE{i}"),
        }));
    }

    let releaser = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        let _ = release_tx.send(());
    });
    engine.cleanup();
    releaser.join().unwrap();

    // only the in-flight event completed; the queued ones were dropped
    assert_eq!(after_rx.recv_timeout(WAIT).unwrap(), "$FIRST");
    assert!(after_rx.try_recv().is_err());
}

#[test]
fn aiding_deletion_is_deferred_while_session_runs() {
    let client = Arc::new(FakeClient::default());
    let mut engine = LocEngine::with_config(client.clone(), test_config());
    let (recorder, _calls) = Recorder::channel();
    engine.init(recorder).unwrap();

    client.deliver(RawEvent::Status(StatusReport {
        engine_state: ENGINE_STATE_ON,
    }));
    wait_for_status(&engine, EngineStatus::SessionBegin);

    engine.delete_aiding_data(AidingData::EPHEMERIS).unwrap();
    engine.delete_aiding_data(AidingData::ALMANAC).unwrap();
    let deletions = |requests: &[ControlRequest]| {
        requests
            .iter()
            .filter(|r| matches!(r, ControlRequest::DeleteAssistData(_)))
            .count()
    };
    assert_eq!(deletions(&client.requests()), 0);

    client.deliver(RawEvent::Status(StatusReport {
        engine_state: ENGINE_STATE_OFF,
    }));
    wait_for_status(&engine, EngineStatus::EngineOff);

    engine.stop().unwrap();
    let requests = client.requests();
    assert_eq!(deletions(&requests), 1);
    assert!(requests.contains(&ControlRequest::DeleteAssistData(
        AidingData::EPHEMERIS | AidingData::ALMANAC
    )));

    // the accumulated mask was consumed; a second stop issues nothing
    engine.stop().unwrap();
    assert_eq!(deletions(&client.requests()), 1);

    engine.cleanup();
}

#[test]
fn immediate_deletion_outside_a_session() {
    let client = Arc::new(FakeClient::default());
    let mut engine = LocEngine::with_config(client.clone(), test_config());
    let (recorder, _calls) = Recorder::channel();
    engine.init(recorder).unwrap();

    engine.delete_aiding_data(AidingData::ALL).unwrap();
    assert!(client
        .requests()
        .contains(&ControlRequest::DeleteAssistData(AidingData::ALL)));

    engine.cleanup();
}

#[test]
fn connection_request_fires_one_agps_status_change() {
    let client = Arc::new(FakeClient::default());
    let mut engine = LocEngine::with_config(client.clone(), test_config());
    let (recorder, _calls) = Recorder::channel();
    engine.init(recorder).unwrap();

    let (agps, statuses) = AgpsRecorder::channel();
    engine.agps_init(agps);

    client.deliver(RawEvent::ServerRequest(ServerRequest::Open {
        conn_handle: 42,
    }));
    assert_eq!(
        statuses.recv_timeout(WAIT).unwrap(),
        (AgpsSessionStatus::Requested, AgpsType::Supl)
    );

    // an unrelated event must not re-report the unchanged status
    client.deliver(RawEvent::Nmea(NmeaReport {
        sentence: "$GPGGA".to_string(),
    }));
    assert!(statuses.recv_timeout(Duration::from_millis(200)).is_err());

    engine.cleanup();
}

#[test]
fn data_conn_open_informs_engine_with_apn_and_handle() {
    let client = Arc::new(FakeClient::default());
    let mut engine = LocEngine::with_config(client.clone(), test_config());
    let (recorder, _calls) = Recorder::channel();
    engine.init(recorder).unwrap();

    let (agps, statuses) = AgpsRecorder::channel();
    engine.agps_init(agps);

    client.deliver(RawEvent::ServerRequest(ServerRequest::Open {
        conn_handle: 42,
    }));
    statuses.recv_timeout(WAIT).unwrap();

    engine.agps_data_conn_open("internet").unwrap();
    assert!(client
        .requests()
        .contains(&ControlRequest::InformServerOpen {
            conn_handle: 42,
            status: DataConnOpenStatus::Success {
                apn: Some("internet".to_string()),
            },
        }));

    client.deliver(RawEvent::ServerRequest(ServerRequest::Close {
        conn_handle: 42,
    }));
    assert_eq!(
        statuses.recv_timeout(WAIT).unwrap(),
        (AgpsSessionStatus::Released, AgpsType::Supl)
    );

    engine.agps_data_conn_closed().unwrap();
    assert!(client
        .requests()
        .contains(&ControlRequest::InformServerClose { conn_handle: 42 }));

    engine.cleanup();
}

#[test]
fn assisted_start_pushes_resolved_server_address() {
    let client = Arc::new(FakeClient::default());
    let mut engine = LocEngine::with_config(client.clone(), test_config());
    let (recorder, _calls) = Recorder::channel();
    engine.init(recorder).unwrap();

    engine
        .agps_set_server(AgpsType::Supl, "127.0.0.1", 7275)
        .unwrap();
    engine.set_position_mode(PositionMode::MsBased, 1).unwrap();
    engine.start().unwrap();

    let requests = client.requests();
    let pushed: Vec<&ControlRequest> = requests
        .iter()
        .filter(|r| matches!(r, ControlRequest::SetServerAddress { .. }))
        .collect();
    assert_eq!(
        pushed,
        vec![&ControlRequest::SetServerAddress {
            url: "127.0.0.1:7275".to_string(),
        }]
    );

    engine.cleanup();
}

#[test]
fn standalone_start_skips_server_configuration() {
    let client = Arc::new(FakeClient::default());
    let mut engine = LocEngine::with_config(client.clone(), test_config());
    let (recorder, _calls) = Recorder::channel();
    engine.init(recorder).unwrap();

    engine
        .agps_set_server(AgpsType::Supl, "127.0.0.1", 7275)
        .unwrap();
    engine.start().unwrap();

    assert!(!client
        .requests()
        .iter()
        .any(|r| matches!(r, ControlRequest::SetServerAddress { .. })));

    engine.cleanup();
}

#[test]
fn c2k_server_is_rejected() {
    let client = Arc::new(FakeClient::default());
    let engine = LocEngine::with_config(client, test_config());
    assert!(matches!(
        engine.agps_set_server(AgpsType::C2k, "example.com", 4911),
        Err(EngineError::Unsupported(_))
    ));
}

#[test]
fn position_report_reaches_callback_with_derived_speed() {
    let client = Arc::new(FakeClient::default());
    let mut engine = LocEngine::with_config(client.clone(), test_config());
    let (recorder, calls) = Recorder::channel();
    engine.init(recorder).unwrap();

    client.deliver(RawEvent::Position(PositionReport {
        session_status: Some(SessionStatus::Success),
        latitude: Some(37.422),
        longitude: Some(-122.084),
        speed_horizontal: Some(6.0),
        speed_vertical: Some(8.0),
        ..PositionReport::default()
    }));

    match calls.recv_timeout(WAIT).unwrap() {
        Call::Location(location) => {
            assert_eq!(location.latitude, Some(37.422));
            assert_eq!(location.longitude, Some(-122.084));
            assert_eq!(location.speed, Some(10.0));
        }
        other => panic!("unexpected call {other:?}"),
    }

    engine.cleanup();
}

#[test]
fn worker_survives_an_untranslatable_event() {
    let client = Arc::new(FakeClient::default());
    let mut engine = LocEngine::with_config(client.clone(), test_config());
    let (recorder, calls) = Recorder::channel();
    engine.init(recorder).unwrap();

    client.deliver(RawEvent::AssistDataRequest(AssistDataRequest { kind: 99 }));
    client.deliver(RawEvent::Nmea(NmeaReport {
        sentence: "$GPVTG".to_string(),
    }));

    match calls.recv_timeout(WAIT).unwrap() {
        Call::Nmea(sentence) => assert_eq!(sentence, "$GPVTG"),
        other => panic!("unexpected call {other:?}"),
    }

    engine.cleanup();
}

#[test]
fn satellites_after_a_fresh_fix_count_as_used() {
    let client = Arc::new(FakeClient::default());
    let mut engine = LocEngine::with_config(client.clone(), test_config());
    let (recorder, calls) = Recorder::channel();
    engine.init(recorder).unwrap();

    client.deliver(RawEvent::Position(PositionReport {
        session_status: Some(SessionStatus::Success),
        latitude: Some(37.422),
        longitude: Some(-122.084),
        ..PositionReport::default()
    }));
    match calls.recv_timeout(WAIT).unwrap() {
        Call::Location(_) => {}
        other => panic!("unexpected call {other:?}"),
    }

    client.deliver(RawEvent::Satellite(SatelliteReport {
        svs: vec![SvInfo {
            system: Some(SV_SYSTEM_GPS),
            prn: 12,
            has_ephemeris: Some(true),
            ..SvInfo::default()
        }],
    }));

    match calls.recv_timeout(WAIT).unwrap() {
        Call::SvStatus(status) => {
            assert_eq!(status.svs.len(), 1);
            assert_eq!(status.used_in_fix_mask, 1 << 11);
        }
        other => panic!("unexpected call {other:?}"),
    }

    engine.cleanup();
}
