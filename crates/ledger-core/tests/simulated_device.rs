//! End-to-end scenarios against simulated Oasis apps.
//!
//! Each simulated device answers the version, address and signing
//! instructions the way the Oasis app does, and records every frame it
//! receives so the tests can inspect what went over the wire.

// Silence unused crate dependency warnings for test binary
use serde as _;
use tempfile as _;
use thiserror as _;
use toml as _;
use tracing as _;

#[cfg(feature = "hid")]
use ledger_transport as _;
#[cfg(feature = "hid")]
use ledger_transport_hid as _;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use oasis_ledger_core::ledger::apdu::ins;
use oasis_ledger_core::ledger::{
    ApduAnswer, Command, DeviceProvider, DeviceStatus, ExchangeObserver, Operation, Transport,
};
use oasis_ledger_core::{
    AppMode, AppVersion, DerivationPath, Discovery, Error, LedgerConfig, Version,
};

const SW_CLA_NOT_SUPPORTED: u16 = 0x6E00;
const SW_COMMAND_NOT_ALLOWED: u16 = 0x6986;

/// State of one simulated device, shared with the test.
#[derive(Debug, Default)]
struct SimState {
    mode: u8,
    version: (u8, u8, u8),
    address: String,
    declines: bool,
    frames: Vec<Vec<u8>>,
    pending: Vec<u8>,
    signed: Option<Vec<u8>>,
    opened: usize,
    closed: usize,
}

impl SimState {
    fn expected_cla(&self) -> u8 {
        if self.mode == 1 { 0xF5 } else { 0x05 }
    }

    fn handle(&mut self, frame: &[u8]) -> ApduAnswer {
        self.frames.push(frame.to_vec());
        let (cla, instruction, p1, len) = (frame[0], frame[1], frame[2], usize::from(frame[4]));
        let data = &frame[5..];
        assert_eq!(data.len(), len, "length byte must match the data");

        if instruction == ins::GET_VERSION {
            let (major, minor, patch) = self.version;
            return success(vec![self.mode, major, minor, patch]);
        }
        if cla != self.expected_cla() {
            return ApduAnswer::new(vec![], SW_CLA_NOT_SUPPORTED);
        }

        match instruction {
            ins::GET_ADDR_ED25519 => {
                let mut response = vec![0xED; 32];
                response.extend_from_slice(self.address.as_bytes());
                success(response)
            }
            ins::SIGN_ED25519 => match p1 {
                0 => {
                    self.pending = data.to_vec();
                    success(vec![])
                }
                1 => {
                    self.pending.extend_from_slice(data);
                    success(vec![])
                }
                _ if self.declines => {
                    ApduAnswer::new(b"Sign request rejected".to_vec(), SW_COMMAND_NOT_ALLOWED)
                }
                _ => {
                    self.pending.extend_from_slice(data);
                    self.signed = Some(std::mem::take(&mut self.pending));
                    success(vec![0x5A; 64])
                }
            },
            _ => ApduAnswer::new(vec![], 0x6D00),
        }
    }
}

fn success(data: Vec<u8>) -> ApduAnswer {
    ApduAnswer::new(data, ApduAnswer::SW_SUCCESS)
}

struct SimTransport(Rc<RefCell<SimState>>);

impl Transport for SimTransport {
    fn exchange(&mut self, command: &Command) -> oasis_ledger_core::Result<ApduAnswer> {
        Ok(self.0.borrow_mut().handle(&command.to_bytes()))
    }

    fn close(&mut self) -> oasis_ledger_core::Result<()> {
        self.0.borrow_mut().closed += 1;
        Ok(())
    }
}

#[derive(Default)]
struct SimProvider {
    devices: Vec<Rc<RefCell<SimState>>>,
}

impl SimProvider {
    fn add(&mut self, mode: u8, version: (u8, u8, u8), address: &str) -> Rc<RefCell<SimState>> {
        let state = Rc::new(RefCell::new(SimState {
            mode,
            version,
            address: address.to_string(),
            ..SimState::default()
        }));
        self.devices.push(Rc::clone(&state));
        state
    }
}

impl DeviceProvider for SimProvider {
    fn device_count(&self) -> usize {
        self.devices.len()
    }

    fn open(&self, index: usize) -> oasis_ledger_core::Result<Box<dyn Transport>> {
        let state = self
            .devices
            .get(index)
            .ok_or_else(|| Error::Transport(format!("no device {index}")))?;
        state.borrow_mut().opened += 1;
        Ok(Box::new(SimTransport(Rc::clone(state))))
    }
}

/// Observer recording every operation it sees.
#[derive(Debug, Default)]
struct RecordingObserver {
    seen: Mutex<Vec<(Operation, Vec<u8>, Option<u16>)>>,
}

impl ExchangeObserver for RecordingObserver {
    fn exchanged(&self, operation: Operation, request: &[u8], answer: &ApduAnswer) {
        self.seen
            .lock()
            .unwrap()
            .push((operation, request.to_vec(), Some(answer.status())));
    }

    fn failed(&self, operation: Operation, request: &[u8], _error: &Error) {
        self.seen
            .lock()
            .unwrap()
            .push((operation, request.to_vec(), None));
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

const ADDRESS_X: &str = "oasis1qrxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";
const ADDRESS_Y: &str = "oasis1qryyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyyy";

#[test]
fn connect_by_address_closes_non_matching_device() {
    init_tracing();
    let mut provider = SimProvider::default();
    let a = provider.add(2, (1, 0, 0), ADDRESS_X);
    let b = provider.add(2, (1, 0, 0), ADDRESS_Y);

    let discovery = Discovery::new(provider);
    let mut app = discovery
        .connect(ADDRESS_Y, &DerivationPath::oasis(0))
        .unwrap();

    assert_eq!(a.borrow().closed, 1);
    assert_eq!(b.borrow().closed, 0);

    let info = app.get_address(&DerivationPath::oasis(0)).unwrap();
    assert_eq!(info.address, ADDRESS_Y);

    app.close().unwrap();
    assert_eq!(b.borrow().closed, 1);
}

#[test]
fn consensus_path_uses_validator_class_for_every_frame() {
    init_tracing();
    let mut provider = SimProvider::default();
    let device = provider.add(1, (2, 0, 0), ADDRESS_X);

    let path = DerivationPath::new(&[43, 474, 0, 0, 0]).unwrap();
    let discovery = Discovery::new(provider);
    let mut app = discovery.connect("", &path).unwrap();
    assert_eq!(app.mode(), AppMode::Validator);

    app.sign(&path, b"oasis-core/tendermint", &[0x01; 600])
        .unwrap();

    let state = device.borrow();
    assert!(state.frames.len() > 2);
    assert!(state.frames.iter().all(|frame| frame[0] == 0xF5));
}

#[test]
fn consumer_session_cannot_talk_to_validator_app() {
    let mut provider = SimProvider::default();
    let device = provider.add(1, (2, 0, 0), ADDRESS_X);

    let err = Discovery::new(provider)
        .connect("", &DerivationPath::oasis(0))
        .unwrap_err();

    assert!(matches!(err, Error::AddressNotFound(_)));
    assert_eq!(device.borrow().closed, 1);
}

#[test]
fn hardened_consensus_purpose_uses_consumer_class() {
    let mut provider = SimProvider::default();
    let consumer = provider.add(2, (1, 0, 0), ADDRESS_Y);

    let path: DerivationPath = "m/43'/474'/0'/0'/0'".parse().unwrap();
    let mut app = Discovery::new(provider).connect("", &path).unwrap();
    assert_eq!(app.mode(), AppMode::Consumer);

    app.get_address(&path).unwrap();
    let state = consumer.borrow();
    assert!(state.frames.iter().all(|frame| frame[0] == 0x05));
}

#[test]
fn sign_reassembles_on_device() {
    let mut provider = SimProvider::default();
    let device = provider.add(2, (1, 0, 0), ADDRESS_X);

    let config = LedgerConfig {
        chunk_size: 32,
        ..LedgerConfig::default()
    };
    let observer = Arc::new(RecordingObserver::default());
    let discovery = Discovery::with_config(provider, config, observer.clone());

    let path = DerivationPath::oasis(7);
    let mut app = discovery.find_any().unwrap();

    let context = [0xC7; 10];
    let tx: Vec<u8> = (0..2 * 32 + 5).collect();
    let signature = app.sign(&path, &context, &tx).unwrap();
    assert_eq!(signature, vec![0x5A; 64]);

    let mut expected = path.encode(5).unwrap().to_vec();
    expected.push(10);
    expected.extend_from_slice(&context);
    expected.extend_from_slice(&tx);
    assert_eq!(
        device.borrow().signed.as_deref(),
        Some(expected.as_slice())
    );

    // 1 + 10 + 69 = 80 data bytes in chunks of 32: path, 32, 32, 16.
    let seen = observer.seen.lock().unwrap();
    let sign_p1s: Vec<u8> = seen
        .iter()
        .filter(|(op, _, _)| *op == Operation::Sign)
        .map(|(_, request, _)| request[2])
        .collect();
    assert_eq!(sign_p1s, vec![0, 1, 1, 2]);
    assert_eq!(seen[0].0, Operation::GetVersion);
}

#[test]
fn encoded_path_on_the_wire() {
    let mut provider = SimProvider::default();
    let device = provider.add(2, (1, 0, 0), ADDRESS_X);

    let mut app = Discovery::new(provider).find_any().unwrap();
    app.get_address(&DerivationPath::oasis(0)).unwrap();

    let expected = hex::decode("2c000080da010080000000800000008000000080").unwrap();
    let state = device.borrow();
    let frame = state.frames.last().unwrap();
    assert_eq!(&frame[..5], &[0x05, ins::GET_ADDR_ED25519, 0, 0, 20]);
    assert_eq!(&frame[5..], expected.as_slice());
}

#[test]
fn declined_signature_surfaces_device_reason() {
    let mut provider = SimProvider::default();
    let device = provider.add(2, (1, 0, 0), ADDRESS_X);
    device.borrow_mut().declines = true;

    let mut app = Discovery::new(provider).find_any().unwrap();
    let err = app
        .sign(&DerivationPath::oasis(0), b"ctx", b"tx")
        .unwrap_err();

    match err {
        Error::DeviceRejected { status, reason } => {
            assert_eq!(status, DeviceStatus::CommandNotAllowed);
            assert_eq!(reason, "Sign request rejected");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(device.borrow().signed.is_none());
}

#[test]
fn find_any_enforces_configured_minimum() {
    let mut provider = SimProvider::default();
    let old = provider.add(2, (1, 1, 9), ADDRESS_X);
    let new = provider.add(2, (1, 2, 0), ADDRESS_Y);

    let config = LedgerConfig {
        minimum_version: Version::new(1, 2, 0),
        ..LedgerConfig::default()
    };
    let observer = Arc::new(RecordingObserver::default());
    let discovery = Discovery::with_config(provider, config, observer);

    let app = discovery.find_any().unwrap();
    assert_eq!(app.version(), AppVersion::new(AppMode::Consumer, 1, 2, 0));
    assert_eq!(old.borrow().closed, 1);
    assert_eq!(new.borrow().closed, 0);
}

#[test]
fn find_any_default_baseline() {
    let mut provider = SimProvider::default();
    let too_old = provider.add(2, (0, 0, 2), ADDRESS_X);
    let minimum = provider.add(2, (0, 0, 3), ADDRESS_Y);

    let app = Discovery::new(provider).find_any().unwrap();
    assert_eq!(app.version().version(), Version::new(0, 0, 3));
    assert_eq!(too_old.borrow().closed, 1);
    assert_eq!(minimum.borrow().closed, 0);
}

#[test]
fn repeated_version_queries_agree() {
    let mut provider = SimProvider::default();
    provider.add(1, (2, 1, 4), ADDRESS_X);

    let mut app = Discovery::new(provider).find_any().unwrap();
    let first = app.get_version().unwrap();
    let second = app.get_version().unwrap();
    assert_eq!(first, second);
    assert_eq!(first, AppVersion::new(AppMode::Validator, 2, 1, 4));
}

#[test]
fn list_candidates_opens_and_closes_everything() {
    let mut provider = SimProvider::default();
    let consumer = provider.add(2, (1, 0, 0), ADDRESS_X);
    let validator = provider.add(1, (1, 0, 0), ADDRESS_Y);

    let discovery = Discovery::new(provider);
    let candidates = discovery.list_candidates(&DerivationPath::oasis(0));

    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].address, ADDRESS_X);
    assert_eq!(candidates[1].version.mode, AppMode::Validator);
    for device in [&consumer, &validator] {
        let state = device.borrow();
        assert_eq!(state.opened, 1);
        assert_eq!(state.closed, 1);
    }
}
