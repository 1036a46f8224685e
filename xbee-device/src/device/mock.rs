//! Scripted module used by the device tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::rc::Rc;
use std::time::Duration;

use super::frame::{ApiFrame, AtCommand, AtCommandStatus};
use crate::connection::ConnectionInterface;
use crate::error::XBeeError;
use crate::models::TransmitStatus;

pub(crate) const LOCAL_SH: [u8; 4] = [0x00, 0x13, 0xA2, 0x00];
pub(crate) const LOCAL_SL: [u8; 4] = [0x40, 0xA1, 0xB2, 0xC3];

#[derive(Default)]
pub(crate) struct MockState {
    pub open: bool,
    pub opens: usize,
    pub silent: bool,
    pub at_values: HashMap<AtCommand, Vec<u8>>,
    pub delivery: Option<TransmitStatus>,
    /// Frames written by the device.
    pub written: Vec<ApiFrame>,
    /// Frames the device will read next.
    pub pending: VecDeque<Vec<u8>>,
}

/// Connection answering AT queries from a table and transmit requests with a fixed status.
#[derive(Clone)]
pub(crate) struct MockConnection {
    state: Rc<RefCell<MockState>>,
}

impl MockConnection {
    /// Module of the given hardware series (high byte of `HV`) and firmware (`VR`).
    pub fn module(series: u8, firmware: [u8; 2]) -> Self {
        let mut at_values = HashMap::new();
        at_values.insert(*b"HV", vec![series, 0x43]);
        at_values.insert(*b"VR", firmware.to_vec());
        at_values.insert(*b"SH", LOCAL_SH.to_vec());
        at_values.insert(*b"SL", LOCAL_SL.to_vec());
        at_values.insert(*b"NI", b"LOCAL ".to_vec());
        let state = MockState {
            at_values,
            ..MockState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn digi_mesh() -> Self {
        Self::module(0x1B, [0x80, 0x66])
    }

    pub fn digi_point() -> Self {
        Self::module(0x1D, [0x10, 0x04])
    }

    pub fn raw_802() -> Self {
        let conn = Self::module(0x17, [0x10, 0xEF]);
        conn.state().at_values.insert(*b"MY", vec![0x12, 0x34]);
        conn
    }

    pub fn zigbee() -> Self {
        let conn = Self::module(0x19, [0x23, 0x70]);
        conn.state().at_values.insert(*b"MY", vec![0x00, 0x00]);
        conn
    }

    pub fn state(&self) -> std::cell::RefMut<'_, MockState> {
        self.state.borrow_mut()
    }

    pub fn set_silent(&self, silent: bool) {
        self.state().silent = silent;
    }

    pub fn set_delivery(&self, status: TransmitStatus) {
        self.state().delivery = Some(status);
    }

    /// Queues an unsolicited frame, read before any answer to later writes.
    pub fn inject(&self, frame: ApiFrame) {
        self.state().pending.push_back(frame.to_bytes());
    }

    pub fn written(&self) -> Vec<ApiFrame> {
        self.state().written.clone()
    }

    pub fn clear_written(&self) {
        self.state().written.clear();
    }
}

impl ConnectionInterface for MockConnection {
    fn open(&mut self) -> Result<(), XBeeError> {
        let mut state = self.state();
        if state.open {
            return Err(XBeeError::interface_already_open());
        }
        state.open = true;
        state.opens += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.state().open = false;
    }

    fn is_open(&self) -> bool {
        self.state.borrow().open
    }

    fn write_frame(&mut self, bytes: &[u8]) -> io::Result<()> {
        let frame = ApiFrame::try_from_bytes(bytes)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        let mut state = self.state();
        state.written.push(frame.clone());
        if state.silent {
            return Ok(());
        }
        let delivery = state.delivery.unwrap_or(TransmitStatus::SUCCESS);
        let answer = match frame {
            ApiFrame::AtCommand {
                frame_id, command, ..
            } => match state.at_values.get(&command) {
                Some(value) => Some(ApiFrame::AtCommandResponse {
                    frame_id,
                    command,
                    status: AtCommandStatus::OK,
                    value: value.clone(),
                }),
                None => Some(ApiFrame::AtCommandResponse {
                    frame_id,
                    command,
                    status: AtCommandStatus(2),
                    value: Vec::new(),
                }),
            },
            ApiFrame::TransmitRequest {
                frame_id, dest16, ..
            } if frame_id != 0 => Some(ApiFrame::TransmitStatus {
                frame_id,
                dest16,
                retries: 0,
                delivery,
                discovery: 0,
            }),
            ApiFrame::Tx64Request { frame_id, .. } | ApiFrame::Tx16Request { frame_id, .. }
                if frame_id != 0 =>
            {
                Some(ApiFrame::TxStatus { frame_id, delivery })
            }
            _ => None,
        };
        if let Some(answer) = answer {
            state.pending.push_back(answer.to_bytes());
        }
        Ok(())
    }

    fn read_frame(&mut self, _timeout: Duration) -> io::Result<Option<Vec<u8>>> {
        Ok(self.state().pending.pop_front())
    }
}
