//! Scripted channel for unit tests.

use std::collections::VecDeque;

use super::Channel;
use crate::core::{encode_ack, FrameHeader, MailboxId, NodeAddr, Slice};
use crate::error::Result;

type Responder = Box<dyn FnMut(&Slice) -> Vec<Slice>>;

/// Records every sent slice and answers from a script.
///
/// `receive` pops the first queued slice for the requested mailbox and
/// returns `None` when there is none, so tests never block.
pub(crate) struct ScriptedChannel {
    local: NodeAddr,
    pub sent: Vec<Slice>,
    inbox: VecDeque<Slice>,
    responder: Option<Responder>,
}

impl ScriptedChannel {
    pub fn new(local: NodeAddr) -> Self {
        Self {
            local,
            sent: Vec::new(),
            inbox: VecDeque::new(),
            responder: None,
        }
    }

    /// Calls `responder` for every sent slice and queues what it returns.
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: FnMut(&Slice) -> Vec<Slice> + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    /// Queues a slice for a later `receive`.
    pub fn push(&mut self, slice: Slice) {
        self.inbox.push_back(slice);
    }

    /// Headers of all sent slices, in order.
    pub fn sent_headers(&self) -> Vec<FrameHeader> {
        self.sent.iter().map(|s| *s.header()).collect()
    }
}

impl Channel for ScriptedChannel {
    fn local_addr(&self) -> NodeAddr {
        self.local
    }

    fn send(&mut self, slice: &Slice) -> Result<()> {
        self.sent.push(slice.clone());
        if let Some(responder) = self.responder.as_mut() {
            let replies = responder(slice);
            self.inbox.extend(replies);
        }
        Ok(())
    }

    fn receive(&mut self, mailbox: MailboxId) -> Result<Option<Slice>> {
        let pos = self
            .inbox
            .iter()
            .position(|s| s.header().dst_mailbox == mailbox);
        Ok(pos.and_then(|pos| self.inbox.remove(pos)))
    }
}

/// Builds the acknowledgment a peer would send back for `data`, carrying
/// `index`.
pub(crate) fn ack_for(data: &Slice, index: i64) -> Slice {
    let text = encode_ack(index).unwrap();
    let header = data.header().reply(text.len() as u16);
    Slice::new(header, text.as_bytes().to_vec()).unwrap()
}

/// Builds a data slice from `src` to `dst`.
pub(crate) fn data_slice(
    src: NodeAddr,
    dst: NodeAddr,
    index: u32,
    total: u32,
    data: &[u8],
) -> Slice {
    let header = FrameHeader {
        src_addr: src,
        dst_addr: dst,
        src_mailbox: crate::core::ACK_MAILBOX,
        dst_mailbox: crate::core::DATA_MAILBOX,
        slice_index: index,
        total_slices: total,
        length: data.len() as u16,
    };
    Slice::new(header, data.to_vec()).unwrap()
}
