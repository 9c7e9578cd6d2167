//! Stamper - 新しい envelope の message_id と timestamp を決める
//!
//! IdGenerator と Clock をひとまとめにして、バス・エージェント・コーディネーターで共有します。
//! FixedClock を渡せば envelope のタイムスタンプが決定的になります。

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

use crate::domain::{Envelope, MessageId};
use crate::ports::{Clock, FixedClock, IdGenerator, SystemClock, UlidGenerator};

static SYSTEM_IDS: UlidGenerator<SystemClock> = UlidGenerator::new(SystemClock);

/// Id and time for envelopes built without an explicit [`Stamper`].
pub(crate) fn system_stamp() -> (MessageId, DateTime<Utc>) {
    (SYSTEM_IDS.generate_message_id(), SystemClock.now())
}

#[derive(Clone)]
pub struct Stamper {
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl Stamper {
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { ids, clock }
    }

    /// ULID ids on the wall clock.
    pub fn system() -> Self {
        Self::new(Arc::new(UlidGenerator::new(SystemClock)), Arc::new(SystemClock))
    }

    /// Every stamp carries `at`; ids still differ in their random part.
    pub fn fixed(at: DateTime<Utc>) -> Self {
        let clock = FixedClock::new(at);
        Self::new(Arc::new(UlidGenerator::new(clock)), Arc::new(clock))
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn next_id(&self) -> MessageId {
        self.ids.generate_message_id()
    }

    /// Give a freshly built envelope an id and timestamp from the ports.
    pub fn stamp<E: Envelope>(&self, envelope: E) -> E {
        envelope.stamped(self.next_id(), self.now())
    }
}

impl Default for Stamper {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for Stamper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stamper")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
