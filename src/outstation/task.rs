//! Session task driving the state machine over an async transport.

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use super::config::OutstationConfig;
use super::handle::{DatabaseHandle, Message, OutstationHandle};
use super::session::{Handlers, Session};
use super::traits::{
    ConnectionState, ConnectionStateListener, ControlHandler, OutstationApplication,
    OutstationInformation,
};
use crate::codec::{Fragment, FragmentCodec};
use crate::database::Database;
use crate::error::{Dnp3Error, Result};

/// Capacity of the control message channel.
const MESSAGE_CHANNEL_SIZE: usize = 16;

/// Create an outstation over an initialized database.
///
/// Returns the handle used by the application and the task to run for
/// each transport session.
pub fn create_outstation(
    config: OutstationConfig,
    database: Database,
    application: impl OutstationApplication,
    information: impl OutstationInformation,
    control: impl ControlHandler,
    listener: impl ConnectionStateListener,
) -> Result<(OutstationHandle, OutstationTask)> {
    config.validate()?;
    database.events().config().validate()?;

    info!(
        "Creating outstation {} for master {}",
        config.outstation_address, config.master_address
    );

    let handlers = Handlers {
        application: Box::new(application),
        information: Box::new(information),
        control: Box::new(control),
        listener: Box::new(listener),
    };
    let database = DatabaseHandle::new(database);
    let (tx, rx) = mpsc::channel(MESSAGE_CHANNEL_SIZE);

    let task = OutstationTask {
        session: Session::new(config, handlers),
        database: database.clone(),
        rx,
    };
    Ok((OutstationHandle::new(database, tx), task))
}

enum Wakeup {
    Received(Option<Result<Fragment>>),
    Timeout,
    Updated,
    Message(Option<Message>),
}

/// Session task of one outstation.
pub struct OutstationTask {
    session: Session,
    database: DatabaseHandle,
    rx: mpsc::Receiver<Message>,
}

impl OutstationTask {
    /// Shared database of the outstation.
    pub fn database(&self) -> &DatabaseHandle {
        &self.database
    }

    /// Run one transport session until the peer closes it.
    ///
    /// Returns `Ok(())` when the transport reaches end of stream and
    /// `Dnp3Error::Shutdown` when the outstation was shut down or every
    /// handle was dropped. The task can be run again for the next session.
    pub async fn run<T>(&mut self, io: T) -> Result<()>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let codec = FragmentCodec::new(self.session.config().max_rx_fragment_size);
        let mut framed = Framed::new(io, codec);

        self.session.reset();
        self.session.connection_changed(ConnectionState::Connected);
        let result = self.run_session(&mut framed).await;
        self.session.connection_changed(ConnectionState::Disconnected);

        if let Err(err) = &result {
            warn!("Session ended: {}", err);
        }
        result
    }

    async fn run_session<T>(&mut self, framed: &mut Framed<T, FragmentCodec>) -> Result<()>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let output = self.step(|session, db| session.poll_unsolicited(Instant::now(), db));
        send_all(framed, output).await?;

        loop {
            let deadline = self.session.deadline();
            let wakeup = tokio::select! {
                frame = framed.next() => Wakeup::Received(frame),
                _ = sleep_until(deadline) => Wakeup::Timeout,
                _ = self.database.updated() => Wakeup::Updated,
                message = self.rx.recv() => Wakeup::Message(message),
            };

            let output = match wakeup {
                Wakeup::Received(Some(Ok(fragment))) => {
                    debug!("Received {}", fragment);
                    self.step(|session, db| {
                        let now = Instant::now();
                        let mut output = session.on_fragment(fragment, now, db);
                        output.extend(session.poll_unsolicited(now, db));
                        output
                    })
                }
                Wakeup::Received(Some(Err(err))) => return Err(err),
                Wakeup::Received(None) => {
                    info!("Transport closed by peer");
                    return Ok(());
                }
                Wakeup::Timeout => self.step(|session, db| {
                    let now = Instant::now();
                    let mut output = session.on_timeout(now, db);
                    output.extend(session.poll_unsolicited(now, db));
                    output
                }),
                Wakeup::Updated => {
                    self.step(|session, db| session.poll_unsolicited(Instant::now(), db))
                }
                Wakeup::Message(Some(Message::Shutdown)) | Wakeup::Message(None) => {
                    info!("Outstation shut down");
                    return Err(Dnp3Error::Shutdown);
                }
            };

            send_all(framed, output).await?;
        }
    }

    /// Run `f` under the database lock. The lock is released before returning.
    fn step<F>(&mut self, f: F) -> Vec<Fragment>
    where
        F: FnOnce(&mut Session, &mut Database) -> Vec<Fragment>,
    {
        let mut database = self.database.lock();
        f(&mut self.session, &mut database)
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => futures::future::pending().await,
    }
}

async fn send_all<T>(framed: &mut Framed<T, FragmentCodec>, fragments: Vec<Fragment>) -> Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    for fragment in fragments {
        debug!("Sending {}", fragment);
        framed.send(fragment).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::codec::Addresses;
    use crate::database::UpdateOptions;
    use crate::event::EventBufferConfig;
    use crate::outstation::traits::DefaultHandler;
    use crate::types::{BinaryInput, EventClass, Flags, FunctionCode, ResponseHeader};

    const OUTSTATION: u16 = 10;
    const MASTER: u16 = 1;

    #[derive(Clone, Default)]
    struct States(Arc<Mutex<Vec<ConnectionState>>>);

    impl ConnectionStateListener for States {
        fn on_change(&mut self, state: ConnectionState) {
            self.0.lock().unwrap().push(state);
        }
    }

    fn database(class: Option<EventClass>) -> Database {
        let mut db = Database::new(EventBufferConfig::default()).unwrap();
        db.add_binary_input(0, class, Default::default()).unwrap();
        db
    }

    fn outstation(config: OutstationConfig, db: Database, states: States) -> (OutstationHandle, OutstationTask) {
        create_outstation(config, db, DefaultHandler, DefaultHandler, DefaultHandler, states)
            .unwrap()
    }

    fn envelope(destination: u16, source: u16, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(data.len() as u16).to_le_bytes());
        out.extend_from_slice(&destination.to_le_bytes());
        out.extend_from_slice(&source.to_le_bytes());
        out.extend_from_slice(data);
        out
    }

    fn master(io: tokio::io::DuplexStream) -> Framed<tokio::io::DuplexStream, FragmentCodec> {
        Framed::new(io, FragmentCodec::new(2048))
    }

    async fn receive(master: &mut Framed<tokio::io::DuplexStream, FragmentCodec>) -> ResponseHeader {
        let fragment = master.next().await.unwrap().unwrap();
        assert_eq!(fragment.addresses, Addresses::new(MASTER, OUTSTATION));
        ResponseHeader::parse(&fragment.data).unwrap()
    }

    #[test]
    fn test_create_rejects_invalid_config() {
        let result = create_outstation(
            OutstationConfig::new(10, 10),
            database(None),
            DefaultHandler,
            DefaultHandler,
            DefaultHandler,
            DefaultHandler,
        );
        assert!(matches!(result, Err(Dnp3Error::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_integrity_poll_over_mock_io() {
        let states = States::default();
        let (_handle, mut task) = outstation(
            OutstationConfig::new(OUTSTATION, MASTER),
            database(None),
            states.clone(),
        );

        let request = envelope(OUTSTATION, MASTER, &[0xC0, 0x01, 60, 1, 0x06]);
        let response = envelope(
            MASTER,
            OUTSTATION,
            &[0xC0, 0x81, 0x80, 0x00, 1, 2, 0x01, 0, 0, 0, 0, 0x02],
        );
        let io = tokio_test::io::Builder::new()
            .read(&request)
            .write(&response)
            .build();

        task.run(io).await.unwrap();
        assert_eq!(
            *states.0.lock().unwrap(),
            vec![ConnectionState::Connected, ConnectionState::Disconnected]
        );
    }

    #[tokio::test]
    async fn test_fragment_for_other_outstation_ignored() {
        let (_handle, mut task) = outstation(
            OutstationConfig::new(OUTSTATION, MASTER),
            database(None),
            States::default(),
        );
        let request = envelope(11, MASTER, &[0xC0, 0x01, 60, 1, 0x06]);
        let io = tokio_test::io::Builder::new().read(&request).build();
        task.run(io).await.unwrap();
    }

    #[tokio::test]
    async fn test_oversized_fragment_ends_session() {
        let (_handle, mut task) = outstation(
            OutstationConfig::new(OUTSTATION, MASTER).max_rx_fragment_size(249),
            database(None),
            States::default(),
        );
        let request = envelope(OUTSTATION, MASTER, &[0u8; 300]);
        let io = tokio_test::io::Builder::new().read(&request).build();
        assert!(matches!(task.run(io).await, Err(Dnp3Error::Codec(_))));
    }

    #[tokio::test]
    async fn test_shutdown() {
        let (handle, mut task) = outstation(
            OutstationConfig::new(OUTSTATION, MASTER),
            database(None),
            States::default(),
        );
        let (_master_io, outstation_io) = tokio::io::duplex(1024);
        handle.shutdown().await.unwrap();
        assert!(matches!(task.run(outstation_io).await, Err(Dnp3Error::Shutdown)));
    }

    #[tokio::test]
    async fn test_unsolicited_after_transaction() {
        let config = OutstationConfig::new(OUTSTATION, MASTER).allow_unsolicited(true);
        let (handle, mut task) =
            outstation(config, database(Some(EventClass::Class1)), States::default());
        let (master_io, outstation_io) = tokio::io::duplex(4096);
        let server = tokio::spawn(async move { task.run(outstation_io).await });
        let mut master = master(master_io);

        // null unsolicited response at session start
        let header = receive(&mut master).await;
        assert_eq!(header.function, FunctionCode::UnsolicitedResponse);
        let seq = header.control.seq.value();
        master
            .send(Fragment::new(
                Addresses::new(OUTSTATION, MASTER),
                vec![0xD0 | seq, 0x00],
            ))
            .await
            .unwrap();

        // enable class 1
        master
            .send(Fragment::new(
                Addresses::new(OUTSTATION, MASTER),
                vec![0xC0, 0x14, 60, 2, 0x06],
            ))
            .await
            .unwrap();
        let header = receive(&mut master).await;
        assert_eq!(header.function, FunctionCode::Response);
        assert!(!header.iin.iin2.has_request_error());

        handle
            .transaction(|db| {
                db.update(
                    BinaryInput::without_time(0, true, Flags::ONLINE),
                    UpdateOptions::default(),
                )
            })
            .unwrap();

        let header = receive(&mut master).await;
        assert_eq!(header.function, FunctionCode::UnsolicitedResponse);
        assert!(header.control.con);

        handle.shutdown().await.unwrap();
        assert!(matches!(server.await.unwrap(), Err(Dnp3Error::Shutdown)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsolicited_retransmitted_after_timeout() {
        let config = OutstationConfig::new(OUTSTATION, MASTER)
            .allow_unsolicited(true)
            .unsolicited_confirm_timeout(Duration::from_secs(2));
        let (handle, mut task) = outstation(config, database(None), States::default());
        let (master_io, outstation_io) = tokio::io::duplex(4096);
        let server = tokio::spawn(async move { task.run(outstation_io).await });
        let mut master = master(master_io);

        let first = master.next().await.unwrap().unwrap();
        let second = master.next().await.unwrap().unwrap();
        assert_eq!(first, second);

        handle.shutdown().await.unwrap();
        assert!(matches!(server.await.unwrap(), Err(Dnp3Error::Shutdown)));
    }
}
