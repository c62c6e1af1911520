use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use tracing::{debug, trace, warn};
use waywire_codec::{Message, ObjectId};
use waywire_transport::{DisplaySocket, FdTransport, IpcStream};

use crate::error::{ConnError, Result};
use crate::object::Object;

/// First id handed out by [`Connection::next_id`]; id 1 is the display.
pub const FIRST_ALLOCATED_ID: u32 = 2;

/// One end of a protocol connection.
///
/// Holds the transport, the object table and the id allocator. All state is
/// unsynchronized; a connection is driven from one thread at a time.
/// Closing consumes the connection, so no operation can follow it.
pub struct Connection<T = IpcStream> {
    transport: T,
    objects: HashMap<ObjectId, Box<dyn Object>>,
    next_id: u32,
}

impl<T: FdTransport> Connection<T> {
    /// Wrap an established transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            objects: HashMap::new(),
            next_id: FIRST_ALLOCATED_ID,
        }
    }

    /// Read the next message (blocking).
    pub fn read_message(&mut self) -> Result<Message> {
        Ok(waywire_codec::read_message(&mut self.transport)?)
    }

    /// Write one message (blocking).
    pub fn write_message(&mut self, message: &Message) -> Result<()> {
        Ok(waywire_codec::write_message(&mut self.transport, message)?)
    }

    /// Register `object` under `id`.
    pub fn add_object(&mut self, id: ObjectId, object: impl Object + 'static) -> Result<()> {
        self.add_boxed(id, Box::new(object))
    }

    /// Register an already boxed object under `id`.
    pub fn add_boxed(&mut self, id: ObjectId, object: Box<dyn Object>) -> Result<()> {
        if self.objects.contains_key(&id) {
            return Err(ConnError::ObjectExists(id));
        }
        trace!(%id, "add object");
        self.objects.insert(id, object);
        Ok(())
    }

    /// Remove the object registered under `id`, returning it.
    pub fn delete_object(&mut self, id: ObjectId) -> Option<Box<dyn Object>> {
        let removed = self.objects.remove(&id);
        if removed.is_none() {
            debug!(%id, "delete of unregistered object");
        }
        removed
    }

    pub fn has_object(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Allocate an id not currently registered.
    ///
    /// Ids increase monotonically from [`FIRST_ALLOCATED_ID`], wrapping
    /// around past `u32::MAX` without ever returning the null id or the
    /// display id.
    pub fn next_id(&mut self) -> ObjectId {
        loop {
            let id = ObjectId::new(self.next_id);
            self.next_id = match self.next_id.checked_add(1) {
                Some(next) => next,
                None => FIRST_ALLOCATED_ID,
            };
            if !self.objects.contains_key(&id) {
                return id;
            }
        }
    }

    /// Route `message` to the object it addresses.
    pub fn dispatch(&mut self, message: &mut Message) -> Result<()> {
        let id = message.object();
        let Some(object) = self.objects.get_mut(&id) else {
            warn!(%id, opcode = message.opcode(), "message for unregistered object");
            return Err(ConnError::UnknownObject(id));
        };
        trace!(%id, opcode = message.opcode(), "dispatch");
        object.handle(message.opcode(), message)
    }

    /// Read one message and dispatch it: a single event-loop step.
    pub fn next(&mut self) -> Result<()> {
        let mut message = self.read_message()?;
        self.dispatch(&mut message)
    }

    /// Keep dispatching until `done` reports completion.
    ///
    /// This is the client half of a sync barrier: issue a request whose
    /// completion event flips the condition, then call this. Because the
    /// stream is ordered and the peer answers in order, every event the
    /// peer emitted before the completion is dispatched first.
    pub fn dispatch_until(&mut self, mut done: impl FnMut() -> bool) -> Result<()> {
        while !done() {
            self.next()?;
        }
        Ok(())
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Drop the object table and hand back the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }
}

impl Connection<IpcStream> {
    /// Connect to the display socket resolved from the environment.
    pub fn dial() -> Result<Self> {
        Ok(Self::new(DisplaySocket::connect_default()?))
    }

    /// Connect to an explicit socket path.
    pub fn dial_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(DisplaySocket::connect(path)?))
    }

    /// Shut down the socket without consuming the connection.
    ///
    /// Wakes any other thread blocked reading from a clone of the same
    /// socket.
    pub fn shutdown(&self) -> Result<()> {
        Ok(self.transport.shutdown()?)
    }

    /// Close the connection, releasing the socket and object table.
    pub fn close(self) -> Result<()> {
        debug!(objects = self.objects.len(), "closing connection");
        self.shutdown()
    }
}

impl<T> fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.objects.keys().map(|id| id.get()).collect();
        ids.sort_unstable();
        f.debug_struct("Connection")
            .field("objects", &ids)
            .field("next_id", &self.next_id)
            .finish()
    }
}
