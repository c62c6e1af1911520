use waywire_codec::Message;

use crate::error::Result;

/// A protocol object registered in a connection's table.
///
/// The connection calls [`Object::handle`] for every message addressed to
/// the object's id. The handler decodes the arguments it expects from
/// `message` in order.
pub trait Object {
    fn handle(&mut self, opcode: u16, message: &mut Message) -> Result<()>;
}

impl<F> Object for F
where
    F: FnMut(u16, &mut Message) -> Result<()>,
{
    fn handle(&mut self, opcode: u16, message: &mut Message) -> Result<()> {
        self(opcode, message)
    }
}
