//! Asynchronous notifications pushed by the reader driver.

/// Notification emitted by the reader driver outside the command/response
/// flow.
///
/// The driver raises these from its own execution context: a reset issued via
/// [`ReaderPort::reset`](crate::traits::ReaderPort::reset) completes some
/// time later with [`ResetComplete`](ReaderEvent::ResetComplete), and a PICC
/// transmit that reaches a card answers with
/// [`ResponseApdu`](ReaderEvent::ResponseApdu).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    /// A previously issued reset has finished.
    ResetComplete,

    /// A PICC transmit produced a response APDU.
    ResponseApdu(Vec<u8>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_event_carries_payload() {
        let event = ReaderEvent::ResponseApdu(vec![0x63, 0x00]);
        match event {
            ReaderEvent::ResponseApdu(bytes) => assert_eq!(bytes, vec![0x63, 0x00]),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
