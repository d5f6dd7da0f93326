use crate::base::neterror::NetError;

#[test]
fn test_net_error_roundtrip() {
    // Chromium-aligned error
    let original = NetError::ConnectFailed;
    let code = original.as_i32();
    assert_eq!(code, -104);
    let converted = NetError::from(code);
    assert!(matches!(converted, NetError::ConnectFailed));

    // Handshake error
    let custom = NetError::AcceptHashMismatch;
    let custom_code = custom.as_i32();
    assert_eq!(custom_code, -10005);
    assert_eq!(NetError::from(custom_code), NetError::AcceptHashMismatch);
}

#[test]
fn test_unknown_error() {
    let err = NetError::from(-9999);
    assert!(matches!(err, NetError::Unknown(-9999)));
}

#[test]
fn test_collision_avoidance() {
    // Chromium reserves -900 to -906 for Blob errors.
    let blob_range = -906..=-900;

    for err in [
        NetError::TooFewHeaders,
        NetError::BadStatusLine,
        NetError::MalformedHeader,
        NetError::HeaderValueMismatch,
        NetError::AcceptHashMismatch,
        NetError::UnrequestedProtocol,
        NetError::ProtocolNotAccepted,
    ] {
        assert!(!blob_range.contains(&err.as_i32()));
        assert!(err.is_handshake_error());
    }
}

#[test]
fn test_io_error_conversion() {
    use std::io::{Error, ErrorKind};

    assert_eq!(
        NetError::from(Error::new(ErrorKind::UnexpectedEof, "eof")),
        NetError::PeerEof
    );
    assert_eq!(
        NetError::from(Error::new(ErrorKind::BrokenPipe, "pipe")),
        NetError::TransportError(ErrorKind::BrokenPipe)
    );
    assert!(!NetError::TransportError(ErrorKind::BrokenPipe).is_handshake_error());
}
