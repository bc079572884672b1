//! Integration tests for the `npb-charger` crate.
//!
//! These tests exercise the top-level API, making sure the protocol, frame codec
//! and transport work together as expected.

use npb_charger::constants::REG_READ_VOUT;
use npb_charger::{disconnect, BusTransport, ChargerError, ChargerProtocol, MockBus};

#[tokio::test]
async fn test_disconnect_releases_bus() -> Result<(), ChargerError> {
    let bus = MockBus::new();
    let charger = ChargerProtocol::with_defaults(bus.clone());
    disconnect(charger).await?;
    assert!(bus.is_shut_down());
    Ok(())
}

#[tokio::test]
async fn test_into_transport_keeps_bus_open() -> Result<(), ChargerError> {
    let bus = MockBus::new();
    bus.queue_register_value(REG_READ_VOUT, 5312);
    let charger = ChargerProtocol::with_defaults(bus.clone());
    assert_eq!(charger.read_register(REG_READ_VOUT).await, Some(5312));

    let mut transport = charger.into_transport();
    assert!(!bus.is_shut_down());
    transport.shutdown().await?;
    assert!(bus.is_shut_down());
    Ok(())
}

#[test]
fn test_protocol_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ChargerProtocol<MockBus>>();
}
