//! Discovery pipeline tests: service match and characteristic match

use blelink_core::{
    gatt_uuid::uuid_from_u16, AdapterError, AdapterEvent, BoundChannel, ConnectionState,
    GattService, PeripheralId,
};

use test_utils::{
    characteristic, connect_to_target, create_link, input_uuid, output_uuid, service,
    service_uuid, target, AdapterCall, TestLink,
};

fn services_discovered(link: &mut TestLink, services: Vec<GattService>) {
    link.handle_event(AdapterEvent::ServicesDiscovered {
        id: target(),
        result: Ok(services),
    });
}

fn at_characteristic_phase() -> TestLink {
    let mut link = create_link();
    connect_to_target(&mut link);
    services_discovered(&mut link, vec![service(service_uuid())]);
    assert_eq!(link.state(), ConnectionState::DiscoveringCharacteristics);
    link.adapter_mut().take_calls();
    link
}

// ----------------------------------------------------------------------------
// Service Phase
// ----------------------------------------------------------------------------

#[test]
fn test_matching_service_is_bound() {
    let mut link = create_link();
    connect_to_target(&mut link);

    let a = service(uuid_from_u16(0x1800));
    let c = service(uuid_from_u16(0x180A));
    services_discovered(&mut link, vec![a, service(service_uuid()), c]);

    assert_eq!(
        link.bound_channel().service.as_ref().map(|s| s.uuid),
        Some(service_uuid())
    );
    assert_eq!(link.state(), ConnectionState::DiscoveringCharacteristics);
    assert_eq!(
        link.adapter().calls.last(),
        Some(&AdapterCall::DiscoverCharacteristics(target(), service_uuid()))
    );
}

#[test]
fn test_first_matching_service_wins() {
    let mut link = create_link();
    connect_to_target(&mut link);

    let first = GattService {
        uuid: service_uuid(),
        primary: true,
    };
    let second = GattService {
        uuid: service_uuid(),
        primary: false,
    };
    services_discovered(&mut link, vec![first.clone(), second]);

    assert_eq!(link.bound_channel().service, Some(first));
    let requests = link
        .adapter()
        .calls
        .iter()
        .filter(|c| matches!(c, AdapterCall::DiscoverCharacteristics(..)))
        .count();
    assert_eq!(requests, 1);
}

#[test]
fn test_missing_service_stays_discovering() {
    let mut link = create_link();
    connect_to_target(&mut link);
    let transitions = link.observer().states.len();

    services_discovered(
        &mut link,
        vec![service(uuid_from_u16(0x1800)), service(uuid_from_u16(0x180A))],
    );

    assert_eq!(link.state(), ConnectionState::DiscoveringServices);
    assert_eq!(link.observer().states.len(), transitions);
    assert!(link.bound_channel().service.is_none());
}

#[test]
fn test_service_discovery_error() {
    let mut link = create_link();
    connect_to_target(&mut link);

    link.handle_event(AdapterEvent::ServicesDiscovered {
        id: target(),
        result: Err(AdapterError::new("gatt timeout")),
    });

    assert_eq!(link.state(), ConnectionState::ServiceDiscoveryFailed);
}

#[test]
fn test_services_from_stale_peripheral_are_ignored() {
    let mut link = create_link();
    connect_to_target(&mut link);

    link.handle_event(AdapterEvent::ServicesDiscovered {
        id: PeripheralId::new("stale"),
        result: Ok(vec![service(service_uuid())]),
    });

    assert_eq!(link.state(), ConnectionState::DiscoveringServices);
}

// ----------------------------------------------------------------------------
// Characteristic Phase
// ----------------------------------------------------------------------------

fn characteristics_discovered(link: &mut TestLink, uuids: &[uuid::Uuid]) {
    link.handle_event(AdapterEvent::CharacteristicsDiscovered {
        id: target(),
        service: service(service_uuid()),
        result: Ok(uuids.iter().copied().map(characteristic).collect()),
    });
}

#[test]
fn test_both_roles_bind_and_extra_is_never_inspected() {
    let mut link = at_characteristic_phase();
    let extra = uuid_from_u16(0xFFE9);

    characteristics_discovered(&mut link, &[output_uuid(), input_uuid(), extra]);

    assert_eq!(link.state(), ConnectionState::Ready);
    let channel = link.bound_channel();
    assert_eq!(channel.output.as_ref().map(|c| c.uuid), Some(output_uuid()));
    assert_eq!(channel.input.as_ref().map(|c| c.uuid), Some(input_uuid()));
    assert_eq!(
        link.adapter().calls,
        vec![
            AdapterCall::SetNotify(input_uuid(), true),
            AdapterCall::ReadValue(input_uuid()),
        ]
    );
}

#[test]
fn test_matching_stops_once_both_roles_bound() {
    let mut link = at_characteristic_phase();

    // A second input entry after the binding point must not be subscribed
    characteristics_discovered(&mut link, &[input_uuid(), output_uuid(), input_uuid()]);

    assert_eq!(link.state(), ConnectionState::Ready);
    let reads = link
        .adapter()
        .calls
        .iter()
        .filter(|c| matches!(c, AdapterCall::ReadValue(_)))
        .count();
    assert_eq!(reads, 1);
}

#[test]
fn test_missing_input_characteristic_stays_discovering() {
    let mut link = at_characteristic_phase();

    characteristics_discovered(&mut link, &[output_uuid(), uuid_from_u16(0xFFE9)]);

    assert_eq!(link.state(), ConnectionState::DiscoveringCharacteristics);
    assert!(link.bound_channel().output.is_some());
    assert!(!link.bound_channel().is_usable());
}

#[test]
fn test_characteristic_discovery_error() {
    let mut link = at_characteristic_phase();

    link.handle_event(AdapterEvent::CharacteristicsDiscovered {
        id: target(),
        service: service(service_uuid()),
        result: Err(AdapterError::new("insufficient authentication")),
    });

    assert_eq!(link.state(), ConnectionState::CharacteristicDiscoveryFailed);
    assert!(link.adapter().calls.is_empty());
}

#[test]
fn test_characteristics_for_unbound_service_are_ignored() {
    let mut link = at_characteristic_phase();

    link.handle_event(AdapterEvent::CharacteristicsDiscovered {
        id: target(),
        service: service(uuid_from_u16(0x180A)),
        result: Ok(vec![characteristic(output_uuid()), characteristic(input_uuid())]),
    });

    assert_eq!(link.state(), ConnectionState::DiscoveringCharacteristics);
    assert!(link.bound_channel().output.is_none());
    assert!(link.adapter().calls.is_empty());
}

#[test]
fn test_characteristics_from_stale_peripheral_are_ignored() {
    let mut link = at_characteristic_phase();

    link.handle_event(AdapterEvent::CharacteristicsDiscovered {
        id: PeripheralId::new("stale"),
        service: service(service_uuid()),
        result: Err(AdapterError::new("gatt timeout")),
    });

    assert_eq!(link.state(), ConnectionState::DiscoveringCharacteristics);
}

#[test]
fn test_same_uuid_for_both_roles_binds_one_entry() {
    let mut link = create_link();
    let shared = uuid_from_u16(0xFFE1);
    link.connect(target(), service_uuid(), shared, shared);
    link.handle_event(AdapterEvent::Connected(target()));
    services_discovered(&mut link, vec![service(service_uuid())]);

    characteristics_discovered(&mut link, &[shared]);

    assert_eq!(link.state(), ConnectionState::Ready);
}

#[test]
fn test_reconnect_rediscovers_from_scratch() {
    let mut link = at_characteristic_phase();
    characteristics_discovered(&mut link, &[output_uuid(), input_uuid()]);
    assert!(link.bound_channel().is_usable());

    link.reconnect().unwrap();
    link.handle_event(AdapterEvent::Connected(target()));

    assert_eq!(link.state(), ConnectionState::DiscoveringServices);
    assert_eq!(*link.bound_channel(), BoundChannel::default());
}
