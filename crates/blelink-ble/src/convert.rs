//! Translation of btleplug types into link types

use blelink_core::{Advertisement, GattCharacteristic, GattService, PeripheralId, PowerState};
use btleplug::api::{CentralState, Characteristic, PeripheralProperties, Service};

/// Platform radio state as a link power state
pub fn power_state(state: CentralState) -> PowerState {
    #[allow(unreachable_patterns)]
    match state {
        CentralState::PoweredOn => PowerState::PoweredOn,
        CentralState::PoweredOff => PowerState::PoweredOff,
        CentralState::Unknown => PowerState::Unknown,
        _ => PowerState::Unknown,
    }
}

pub fn peripheral_id(id: &btleplug::platform::PeripheralId) -> PeripheralId {
    PeripheralId::new(id.to_string())
}

/// Advertisement data as last seen by the platform
pub fn advertisement(properties: &PeripheralProperties) -> Advertisement {
    Advertisement {
        local_name: properties.local_name.clone(),
        rssi: properties.rssi,
        tx_power_level: properties.tx_power_level,
        services: properties.services.clone(),
        manufacturer_data: properties.manufacturer_data.clone(),
        service_data: properties.service_data.clone(),
    }
}

pub fn service(service: &Service) -> GattService {
    GattService {
        uuid: service.uuid,
        primary: service.primary,
    }
}

pub fn characteristic(characteristic: &Characteristic) -> GattCharacteristic {
    GattCharacteristic::new(characteristic.uuid, characteristic.service_uuid)
        .with_properties(characteristic.properties.bits())
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};

    use blelink_core::types::char_props;
    use blelink_core::uuid_from_u16;
    use btleplug::api::CharPropFlags;

    use super::*;

    #[test]
    fn test_power_state_translation() {
        assert_eq!(power_state(CentralState::PoweredOn), PowerState::PoweredOn);
        assert_eq!(power_state(CentralState::PoweredOff), PowerState::PoweredOff);
        assert_eq!(power_state(CentralState::Unknown), PowerState::Unknown);
    }

    #[test]
    fn test_advertisement_copies_properties() {
        let mut manufacturer_data = HashMap::new();
        manufacturer_data.insert(0x004C, vec![0x02, 0x15]);
        let properties = PeripheralProperties {
            local_name: Some("thermometer".to_string()),
            rssi: Some(-52),
            services: vec![uuid_from_u16(0x181A)],
            manufacturer_data,
            ..Default::default()
        };

        let adv = advertisement(&properties);

        assert_eq!(adv.local_name.as_deref(), Some("thermometer"));
        assert_eq!(adv.rssi, Some(-52));
        assert_eq!(adv.services, vec![uuid_from_u16(0x181A)]);
        assert_eq!(adv.manufacturer_data.get(&0x004C), Some(&vec![0x02, 0x15]));
    }

    #[test]
    fn test_characteristic_properties_keep_bit_layout() {
        let raw = Characteristic {
            uuid: uuid_from_u16(0xFFE2),
            service_uuid: uuid_from_u16(0xFFE0),
            properties: CharPropFlags::READ | CharPropFlags::NOTIFY,
            descriptors: BTreeSet::new(),
        };

        let converted = characteristic(&raw);

        assert_eq!(converted.uuid, uuid_from_u16(0xFFE2));
        assert_eq!(converted.service_uuid, uuid_from_u16(0xFFE0));
        assert_eq!(converted.properties, char_props::READ | char_props::NOTIFY);
    }
}
