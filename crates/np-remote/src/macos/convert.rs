//! CoreFoundation <-> raw value conversion.

use crate::types::{CommandOptions, RawInfo, RawValue, keys};
use core_foundation::base::{CFType, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::data::CFData;
use core_foundation::date::CFDate;
use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
use core_foundation::number::CFNumber;
use core_foundation::string::{CFString, CFStringRef};
use log::debug;
use std::ffi::c_void;

/// Seconds between the CoreFoundation reference date (2001-01-01) and the UNIX epoch.
const ABSOLUTE_TIME_TO_UNIX: f64 = 978_307_200.0;

/// Copy a dictionary into an owned raw map.
///
/// # Safety
/// `dict` must be null or a valid `CFDictionaryRef` with string keys.
pub(crate) unsafe fn raw_info_from_dictionary(dict: *const c_void) -> RawInfo {
    let mut info = RawInfo::new();
    if dict.is_null() {
        return info;
    }

    // SAFETY: non-null and valid per the caller; the get rule retains it.
    let dict: CFDictionary = unsafe { CFDictionary::wrap_under_get_rule(dict as CFDictionaryRef) };
    let (keys, values) = dict.get_keys_and_values();

    for (key, value) in keys.into_iter().zip(values) {
        if key.is_null() || value.is_null() {
            continue;
        }
        // SAFETY: keys are CFStrings; values are retained CF objects.
        let key = unsafe { CFType::wrap_under_get_rule(key) };
        let Some(key) = key.downcast::<CFString>() else {
            continue;
        };
        let value = unsafe { CFType::wrap_under_get_rule(value) };
        match raw_value(&value) {
            Some(raw) => {
                info.insert(key.to_string(), raw);
            }
            None => debug!("Skipping unsupported value for {}", key),
        }
    }

    info
}

fn raw_value(value: &CFType) -> Option<RawValue> {
    if let Some(s) = value.downcast::<CFString>() {
        return Some(RawValue::String(s.to_string()));
    }
    // CFBoolean must be tested before CFNumber
    if let Some(b) = value.downcast::<CFBoolean>() {
        return Some(RawValue::Bool(b.into()));
    }
    if let Some(n) = value.downcast::<CFNumber>() {
        // to_i64 refuses lossy conversions, so fractional values fall through
        if let Some(i) = n.to_i64() {
            return Some(RawValue::Integer(i));
        }
        return n.to_f64().map(RawValue::Float);
    }
    if let Some(d) = value.downcast::<CFData>() {
        return Some(RawValue::Data(d.bytes().to_vec()));
    }
    if let Some(date) = value.downcast::<CFDate>() {
        return Some(RawValue::Date(date.abs_time() + ABSOLUTE_TIME_TO_UNIX));
    }
    None
}

/// Build the options dictionary for rating commands.
pub(crate) fn options_dictionary(options: &CommandOptions) -> CFDictionary<CFString, CFType> {
    let mut pairs: Vec<(CFString, CFType)> = Vec::with_capacity(3);
    if let Some(track_id) = &options.track_id {
        pairs.push((
            CFString::new(keys::OPTION_TRACK_ID),
            CFString::new(track_id).as_CFType(),
        ));
    }
    if let Some(station_id) = options.station_id {
        pairs.push((
            CFString::new(keys::OPTION_STATION_ID),
            CFNumber::from(station_id).as_CFType(),
        ));
    }
    if let Some(station_hash) = &options.station_hash {
        pairs.push((
            CFString::new(keys::OPTION_STATION_HASH),
            CFString::new(station_hash).as_CFType(),
        ));
    }
    CFDictionary::from_CFType_pairs(&pairs)
}

/// Copy a notification name.
///
/// # Safety
/// `name` must be null or a valid `CFStringRef`.
pub(crate) unsafe fn string_from_ref(name: CFStringRef) -> String {
    if name.is_null() {
        return String::new();
    }
    // SAFETY: non-null and valid per the caller.
    unsafe { CFString::wrap_under_get_rule(name) }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dictionary_round_trip_keeps_types() {
        let pairs = [
            (CFString::new(keys::TITLE), CFString::new("Song").as_CFType()),
            (CFString::new(keys::DURATION), CFNumber::from(215.5f64).as_CFType()),
            (CFString::new(keys::TRACK_NUMBER), CFNumber::from(3i64).as_CFType()),
            (CFString::new(keys::IS_MUSIC_APP), CFBoolean::true_value().as_CFType()),
            (CFString::new(keys::ARTWORK_DATA), CFData::from_buffer(&[1, 2, 3]).as_CFType()),
        ];
        let dict = CFDictionary::from_CFType_pairs(&pairs);

        let info = unsafe { raw_info_from_dictionary(dict.as_concrete_TypeRef() as *const c_void) };

        assert_eq!(info.get(keys::TITLE), Some(&RawValue::String("Song".into())));
        assert_eq!(info.get(keys::DURATION), Some(&RawValue::Float(215.5)));
        assert_eq!(info.get(keys::TRACK_NUMBER), Some(&RawValue::Integer(3)));
        assert_eq!(info.get(keys::IS_MUSIC_APP), Some(&RawValue::Bool(true)));
        assert_eq!(info.get(keys::ARTWORK_DATA), Some(&RawValue::Data(vec![1, 2, 3])));
    }

    #[test]
    fn test_null_dictionary_is_empty() {
        let info = unsafe { raw_info_from_dictionary(std::ptr::null()) };
        assert!(info.is_empty());
    }

    #[test]
    fn test_options_dictionary_skips_missing_fields() {
        let dict = options_dictionary(&CommandOptions::for_track("1234"));
        assert_eq!(dict.len(), 1);
    }
}
