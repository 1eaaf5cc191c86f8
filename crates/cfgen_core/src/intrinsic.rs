//! CloudFormation intrinsic function helpers.

use crate::value::{PropertyMap, PropertyValue};

/// Pseudo parameter holding the deploying account id.
pub const ACCOUNT_ID: &str = "AWS::AccountId";

/// Pseudo parameter holding the deployment region.
pub const REGION: &str = "AWS::Region";

/// `{ "Ref": name }`
pub fn reference(name: impl Into<String>) -> PropertyValue {
    single("Ref", PropertyValue::String(name.into()))
}

/// `{ "Fn::Join": [separator, parts] }`
pub fn join(separator: &str, parts: Vec<PropertyValue>) -> PropertyValue {
    single(
        "Fn::Join",
        PropertyValue::List(vec![separator.into(), PropertyValue::List(parts)]),
    )
}

pub fn account_id() -> PropertyValue {
    reference(ACCOUNT_ID)
}

pub fn region() -> PropertyValue {
    reference(REGION)
}

fn single(key: &str, value: PropertyValue) -> PropertyValue {
    let mut map = PropertyMap::new();
    map.insert(key.to_string(), value);
    PropertyValue::Map(map)
}
