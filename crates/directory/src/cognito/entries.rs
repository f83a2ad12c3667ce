//! Conversion of Cognito records into directory entries.
//!
//! Entries use the attribute names of the Cognito API. Absent attributes are
//! left out instead of being written as `null`.

use aws_sdk_cognitoidentityprovider::types::{AttributeType, GroupType, MfaOptionType, UserType};
use aws_smithy_types::{DateTime, date_time::Format};
use serde::Serialize;
use serde_json::Value;

use crate::Entry;

pub(super) fn group_entry(group: &GroupType) -> Entry {
    let mut entry = Entry::new();

    insert(&mut entry, "GroupName", group.group_name());
    insert(&mut entry, "UserPoolId", group.user_pool_id());
    insert(&mut entry, "Description", group.description());
    insert(&mut entry, "RoleArn", group.role_arn());
    insert(&mut entry, "Precedence", group.precedence());
    insert(&mut entry, "LastModifiedDate", group.last_modified_date().and_then(format_date));
    insert(&mut entry, "CreationDate", group.creation_date().and_then(format_date));

    entry
}

pub(super) fn user_entry(user: &UserType) -> Entry {
    let mut entry = Entry::new();

    insert(&mut entry, "Username", user.username());

    let attributes: Vec<Entry> = user.attributes().iter().map(attribute_entry).collect();
    insert(&mut entry, "Attributes", attributes);

    insert(&mut entry, "UserCreateDate", user.user_create_date().and_then(format_date));
    insert(
        &mut entry,
        "UserLastModifiedDate",
        user.user_last_modified_date().and_then(format_date),
    );
    insert(&mut entry, "Enabled", user.enabled());
    insert(&mut entry, "UserStatus", user.user_status().map(|status| status.as_str()));

    let mfa_options: Vec<Entry> = user.mfa_options().iter().map(mfa_option_entry).collect();

    if !mfa_options.is_empty() {
        insert(&mut entry, "MFAOptions", mfa_options);
    }

    entry
}

fn attribute_entry(attribute: &AttributeType) -> Entry {
    let mut entry = Entry::new();

    insert(&mut entry, "Name", attribute.name());
    insert(&mut entry, "Value", attribute.value());

    entry
}

fn mfa_option_entry(option: &MfaOptionType) -> Entry {
    let mut entry = Entry::new();

    insert(
        &mut entry,
        "DeliveryMedium",
        option.delivery_medium().map(|medium| medium.as_str()),
    );
    insert(&mut entry, "AttributeName", option.attribute_name());

    entry
}

fn format_date(date: &DateTime) -> Option<String> {
    date.fmt(Format::DateTime).ok()
}

fn insert(entry: &mut Entry, key: &str, value: impl Serialize) {
    match serde_json::to_value(value) {
        Ok(Value::Null) => (),
        Ok(value) => {
            entry.insert(key.to_string(), value);
        }
        Err(e) => log::warn!("Dropping unserializable directory attribute {key}: {e}"),
    }
}
