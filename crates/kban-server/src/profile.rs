//! Device provisioning artifacts returned with an issued KBAN.
//!
//! The `.mobileconfig` profile carries the sealed KBAN and its credentials to
//! Apple devices; the QR link points at an external renderer.

use kban_identity_core::IssuedKban;
use url::Url;
use uuid::Uuid;

use crate::config::ProfileSettings;

/// Escape text for an XML element body
pub fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn string_entry(out: &mut String, indent: &str, key: &str, value: &str) {
    out.push_str(&format!(
        "{indent}<key>{}</key>\n{indent}<string>{}</string>\n",
        xml_escape(key),
        xml_escape(value)
    ));
}

/// Render an Apple configuration profile for an issued KBAN
///
/// Payload UUIDs are fresh on every call.
pub fn render_mobileconfig(settings: &ProfileSettings, issued: &IssuedKban) -> String {
    let metadata = &issued.metadata;
    let org = &settings.organization;
    let identifier = &settings.identifier;

    let mut kban_dict = String::new();
    let inner = "            ";
    string_entry(&mut kban_dict, inner, "EncryptedKBAN", issued.kban.as_str());
    string_entry(&mut kban_dict, inner, "SessionToken", &issued.session_token);
    string_entry(&mut kban_dict, inner, "AuthCode", &issued.auth_code);
    string_entry(&mut kban_dict, inner, "DeviceID", &metadata.device_id);
    string_entry(&mut kban_dict, inner, "DeviceType", &metadata.device_type);
    string_entry(
        &mut kban_dict,
        inner,
        "PushEnabled",
        if metadata.push_enabled { "true" } else { "false" },
    );
    string_entry(&mut kban_dict, inner, "IP", &metadata.ip);
    string_entry(&mut kban_dict, inner, "UserAgent", &metadata.user_agent);
    string_entry(
        &mut kban_dict,
        inner,
        "RiskScore",
        &metadata.risk_score.to_string(),
    );
    let tags: String = metadata
        .tags
        .iter()
        .map(|tag| format!("<string>{}</string>", xml_escape(tag)))
        .collect();
    kban_dict.push_str(&format!("{inner}<key>Tags</key>\n{inner}<array>{tags}</array>\n"));

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
  <dict>
    <key>PayloadContent</key>
    <array>
      <dict>
        <key>PayloadType</key>
        <string>com.apple.ManagedConfiguration</string>
        <key>PayloadVersion</key>
        <integer>1</integer>
        <key>PayloadIdentifier</key>
        <string>{payload_id}.profile</string>
        <key>PayloadUUID</key>
        <string>{inner_uuid}</string>
        <key>PayloadDisplayName</key>
        <string>K/BAN Profile</string>
        <key>PayloadOrganization</key>
        <string>{org}</string>
        <key>PayloadDescription</key>
        <string>Installs a secure K/BAN identity profile on your device.</string>
        <key>PayloadContent</key>
        <dict>
          <key>{payload_id}</key>
          <dict>
{kban_dict}          </dict>
        </dict>
      </dict>
    </array>
    <key>PayloadType</key>
    <string>Configuration</string>
    <key>PayloadVersion</key>
    <integer>1</integer>
    <key>PayloadIdentifier</key>
    <string>{payload_id}.root</string>
    <key>PayloadUUID</key>
    <string>{root_uuid}</string>
    <key>PayloadDisplayName</key>
    <string>{org} K/BAN Profile</string>
    <key>PayloadDescription</key>
    <string>This profile installs and secures a unique K/BAN identity to this device.</string>
    <key>PayloadOrganization</key>
    <string>{org}</string>
  </dict>
</plist>
"#,
        payload_id = xml_escape(identifier),
        inner_uuid = Uuid::new_v4(),
        root_uuid = Uuid::new_v4(),
        org = xml_escape(org),
        kban_dict = kban_dict,
    )
}

/// QR renderer link encoding the sealed KBAN
pub fn qr_link(base: &Url, encrypted_kban: &str) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("data", encrypted_kban)
        .append_pair("size", "200x200");
    url
}
