//! Fixture builders for pipeline and end-to-end tests: provisioning
//! profile XML, signed manifests and in-memory ZIP archives.

use std::io::{Cursor, Write};

use provgate_crypto::testing::TestSigner;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Application identifier the default fixtures are signed for.
pub const TEST_APP_ID: &str = "ABC.myapp";

/// Archive path of the main bundle's manifest.
pub const BUNDLE_MANIFEST_PATH: &str = "Payload/MyApp.app/embedded.mobileprovision";

/// An XML provisioning profile authorizing `app_id`.
pub fn profile_xml(app_id: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>AppIDName</key>
    <string>My App</string>
    <key>CreationDate</key>
    <date>2024-01-15T10:00:00Z</date>
    <key>Entitlements</key>
    <dict>
        <key>application-identifier</key>
        <string>{app_id}</string>
        <key>get-task-allow</key>
        <false/>
    </dict>
    <key>ExpirationDate</key>
    <date>2099-01-15T10:00:00Z</date>
    <key>Name</key>
    <string>My App Distribution</string>
    <key>TeamIdentifier</key>
    <array>
        <string>ABC</string>
    </array>
    <key>UUID</key>
    <string>0f8fad5b-d9cb-469f-a165-70867728950e</string>
</dict>
</plist>"#
    )
}

/// A DER PKCS#7 message carrying [`profile_xml`] for `app_id`.
pub fn signed_profile(signer: &TestSigner, app_id: &str) -> Vec<u8> {
    signer
        .sign(profile_xml(app_id).as_bytes())
        .expect("sign test profile")
}

/// Build a deflated ZIP archive from `(name, content)` pairs, in order.
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        writer.start_file(*name, options).expect("start zip entry");
        writer.write_all(content).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// A minimal application archive whose bundle carries a signed manifest
/// for `app_id`.
pub fn app_archive(signer: &TestSigner, app_id: &str) -> Vec<u8> {
    let profile = signed_profile(signer, app_id);
    zip_archive(&[
        ("Payload/MyApp.app/Info.plist", b"<plist version=\"1.0\"><dict/></plist>"),
        ("Payload/MyApp.app/MyApp", b"\xcf\xfa\xed\xfe executable"),
        (BUNDLE_MANIFEST_PATH, &profile),
    ])
}
